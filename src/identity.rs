//! Session backed identity resolution
use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::error::StoreError;
use crate::store::Result;
use crate::types::{SessionToken, TimeStamp, UserId};

/// Maps a session credential, scoped to the caller's network address, to a user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` when the session is unknown, expired, or bound to another address.
    async fn resolve_identity(
        &self,
        token: &SessionToken,
        client_address: &str,
    ) -> Result<Option<UserId>>;
}

// Key is the sha256 digest of the session token
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    #[n(0)]
    pub user_id: UserId,
    #[n(1)]
    pub client_address: String,
    #[n(2)]
    pub created_at: TimeStamp<Utc>,
    #[n(3)]
    pub persistent: bool, // "remember me" sessions never expire
}

pub struct SessionStore {
    tree: sled::Tree,
    ttl: Duration,
}

impl SessionStore {
    pub const TREE: &'static str = "sessions";

    pub fn open(db: &sled::Db, ttl_minutes: i64) -> Result<Self> {
        let ttl = Duration::try_minutes(ttl_minutes)
            .with_context(|| format!("session lifetime of {ttl_minutes} minutes is out of range"))?;
        let tree = db.open_tree(Self::TREE).map_err(StoreError::from)?;
        Ok(Self { tree, ttl })
    }

    /// Log `user_id` in from `client_address` and hand back the new credential.
    pub fn open_session(
        &self,
        user_id: UserId,
        client_address: &str,
        persistent: bool,
    ) -> Result<SessionToken> {
        let token = SessionToken::new()?;
        let session = Session {
            user_id,
            client_address: client_address.to_string(),
            created_at: TimeStamp::new(),
            persistent,
        };

        let bytes = minicbor::to_vec(&session).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.tree
            .insert(token.digest().as_bytes(), bytes)
            .map_err(StoreError::from)?;

        tracing::debug!(user = %session.user_id, persistent, "session opened");
        Ok(token)
    }

    /// Log out. Only the address the session was opened from may close it.
    pub fn close_session(&self, token: &SessionToken, client_address: &str) -> Result<bool> {
        let key = token.digest();

        match self.load(&key)? {
            Some(session) if session.client_address == client_address => {
                self.tree.remove(key.as_bytes()).map_err(StoreError::from)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn load(&self, key: &str) -> std::result::Result<Option<Session>, StoreError> {
        self.tree
            .get(key.as_bytes())?
            .map(|bytes| {
                minicbor::decode(&bytes).map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn is_expired(&self, session: &Session) -> bool {
        !session.persistent && Utc::now() - session.created_at.to_datetime_utc() > self.ttl
    }
}

#[async_trait]
impl IdentityResolver for SessionStore {
    async fn resolve_identity(
        &self,
        token: &SessionToken,
        client_address: &str,
    ) -> Result<Option<UserId>> {
        let Some(session) = self.load(&token.digest())? else {
            tracing::debug!("no session for token");
            return Ok(None);
        };

        if session.client_address != client_address {
            tracing::debug!(user = %session.user_id, "session used from another address");
            return Ok(None);
        }
        if self.is_expired(&session) {
            tracing::debug!(user = %session.user_id, "session expired");
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }
}
