//! Service layer API for subscription workflow operations
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::identity::SessionStore;
use crate::lifecycle::{CreationOutcome, LifecycleEngine, TransitionOutcome};
use crate::listing::{Listing, ListingDirectory, ListingDraft};
use crate::record::SubscriptionRecord;
use crate::status::SubscriptionStatus;
use crate::store::SledSubscriptionStore;
use crate::types::{ListingId, SessionToken, SubscriptionId, UserId};

pub type SledLifecycleEngine =
    LifecycleEngine<SessionStore, ListingDirectory, SledSubscriptionStore>;

/// The lifecycle engine wired to sled backed collaborators, with one verb per
/// subscription endpoint. Raw ids from callers are parsed here.
pub struct SubscriptionService {
    instance: Arc<sled::Db>,
    engine: SledLifecycleEngine,
}

impl SubscriptionService {
    pub fn new(instance: Arc<sled::Db>, config: &ServiceConfig) -> anyhow::Result<Self> {
        let engine = LifecycleEngine::new(
            SessionStore::open(&instance, config.session_ttl_minutes)?,
            ListingDirectory::open(&instance)?,
            SledSubscriptionStore::open(&instance)?,
            config.max_hours,
        );

        Ok(Self { instance, engine })
    }

    /// Open (or create) the database named in `config`.
    pub fn open(config: &ServiceConfig) -> anyhow::Result<Self> {
        let db = sled::open(&config.database_path)?;
        Self::new(Arc::new(db), config)
    }

    pub fn engine(&self) -> &SledLifecycleEngine {
        &self.engine
    }

    pub fn login(
        &self,
        user_id: UserId,
        client_address: &str,
        persistent: bool,
    ) -> anyhow::Result<SessionToken> {
        self.engine
            .identity()
            .open_session(user_id, client_address, persistent)
    }

    pub fn logout(&self, token: &SessionToken, client_address: &str) -> anyhow::Result<bool> {
        self.engine.identity().close_session(token, client_address)
    }

    pub fn publish_listing(&self, author_id: UserId, draft: ListingDraft) -> anyhow::Result<Listing> {
        self.engine.listings().publish(author_id, draft)
    }

    /// Student books a listing.
    pub async fn request_subscription(
        &self,
        token: &SessionToken,
        client_address: &str,
        listing_id: &str,
        hours: u32,
    ) -> anyhow::Result<CreationOutcome> {
        let listing_id = match ListingId::parse(listing_id) {
            Ok(id) => id,
            Err(e) => return Ok(CreationOutcome::Invalid(e)),
        };

        self.engine
            .request_subscription(token, client_address, &listing_id, hours)
            .await
    }

    /// Tutor accepts a request; the student now owes payment.
    pub async fn accept_subscription(
        &self,
        record_id: &str,
        token: &SessionToken,
        client_address: &str,
    ) -> anyhow::Result<TransitionOutcome> {
        self.transition(record_id, token, client_address, SubscriptionStatus::WaitingPayment)
            .await
    }

    /// Tutor turns a request down.
    pub async fn reject_subscription(
        &self,
        record_id: &str,
        token: &SessionToken,
        client_address: &str,
    ) -> anyhow::Result<TransitionOutcome> {
        self.transition(record_id, token, client_address, SubscriptionStatus::TutorRejected)
            .await
    }

    /// Student withdraws a request.
    pub async fn cancel_subscription(
        &self,
        record_id: &str,
        token: &SessionToken,
        client_address: &str,
    ) -> anyhow::Result<TransitionOutcome> {
        self.transition(record_id, token, client_address, SubscriptionStatus::StudentCanceled)
            .await
    }

    /// Student marks an accepted subscription as paid. No money moves here.
    pub async fn pay_subscription(
        &self,
        record_id: &str,
        token: &SessionToken,
        client_address: &str,
    ) -> anyhow::Result<TransitionOutcome> {
        self.transition(record_id, token, client_address, SubscriptionStatus::Paid)
            .await
    }

    pub async fn list_subscriptions(
        &self,
        token: &SessionToken,
        client_address: &str,
    ) -> anyhow::Result<Option<Vec<SubscriptionRecord>>> {
        self.engine.list_subscriptions(token, client_address).await
    }

    pub async fn flush(&self) -> anyhow::Result<()> {
        self.instance.flush_async().await?;
        Ok(())
    }

    async fn transition(
        &self,
        record_id: &str,
        token: &SessionToken,
        client_address: &str,
        target: SubscriptionStatus,
    ) -> anyhow::Result<TransitionOutcome> {
        let record_id = match SubscriptionId::parse(record_id) {
            Ok(id) => id,
            Err(e) => return Ok(TransitionOutcome::Invalid(e)),
        };

        self.engine
            .attempt_transition(&record_id, token, client_address, target)
            .await
    }
}
