//! Persistence for subscription records
//!
//! sled is synchronous. Point reads and the guarded write are served from its
//! page cache and run inline; the full scan behind `list_records` is moved to
//! the blocking pool.
use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::SubscriptionRecord;
use crate::status::SubscriptionStatus;
use crate::types::SubscriptionId;

pub type Result<T> = anyhow::Result<T>;

/// Document store holding subscription records.
///
/// The status is the only field that changes after creation, and it only
/// changes through [`SubscriptionStore::conditional_update_status`].
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persist a new record. Fails if a record with the same id exists.
    async fn insert_record(&self, record: &SubscriptionRecord) -> Result<()>;
    async fn load_record(&self, id: &SubscriptionId) -> Result<Option<SubscriptionRecord>>;
    /// Move the record to `new` only if its persisted status is still `expected`.
    ///
    /// Returns the committed record, or `None` when the status had already
    /// moved on or the record is gone.
    async fn conditional_update_status(
        &self,
        id: &SubscriptionId,
        expected: SubscriptionStatus,
        new: SubscriptionStatus,
    ) -> Result<Option<SubscriptionRecord>>;
    /// Every record, oldest first.
    async fn list_records(&self) -> Result<Vec<SubscriptionRecord>>;
}

pub struct SledSubscriptionStore {
    tree: sled::Tree,
}

impl SledSubscriptionStore {
    pub const TREE: &'static str = "subscriptions";

    pub fn open(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(Self::TREE).map_err(StoreError::from)?;
        Ok(Self { tree })
    }

    fn insert(&self, record: &SubscriptionRecord) -> std::result::Result<(), StoreError> {
        let key = record.id.as_str().as_bytes();
        let bytes = encode_record(record)?;

        self.tree
            .compare_and_swap(key, None::<&[u8]>, Some(bytes))?
            .map_err(|_| StoreError::Duplicate(record.id.to_string()))
    }

    fn get(&self, id: &SubscriptionId) -> std::result::Result<Option<SubscriptionRecord>, StoreError> {
        self.tree
            .get(id.as_str().as_bytes())?
            .map(|bytes| decode_record(id.as_str(), &bytes))
            .transpose()
    }

    fn swap_status(
        &self,
        id: &SubscriptionId,
        expected: SubscriptionStatus,
        new: SubscriptionStatus,
    ) -> std::result::Result<Option<SubscriptionRecord>, StoreError> {
        let key = id.as_str().as_bytes();

        loop {
            let Some(current) = self.tree.get(key)? else {
                return Ok(None);
            };
            let record = decode_record(id.as_str(), &current)?;

            if record.status != expected {
                return Ok(None);
            }

            let committed = record.with_status(new);
            let next = encode_record(&committed)?;

            // Guarded on the exact bytes read above, so a concurrent writer
            // forces another read instead of being overwritten.
            match self.tree.compare_and_swap(key, Some(&current), Some(next))? {
                Ok(()) => return Ok(Some(committed)),
                Err(_) => {
                    tracing::debug!(subscription = %id, "status swap conflicted, re-reading");
                }
            }
        }
    }
}

#[async_trait]
impl SubscriptionStore for SledSubscriptionStore {
    async fn insert_record(&self, record: &SubscriptionRecord) -> Result<()> {
        Ok(self.insert(record)?)
    }

    async fn load_record(&self, id: &SubscriptionId) -> Result<Option<SubscriptionRecord>> {
        Ok(self.get(id)?)
    }

    async fn conditional_update_status(
        &self,
        id: &SubscriptionId,
        expected: SubscriptionStatus,
        new: SubscriptionStatus,
    ) -> Result<Option<SubscriptionRecord>> {
        Ok(self.swap_status(id, expected, new)?)
    }

    async fn list_records(&self) -> Result<Vec<SubscriptionRecord>> {
        // full scans leave the async workers; point lookups stay inline
        let tree = self.tree.clone();
        Ok(tokio::task::spawn_blocking(move || scan(&tree)).await??)
    }
}

fn scan(tree: &sled::Tree) -> std::result::Result<Vec<SubscriptionRecord>, StoreError> {
    let mut records = tree
        .iter()
        .map(|entry| {
            let (key, bytes) = entry?;
            decode_record(&String::from_utf8_lossy(&key), &bytes)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // bech32 keys do not sort by mint time
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(records)
}

fn encode_record(record: &SubscriptionRecord) -> std::result::Result<Vec<u8>, StoreError> {
    minicbor::to_vec(record).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode_record(key: &str, bytes: &[u8]) -> std::result::Result<SubscriptionRecord, StoreError> {
    minicbor::decode(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
