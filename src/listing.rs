//! Advertisement listings. Only ownership matters to the lifecycle engine.
use anyhow::Context;
use async_trait::async_trait;

use crate::error::{StoreError, ValidationError};
use crate::store::Result;
use crate::types::{ListingId, UserId};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
#[cbor(index_only)]
pub enum ListingKind {
    #[n(0)]
    Online,
    #[n(1)]
    Offline,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    #[n(0)]
    pub id: ListingId,
    #[n(1)]
    pub author_id: UserId, // the tutor
    #[n(2)]
    pub title: String,
    #[n(3)]
    pub description: String,
    #[n(4)]
    pub price_cents: u64, // per hour, integers for currency
    #[n(5)]
    pub kind: ListingKind,
}

/// What a tutor fills in before publishing.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price_cents: u64,
    pub kind: ListingKind,
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>>;

    /// Current owner of a listing. A missing listing is an error here, not `None`.
    async fn owner_of(&self, id: &ListingId) -> Result<UserId> {
        let listing = self
            .find_listing(id)
            .await?
            .with_context(|| format!("listing {id} does not exist"))?;
        Ok(listing.author_id)
    }
}

pub struct ListingDirectory {
    tree: sled::Tree,
}

impl ListingDirectory {
    pub const TREE: &'static str = "listings";

    pub fn open(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(Self::TREE).map_err(StoreError::from)?;
        Ok(Self { tree })
    }

    pub fn publish(&self, author_id: UserId, draft: ListingDraft) -> Result<Listing> {
        if draft.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let listing = Listing {
            id: ListingId::new()?,
            author_id,
            title: draft.title,
            description: draft.description,
            price_cents: draft.price_cents,
            kind: draft.kind,
        };

        let bytes = minicbor::to_vec(&listing).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.tree
            .insert(listing.id.as_str().as_bytes(), bytes)
            .map_err(StoreError::from)?;

        tracing::info!(listing = %listing.id, author = %listing.author_id, "listing published");
        Ok(listing)
    }

    /// Every listing published by `author_id`.
    pub fn listings_by_author(&self, author_id: &UserId) -> Result<Vec<Listing>> {
        let mut listings = vec![];

        for entry in self.tree.iter() {
            let (key, bytes) = entry.map_err(StoreError::from)?;
            let listing = decode_listing(&String::from_utf8_lossy(&key), &bytes)?;

            if &listing.author_id == author_id {
                listings.push(listing);
            }
        }

        Ok(listings)
    }
}

#[async_trait]
impl ListingStore for ListingDirectory {
    async fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>> {
        let found = self
            .tree
            .get(id.as_str().as_bytes())
            .map_err(StoreError::from)?
            .map(|bytes| decode_listing(id.as_str(), &bytes))
            .transpose()?;

        Ok(found)
    }
}

fn decode_listing(key: &str, bytes: &[u8]) -> std::result::Result<Listing, StoreError> {
    minicbor::decode(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
