//! The booking request under management
use chrono::Utc;

use crate::status::SubscriptionStatus;
use crate::types::{ListingId, SubscriptionId, TimeStamp, UserId};

// Key is the subscription id, value is this struct encoded into CBOR
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    #[n(0)]
    pub id: SubscriptionId,
    #[n(1)]
    pub subscriber_id: UserId, // the student
    #[n(2)]
    pub listing_id: ListingId, // the tutor is whoever owns this listing
    #[n(3)]
    pub status: SubscriptionStatus,
    #[n(4)]
    pub hours: u32,
    #[n(5)]
    pub created_at: TimeStamp<Utc>,
    #[n(6)]
    pub updated_at: TimeStamp<Utc>,
}

impl SubscriptionRecord {
    /// A fresh booking request. Always starts out `requested`.
    pub fn new(subscriber_id: UserId, listing_id: ListingId, hours: u32) -> anyhow::Result<Self> {
        let now = TimeStamp::new();

        Ok(Self {
            id: SubscriptionId::new()?,
            subscriber_id,
            listing_id,
            status: SubscriptionStatus::Requested,
            hours,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Copy of this record moved to `status`, as it would be written on commit.
    pub fn with_status(&self, status: SubscriptionStatus) -> Self {
        Self {
            status,
            updated_at: TimeStamp::new(),
            ..self.clone()
        }
    }

    pub fn is_subscriber(&self, user: &UserId) -> bool {
        &self.subscriber_id == user
    }
}
