//! Subscription lifecycle engine
//!
//! Every mutation goes through [`LifecycleEngine::attempt_transition`]:
//! resolve the caller, load the record, check the transition table, check the
//! caller's role on this record, then commit with a status-guarded write.
//! Business outcomes come back as [`TransitionOutcome`] inside `Ok`; only
//! collaborator faults come back as `Err`.
use std::collections::HashMap;

use anyhow::Context;

use crate::error::ValidationError;
use crate::identity::IdentityResolver;
use crate::listing::ListingStore;
use crate::record::SubscriptionRecord;
use crate::status::{Role, SubscriptionStatus, required_role};
use crate::store::SubscriptionStore;
use crate::types::{ListingId, SessionToken, SubscriptionId, UserId};

/// Why a structurally illegal transition was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalTransition {
    pub current_status: SubscriptionStatus,
    pub attempted_target: SubscriptionStatus,
}

/// Diagnostic context for a caller lacking the role a target requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forbidden {
    pub requester_id: UserId,
    pub listing_owner: UserId,
    pub is_owner: bool,
    pub required_role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Success(SubscriptionRecord),
    Unauthenticated,
    RecordNotFound(SubscriptionId),
    IllegalTransition(IllegalTransition),
    Forbidden(Forbidden),
    /// Raw input that never reached the engine, e.g. an unparsable record id.
    Invalid(ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    Created(SubscriptionRecord),
    Unauthenticated,
    Invalid(ValidationError),
}

impl TransitionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransitionOutcome::Success(_))
    }
}

pub struct LifecycleEngine<I, L, S> {
    identity: I,
    listings: L,
    store: S,
    max_hours: u32,
}

impl<I, L, S> LifecycleEngine<I, L, S>
where
    I: IdentityResolver,
    L: ListingStore,
    S: SubscriptionStore,
{
    pub fn new(identity: I, listings: L, store: S, max_hours: u32) -> Self {
        Self {
            identity,
            listings,
            store,
            max_hours,
        }
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn listings(&self) -> &L {
        &self.listings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn resolve(&self, token: &SessionToken, client_address: &str) -> anyhow::Result<Option<UserId>> {
        self.identity
            .resolve_identity(token, client_address)
            .await
            .context("identity resolution failed")
    }

    /// Book `hours` of `listing_id` on behalf of the caller behind `token`.
    #[tracing::instrument(skip_all, fields(listing = %listing_id, hours = hours))]
    pub async fn request_subscription(
        &self,
        token: &SessionToken,
        client_address: &str,
        listing_id: &ListingId,
        hours: u32,
    ) -> anyhow::Result<CreationOutcome> {
        let Some(subscriber) = self.resolve(token, client_address).await? else {
            return Ok(CreationOutcome::Unauthenticated);
        };

        self.create_subscription(subscriber, listing_id, hours).await
    }

    /// Create a record in `requested`. This is not a transition.
    pub async fn create_subscription(
        &self,
        subscriber_id: UserId,
        listing_id: &ListingId,
        hours: u32,
    ) -> anyhow::Result<CreationOutcome> {
        if hours == 0 || hours > self.max_hours {
            return Ok(CreationOutcome::Invalid(ValidationError::HoursOutOfRange {
                got: hours,
                max: self.max_hours,
            }));
        }

        let listing = self
            .listings
            .find_listing(listing_id)
            .await
            .context("listing lookup failed")?;
        if listing.is_none() {
            return Ok(CreationOutcome::Invalid(ValidationError::UnknownListing(
                listing_id.to_string(),
            )));
        }

        let record = SubscriptionRecord::new(subscriber_id, listing_id.clone(), hours)?;
        self.store
            .insert_record(&record)
            .await
            .context("failed to persist subscription")?;

        tracing::info!(
            subscription = %record.id,
            subscriber = %record.subscriber_id,
            hours,
            "subscription requested"
        );
        Ok(CreationOutcome::Created(record))
    }

    /// Move record `record_id` to `target` on behalf of the caller behind `token`.
    ///
    /// Writes at most once, and only after both the table and the role check pass.
    #[tracing::instrument(skip_all, fields(subscription = %record_id, to = %target))]
    pub async fn attempt_transition(
        &self,
        record_id: &SubscriptionId,
        token: &SessionToken,
        client_address: &str,
        target: SubscriptionStatus,
    ) -> anyhow::Result<TransitionOutcome> {
        let Some(requester) = self.resolve(token, client_address).await? else {
            tracing::debug!("caller not authenticated");
            return Ok(TransitionOutcome::Unauthenticated);
        };

        let Some(record) = self
            .store
            .load_record(record_id)
            .await
            .context("failed to load subscription")?
        else {
            return Ok(TransitionOutcome::RecordNotFound(record_id.clone()));
        };

        if !record.status.can_transition_to(target) {
            return Ok(illegal(record.status, target));
        }

        if let Some(forbidden) = self.authorize(&record, &requester, target).await? {
            tracing::warn!(
                requester = %forbidden.requester_id,
                owner = %forbidden.listing_owner,
                "transition forbidden"
            );
            return Ok(TransitionOutcome::Forbidden(forbidden));
        }

        let committed = self
            .store
            .conditional_update_status(record_id, record.status, target)
            .await
            .context("failed to update subscription status")?;

        match committed {
            Some(updated) => {
                tracing::info!(from = %record.status, to = %target, "transition committed");
                Ok(TransitionOutcome::Success(updated))
            }
            None => self.lost_race(record_id, target).await,
        }
    }

    /// Someone else moved the record between our read and our write.
    async fn lost_race(
        &self,
        record_id: &SubscriptionId,
        target: SubscriptionStatus,
    ) -> anyhow::Result<TransitionOutcome> {
        let current = self
            .store
            .load_record(record_id)
            .await
            .context("failed to reload subscription")?;

        match current {
            Some(record) => {
                tracing::warn!(now = %record.status, "status changed underneath transition");
                Ok(illegal(record.status, target))
            }
            None => Ok(TransitionOutcome::RecordNotFound(record_id.clone())),
        }
    }

    /// `None` if `requester` holds the role `target` requires on `record`.
    async fn authorize(
        &self,
        record: &SubscriptionRecord,
        requester: &UserId,
        target: SubscriptionStatus,
    ) -> anyhow::Result<Option<Forbidden>> {
        let role = required_role(target);

        if role == Some(Role::Student) && record.is_subscriber(requester) {
            return Ok(None);
        }

        // never cached: ownership is looked up on every check
        let owner = self
            .listings
            .owner_of(&record.listing_id)
            .await
            .context("listing owner lookup failed")?;
        let is_owner = &owner == requester;

        if role == Some(Role::Tutor) && is_owner {
            return Ok(None);
        }

        Ok(Some(Forbidden {
            requester_id: requester.clone(),
            listing_owner: owner,
            is_owner,
            required_role: role,
        }))
    }

    /// Records where the caller is either the student or the tutor.
    ///
    /// `None` when the caller is not authenticated.
    pub async fn list_subscriptions(
        &self,
        token: &SessionToken,
        client_address: &str,
    ) -> anyhow::Result<Option<Vec<SubscriptionRecord>>> {
        let Some(user) = self.resolve(token, client_address).await? else {
            return Ok(None);
        };

        let records = self
            .store
            .list_records()
            .await
            .context("failed to list subscriptions")?;

        // owners looked up once per listing within this call only
        let mut owners: HashMap<ListingId, Option<UserId>> = HashMap::new();
        let mut visible = vec![];

        for record in records {
            if record.is_subscriber(&user) {
                visible.push(record);
                continue;
            }

            if !owners.contains_key(&record.listing_id) {
                let owner = self
                    .listings
                    .find_listing(&record.listing_id)
                    .await
                    .context("listing lookup failed")?
                    .map(|listing| listing.author_id);
                owners.insert(record.listing_id.clone(), owner);
            }

            if owners.get(&record.listing_id) == Some(&Some(user.clone())) {
                visible.push(record);
            }
        }

        Ok(Some(visible))
    }
}

fn illegal(current_status: SubscriptionStatus, attempted_target: SubscriptionStatus) -> TransitionOutcome {
    TransitionOutcome::IllegalTransition(IllegalTransition {
        current_status,
        attempted_target,
    })
}
