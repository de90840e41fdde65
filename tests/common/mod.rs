//! Shared fixture: one tutor with one listing, one student, one bystander.
#![allow(dead_code)]

use std::sync::Arc;

use tempfile::{TempDir, tempdir};
use tutoring_subscriptions::{
    config::ServiceConfig,
    listing::{Listing, ListingDraft, ListingKind},
    record::SubscriptionRecord,
    service::SubscriptionService,
    status::SubscriptionStatus,
    store::SubscriptionStore,
    types::{SessionToken, SubscriptionId, UserId},
};

pub const TUTOR_ADDR: &str = "192.168.1.10";
pub const STUDENT_ADDR: &str = "192.168.1.20";
pub const STRANGER_ADDR: &str = "192.168.1.30";

pub struct Marketplace {
    pub service: SubscriptionService,
    pub tutor: UserId,
    pub student: UserId,
    pub tutor_token: SessionToken,
    pub student_token: SessionToken,
    pub stranger_token: SessionToken,
    pub listing: Listing,
    // declared last so it is dropped after the service
    _temp_dir: TempDir,
}

impl Marketplace {
    pub fn new() -> anyhow::Result<Self> {
        // Sled locks the database directory, so every test gets its own.
        let temp_dir = tempdir()?;
        let config = ServiceConfig {
            database_path: temp_dir.path().join("marketplace.db"),
            ..ServiceConfig::default()
        };
        let db = sled::open(&config.database_path)?;
        let service = SubscriptionService::new(Arc::new(db), &config)?;

        let tutor = UserId::new()?;
        let student = UserId::new()?;
        let stranger = UserId::new()?;

        let tutor_token = service.login(tutor.clone(), TUTOR_ADDR, false)?;
        let student_token = service.login(student.clone(), STUDENT_ADDR, true)?;
        let stranger_token = service.login(stranger, STRANGER_ADDR, false)?;

        let listing = service.publish_listing(
            tutor.clone(),
            ListingDraft {
                title: "Analysis I".to_string(),
                description: "Weekly exercise sessions".to_string(),
                price_cents: 1_050,
                kind: ListingKind::Online,
            },
        )?;

        Ok(Self {
            service,
            tutor,
            student,
            tutor_token,
            student_token,
            stranger_token,
            listing,
            _temp_dir: temp_dir,
        })
    }

    /// Store a record for the fixture's student already sitting in `status`.
    pub async fn seed(&self, status: SubscriptionStatus) -> anyhow::Result<SubscriptionId> {
        let mut record = SubscriptionRecord::new(self.student.clone(), self.listing.id.clone(), 4)?;
        record.status = status;

        self.service.engine().store().insert_record(&record).await?;
        Ok(record.id)
    }

    pub async fn status_of(&self, id: &SubscriptionId) -> anyhow::Result<SubscriptionStatus> {
        let record = self
            .service
            .engine()
            .store()
            .load_record(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("record {id} vanished"))?;
        Ok(record.status)
    }
}
