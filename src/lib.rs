//! Booking lifecycle for a tutoring marketplace: students request
//! subscriptions to tutors' listings, and each party drives the subscription
//! through a fixed state machine according to its role on that record.

pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod listing;
pub mod record;
pub mod response;
pub mod service;
pub mod status;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;
