//! Walks one booking from request to payment and prints what a client would
//! receive at each step.
//!
//!     cargo run --example lifecycle -- [config.json]

use anyhow::Context;
use tutoring_subscriptions::{
    config::ServiceConfig,
    lifecycle::CreationOutcome,
    listing::{ListingDraft, ListingKind},
    response::{creation_reply, transition_reply},
    service::SubscriptionService,
    telemetry,
    types::UserId,
};

const TUTOR_ADDR: &str = "127.0.0.1";
const STUDENT_ADDR: &str = "127.0.0.2";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init(telemetry::default_filter(true))?;

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "db-config.json".to_string());
    let config = ServiceConfig::load_or_init(&config_path)?;
    let service = SubscriptionService::open(&config).context("failed to open database")?;

    let tutor = UserId::new()?;
    let student = UserId::new()?;
    let tutor_token = service.login(tutor.clone(), TUTOR_ADDR, false)?;
    let student_token = service.login(student, STUDENT_ADDR, true)?;

    let listing = service.publish_listing(
        tutor,
        ListingDraft {
            title: "Software Engineering I".to_string(),
            description: "Exam preparation, two sessions a week".to_string(),
            price_cents: 2_000,
            kind: ListingKind::Offline,
        },
    )?;

    let created = service
        .request_subscription(&student_token, STUDENT_ADDR, listing.id.as_str(), 4)
        .await;
    println!("request  -> {:?}", creation_reply(&created));

    let CreationOutcome::Created(record) = created? else {
        anyhow::bail!("subscription was not created");
    };
    let id = record.id.as_str();

    // the student cannot accept on the tutor's behalf
    let reply = transition_reply(
        &service
            .accept_subscription(id, &student_token, STUDENT_ADDR)
            .await,
    );
    println!("accept (student) -> {reply:?}");

    let reply = transition_reply(&service.accept_subscription(id, &tutor_token, TUTOR_ADDR).await);
    println!("accept (tutor)   -> {reply:?}");

    let reply = transition_reply(&service.pay_subscription(id, &student_token, STUDENT_ADDR).await);
    println!("pay (student)    -> {reply:?}");

    let reply = transition_reply(&service.reject_subscription(id, &tutor_token, TUTOR_ADDR).await);
    println!("reject (tutor)   -> {reply:?}");

    service.logout(&tutor_token, TUTOR_ADDR)?;
    service.flush().await?;

    Ok(())
}
