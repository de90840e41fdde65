//! Reference mapping from engine results to transport replies
//!
//! Business outcomes get distinct, stable codes so clients can branch on
//! them. Faults all collapse to one 500 with no internal detail.
use serde_json::{Value, json};

use crate::lifecycle::{CreationOutcome, TransitionOutcome};
use crate::record::SubscriptionRecord;

pub const INTERNAL_ERROR: &str = "internal error";

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, code: &str) -> Self {
        Self::new(status, json!({ "error": code }))
    }

    fn internal(fault: &anyhow::Error) -> Self {
        tracing::error!("request failed: {fault:#}");
        Self::error(500, INTERNAL_ERROR)
    }
}

pub fn transition_reply(result: &anyhow::Result<TransitionOutcome>) -> Reply {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(fault) => return Reply::internal(fault),
    };

    match outcome {
        TransitionOutcome::Success(record) => Reply::new(200, record_body(record)),
        TransitionOutcome::Unauthenticated => Reply::error(403, "unauthenticated"),
        TransitionOutcome::RecordNotFound(id) => {
            Reply::new(404, json!({ "error": "not_found", "id": id.as_str() }))
        }
        TransitionOutcome::IllegalTransition(illegal) => Reply::new(
            400,
            json!({
                "error": "illegal_transition",
                "currentStatus": illegal.current_status.as_str(),
                "newStatus": illegal.attempted_target.as_str(),
            }),
        ),
        TransitionOutcome::Forbidden(forbidden) => Reply::new(
            403,
            json!({
                "error": "forbidden",
                "requesterId": forbidden.requester_id.as_str(),
                "authorId": forbidden.listing_owner.as_str(),
                "authorized": forbidden.is_owner,
            }),
        ),
        TransitionOutcome::Invalid(e) => {
            Reply::new(400, json!({ "error": "invalid", "message": e.to_string() }))
        }
    }
}

pub fn creation_reply(result: &anyhow::Result<CreationOutcome>) -> Reply {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(fault) => return Reply::internal(fault),
    };

    match outcome {
        CreationOutcome::Created(record) => Reply::new(200, record_body(record)),
        CreationOutcome::Unauthenticated => Reply::error(403, "unauthenticated"),
        CreationOutcome::Invalid(e) => {
            Reply::new(400, json!({ "error": "invalid", "message": e.to_string() }))
        }
    }
}

fn record_body(record: &SubscriptionRecord) -> Value {
    json!({
        "id": record.id.as_str(),
        "subscriberId": record.subscriber_id.as_str(),
        "adId": record.listing_id.as_str(),
        "status": record.status.as_str(),
        "hours": record.hours,
    })
}
