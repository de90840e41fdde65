//! Subscription states, the legal transition table, and who may drive each transition.
//!
//! | From            | Allowed targets                                       |
//! |-----------------|-------------------------------------------------------|
//! | requested       | tutor_rejected, student_canceled, waiting_payment     |
//! | waiting_payment | paid                                                  |
//! | paid            | completed                                             |
//! | completed       | refunded                                              |
//!
//! Every other pair is illegal, whoever asks.
use std::fmt;
use std::str::FromStr;

#[derive(
    minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[cbor(index_only)]
pub enum SubscriptionStatus {
    #[n(0)]
    Requested,
    #[n(1)]
    TutorRejected,
    #[n(2)]
    StudentCanceled,
    #[n(3)]
    WaitingPayment,
    #[n(4)]
    Paid,
    #[n(5)]
    Completed,
    #[n(6)]
    Refunded,
}

/// The part a caller plays on one particular record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owner of the listing the record points at.
    Tutor,
    /// The record's subscriber.
    Student,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 7] = [
        SubscriptionStatus::Requested,
        SubscriptionStatus::TutorRejected,
        SubscriptionStatus::StudentCanceled,
        SubscriptionStatus::WaitingPayment,
        SubscriptionStatus::Paid,
        SubscriptionStatus::Completed,
        SubscriptionStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Requested => "requested",
            SubscriptionStatus::TutorRejected => "tutor_rejected",
            SubscriptionStatus::StudentCanceled => "student_canceled",
            SubscriptionStatus::WaitingPayment => "waiting_payment",
            SubscriptionStatus::Paid => "paid",
            SubscriptionStatus::Completed => "completed",
            SubscriptionStatus::Refunded => "refunded",
        }
    }

    /// Targets reachable from this state in one step.
    pub fn allowed_targets(&self) -> &'static [SubscriptionStatus] {
        match self {
            SubscriptionStatus::Requested => &[
                SubscriptionStatus::TutorRejected,
                SubscriptionStatus::StudentCanceled,
                SubscriptionStatus::WaitingPayment,
            ],
            SubscriptionStatus::WaitingPayment => &[SubscriptionStatus::Paid],
            SubscriptionStatus::Paid => &[SubscriptionStatus::Completed],
            SubscriptionStatus::Completed => &[SubscriptionStatus::Refunded],
            SubscriptionStatus::TutorRejected
            | SubscriptionStatus::StudentCanceled
            | SubscriptionStatus::Refunded => &[],
        }
    }

    pub fn can_transition_to(&self, target: SubscriptionStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }
}

/// Role a caller must hold on a record to move it into `target`.
///
/// `None` means no caller may drive the record there: `refunded` is a legal
/// target in the table but belongs to neither role.
pub fn required_role(target: SubscriptionStatus) -> Option<Role> {
    match target {
        SubscriptionStatus::TutorRejected | SubscriptionStatus::WaitingPayment => Some(Role::Tutor),
        SubscriptionStatus::Requested
        | SubscriptionStatus::StudentCanceled
        | SubscriptionStatus::Paid
        | SubscriptionStatus::Completed => Some(Role::Student),
        SubscriptionStatus::Refunded => None,
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a subscription status")]
pub struct UnknownStatus(pub String);

impl FromStr for SubscriptionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
