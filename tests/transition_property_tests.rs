//! Property-based tests for the transition and authorization matrix
//!
//! Every (source, target, caller) combination is driven through the engine
//! against a real store. The expected results are written out independently
//! here rather than derived from the crate's own table.

mod common;

use common::{Marketplace, STRANGER_ADDR, STUDENT_ADDR, TUTOR_ADDR};
use proptest::prelude::*;
use tutoring_subscriptions::{
    lifecycle::{IllegalTransition, TransitionOutcome},
    status::SubscriptionStatus,
    types::SessionToken,
};

use SubscriptionStatus::*;

const LEGAL: [(SubscriptionStatus, SubscriptionStatus); 6] = [
    (Requested, TutorRejected),
    (Requested, StudentCanceled),
    (Requested, WaitingPayment),
    (WaitingPayment, Paid),
    (Paid, Completed),
    (Completed, Refunded),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Caller {
    Tutor,
    Student,
    Stranger,
    Anonymous,
}

fn status_strategy() -> impl Strategy<Value = SubscriptionStatus> {
    prop::sample::select(SubscriptionStatus::ALL.to_vec())
}

fn caller_strategy() -> impl Strategy<Value = Caller> {
    prop_oneof![
        Just(Caller::Tutor),
        Just(Caller::Student),
        Just(Caller::Stranger),
        Just(Caller::Anonymous),
    ]
}

fn may_drive(caller: Caller, target: SubscriptionStatus) -> bool {
    match target {
        TutorRejected | WaitingPayment => caller == Caller::Tutor,
        Requested | StudentCanceled | Paid | Completed => caller == Caller::Student,
        Refunded => false,
    }
}

fn credentials(market: &Marketplace, caller: Caller) -> (SessionToken, &'static str) {
    match caller {
        Caller::Tutor => (market.tutor_token.clone(), TUTOR_ADDR),
        Caller::Student => (market.student_token.clone(), STUDENT_ADDR),
        Caller::Stranger => (market.stranger_token.clone(), STRANGER_ADDR),
        Caller::Anonymous => (SessionToken::from("session_expired"), STUDENT_ADDR),
    }
}

/// Seed a record in `source`, attempt `target` as `caller` `attempts` times.
fn drive(
    source: SubscriptionStatus,
    target: SubscriptionStatus,
    caller: Caller,
    attempts: usize,
) -> anyhow::Result<(Vec<TransitionOutcome>, SubscriptionStatus)> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;

    runtime.block_on(async {
        let market = Marketplace::new()?;
        let id = market.seed(source).await?;
        let (token, addr) = credentials(&market, caller);

        let mut outcomes = vec![];
        for _ in 0..attempts {
            outcomes.push(
                market
                    .service
                    .engine()
                    .attempt_transition(&id, &token, addr, target)
                    .await?,
            );
        }

        let after = market.status_of(&id).await?;
        Ok::<_, anyhow::Error>((outcomes, after))
    })
}

fn same_class(a: &TransitionOutcome, b: &TransitionOutcome) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: pairs outside the table are illegal for every authenticated caller
    #[test]
    fn prop_illegal_pairs_never_mutate(
        source in status_strategy(),
        target in status_strategy(),
        caller in prop_oneof![Just(Caller::Tutor), Just(Caller::Student), Just(Caller::Stranger)],
    ) {
        prop_assume!(!LEGAL.contains(&(source, target)));

        let (outcomes, after) = drive(source, target, caller, 1).unwrap();

        prop_assert_eq!(
            &outcomes[0],
            &TransitionOutcome::IllegalTransition(IllegalTransition {
                current_status: source,
                attempted_target: target,
            })
        );
        prop_assert_eq!(after, source);
    }

    /// Property: a legal pair commits exactly when the caller holds the target's role
    #[test]
    fn prop_legal_pairs_follow_roles(
        pair in prop::sample::select(LEGAL.to_vec()),
        caller in prop_oneof![Just(Caller::Tutor), Just(Caller::Student), Just(Caller::Stranger)],
    ) {
        let (source, target) = pair;
        let (outcomes, after) = drive(source, target, caller, 1).unwrap();

        if may_drive(caller, target) {
            prop_assert!(outcomes[0].is_success(), "expected success, got {:?}", outcomes[0]);
            prop_assert_eq!(after, target);
        } else {
            prop_assert!(
                matches!(outcomes[0], TransitionOutcome::Forbidden(_)),
                "expected forbidden, got {:?}", outcomes[0]
            );
            prop_assert_eq!(after, source);
        }
    }

    /// Property: without a valid session nothing else is even looked at
    #[test]
    fn prop_anonymous_is_unauthenticated(
        source in status_strategy(),
        target in status_strategy(),
    ) {
        let (outcomes, after) = drive(source, target, Caller::Anonymous, 1).unwrap();

        prop_assert_eq!(&outcomes[0], &TransitionOutcome::Unauthenticated);
        prop_assert_eq!(after, source);
    }

    /// Property: refused requests stay refused and never touch the record
    #[test]
    fn prop_failures_are_idempotent(
        source in status_strategy(),
        target in status_strategy(),
        caller in caller_strategy(),
    ) {
        let succeeds = LEGAL.contains(&(source, target)) && may_drive(caller, target);
        prop_assume!(!succeeds);

        let (outcomes, after) = drive(source, target, caller, 3).unwrap();

        prop_assert!(!outcomes[0].is_success());
        prop_assert!(outcomes.iter().all(|outcome| same_class(outcome, &outcomes[0])));
        prop_assert_eq!(after, source);
    }
}
