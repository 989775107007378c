//! End-to-end lifecycle tests for the lottery engine over the in-memory
//! stores: draws, invitation responses, cancellation, replacement, and the
//! exported query surface.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use chrono::Utc;
use fairdraw_core::engine::{EngineConfig, LotteryEngine};
use fairdraw_core::error::LotteryError;
use fairdraw_core::ids::{EntrantId, EventId};
use fairdraw_core::invitation::{InvitationResolution, InvitationStatus};
use fairdraw_core::selection::{EntrantOutcome, SelectionStatus};
use fairdraw_core::store::{MessageKind, Notifier, SelectionStore, WaitlistStore};
use fairdraw_memory::{
    InMemoryInvitationStore, InMemorySelectionStore, InMemoryWaitlist, RecordingNotifier,
};
use fairdraw_testing::test_clock;
use std::collections::HashSet;
use std::sync::Arc;

struct Fixture {
    waitlist: Arc<InMemoryWaitlist>,
    selections: Arc<InMemorySelectionStore>,
    notifier: Arc<RecordingNotifier>,
    engine: LotteryEngine,
}

fn fixture() -> Fixture {
    let waitlist = Arc::new(InMemoryWaitlist::new());
    let selections = Arc::new(InMemorySelectionStore::new());
    let invitations = Arc::new(InMemoryInvitationStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = LotteryEngine::new(
        Arc::clone(&waitlist) as Arc<dyn WaitlistStore>,
        Arc::clone(&selections) as Arc<dyn SelectionStore>,
        invitations,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::new(test_clock()),
        EngineConfig::default(),
    );
    Fixture {
        waitlist,
        selections,
        notifier,
        engine,
    }
}

fn populate(fx: &Fixture, event: &EventId, names: &[&str]) {
    for name in names {
        fx.waitlist.join(event, &EntrantId::new(*name), Utc::now());
    }
}

#[tokio::test]
async fn scenario_a_sequential_draws_partition_the_pool() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1", "u2", "u3", "u4", "u5"]);

    let first = fx.engine.draw(&event, 3).await.unwrap();
    assert_eq!(first.actual_count(), 3);
    let first_ids: HashSet<_> = first.selected.iter().cloned().collect();
    assert_eq!(first_ids.len(), 3, "draw must select distinct entrants");
    assert_eq!(fx.engine.count_waiting(&event).await.unwrap(), 2);

    // Second draw can only pull from the remaining two.
    let second = fx.engine.draw(&event, 3).await.unwrap();
    assert_eq!(second.actual_count(), 2);
    assert!(!second.is_full());
    for id in &second.selected {
        assert!(!first_ids.contains(id), "second draw re-selected {id}");
    }
    assert_eq!(fx.engine.count_waiting(&event).await.unwrap(), 0);

    // Pool exhausted: a further draw selects nobody, without error.
    let third = fx.engine.draw(&event, 3).await.unwrap();
    assert_eq!(third.actual_count(), 0);
}

#[tokio::test]
async fn scenario_b_first_invitation_response_wins() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1"]);
    let drawn = fx.engine.draw(&event, 1).await.unwrap();
    let entrant = drawn.selected[0].clone();

    assert_eq!(
        fx.engine.decline(&event, &entrant).await.unwrap(),
        InvitationResolution::Applied
    );
    assert_eq!(
        fx.engine.accept(&event, &entrant).await.unwrap(),
        InvitationResolution::AlreadyResolved(InvitationStatus::Declined)
    );

    // The confirmed-attendee marker was never set.
    assert!(fx.engine.list_confirmed(&event).await.unwrap().is_empty());
    match fx.engine.outcome(&event, &entrant).await.unwrap() {
        EntrantOutcome::Drawn(record) => assert!(!record.confirmed),
        EntrantOutcome::Waiting => panic!("entrant was drawn"),
    }
}

#[tokio::test]
async fn scenario_c_cancelled_slot_is_backfilled_once() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1", "u2", "u3"]);

    let drawn = fx.engine.draw(&event, 1).await.unwrap();
    let entrant = drawn.selected[0].clone();
    fx.engine.accept(&event, &entrant).await.unwrap();
    assert_eq!(fx.engine.list_confirmed(&event).await.unwrap().len(), 1);

    fx.engine.cancel(&event, &entrant).await.unwrap();
    let candidates = fx
        .engine
        .list_cancelled_awaiting_replacement(&event)
        .await
        .unwrap();
    assert_eq!(candidates, vec![entrant.clone()]);

    let replacement = fx.engine.draw_replacement_for(&event, &entrant).await.unwrap();
    let drawn_id = replacement.drawn.expect("two entrants remained eligible");
    assert_ne!(drawn_id, entrant);

    // The candidate is gone and a second attempt is rejected.
    assert!(
        fx.engine
            .list_cancelled_awaiting_replacement(&event)
            .await
            .unwrap()
            .is_empty()
    );
    let err = fx
        .engine
        .draw_replacement_for(&event, &entrant)
        .await
        .unwrap_err();
    assert!(matches!(err, LotteryError::NotACandidate { .. }));
}

#[tokio::test]
async fn replacement_with_empty_pool_still_latches() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1"]);

    let entrant = fx.engine.draw(&event, 1).await.unwrap().selected[0].clone();
    fx.engine.accept(&event, &entrant).await.unwrap();
    fx.engine.cancel(&event, &entrant).await.unwrap();

    // Nobody is left to draw: the slot stays unfilled, the candidate is
    // still consumed.
    let outcome = fx.engine.draw_replacement_for(&event, &entrant).await.unwrap();
    assert!(outcome.drawn.is_none());
    assert!(
        fx.engine
            .list_cancelled_awaiting_replacement(&event)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn join_then_leave_makes_entrant_ineligible() {
    let fx = fixture();
    let event = EventId::new("e1");
    let leaver = EntrantId::new("u1");
    populate(&fx, &event, &["u1", "u2"]);
    assert!(fx.waitlist.leave(&event, &leaver));

    let drawn = fx.engine.draw(&event, 5).await.unwrap();
    assert_eq!(drawn.actual_count(), 1);
    assert_eq!(drawn.selected[0].as_str(), "u2");
    assert!(fx.engine.outcome(&event, &leaver).await.unwrap().is_waiting());
}

#[tokio::test]
async fn zero_requested_count_is_rejected() {
    let fx = fixture();
    let event = EventId::new("e1");
    let err = fx.engine.draw(&event, 0).await.unwrap_err();
    assert!(matches!(err, LotteryError::InvalidArgument(_)));
}

#[tokio::test]
async fn cancel_requires_a_selected_record() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1", "u2"]);

    // Never drawn: cancelling a waiting entrant is an invalid transition.
    let err = fx.engine.cancel(&event, &EntrantId::new("u2")).await.unwrap_err();
    assert!(matches!(err, LotteryError::InvalidTransition { .. }));

    // Already cancelled: a second cancel is rejected too.
    let entrant = fx.engine.draw(&event, 1).await.unwrap().selected[0].clone();
    fx.engine.cancel(&event, &entrant).await.unwrap();
    let err = fx.engine.cancel(&event, &entrant).await.unwrap_err();
    assert!(matches!(err, LotteryError::InvalidTransition { .. }));
}

#[tokio::test]
async fn stale_cancel_cannot_overwrite_a_handled_record() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1", "u2"]);

    let entrant = fx.engine.draw(&event, 1).await.unwrap().selected[0].clone();
    fx.engine.cancel(&event, &entrant).await.unwrap();
    fx.engine.draw_replacement_for(&event, &entrant).await.unwrap();

    // A cancel that read the record before the latch landed must lose, and
    // the terminal status must survive it.
    let err = fx.engine.cancel(&event, &entrant).await.unwrap_err();
    assert!(matches!(err, LotteryError::InvalidTransition { .. }));
    let record = fx
        .selections
        .get(&event, &entrant)
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.status, SelectionStatus::ReplacementHandled);
    assert!(
        fx.engine
            .list_cancelled_awaiting_replacement(&event)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn responding_without_an_invitation_is_rejected() {
    let fx = fixture();
    let event = EventId::new("e1");
    let err = fx
        .engine
        .accept(&event, &EntrantId::new("nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, LotteryError::InvalidArgument(_)));
}

#[tokio::test]
async fn repeated_accept_is_a_visible_noop() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1"]);
    let entrant = fx.engine.draw(&event, 1).await.unwrap().selected[0].clone();

    assert_eq!(
        fx.engine.accept(&event, &entrant).await.unwrap(),
        InvitationResolution::Applied
    );
    assert_eq!(
        fx.engine.accept(&event, &entrant).await.unwrap(),
        InvitationResolution::AlreadyResolved(InvitationStatus::Accepted)
    );
    assert_eq!(fx.engine.list_confirmed(&event).await.unwrap().len(), 1);
}

#[tokio::test]
async fn notifications_follow_committed_transitions() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1", "u2", "u3"]);

    let drawn = fx.engine.draw(&event, 2).await.unwrap();
    let entrant = drawn.selected[0].clone();
    fx.engine.accept(&event, &entrant).await.unwrap();
    fx.engine.cancel(&event, &entrant).await.unwrap();
    fx.engine.draw_replacement_for(&event, &entrant).await.unwrap();

    let log = fx.notifier.log_for(&event);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, MessageKind::LotterySelected);
    assert_eq!(log[0].recipient_count, 2);
    assert_eq!(log[1].kind, MessageKind::ReplacementSelected);
    assert_eq!(log[1].recipient_count, 1);
}

#[tokio::test]
async fn query_surface_partitions_records() {
    let fx = fixture();
    let event = EventId::new("e1");
    populate(&fx, &event, &["u1", "u2", "u3", "u4"]);

    let drawn = fx.engine.draw(&event, 3).await.unwrap();
    let (accepter, decliner, canceller) = (
        drawn.selected[0].clone(),
        drawn.selected[1].clone(),
        drawn.selected[2].clone(),
    );
    fx.engine.accept(&event, &accepter).await.unwrap();
    fx.engine.decline(&event, &decliner).await.unwrap();
    fx.engine.accept(&event, &canceller).await.unwrap();
    fx.engine.cancel(&event, &canceller).await.unwrap();

    let selected = fx.engine.list_selected(&event).await.unwrap();
    let selected_ids: HashSet<_> = selected.iter().map(|r| r.entrant_id.clone()).collect();
    assert_eq!(selected_ids, HashSet::from([accepter.clone(), decliner]));

    let confirmed = fx.engine.list_confirmed(&event).await.unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].entrant_id, accepter);

    assert_eq!(
        fx.engine
            .list_cancelled_awaiting_replacement(&event)
            .await
            .unwrap(),
        vec![canceller]
    );
    assert_eq!(fx.engine.count_waiting(&event).await.unwrap(), 1);
    assert!(fx.engine.is_waitlisted(&event, &accepter).await.unwrap());

    // Direct store view agrees: one record per drawn entrant.
    assert_eq!(fx.selections.list(&event).await.unwrap().len(), 3);
}
