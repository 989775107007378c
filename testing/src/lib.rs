//! # Fairdraw Testing
//!
//! Testing utilities for the fairdraw engine:
//!
//! - Deterministic clock (`FixedClock`, [`test_clock`])
//! - Fault-injection wrappers for exercising the failure paths the engine
//!   promises to survive (store timeouts, latch-write and invitation-write
//!   failures, notifier outages)
//!
//! The real in-memory stores live in `fairdraw-memory`; this crate only
//! holds what tests need on top of them.

use chrono::{DateTime, Utc};
use fairdraw_core::environment::Clock;

/// Mock implementations and fault injectors.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use fairdraw_core::error::StoreError;
    use fairdraw_core::ids::{EntrantId, EventId};
    use fairdraw_core::invitation::{Invitation, InvitationStatus};
    use fairdraw_core::selection::{SelectionRecord, SelectionStatus};
    use fairdraw_core::store::{
        InvitationStore, MessageKind, Notifier, SelectionPatch, SelectionStore, StoreFuture,
        WaitlistStore,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Fixed clock for deterministic tests: always returns the same time.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC).
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which should never
    /// happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// A waitlist whose calls never complete.
    ///
    /// Exercises the engine's caller-supplied bound: every operation against
    /// this store must come back as `StoreUnavailable`, not hang.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct StalledWaitlist;

    impl WaitlistStore for StalledWaitlist {
        fn list_eligible(&self, _event_id: &EventId) -> StoreFuture<'_, Vec<EntrantId>> {
            Box::pin(futures::future::pending())
        }

        fn contains(
            &self,
            _event_id: &EventId,
            _entrant_id: &EntrantId,
        ) -> StoreFuture<'_, bool> {
            Box::pin(futures::future::pending())
        }
    }

    /// Selection store wrapper that fails latch writes on demand.
    ///
    /// Used to drive the partial-failure path of a replacement draw: the
    /// draw commits against the inner store, then the latch write reports
    /// `Unavailable`.
    pub struct FailingLatchSelectionStore {
        inner: Arc<dyn SelectionStore>,
        fail_latch: AtomicBool,
    }

    impl FailingLatchSelectionStore {
        /// Wrap a working store; latch writes succeed until armed.
        #[must_use]
        pub fn new(inner: Arc<dyn SelectionStore>) -> Self {
            Self {
                inner,
                fail_latch: AtomicBool::new(false),
            }
        }

        /// Arm or disarm latch-write failure.
        pub fn fail_latch(&self, fail: bool) {
            self.fail_latch.store(fail, Ordering::SeqCst);
        }
    }

    impl SelectionStore for FailingLatchSelectionStore {
        fn get(
            &self,
            event_id: &EventId,
            entrant_id: &EntrantId,
        ) -> StoreFuture<'_, Option<SelectionRecord>> {
            self.inner.get(event_id, entrant_id)
        }

        fn create_if_absent(&self, record: SelectionRecord) -> StoreFuture<'_, bool> {
            self.inner.create_if_absent(record)
        }

        fn update(
            &self,
            event_id: &EventId,
            entrant_id: &EntrantId,
            patch: SelectionPatch,
        ) -> StoreFuture<'_, bool> {
            self.inner.update(event_id, entrant_id, patch)
        }

        fn cancel_if_selected(
            &self,
            event_id: &EventId,
            entrant_id: &EntrantId,
            at: DateTime<Utc>,
        ) -> StoreFuture<'_, bool> {
            self.inner.cancel_if_selected(event_id, entrant_id, at)
        }

        fn latch_replacement(
            &self,
            event_id: &EventId,
            entrant_id: &EntrantId,
        ) -> StoreFuture<'_, bool> {
            if self.fail_latch.load(Ordering::SeqCst) {
                return Box::pin(async {
                    Err(StoreError::Unavailable(
                        "injected latch-write failure".to_string(),
                    ))
                });
            }
            self.inner.latch_replacement(event_id, entrant_id)
        }

        fn list(&self, event_id: &EventId) -> StoreFuture<'_, Vec<SelectionRecord>> {
            self.inner.list(event_id)
        }

        fn list_by_status(
            &self,
            event_id: &EventId,
            status: SelectionStatus,
        ) -> StoreFuture<'_, Vec<SelectionRecord>> {
            self.inner.list_by_status(event_id, status)
        }
    }

    /// Invitation store wrapper that fails `create_if_absent` on demand.
    ///
    /// Used to interrupt a draw between its selection write and its
    /// invitation write, leaving a Selected record with no invitation.
    pub struct FailingCreateInvitationStore {
        inner: Arc<dyn InvitationStore>,
        fail_create: AtomicBool,
    }

    impl FailingCreateInvitationStore {
        /// Wrap a working store; creates succeed until armed.
        #[must_use]
        pub fn new(inner: Arc<dyn InvitationStore>) -> Self {
            Self {
                inner,
                fail_create: AtomicBool::new(false),
            }
        }

        /// Arm or disarm invitation-create failure.
        pub fn fail_create(&self, fail: bool) {
            self.fail_create.store(fail, Ordering::SeqCst);
        }
    }

    impl InvitationStore for FailingCreateInvitationStore {
        fn get(
            &self,
            event_id: &EventId,
            entrant_id: &EntrantId,
        ) -> StoreFuture<'_, Option<Invitation>> {
            self.inner.get(event_id, entrant_id)
        }

        fn create_if_absent(&self, invitation: Invitation) -> StoreFuture<'_, bool> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Box::pin(async {
                    Err(StoreError::Unavailable(
                        "injected invitation-write failure".to_string(),
                    ))
                });
            }
            self.inner.create_if_absent(invitation)
        }

        fn compare_and_set_status(
            &self,
            event_id: &EventId,
            entrant_id: &EntrantId,
            new_status: InvitationStatus,
        ) -> StoreFuture<'_, bool> {
            self.inner.compare_and_set_status(event_id, entrant_id, new_status)
        }
    }

    /// Notifier that always fails delivery.
    ///
    /// The engine must log and carry on: a committed transition is never
    /// rolled back because of this store.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct UnavailableNotifier;

    impl Notifier for UnavailableNotifier {
        fn notify(
            &self,
            _event_id: &EventId,
            _entrant_ids: Vec<EntrantId>,
            _kind: MessageKind,
        ) -> StoreFuture<'_, ()> {
            Box::pin(async {
                Err(StoreError::Unavailable(
                    "injected notifier outage".to_string(),
                ))
            })
        }
    }
}

// Re-export commonly used items
pub use mocks::{
    FailingCreateInvitationStore, FailingLatchSelectionStore, FixedClock, StalledWaitlist,
    UnavailableNotifier, test_clock,
};
