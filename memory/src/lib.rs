//! # Fairdraw Memory
//!
//! In-process implementations of every store interface the fairdraw engine
//! consumes, backed by mutex-guarded maps.
//!
//! These are real implementations, not stubs: they honor the full
//! concurrency contract (atomic `create_if_absent`, one-winner
//! `compare_and_set_status`, conditional `cancel_if_selected`, one-shot
//! `latch_replacement`) and preserve the
//! orderings the engine relies on (join order on the waiting list,
//! cancellation order for replacement candidates). They back the demo
//! binary and the workspace's integration and concurrency test suites.

pub mod invitation;
pub mod notifier;
pub mod selection;
pub mod waitlist;

pub use invitation::InMemoryInvitationStore;
pub use notifier::{NotificationRecord, RecordingNotifier};
pub use selection::InMemorySelectionStore;
pub use waitlist::{InMemoryWaitlist, JoinOutcome};

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the inner state if a previous holder panicked.
///
/// Store state is plain data; observing it after a poisoning panic is safe.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
