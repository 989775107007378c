//! Error taxonomy for the lottery engine.
//!
//! Precondition failures and concurrency losses are returned as typed
//! results; nothing in this crate panics on bad input. `Conflict` in
//! particular is an expected outcome under concurrent callers, to be handled
//! with retry-or-ignore at the call site.

use crate::ids::{EntrantId, EventId};
use thiserror::Error;

/// Errors produced by the stores the engine consumes.
///
/// The store contract is deliberately narrow: conflicts are reported through
/// `bool` compare-and-set return values, absence through `Option`, so the
/// only thing left to fail on is the backend itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store failed transiently or did not answer within the
    /// caller's bound. Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during lottery engine operations.
#[derive(Error, Debug)]
pub enum LotteryError {
    /// A caller-supplied argument was rejected before any state was touched
    /// (zero draw size, id for which nothing exists).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A replacement draw was requested for an entrant who is not currently
    /// a cancelled-and-unhandled selection.
    #[error("{entrant_id} is not a replacement candidate for event {event_id}")]
    NotACandidate {
        /// Event the replacement draw targeted.
        event_id: EventId,
        /// Entrant who is not a candidate.
        entrant_id: EntrantId,
    },

    /// A state-machine transition was requested from a state it is not
    /// defined for. The underlying state is untouched.
    #[error("invalid transition for {entrant_id} in event {event_id}: {reason}")]
    InvalidTransition {
        /// Event the transition targeted.
        event_id: EventId,
        /// Entrant whose record rejected the transition.
        entrant_id: EntrantId,
        /// What made the transition invalid.
        reason: String,
    },

    /// A store call failed or timed out. Transient; retry the operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Lost a compare-and-set race to a concurrent caller. The caller should
    /// re-read and decide whether to retry.
    #[error("lost a concurrent update race for {entrant_id} in event {event_id}")]
    Conflict {
        /// Event where the race occurred.
        event_id: EventId,
        /// Entrant whose record was concurrently updated.
        entrant_id: EntrantId,
    },

    /// A replacement draw committed but the latch write on the cancelled
    /// record failed. The caller must retry the latch alone (via
    /// `latch_replacement`); retrying the whole replacement operation would
    /// draw a second entrant for the same slot.
    #[error(
        "replacement for {cancelled_id} in event {event_id} drawn but latch write failed: {reason}"
    )]
    ReplacementLatchFailed {
        /// Event the replacement draw targeted.
        event_id: EventId,
        /// The cancelled entrant whose latch write failed.
        cancelled_id: EntrantId,
        /// The entrant drawn as replacement, if the pool was non-empty.
        drawn: Option<EntrantId>,
        /// The store failure that interrupted the latch write.
        reason: String,
    },
}

impl LotteryError {
    /// Whether the whole operation can be safely retried as-is.
    ///
    /// `ReplacementLatchFailed` is deliberately not retryable as a whole
    /// operation; only its latch step is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for LotteryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
        }
    }
}

/// Run a store call under the caller-supplied bound.
///
/// No engine operation blocks indefinitely: a store call that neither
/// completes nor fails within `limit` is reported as the retryable
/// [`LotteryError::StoreUnavailable`].
pub(crate) async fn bounded<T>(
    limit: std::time::Duration,
    call: impl std::future::Future<Output = Result<T, StoreError>>,
) -> Result<T, LotteryError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(LotteryError::from),
        Err(_) => Err(LotteryError::StoreUnavailable(format!(
            "store call exceeded the {}ms bound",
            limit.as_millis()
        ))),
    }
}
