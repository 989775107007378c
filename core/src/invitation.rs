//! Invitation lifecycle: the entrant-facing accept/decline decision.
//!
//! An invitation is created alongside every Selected selection record and is
//! immutable once resolved. Resolution is deliberately a silent no-op from a
//! terminal state rather than an error: responses may arrive more than once
//! (duplicate taps, retried network calls) and must not corrupt
//! already-resolved state.

use crate::ids::{EntrantId, EventId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an invitation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvitationStatus {
    /// Sent, no response yet. The only state a transition is defined from.
    Pending,
    /// Accepted by the entrant; terminal.
    Accepted,
    /// Declined by the entrant; terminal.
    Declined,
}

impl InvitationStatus {
    /// Whether the invitation can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        };
        write!(f, "{label}")
    }
}

/// The accept/decline decision tied to one selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Event this invitation is for.
    pub event_id: EventId,
    /// The invited entrant.
    pub entrant_id: EntrantId,
    /// Current status.
    pub status: InvitationStatus,
}

impl Invitation {
    /// Create the pending invitation that accompanies a fresh selection.
    #[must_use]
    pub const fn pending(event_id: EventId, entrant_id: EntrantId) -> Self {
        Self {
            event_id,
            entrant_id,
            status: InvitationStatus::Pending,
        }
    }

    /// Whether no response has been recorded yet.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, InvitationStatus::Pending)
    }

    /// Resolve the invitation to a terminal status, first caller wins.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// invitation was already resolved (the silent no-op). Resolving to
    /// `Pending` never succeeds.
    pub fn resolve(&mut self, to: InvitationStatus) -> bool {
        if self.is_pending() && to.is_terminal() {
            self.status = to;
            true
        } else {
            false
        }
    }
}

/// Outcome of an accept or decline call, visible to the caller.
///
/// The no-op branch carries the status the first successful call set, so a
/// duplicate caller can see what actually happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvitationResolution {
    /// This call performed the transition.
    Applied,
    /// The invitation was already resolved; nothing changed.
    AlreadyResolved(InvitationStatus),
}
