//! Selection records: the authoritative lottery outcome state machine.
//!
//! One record exists per entrant per event once a draw has chosen them.
//! Absence of a record means the entrant is still Waiting; that implicit
//! state is surfaced explicitly as [`EntrantOutcome::Waiting`] so callers
//! cannot forget the branch.
//!
//! # State machine
//!
//! ```text
//! Waiting ──draw──▶ Selected ──cancel──▶ Cancelled ──latch──▶ ReplacementHandled
//!                      │
//!                      └─ confirmed marker layered on Selected when the
//!                         invitation resolves to Accepted; a Declined
//!                         invitation leaves the record Selected and terminal
//! ```
//!
//! `ReplacementHandled` and a declined Selected record are terminal: no
//! transition is defined out of either.

use crate::error::LotteryError;
use crate::ids::{EntrantId, EventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lottery outcome status of a drawn entrant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionStatus {
    /// Chosen by a draw; the entrant holds a pending (or resolved) invitation.
    Selected,
    /// Withdrew after being selected; eligible for backfill until latched.
    Cancelled,
    /// A replacement draw has been performed for this cancelled slot.
    ReplacementHandled,
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Selected => "selected",
            Self::Cancelled => "cancelled",
            Self::ReplacementHandled => "replacement-handled",
        };
        write!(f, "{label}")
    }
}

/// Per-entrant record of a lottery outcome for one event.
///
/// Created only by a draw, always with `status = Selected`. The
/// `replacement_drawn` flag is a one-shot latch preventing a cancelled slot
/// from being refilled twice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRecord {
    /// Event this selection belongs to.
    pub event_id: EventId,
    /// The chosen entrant.
    pub entrant_id: EntrantId,
    /// Current outcome status.
    pub status: SelectionStatus,
    /// When the draw chose this entrant.
    pub selected_at: DateTime<Utc>,
    /// Confirmed-attendee marker, set when the invitation is accepted.
    pub confirmed: bool,
    /// When the entrant withdrew, if they did.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// One-shot latch: a replacement draw has been performed for this slot.
    pub replacement_drawn: bool,
}

impl SelectionRecord {
    /// Create the record a draw commits: freshly selected, unconfirmed,
    /// latch unset.
    #[must_use]
    pub const fn new(event_id: EventId, entrant_id: EntrantId, selected_at: DateTime<Utc>) -> Self {
        Self {
            event_id,
            entrant_id,
            status: SelectionStatus::Selected,
            selected_at,
            confirmed: false,
            cancelled_at: None,
            replacement_drawn: false,
        }
    }

    /// Whether this record is currently eligible for a replacement draw.
    #[must_use]
    pub const fn is_replacement_candidate(&self) -> bool {
        matches!(self.status, SelectionStatus::Cancelled) && !self.replacement_drawn
    }

    /// Layer the confirmed-attendee marker on a Selected record.
    ///
    /// Idempotent: confirming an already-confirmed record is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LotteryError::InvalidTransition`] if the record is no longer
    /// Selected (a cancelled or handled entrant cannot become confirmed).
    pub fn confirm(&mut self) -> Result<(), LotteryError> {
        match self.status {
            SelectionStatus::Selected => {
                self.confirmed = true;
                Ok(())
            }
            status => Err(self.invalid_transition(format!("cannot confirm from {status}"))),
        }
    }

    /// Record an external withdrawal: Selected becomes Cancelled.
    ///
    /// Legal from Selected regardless of confirmation; the entrant may
    /// withdraw after accepting, and an organizer may cancel a non-responder.
    ///
    /// # Errors
    ///
    /// Returns [`LotteryError::InvalidTransition`] from Cancelled or
    /// `ReplacementHandled`.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), LotteryError> {
        match self.status {
            SelectionStatus::Selected => {
                self.status = SelectionStatus::Cancelled;
                self.cancelled_at = Some(at);
                Ok(())
            }
            status => Err(self.invalid_transition(format!("cannot cancel from {status}"))),
        }
    }

    /// Flip the one-shot replacement latch: Cancelled becomes
    /// `ReplacementHandled`.
    ///
    /// # Errors
    ///
    /// Returns [`LotteryError::InvalidTransition`] unless the record is
    /// currently a replacement candidate.
    pub fn mark_replacement_handled(&mut self) -> Result<(), LotteryError> {
        if !self.is_replacement_candidate() {
            return Err(self.invalid_transition(format!(
                "cannot mark replacement handled from {} (latch {})",
                self.status, self.replacement_drawn
            )));
        }
        self.status = SelectionStatus::ReplacementHandled;
        self.replacement_drawn = true;
        Ok(())
    }

    fn invalid_transition(&self, reason: String) -> LotteryError {
        LotteryError::InvalidTransition {
            event_id: self.event_id.clone(),
            entrant_id: self.entrant_id.clone(),
            reason,
        }
    }
}

/// Explicit view of an entrant's lottery outcome for an event.
///
/// The store only holds records for drawn entrants; this enum makes the
/// implicit "no record" state a value callers must match on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrantOutcome {
    /// No selection record exists: the entrant has not been drawn.
    Waiting,
    /// The entrant was drawn; the record carries the full outcome.
    Drawn(SelectionRecord),
}

impl EntrantOutcome {
    /// Whether the entrant is still waiting (never drawn).
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }
}
