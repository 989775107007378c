//! Uniform random sampling of entrants from the waiting pool.
//!
//! A draw computes the eligible pool (waiting list minus every entrant who
//! already holds a selection record for the event), shuffles it uniformly,
//! and commits selections one entrant at a time through the store's
//! compare-and-set. Losing a CAS race on an entrant just skips them and
//! continues down the shuffled pool, so two concurrent draws for the same
//! event never select overlapping entrants and still fill their quotas from
//! what remains.
//!
//! Sampling is unseeded by design: re-running a draw with identical inputs
//! is not expected to reproduce the same selection.

use crate::environment::Clock;
use crate::error::{LotteryError, bounded};
use crate::ids::{EntrantId, EventId};
use crate::invitation::Invitation;
use crate::selection::SelectionRecord;
use crate::store::{InvitationStore, SelectionStore, WaitlistStore};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Result of one draw invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOutcome {
    /// Event the draw targeted.
    pub event_id: EventId,
    /// How many selections the caller asked for.
    pub requested: u32,
    /// The entrants actually selected, at most `requested`. Fewer (including
    /// zero) means the eligible pool ran out. A normal outcome, not a
    /// failure.
    pub selected: Vec<EntrantId>,
}

impl DrawOutcome {
    /// Number of entrants this draw actually selected.
    #[must_use]
    pub const fn actual_count(&self) -> usize {
        self.selected.len()
    }

    /// Whether the draw filled the full requested quota.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.selected.len() == self.requested as usize
    }
}

/// Draws an unbiased subset of the current waiting pool.
pub struct LotterySampler {
    waitlist: Arc<dyn WaitlistStore>,
    selections: Arc<dyn SelectionStore>,
    invitations: Arc<dyn InvitationStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl LotterySampler {
    /// Create a sampler over the given stores.
    #[must_use]
    pub fn new(
        waitlist: Arc<dyn WaitlistStore>,
        selections: Arc<dyn SelectionStore>,
        invitations: Arc<dyn InvitationStore>,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            waitlist,
            selections,
            invitations,
            clock,
            store_timeout,
        }
    }

    /// Draw up to `requested` entrants from the event's eligible pool.
    ///
    /// Selected entrants get a `Selected` record stamped with the injected
    /// clock and a Pending invitation. An empty (or exhausted) pool yields
    /// an outcome with fewer selections than requested, down to zero.
    ///
    /// # Errors
    ///
    /// - [`LotteryError::InvalidArgument`] if `requested` is zero
    /// - [`LotteryError::StoreUnavailable`] if a store call fails or exceeds
    ///   the configured bound; selections committed before the failure stay
    ///   committed (each entrant is all-or-nothing, the batch is not)
    pub async fn draw(
        &self,
        event_id: &EventId,
        requested: u32,
    ) -> Result<DrawOutcome, LotteryError> {
        if requested == 0 {
            return Err(LotteryError::InvalidArgument(
                "requested draw count must be a positive integer".to_string(),
            ));
        }

        let mut pool = self.eligible_pool(event_id).await?;
        pool.shuffle(&mut rand::thread_rng());

        let want = requested as usize;
        let mut selected = Vec::with_capacity(want.min(pool.len()));
        for entrant_id in pool {
            if selected.len() == want {
                break;
            }
            let record = SelectionRecord::new(
                event_id.clone(),
                entrant_id.clone(),
                self.clock.now(),
            );
            let created = bounded(
                self.store_timeout,
                self.selections.create_if_absent(record),
            )
            .await?;
            if created {
                let invitation = Invitation::pending(event_id.clone(), entrant_id.clone());
                bounded(
                    self.store_timeout,
                    self.invitations.create_if_absent(invitation),
                )
                .await?;
                selected.push(entrant_id);
            } else {
                // Another draw committed this entrant between our pool read
                // and the CAS. Skip and keep filling from the rest.
                tracing::debug!(%event_id, %entrant_id, "lost selection race, skipping entrant");
            }
        }

        Ok(DrawOutcome {
            event_id: event_id.clone(),
            requested,
            selected,
        })
    }

    /// The entrants a draw may currently choose from: waiting-list members
    /// with no selection record of any status.
    pub(crate) async fn eligible_pool(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<EntrantId>, LotteryError> {
        let waiting = bounded(self.store_timeout, self.waitlist.list_eligible(event_id)).await?;
        let already_drawn: HashSet<EntrantId> =
            bounded(self.store_timeout, self.selections.list(event_id))
                .await?
                .into_iter()
                .map(|record| record.entrant_id)
                .collect();
        Ok(waiting
            .into_iter()
            .filter(|entrant| !already_drawn.contains(entrant))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(requested: u32, selected: &[&str]) -> DrawOutcome {
        DrawOutcome {
            event_id: EventId::new("e1"),
            requested,
            selected: selected.iter().map(|id| EntrantId::new(*id)).collect(),
        }
    }

    #[test]
    fn actual_count_tracks_selected() {
        assert_eq!(outcome(3, &["u1", "u2"]).actual_count(), 2);
        assert_eq!(outcome(3, &[]).actual_count(), 0);
    }

    #[test]
    fn is_full_only_when_quota_met() {
        assert!(outcome(2, &["u1", "u2"]).is_full());
        assert!(!outcome(3, &["u1", "u2"]).is_full());
    }
}
