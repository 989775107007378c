//! Backfill of cancelled selections from the remaining waiting pool.
//!
//! A cancelled selection whose replacement latch is unset is a replacement
//! candidate. Handling a candidate is a two-step unit: draw exactly one new
//! entrant through the ordinary sampler (same pool, identical sampling, no
//! reservation or weighting for replacements), then flip the candidate's
//! one-shot latch. The latch applies whether the draw produced one entrant
//! or none: an empty pool leaves the slot unfilled and the candidate is not
//! offered again.
//!
//! If the latch write fails after the draw committed, the failure is
//! surfaced as [`LotteryError::ReplacementLatchFailed`] so the caller can
//! retry the latch alone via [`ReplacementCoordinator::latch_replacement`].
//! Retrying the whole operation instead would draw a second entrant for the
//! same slot.

use crate::error::{LotteryError, bounded};
use crate::ids::{EntrantId, EventId};
use crate::sampler::LotterySampler;
use crate::selection::SelectionStatus;
use crate::store::SelectionStore;
use std::sync::Arc;
use std::time::Duration;

/// Result of handling one replacement candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplacementOutcome {
    /// The cancelled entrant whose slot was handled.
    pub cancelled_id: EntrantId,
    /// The entrant drawn as replacement, or `None` if the pool was empty.
    pub drawn: Option<EntrantId>,
}

/// Identifies cancelled selections eligible for backfill and drives
/// one-at-a-time replacement draws.
pub struct ReplacementCoordinator {
    selections: Arc<dyn SelectionStore>,
    sampler: Arc<LotterySampler>,
    store_timeout: Duration,
}

impl ReplacementCoordinator {
    /// Create a coordinator that fills slots through the given sampler.
    #[must_use]
    pub fn new(
        selections: Arc<dyn SelectionStore>,
        sampler: Arc<LotterySampler>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            selections,
            sampler,
            store_timeout,
        }
    }

    /// Replacement candidates for an event, in the order they became
    /// cancelled.
    ///
    /// # Errors
    ///
    /// [`LotteryError::StoreUnavailable`] if the store call fails or times
    /// out.
    pub async fn list_candidates(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<EntrantId>, LotteryError> {
        let cancelled = bounded(
            self.store_timeout,
            self.selections
                .list_by_status(event_id, SelectionStatus::Cancelled),
        )
        .await?;
        Ok(cancelled
            .into_iter()
            .filter(|record| record.is_replacement_candidate())
            .map(|record| record.entrant_id)
            .collect())
    }

    /// Draw one replacement for a specific cancelled slot and latch it.
    ///
    /// # Errors
    ///
    /// - [`LotteryError::NotACandidate`] if the entrant is not currently a
    ///   cancelled, unlatched selection
    /// - [`LotteryError::Conflict`] if a concurrent caller latched the same
    ///   candidate first; any entrant this call drew stays selected
    /// - [`LotteryError::ReplacementLatchFailed`] if the draw committed but
    ///   the latch write failed; retry the latch alone
    /// - [`LotteryError::StoreUnavailable`] for failures before any draw
    ///   committed
    pub async fn draw_replacement_for(
        &self,
        event_id: &EventId,
        cancelled_id: &EntrantId,
    ) -> Result<ReplacementOutcome, LotteryError> {
        let record = bounded(self.store_timeout, self.selections.get(event_id, cancelled_id))
            .await?
            .filter(|record| record.is_replacement_candidate())
            .ok_or_else(|| LotteryError::NotACandidate {
                event_id: event_id.clone(),
                entrant_id: cancelled_id.clone(),
            })?;

        let outcome = self.sampler.draw(event_id, 1).await?;
        let drawn = outcome.selected.into_iter().next();
        if drawn.is_none() {
            tracing::info!(%event_id, %cancelled_id, "eligible pool empty, slot stays unfilled");
        }

        match bounded(
            self.store_timeout,
            self.selections.latch_replacement(event_id, cancelled_id),
        )
        .await
        {
            Ok(true) => Ok(ReplacementOutcome {
                cancelled_id: record.entrant_id,
                drawn,
            }),
            Ok(false) => Err(LotteryError::Conflict {
                event_id: event_id.clone(),
                entrant_id: cancelled_id.clone(),
            }),
            Err(err) => Err(LotteryError::ReplacementLatchFailed {
                event_id: event_id.clone(),
                cancelled_id: cancelled_id.clone(),
                drawn,
                reason: err.to_string(),
            }),
        }
    }

    /// Retry just the latch step after a [`LotteryError::ReplacementLatchFailed`].
    ///
    /// # Errors
    ///
    /// - [`LotteryError::NotACandidate`] if the record is no longer a
    ///   candidate (including: the original latch write actually landed)
    /// - [`LotteryError::StoreUnavailable`] if the store call fails again
    pub async fn latch_replacement(
        &self,
        event_id: &EventId,
        cancelled_id: &EntrantId,
    ) -> Result<(), LotteryError> {
        let latched = bounded(
            self.store_timeout,
            self.selections.latch_replacement(event_id, cancelled_id),
        )
        .await?;
        if latched {
            Ok(())
        } else {
            Err(LotteryError::NotACandidate {
                event_id: event_id.clone(),
                entrant_id: cancelled_id.clone(),
            })
        }
    }
}
