//! The engine facade: every lifecycle operation and the exported query
//! surface behind one handle.
//!
//! All collaborators are injected at construction; the engine owns no
//! global state and no concrete storage. Notifications are sent only after
//! the corresponding transition has committed; a delivery failure is logged
//! and never rolls the transition back.

use crate::environment::Clock;
use crate::error::{LotteryError, bounded};
use crate::ids::{EntrantId, EventId};
use crate::invitation::{Invitation, InvitationResolution, InvitationStatus};
use crate::replacement::{ReplacementCoordinator, ReplacementOutcome};
use crate::sampler::{DrawOutcome, LotterySampler};
use crate::selection::{EntrantOutcome, SelectionRecord, SelectionStatus};
use crate::store::{
    InvitationStore, MessageKind, Notifier, SelectionPatch, SelectionStore, WaitlistStore,
};
use std::sync::Arc;
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bound applied to every external store call. A call that neither
    /// completes nor fails within this window is reported as the retryable
    /// `StoreUnavailable`.
    pub store_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// The waitlist lottery and invitation lifecycle engine.
///
/// Invoked by concurrent, independent callers; mutual exclusion is scoped to
/// single records through the stores' compare-and-set primitives, so draws
/// for different events run fully concurrently.
pub struct LotteryEngine {
    waitlist: Arc<dyn WaitlistStore>,
    selections: Arc<dyn SelectionStore>,
    invitations: Arc<dyn InvitationStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    sampler: Arc<LotterySampler>,
    coordinator: ReplacementCoordinator,
    config: EngineConfig,
}

impl LotteryEngine {
    /// Create an engine over the injected collaborators.
    #[must_use]
    pub fn new(
        waitlist: Arc<dyn WaitlistStore>,
        selections: Arc<dyn SelectionStore>,
        invitations: Arc<dyn InvitationStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let sampler = Arc::new(LotterySampler::new(
            Arc::clone(&waitlist),
            Arc::clone(&selections),
            Arc::clone(&invitations),
            Arc::clone(&clock),
            config.store_timeout,
        ));
        let coordinator = ReplacementCoordinator::new(
            Arc::clone(&selections),
            Arc::clone(&sampler),
            config.store_timeout,
        );
        Self {
            waitlist,
            selections,
            invitations,
            notifier,
            clock,
            sampler,
            coordinator,
            config,
        }
    }

    // ========== Lottery ==========

    /// Run a sampling round: draw up to `requested` entrants for the event.
    ///
    /// Selected entrants are notified after the draw commits.
    ///
    /// # Errors
    ///
    /// See [`LotterySampler::draw`].
    pub async fn draw(
        &self,
        event_id: &EventId,
        requested: u32,
    ) -> Result<DrawOutcome, LotteryError> {
        let outcome = self.sampler.draw(event_id, requested).await?;
        tracing::info!(
            %event_id,
            requested,
            actual = outcome.actual_count(),
            "draw committed"
        );
        if !outcome.selected.is_empty() {
            self.notify(event_id, outcome.selected.clone(), MessageKind::LotterySelected)
                .await;
        }
        Ok(outcome)
    }

    // ========== Invitation responses ==========

    /// Accept a pending invitation.
    ///
    /// The first successful accept or decline wins; later calls observe
    /// [`InvitationResolution::AlreadyResolved`]. Accepting also layers the
    /// confirmed-attendee marker on the selection record, and repairs a
    /// missing marker when a duplicate accept finds the invitation already
    /// Accepted (covers a crash between the two writes).
    ///
    /// # Errors
    ///
    /// - [`LotteryError::InvalidArgument`] if no invitation exists for the
    ///   pair (the entrant was never selected)
    /// - [`LotteryError::StoreUnavailable`] on store failure; retry
    pub async fn accept(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> Result<InvitationResolution, LotteryError> {
        let resolution = self
            .resolve_invitation(event_id, entrant_id, InvitationStatus::Accepted)
            .await?;
        let confirmed_now = match &resolution {
            InvitationResolution::Applied => true,
            InvitationResolution::AlreadyResolved(status) => {
                *status == InvitationStatus::Accepted
            }
        };
        if confirmed_now {
            bounded(
                self.config.store_timeout,
                self.selections
                    .update(event_id, entrant_id, SelectionPatch::confirm()),
            )
            .await?;
        }
        Ok(resolution)
    }

    /// Decline a pending invitation. Symmetric to [`Self::accept`] without
    /// the confirmed-attendee side effect.
    ///
    /// # Errors
    ///
    /// Same as [`Self::accept`].
    pub async fn decline(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> Result<InvitationResolution, LotteryError> {
        self.resolve_invitation(event_id, entrant_id, InvitationStatus::Declined)
            .await
    }

    async fn resolve_invitation(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        to: InvitationStatus,
    ) -> Result<InvitationResolution, LotteryError> {
        let won = bounded(
            self.config.store_timeout,
            self.invitations
                .compare_and_set_status(event_id, entrant_id, to),
        )
        .await?;
        if won {
            tracing::info!(%event_id, %entrant_id, status = %to, "invitation resolved");
            return Ok(InvitationResolution::Applied);
        }
        // Lost the CAS: either resolved earlier or by a concurrent caller.
        // Re-read to report what the winner set.
        if let Some(invitation) = bounded(
            self.config.store_timeout,
            self.invitations.get(event_id, entrant_id),
        )
        .await?
        {
            tracing::debug!(
                %event_id,
                %entrant_id,
                status = %invitation.status,
                "invitation response was a no-op"
            );
            return Ok(InvitationResolution::AlreadyResolved(invitation.status));
        }
        // No invitation at all. A draw interrupted between its selection
        // write and its invitation write leaves a Selected record with
        // nothing to respond to; recreate the pending invitation and retry
        // instead of locking the entrant out.
        let selection = self.selection(event_id, entrant_id).await?;
        if !selection.is_some_and(|record| record.status == SelectionStatus::Selected) {
            return Err(LotteryError::InvalidArgument(format!(
                "no invitation exists for entrant {entrant_id} in event {event_id}"
            )));
        }
        tracing::warn!(
            %event_id,
            %entrant_id,
            "selected entrant had no invitation, recreating it"
        );
        bounded(
            self.config.store_timeout,
            self.invitations
                .create_if_absent(Invitation::pending(event_id.clone(), entrant_id.clone())),
        )
        .await?;
        let won = bounded(
            self.config.store_timeout,
            self.invitations
                .compare_and_set_status(event_id, entrant_id, to),
        )
        .await?;
        if won {
            tracing::info!(%event_id, %entrant_id, status = %to, "invitation resolved");
            return Ok(InvitationResolution::Applied);
        }
        // A concurrent caller resolved the recreated invitation first.
        let invitation = bounded(
            self.config.store_timeout,
            self.invitations.get(event_id, entrant_id),
        )
        .await?
        .ok_or_else(|| {
            LotteryError::InvalidArgument(format!(
                "no invitation exists for entrant {entrant_id} in event {event_id}"
            ))
        })?;
        Ok(InvitationResolution::AlreadyResolved(invitation.status))
    }

    // ========== Cancellation & replacement ==========

    /// Record an external cancellation: the entrant withdraws after being
    /// selected (typically after accepting). The slot becomes a replacement
    /// candidate.
    ///
    /// The Selected check and the status write are one conditional store
    /// operation, so a cancel racing a concurrent cancel or replacement
    /// latch can never overwrite a state it did not observe.
    ///
    /// # Errors
    ///
    /// - [`LotteryError::InvalidTransition`] if the entrant holds no
    ///   selection record or the record is not Selected at write time
    /// - [`LotteryError::StoreUnavailable`] on store failure; retry
    pub async fn cancel(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> Result<(), LotteryError> {
        let cancelled = bounded(
            self.config.store_timeout,
            self.selections
                .cancel_if_selected(event_id, entrant_id, self.clock.now()),
        )
        .await?;
        if cancelled {
            tracing::info!(%event_id, %entrant_id, "selection cancelled");
            return Ok(());
        }
        // Lost the conditional write; re-read to report what blocked it.
        let reason = match self.selection(event_id, entrant_id).await? {
            None => "cannot cancel an entrant who was never selected".to_string(),
            Some(record) => format!("cannot cancel from {}", record.status),
        };
        Err(LotteryError::InvalidTransition {
            event_id: event_id.clone(),
            entrant_id: entrant_id.clone(),
            reason,
        })
    }

    /// Replacement candidates for the event, in cancellation order.
    ///
    /// # Errors
    ///
    /// [`LotteryError::StoreUnavailable`] on store failure.
    pub async fn list_cancelled_awaiting_replacement(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<EntrantId>, LotteryError> {
        self.coordinator.list_candidates(event_id).await
    }

    /// Backfill one cancelled slot; the drawn entrant (if any) is notified
    /// after the unit commits.
    ///
    /// # Errors
    ///
    /// See [`ReplacementCoordinator::draw_replacement_for`].
    pub async fn draw_replacement_for(
        &self,
        event_id: &EventId,
        cancelled_id: &EntrantId,
    ) -> Result<ReplacementOutcome, LotteryError> {
        let outcome = self
            .coordinator
            .draw_replacement_for(event_id, cancelled_id)
            .await?;
        if let Some(drawn) = &outcome.drawn {
            self.notify(event_id, vec![drawn.clone()], MessageKind::ReplacementSelected)
                .await;
        }
        Ok(outcome)
    }

    /// Retry the latch step of a replacement whose latch write failed.
    ///
    /// # Errors
    ///
    /// See [`ReplacementCoordinator::latch_replacement`].
    pub async fn latch_replacement(
        &self,
        event_id: &EventId,
        cancelled_id: &EntrantId,
    ) -> Result<(), LotteryError> {
        self.coordinator
            .latch_replacement(event_id, cancelled_id)
            .await
    }

    // ========== Exported query surface ==========

    /// The entrant's lottery outcome, with the implicit Waiting state made
    /// explicit.
    ///
    /// # Errors
    ///
    /// [`LotteryError::StoreUnavailable`] on store failure.
    pub async fn outcome(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> Result<EntrantOutcome, LotteryError> {
        Ok(self
            .selection(event_id, entrant_id)
            .await?
            .map_or(EntrantOutcome::Waiting, EntrantOutcome::Drawn))
    }

    /// Number of entrants still waiting: on the list and never drawn.
    ///
    /// # Errors
    ///
    /// [`LotteryError::StoreUnavailable`] on store failure.
    pub async fn count_waiting(&self, event_id: &EventId) -> Result<usize, LotteryError> {
        Ok(self.sampler.eligible_pool(event_id).await?.len())
    }

    /// Whether the entrant is currently on the event's waiting list.
    ///
    /// # Errors
    ///
    /// [`LotteryError::StoreUnavailable`] on store failure.
    pub async fn is_waitlisted(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> Result<bool, LotteryError> {
        bounded(
            self.config.store_timeout,
            self.waitlist.contains(event_id, entrant_id),
        )
        .await
    }

    /// Selection records currently Selected (pending or resolved
    /// invitations alike), in draw order.
    ///
    /// # Errors
    ///
    /// [`LotteryError::StoreUnavailable`] on store failure.
    pub async fn list_selected(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<SelectionRecord>, LotteryError> {
        bounded(
            self.config.store_timeout,
            self.selections
                .list_by_status(event_id, SelectionStatus::Selected),
        )
        .await
    }

    /// Confirmed attendees: Selected records carrying the confirmed marker.
    ///
    /// # Errors
    ///
    /// [`LotteryError::StoreUnavailable`] on store failure.
    pub async fn list_confirmed(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<SelectionRecord>, LotteryError> {
        let selected = self.list_selected(event_id).await?;
        Ok(selected
            .into_iter()
            .filter(|record| record.confirmed)
            .collect())
    }

    // ========== Internals ==========

    async fn selection(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> Result<Option<SelectionRecord>, LotteryError> {
        bounded(
            self.config.store_timeout,
            self.selections.get(event_id, entrant_id),
        )
        .await
    }

    async fn notify(&self, event_id: &EventId, recipients: Vec<EntrantId>, kind: MessageKind) {
        let result = bounded(
            self.config.store_timeout,
            self.notifier.notify(event_id, recipients, kind),
        )
        .await;
        if let Err(err) = result {
            // Fire-and-forget: the transition already committed.
            tracing::warn!(%event_id, kind = kind.as_str(), error = %err, "notification delivery failed");
        }
    }
}
