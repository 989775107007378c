//! # Fairdraw Core
//!
//! Waitlist lottery and invitation lifecycle engine for capacity-limited
//! event registration.
//!
//! Entrants join a waiting list for an event, a fixed number are drawn at
//! random for a sampling round, selected entrants accept or decline, and
//! cancellations are refilled one at a time from the remaining pool.
//!
//! ## Components
//!
//! - [`sampler::LotterySampler`]: unbiased draws from the eligible pool,
//!   committed entrant-by-entrant through a compare-and-set so concurrent
//!   draws never overlap
//! - [`selection`]: the authoritative per-entrant outcome state machine
//!   (Waiting → Selected → Cancelled → `ReplacementHandled`)
//! - [`invitation`]: the entrant-facing accept/decline lifecycle,
//!   first-resolution-wins with idempotent no-ops
//! - [`replacement::ReplacementCoordinator`]: one-shot backfill of
//!   cancelled slots
//! - [`engine::LotteryEngine`]: the facade tying these together plus the
//!   exported query surface
//!
//! ## Architecture principles
//!
//! - Explicit dependency injection: every store and the clock are passed
//!   into [`engine::LotteryEngine::new`] as trait objects
//! - Typed outcomes, never panics: precondition failures and concurrency
//!   losses come back as [`error::LotteryError`] variants
//! - Lost compare-and-set races are expected under concurrent callers and
//!   reported, not treated as corruption
//!
//! ## Example
//!
//! ```ignore
//! use fairdraw_core::prelude::*;
//!
//! let engine = LotteryEngine::new(
//!     waitlist, selections, invitations, notifier,
//!     Arc::new(SystemClock),
//!     EngineConfig::default(),
//! );
//!
//! let outcome = engine.draw(&event_id, 3).await?;
//! engine.accept(&event_id, &outcome.selected[0]).await?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod engine;
pub mod environment;
pub mod error;
pub mod ids;
pub mod invitation;
pub mod replacement;
pub mod sampler;
pub mod selection;
pub mod store;

/// Convenience re-exports of the types most callers need.
pub mod prelude {
    pub use crate::engine::{EngineConfig, LotteryEngine};
    pub use crate::environment::{Clock, SystemClock};
    pub use crate::error::{LotteryError, StoreError};
    pub use crate::ids::{EntrantId, EventId};
    pub use crate::invitation::{Invitation, InvitationResolution, InvitationStatus};
    pub use crate::replacement::{ReplacementCoordinator, ReplacementOutcome};
    pub use crate::sampler::{DrawOutcome, LotterySampler};
    pub use crate::selection::{EntrantOutcome, SelectionRecord, SelectionStatus};
    pub use crate::store::{
        InvitationStore, MessageKind, Notifier, SelectionPatch, SelectionStore, WaitlistEntry,
        WaitlistStore,
    };
}
