//! Waitlist Lottery Demo
//!
//! End-to-end walkthrough of the lottery lifecycle over the in-memory
//! stores:
//! - Entrants join an event's waiting list
//! - A draw selects winners at random and sends invitations
//! - Winners accept or decline
//! - A confirmed attendee cancels and the slot is backfilled from the pool
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin lottery-demo
//!
//! # Tune the store-call timeout (milliseconds)
//! FAIRDRAW_STORE_TIMEOUT_MS=250 cargo run --bin lottery-demo
//! ```

use fairdraw_core::engine::{EngineConfig, LotteryEngine};
use fairdraw_core::environment::{Clock, SystemClock};
use fairdraw_core::ids::{EntrantId, EventId};
use fairdraw_core::store::{Notifier, SelectionStore, WaitlistStore};
use fairdraw_memory::{
    InMemoryInvitationStore, InMemorySelectionStore, InMemoryWaitlist, RecordingNotifier,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Store-call timeout, from `FAIRDRAW_STORE_TIMEOUT_MS` with a 5s default.
fn config_from_env() -> EngineConfig {
    let store_timeout = std::env::var("FAIRDRAW_STORE_TIMEOUT_MS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map_or_else(
            || EngineConfig::default().store_timeout,
            Duration::from_millis,
        );
    EngineConfig { store_timeout }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fairdraw_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🎟️  ============================================");
    println!("   Waitlist Lottery - Live Demo");
    println!("============================================\n");

    let config = config_from_env();
    println!("⚙️  store timeout: {}ms\n", config.store_timeout.as_millis());

    let clock = Arc::new(SystemClock);
    let waitlist = Arc::new(InMemoryWaitlist::new());
    let selections = Arc::new(InMemorySelectionStore::new());
    let invitations = Arc::new(InMemoryInvitationStore::new());
    let notifier = Arc::new(RecordingNotifier::with_clock(clock.clone()));
    let engine = LotteryEngine::new(
        Arc::clone(&waitlist) as Arc<dyn WaitlistStore>,
        Arc::clone(&selections) as Arc<dyn SelectionStore>,
        invitations,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        clock.clone(),
        config,
    );

    let event = EventId::new("summer-concert");

    // ========== 1. Entrants join the waiting list ==========

    println!("📋 Step 1: Entrants join the waiting list");
    let entrants = ["alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi"];
    for name in entrants {
        waitlist.join(&event, &EntrantId::new(name), clock.now());
    }
    println!(
        "   {} entrants waiting\n",
        engine.count_waiting(&event).await?
    );

    // ========== 2. Draw winners ==========

    println!("🎲 Step 2: Draw 3 winners");
    let drawn = engine.draw(&event, 3).await?;
    for id in &drawn.selected {
        println!("   selected: {id}");
    }
    println!(
        "   {} still waiting\n",
        engine.count_waiting(&event).await?
    );

    // ========== 3. Winners respond ==========

    println!("✉️  Step 3: Winners respond to their invitations");
    let mut winners = drawn.selected.iter();
    let (Some(first), Some(second), Some(third)) =
        (winners.next(), winners.next(), winners.next())
    else {
        println!("   fewer than three winners, stopping here");
        return Ok(());
    };
    engine.accept(&event, first).await?;
    println!("   {first} accepted");
    engine.accept(&event, second).await?;
    println!("   {second} accepted");
    engine.decline(&event, third).await?;
    println!("   {third} declined");
    println!(
        "   confirmed attendees: {}\n",
        engine.list_confirmed(&event).await?.len()
    );

    // ========== 4. A confirmed attendee cancels ==========

    println!("❌ Step 4: {first} cancels their spot");
    engine.cancel(&event, first).await?;
    let candidates = engine.list_cancelled_awaiting_replacement(&event).await?;
    println!("   cancellations awaiting replacement: {candidates:?}\n");

    // ========== 5. Backfill from the pool ==========

    println!("🔄 Step 5: Draw a replacement");
    let outcome = engine.draw_replacement_for(&event, first).await?;
    match &outcome.drawn {
        Some(replacement) => println!("   replacement selected: {replacement}"),
        None => println!("   nobody left to draw"),
    }
    println!(
        "   cancellations awaiting replacement: {:?}\n",
        engine.list_cancelled_awaiting_replacement(&event).await?
    );

    // ========== Final state ==========

    println!("📊 Final state");
    for record in engine.list_selected(&event).await? {
        println!(
            "   {} status={} confirmed={}",
            record.entrant_id, record.status, record.confirmed
        );
    }
    println!("   {} still waiting", engine.count_waiting(&event).await?);

    println!("\n🔔 Notification log");
    for entry in notifier.log_for(&event) {
        println!(
            "   [{}] {} -> {} recipient(s)",
            entry.sent_at.format("%H:%M:%S"),
            entry.kind.as_str(),
            entry.recipient_count
        );
    }

    println!("\n✅ Demo complete\n");
    Ok(())
}
