//! Minimal metrics scaffolding for the economy engine.
//! Counters only for now; an exposition endpoint can hang off `snapshot`.
use std::sync::atomic::{AtomicU64, Ordering};

static ENERGY_CONSUMED: AtomicU64 = AtomicU64::new(0);
static CONSUME_DENIALS: AtomicU64 = AtomicU64::new(0);
static ENERGY_PURCHASES: AtomicU64 = AtomicU64::new(0);
static QUESTS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static CONFLICT_RETRIES: AtomicU64 = AtomicU64::new(0);

/// An energy consume hook fired (including zero-cost quest submissions,
/// which downstream analytics still count as actions).
pub fn inc_energy_consumed() {
    ENERGY_CONSUMED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_consume_denials() {
    CONSUME_DENIALS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_energy_purchases() {
    ENERGY_PURCHASES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_quests_completed() {
    QUESTS_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_conflict_retries() {
    CONFLICT_RETRIES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub energy_consumed: u64,
    pub consume_denials: u64,
    pub energy_purchases: u64,
    pub quests_completed: u64,
    pub conflict_retries: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        energy_consumed: ENERGY_CONSUMED.load(Ordering::Relaxed),
        consume_denials: CONSUME_DENIALS.load(Ordering::Relaxed),
        energy_purchases: ENERGY_PURCHASES.load(Ordering::Relaxed),
        quests_completed: QUESTS_COMPLETED.load(Ordering::Relaxed),
        conflict_retries: CONFLICT_RETRIES.load(Ordering::Relaxed),
    }
}
