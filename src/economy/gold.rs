//! Gold ledger: balance arithmetic and the purchase audit trail.
//!
//! Debits fail closed and append a [`PurchaseRecord`]; credits always
//! succeed and deliberately append nothing. Reward amounts live on the
//! quest record, so the purchase history stays a pure gold-to-energy
//! conversion log.

use chrono::{DateTime, Utc};
use log::debug;
use uuid::Uuid;

use crate::economy::errors::EconomyError;
use crate::economy::types::{GoldState, PurchaseRecord};

/// Gold cost of an energy purchase at a fixed per-unit rate.
pub fn purchase_cost(energy_amount: u32, rate_per_unit: u64) -> u64 {
    u64::from(energy_amount).saturating_mul(rate_per_unit)
}

/// Deduct `gold_cost` and append the purchase record, or fail closed with
/// the balance untouched.
pub fn debit_for_purchase(
    state: &GoldState,
    gold_cost: u64,
    energy_amount: u32,
    now: DateTime<Utc>,
) -> Result<GoldState, EconomyError> {
    if state.balance < gold_cost {
        return Err(EconomyError::InsufficientGold {
            required: gold_cost,
            available: state.balance,
        });
    }

    let mut next = state.clone();
    next.balance -= gold_cost;
    next.history.push(PurchaseRecord {
        id: Uuid::new_v4().to_string(),
        energy_amount,
        gold_spent: gold_cost,
        timestamp: now,
    });
    debug!(
        "debited {} gold for {} energy ({} -> {})",
        gold_cost, energy_amount, state.balance, next.balance
    );
    Ok(next)
}

/// Credit `amount` gold. Quest rewards land here; no purchase record is
/// appended.
pub fn credit(state: &GoldState, amount: u64) -> GoldState {
    let mut next = state.clone();
    next.balance = next.balance.saturating_add(amount);
    next
}
