//! Energy ledger: the only legal mutator of [`EnergyState`].
//!
//! All operations are pure; the caller persists the returned state. Policy
//! checks run in a fixed order: zero-cost special action, then premium,
//! then balance.

use chrono::{DateTime, Utc};
use log::debug;

use crate::economy::clock;
use crate::economy::errors::EconomyError;
use crate::economy::types::{ActionCostTable, EnergyState};

/// Owns the action cost table and the consumption/reset/purchase rules.
#[derive(Debug, Clone)]
pub struct EnergyLedger {
    costs: ActionCostTable,
}

impl EnergyLedger {
    pub fn new(costs: ActionCostTable) -> Self {
        Self { costs }
    }

    pub fn cost_of(&self, action: &str) -> Option<u32> {
        self.costs.cost_of(action)
    }

    /// Premium guilds can always act; everyone else needs the balance.
    pub fn can_consume(current: u32, cost: u32, is_premium: bool) -> bool {
        is_premium || current >= cost
    }

    /// Deduct the action's cost, or reject without touching the state.
    ///
    /// Zero-cost actions (notably `SUBMIT_QUEST`) succeed unchanged for
    /// everyone. Premium guilds succeed unchanged for every action,
    /// including ones missing from the cost table. Non-premium guilds fail
    /// with `UnknownAction` for unlisted actions and `InsufficientEnergy`
    /// when the balance is short.
    pub fn consume(
        &self,
        state: &EnergyState,
        action: &str,
        is_premium: bool,
    ) -> Result<EnergyState, EconomyError> {
        let cost = match self.costs.cost_of(action) {
            Some(cost) => cost,
            None if is_premium => return Ok(state.clone()),
            None => return Err(EconomyError::UnknownAction(action.to_string())),
        };

        if cost == 0 {
            return Ok(state.clone());
        }
        if is_premium {
            return Ok(state.clone());
        }
        if state.current < cost {
            return Err(EconomyError::InsufficientEnergy {
                required: cost,
                available: state.current,
            });
        }

        let mut next = state.clone();
        next.current -= cost;
        debug!(
            "consumed {} energy for {} ({} -> {})",
            cost, action, state.current, next.current
        );
        Ok(next)
    }

    /// Refill to max and stamp `last_reset` when a boundary has passed
    /// since the last refill. Idempotent within one reset window.
    pub fn apply_reset_if_due(
        &self,
        state: &EnergyState,
        now: DateTime<Utc>,
        reset_hour: u8,
    ) -> EnergyState {
        if clock::needs_reset(state.last_reset, now, reset_hour) {
            debug!(
                "energy reset: {} -> {} (last reset {})",
                state.current, state.max, state.last_reset
            );
            EnergyState {
                current: state.max,
                max: state.max,
                last_reset: now,
            }
        } else {
            state.clone()
        }
    }

    /// Credit up to `requested` energy, clamped to remaining capacity.
    /// Returns the new state and the amount actually credited; zero is a
    /// no-op success, modelling the "already nearly full" case.
    pub fn purchase(&self, state: &EnergyState, requested: u32) -> (EnergyState, u32) {
        let capacity = state.max.saturating_sub(state.current);
        let actual = requested.min(capacity);
        let mut next = state.clone();
        next.current += actual;
        (next, actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::types::ACTION_SUBMIT_QUEST;
    use chrono::Duration;

    fn ledger() -> EnergyLedger {
        EnergyLedger::new(ActionCostTable::builtin())
    }

    fn state(current: u32, max: u32) -> EnergyState {
        EnergyState::new(current, max, Utc::now())
    }

    #[test]
    fn cost_lookup_and_can_consume_agree() {
        let ledger = ledger();
        assert_eq!(ledger.cost_of("SEEK_COUNSEL"), Some(10));
        assert_eq!(ledger.cost_of("SUMMON_DRAGON"), None);
        assert!(EnergyLedger::can_consume(10, 10, false));
        assert!(!EnergyLedger::can_consume(9, 10, false));
        assert!(EnergyLedger::can_consume(0, 10, true));
    }

    #[test]
    fn consume_deducts_exact_cost() {
        let next = ledger()
            .consume(&state(50, 50), "SEEK_COUNSEL", false)
            .expect("consume");
        assert_eq!(next.current, 40);
        assert_eq!(next.max, 50);
    }

    #[test]
    fn confront_beast_denied_at_ten_energy() {
        // max 50, current 10, cost 40: denied, state untouched.
        let before = state(10, 50);
        let err = ledger()
            .consume(&before, "CONFRONT_BEAST", false)
            .expect_err("should deny");
        assert!(matches!(
            err,
            EconomyError::InsufficientEnergy {
                required: 40,
                available: 10
            }
        ));
        assert_eq!(before.current, 10);
    }

    #[test]
    fn consume_succeeds_iff_balance_covers_cost() {
        let ledger = ledger();
        for current in 0..=50u32 {
            let result = ledger.consume(&state(current, 50), "CONFRONT_BEAST", false);
            if current >= 40 {
                assert_eq!(result.expect("consume").current, current - 40);
            } else {
                assert!(result.is_err());
            }
        }
    }

    #[test]
    fn submit_quest_is_free_for_everyone() {
        let before = state(0, 50);
        let next = ledger()
            .consume(&before, ACTION_SUBMIT_QUEST, false)
            .expect("zero-cost action");
        assert_eq!(next, before);
    }

    #[test]
    fn premium_never_deducts_even_for_unknown_actions() {
        let ledger = ledger();
        let before = state(3, 50);
        for action in ["CONFRONT_BEAST", "SEEK_COUNSEL", "SUMMON_DRAGON"] {
            let next = ledger.consume(&before, action, true).expect("premium");
            assert_eq!(next.current, 3);
        }
    }

    #[test]
    fn unknown_action_rejected_for_non_premium() {
        let err = ledger()
            .consume(&state(50, 50), "SUMMON_DRAGON", false)
            .expect_err("unknown action");
        assert!(matches!(err, EconomyError::UnknownAction(_)));
    }

    #[test]
    fn reset_refills_and_is_idempotent() {
        let ledger = ledger();
        let start = "2026-03-09T23:00:00Z".parse().expect("ts");
        let before = EnergyState::new(2, 50, start);

        let now = start + Duration::minutes(90); // 00:30 next day
        let reset = ledger.apply_reset_if_due(&before, now, 0);
        assert_eq!(reset.current, 50);
        assert_eq!(reset.last_reset, now);

        let later = now + Duration::minutes(1);
        let again = ledger.apply_reset_if_due(&reset, later, 0);
        assert_eq!(again, reset);
    }

    #[test]
    fn reset_not_due_leaves_state_alone() {
        let ledger = ledger();
        let start = "2026-03-10T06:00:00Z".parse().expect("ts");
        let before = EnergyState::new(7, 50, start);
        let now = start + Duration::hours(2);
        assert_eq!(ledger.apply_reset_if_due(&before, now, 0), before);
    }

    #[test]
    fn purchase_clamps_to_capacity() {
        let (next, actual) = ledger().purchase(&state(95, 100), 25);
        assert_eq!(actual, 5);
        assert_eq!(next.current, 100);
    }

    #[test]
    fn purchase_at_full_capacity_is_noop_success() {
        let before = state(100, 100);
        let (next, actual) = ledger().purchase(&before, 25);
        assert_eq!(actual, 0);
        assert_eq!(next, before);
    }

    #[test]
    fn purchase_never_exceeds_max() {
        let ledger = ledger();
        for current in 0..=100u32 {
            for requested in [0u32, 1, 17, 99, 1000] {
                let (next, actual) = ledger.purchase(&state(current, 100), requested);
                assert!(next.current <= next.max);
                assert!(actual <= requested);
            }
        }
    }
}
