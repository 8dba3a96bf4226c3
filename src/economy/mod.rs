//! Guild resource-economy engine: energy, gold, and quest rewards.
//!
//! The engine is layered leaves-first: [`clock`] supplies time and reset
//! boundaries, [`energy`] and [`gold`] own their ledger states, [`reward`]
//! is a pure calculator, and [`service`] orchestrates them over the
//! persistence collaborator with one conditional write per operation.

pub mod clock;
pub mod energy;
pub mod errors;
pub mod gold;
pub mod retry;
pub mod reward;
pub mod service;
pub mod types;

pub use clock::{needs_reset, time_until_next_reset, Clock, FixedClock, ResetCountdown, SystemClock};
pub use energy::EnergyLedger;
pub use errors::EconomyError;
pub use gold::{credit, debit_for_purchase, purchase_cost};
pub use retry::RetryPolicy;
pub use reward::{RewardCalculator, RewardTuning};
pub use service::GuildEconomyService;
pub use types::*;
