//! # Guildhall - Guild Resource Economy Engine
//!
//! Guildhall implements the resource economy behind a gamified
//! founder-coaching platform: each guild owns a daily-replenished Energy
//! budget, a spendable Gold balance, and a quest ledger that converts
//! completed, rated quests into XP and Gold exactly once.
//!
//! ## Features
//!
//! - **Energy Ledger**: rate-limited action budget with a configurable
//!   daily reset boundary, premium bypass, and a zero-cost quest
//!   submission action.
//! - **Gold Ledger**: fail-closed debits with an append-only purchase
//!   audit trail; quest rewards credit without polluting the trail.
//! - **Reward Calculator**: pure, integer-percentage reward formulas with
//!   rating, attribute-match, and full-roster modifiers.
//! - **Conditional Persistence**: every mutation is a versioned
//!   read-modify-write against a sled-backed store, so concurrent
//!   sessions conflict loudly instead of losing updates.
//! - **Deterministic Time**: all reset decisions go through an injectable
//!   clock, so tests walk guilds across day boundaries without sleeping.
//! - **Async Design**: built with Tokio; callers await each persistence
//!   round trip before trusting the returned state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use guildhall::config::Config;
//! use guildhall::economy::{GuildEconomyService, SystemClock};
//! use guildhall::store::GuildStoreBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = GuildStoreBuilder::new(&config.storage.data_dir)
//!         .gold_per_energy(config.economy.gold_per_energy)
//!         .open()?;
//!     let service = GuildEconomyService::new(store, SystemClock, &config.economy);
//!
//!     let economy = service.create_guild("ember").await?;
//!     println!("energy {}/{}", economy.energy.current, economy.energy.max);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`economy`] - ledgers, reward calculator, and the orchestrating service
//! - [`store`] - persistence collaborator trait and the sled implementation
//! - [`config`] - configuration management and validation
//! - [`metrics`] - operation counters
//! - [`logutil`] - log sanitization helpers

pub mod config;
pub mod economy;
pub mod logutil;
pub mod metrics;
pub mod store;
