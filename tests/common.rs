//! Shared fixtures for guild economy integration tests.
//! Every test gets a throwaway sled store and a settable clock so day
//! boundaries can be crossed without sleeping.

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use guildhall::config::EconomyConfig;
use guildhall::economy::{FixedClock, GuildEconomyService};
use guildhall::store::{GuildStoreBuilder, SledEconomyStore};

pub type TestService = GuildEconomyService<SledEconomyStore, FixedClock>;

/// Parse an RFC 3339 timestamp; panics on bad test data.
#[allow(dead_code)]
pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid RFC 3339 timestamp")
}

/// Open a fresh service over a temp store with the given economy config,
/// starting the clock at `start`.
#[allow(dead_code)]
pub fn setup(config: &EconomyConfig, start: &str) -> (TempDir, TestService, FixedClock) {
    let dir = TempDir::new().expect("tempdir");
    let store = GuildStoreBuilder::new(dir.path())
        .gold_per_energy(config.gold_per_energy)
        .open()
        .expect("store");
    let clock = FixedClock::new(ts(start));
    let service = GuildEconomyService::new(store, clock.clone(), config);
    (dir, service, clock)
}

/// Config with fast retries so conflict tests do not sleep for real.
#[allow(dead_code)]
pub fn fast_config() -> EconomyConfig {
    EconomyConfig {
        retry_base_delay_ms: 0,
        ..EconomyConfig::default()
    }
}
