//! # Configuration Management Module
//!
//! Centralized configuration for the guildhall engine: economy rules,
//! storage location, and logging, loaded from a TOML file with sensible
//! defaults and validation.
//!
//! ## Configuration Structure
//!
//! - [`EconomyConfig`] - reset hour, energy caps, pricing, action costs,
//!   reward tuning, quest catalog seeds, retry policy
//! - [`StorageConfig`] - data persistence settings
//! - [`LoggingConfig`] - logging settings
//!
//! ## Configuration File Format
//!
//! ```toml
//! [economy]
//! reset_hour = 0
//! default_max_energy = 100
//! starting_energy = 100
//! starting_gold = 50
//! gold_per_energy = 2
//! min_purchase = 1
//! max_purchase = 100
//!
//! [economy.action_costs]
//! SEEK_COUNSEL = 10
//! CONFRONT_BEAST = 40
//!
//! [economy.quests.first_revenue]
//! base_xp = 150
//! attribute = "execution"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Values omitted from the file fall back to the defaults documented on
//! each field.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::fs;

use crate::economy::types::QuestSeed;

/// Economy rules. These are deployment constants, not runtime flags; the
/// service reads them once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Hour of day (UTC, 0-23) at which energy refills to max.
    #[serde(default = "default_reset_hour")]
    pub reset_hour: u8,
    /// Energy cap for newly created guilds.
    #[serde(default = "default_max_energy")]
    pub default_max_energy: u32,
    /// Energy a new guild starts with.
    #[serde(default = "default_starting_energy")]
    pub starting_energy: u32,
    /// Gold a new guild starts with.
    #[serde(default)]
    pub starting_gold: u64,
    /// Fixed price: gold per unit of purchased energy.
    #[serde(default = "default_gold_per_energy")]
    pub gold_per_energy: u64,
    /// Smallest energy purchase the API accepts.
    #[serde(default = "default_min_purchase")]
    pub min_purchase: u32,
    /// Largest energy purchase per call; bigger requests clamp down.
    #[serde(default = "default_max_purchase")]
    pub max_purchase: u32,
    /// Per-action energy costs merged over the built-in table.
    /// `SUBMIT_QUEST` stays zero-cost regardless of entries here.
    #[serde(default)]
    pub action_costs: BTreeMap<String, u32>,
    /// Quest catalog entries merged over the built-ins.
    #[serde(default)]
    pub quests: BTreeMap<String, QuestSeed>,
    /// Reward tuning: percentage points per rating step from neutral.
    #[serde(default = "default_rating_step_pct")]
    pub rating_step_pct: u32,
    /// Additive bonus percentage for an attribute match.
    #[serde(default = "default_attribute_match_pct")]
    pub attribute_match_pct: u32,
    /// Additive bonus percentage when all core roles are filled.
    #[serde(default = "default_full_roster_pct")]
    pub full_roster_pct: u32,
    /// Conditional-write attempts before a conflict surfaces to the caller.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base backoff between conflict retries, in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_reset_hour() -> u8 {
    0
}

fn default_max_energy() -> u32 {
    100
}

fn default_starting_energy() -> u32 {
    100
}

fn default_gold_per_energy() -> u64 {
    2
}

fn default_min_purchase() -> u32 {
    1
}

fn default_max_purchase() -> u32 {
    100
}

fn default_rating_step_pct() -> u32 {
    25
}

fn default_attribute_match_pct() -> u32 {
    20
}

fn default_full_roster_pct() -> u32 {
    10
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    50
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            reset_hour: default_reset_hour(),
            default_max_energy: default_max_energy(),
            starting_energy: default_starting_energy(),
            starting_gold: 50,
            gold_per_energy: default_gold_per_energy(),
            min_purchase: default_min_purchase(),
            max_purchase: default_max_purchase(),
            action_costs: BTreeMap::new(),
            quests: BTreeMap::new(),
            rating_step_pct: default_rating_step_pct(),
            attribute_match_pct: default_attribute_match_pct(),
            full_roster_pct: default_full_roster_pct(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let economy = &self.economy;
        if economy.reset_hour > 23 {
            return Err(anyhow!(
                "economy.reset_hour must be 0-23, got {}",
                economy.reset_hour
            ));
        }
        if economy.default_max_energy == 0 {
            return Err(anyhow!("economy.default_max_energy must be nonzero"));
        }
        if economy.starting_energy > economy.default_max_energy {
            return Err(anyhow!(
                "economy.starting_energy {} exceeds default_max_energy {}",
                economy.starting_energy,
                economy.default_max_energy
            ));
        }
        if economy.min_purchase == 0 || economy.min_purchase > economy.max_purchase {
            return Err(anyhow!(
                "economy purchase step range is invalid: min {} max {}",
                economy.min_purchase,
                economy.max_purchase
            ));
        }
        if economy.retry_attempts == 0 {
            return Err(anyhow!("economy.retry_attempts must be at least 1"));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        Ok(())
    }
}
