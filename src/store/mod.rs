//! # Store Module - Guild Economy Persistence
//!
//! Sled-backed persistence for guild economy aggregates, plus the
//! [`EconomyStore`] trait the service orchestrates against.
//!
//! Every guild is one bincode document in the `guild_economy` tree,
//! wrapped in a [`StoredGuild`] envelope carrying a monotonically
//! increasing revision. Mutations go through a conditional write
//! (`compare_and_swap` against the previously read revision), which is
//! what turns the lost-update race between two concurrent sessions into a
//! detectable conflict instead of a silent overwrite.
//!
//! The price lookup lives here too: energy pricing is an external concern
//! from the economy's point of view, currently a fixed per-unit rate.

use std::path::{Path, PathBuf};

use log::debug;
use sled::IVec;

use crate::economy::errors::EconomyError;
use crate::economy::types::{GuildEconomy, GUILD_SCHEMA_VERSION};

const TREE_GUILDS: &str = "guild_economy";

/// A guild economy snapshot paired with the store revision it was read at.
/// The revision must be handed back on write.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedGuild {
    pub version: u64,
    pub economy: GuildEconomy,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write landed; the aggregate is now at this revision.
    Committed { version: u64 },
    /// A competing writer changed the aggregate since it was read. The
    /// caller must re-read and recompute.
    Conflict,
}

/// Persistence collaborator consumed by the economy service. Async at the
/// seam: callers await each round trip and never stack a second mutation
/// on an unconfirmed one.
#[allow(async_fn_in_trait)]
pub trait EconomyStore {
    /// Fetch a guild economy with its current revision.
    async fn read(&self, guild_id: &str) -> Result<VersionedGuild, EconomyError>;

    /// Replace the guild document iff it is still at `expected_version`.
    async fn write(
        &self,
        guild_id: &str,
        economy: &GuildEconomy,
        expected_version: u64,
    ) -> Result<WriteOutcome, EconomyError>;

    /// Insert a brand-new guild document; fails if the guild exists.
    async fn create(&self, guild_id: &str, economy: &GuildEconomy) -> Result<(), EconomyError>;

    /// Gold cost for `energy_units` at the current rate.
    async fn price_lookup(&self, energy_units: u32) -> Result<u64, EconomyError>;
}

/// On-disk envelope: revision + aggregate, bincode-encoded.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoredGuild {
    version: u64,
    economy: GuildEconomy,
}

/// Helper builder so tests can easily create throwaway stores with custom
/// paths and rates.
pub struct GuildStoreBuilder {
    path: PathBuf,
    gold_per_energy: u64,
}

impl GuildStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gold_per_energy: 2,
        }
    }

    pub fn gold_per_energy(mut self, rate: u64) -> Self {
        self.gold_per_energy = rate;
        self
    }

    pub fn open(self) -> Result<SledEconomyStore, EconomyError> {
        SledEconomyStore::open(self.path, self.gold_per_energy)
    }
}

/// Sled-backed implementation of [`EconomyStore`].
pub struct SledEconomyStore {
    _db: sled::Db,
    guilds: sled::Tree,
    gold_per_energy: u64,
}

impl SledEconomyStore {
    /// Open (or create) the store rooted at `path` with a fixed
    /// gold-per-energy rate.
    pub fn open<P: AsRef<Path>>(path: P, gold_per_energy: u64) -> Result<Self, EconomyError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let guilds = db.open_tree(TREE_GUILDS)?;
        Ok(Self {
            _db: db,
            guilds,
            gold_per_energy,
        })
    }

    fn guild_key(guild_id: &str) -> Vec<u8> {
        format!("guilds:{}", guild_id.to_ascii_lowercase()).into_bytes()
    }

    fn serialize(value: &StoredGuild) -> Result<Vec<u8>, EconomyError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize(bytes: &IVec) -> Result<StoredGuild, EconomyError> {
        let stored: StoredGuild = bincode::deserialize(bytes)?;
        if stored.economy.schema_version != GUILD_SCHEMA_VERSION {
            return Err(EconomyError::SchemaMismatch {
                entity: "guild_economy",
                expected: GUILD_SCHEMA_VERSION,
                found: stored.economy.schema_version,
            });
        }
        Ok(stored)
    }

    /// List all guild ids currently stored.
    pub fn list_guild_ids(&self) -> Result<Vec<String>, EconomyError> {
        let mut ids = Vec::new();
        for entry in self.guilds.scan_prefix(b"guilds:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(guild_id) = text.strip_prefix("guilds:") {
                ids.push(guild_id.to_string());
            }
        }
        Ok(ids)
    }
}

impl EconomyStore for SledEconomyStore {
    async fn read(&self, guild_id: &str) -> Result<VersionedGuild, EconomyError> {
        let key = Self::guild_key(guild_id);
        let Some(bytes) = self.guilds.get(&key)? else {
            return Err(EconomyError::NotFound(guild_id.to_string()));
        };
        let stored = Self::deserialize(&bytes)?;
        Ok(VersionedGuild {
            version: stored.version,
            economy: stored.economy,
        })
    }

    async fn write(
        &self,
        guild_id: &str,
        economy: &GuildEconomy,
        expected_version: u64,
    ) -> Result<WriteOutcome, EconomyError> {
        let key = Self::guild_key(guild_id);
        let Some(current_bytes) = self.guilds.get(&key)? else {
            return Err(EconomyError::NotFound(guild_id.to_string()));
        };
        let current = Self::deserialize(&current_bytes)?;
        if current.version != expected_version {
            debug!(
                "stale write for {}: expected revision {}, store at {}",
                guild_id, expected_version, current.version
            );
            return Ok(WriteOutcome::Conflict);
        }

        let next_version = expected_version + 1;
        let next = StoredGuild {
            version: next_version,
            economy: economy.clone(),
        };
        let next_bytes = Self::serialize(&next)?;
        match self
            .guilds
            .compare_and_swap(&key, Some(&current_bytes), Some(next_bytes))?
        {
            Ok(()) => {
                self.guilds.flush()?;
                Ok(WriteOutcome::Committed {
                    version: next_version,
                })
            }
            Err(_) => Ok(WriteOutcome::Conflict),
        }
    }

    async fn create(&self, guild_id: &str, economy: &GuildEconomy) -> Result<(), EconomyError> {
        let key = Self::guild_key(guild_id);
        let stored = StoredGuild {
            version: 1,
            economy: economy.clone(),
        };
        let bytes = Self::serialize(&stored)?;
        match self
            .guilds
            .compare_and_swap(&key, None::<&[u8]>, Some(bytes))?
        {
            Ok(()) => {
                self.guilds.flush()?;
                Ok(())
            }
            Err(_) => Err(EconomyError::GuildExists(guild_id.to_string())),
        }
    }

    async fn price_lookup(&self, energy_units: u32) -> Result<u64, EconomyError> {
        Ok(u64::from(energy_units).saturating_mul(self.gold_per_energy))
    }
}
