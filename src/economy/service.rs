//! Guild economy orchestrator.
//!
//! The service is the only write path into a guild's economy. Every
//! mutating operation is one read-modify-write round trip against the
//! [`EconomyStore`]: read a versioned snapshot, run the ledgers on it,
//! then issue a single conditional write. A lost conditional write means a
//! concurrent session got there first; the operation re-reads and
//! recomputes under the bounded retry policy before giving up.
//!
//! Ledger rejections (energy, gold, amounts, completed quests) abort
//! immediately and are never retried; only write conflicts are.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::config::EconomyConfig;
use crate::economy::clock::{self, Clock, ResetCountdown};
use crate::economy::energy::EnergyLedger;
use crate::economy::errors::EconomyError;
use crate::economy::reward::{RewardCalculator, RewardTuning};
use crate::economy::retry::RetryPolicy;
use crate::economy::types::{
    ActionCostTable, Attribute, EnergyState, GoldState, GuildContext, GuildEconomy, QuestCatalog,
    QuestRecord, SageMessage, ACTION_SUBMIT_QUEST,
};
use crate::economy::gold;
use crate::logutil::escape_log;
use crate::metrics;
use crate::store::{EconomyStore, WriteOutcome};

/// Orchestrator over one store and one clock. Cheap to construct; holds no
/// per-guild state of its own.
pub struct GuildEconomyService<S, C> {
    store: S,
    clock: C,
    reset_hour: u8,
    min_purchase: u32,
    max_purchase: u32,
    default_max_energy: u32,
    starting_energy: u32,
    starting_gold: u64,
    ledger: EnergyLedger,
    rewards: RewardCalculator,
    retry: RetryPolicy,
    catalog: QuestCatalog,
}

impl<S: EconomyStore, C: Clock> GuildEconomyService<S, C> {
    pub fn new(store: S, clock: C, config: &EconomyConfig) -> Self {
        let mut catalog = QuestCatalog::builtin();
        catalog.apply_overrides(&config.quests);
        Self {
            store,
            clock,
            reset_hour: config.reset_hour.min(23),
            min_purchase: config.min_purchase,
            max_purchase: config.max_purchase,
            default_max_energy: config.default_max_energy,
            starting_energy: config.starting_energy,
            starting_gold: config.starting_gold,
            ledger: EnergyLedger::new(ActionCostTable::with_overrides(&config.action_costs)),
            rewards: RewardCalculator::new(RewardTuning {
                rating_step_pct: config.rating_step_pct,
                attribute_match_pct: config.attribute_match_pct,
                full_roster_pct: config.full_roster_pct,
            }),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_base_delay_ms),
            catalog,
        }
    }

    pub fn quest_catalog(&self) -> &QuestCatalog {
        &self.catalog
    }

    /// Seed a fresh economy for a new guild.
    pub async fn create_guild(&self, guild_id: &str) -> Result<GuildEconomy, EconomyError> {
        let now = self.clock.now();
        let economy = GuildEconomy::new(
            guild_id,
            EnergyState::new(self.starting_energy, self.default_max_energy, now),
            GoldState::new(self.starting_gold),
            now,
        );
        self.store.create(guild_id, &economy).await?;
        info!("created guild economy for {}", escape_log(guild_id));
        Ok(economy)
    }

    /// Read-only snapshot. A due reset is applied (and persisted) on the
    /// way out so the caller never sees a stale pre-reset balance.
    pub async fn guild_economy(&self, guild_id: &str) -> Result<GuildEconomy, EconomyError> {
        let snapshot = self.store.read(guild_id).await?;
        let now = self.clock.now();
        if !clock::needs_reset(snapshot.economy.energy.last_reset, now, self.reset_hour) {
            return Ok(snapshot.economy);
        }
        self.update_guild(guild_id, |econ, now| {
            econ.energy = self
                .ledger
                .apply_reset_if_due(&econ.energy, now, self.reset_hour);
            Ok(())
        })
        .await
    }

    /// Spend energy on an action. Premium guilds always succeed with no
    /// deduction; an insufficient balance is a deliberate rejection that
    /// is never retried.
    pub async fn consume_energy(
        &self,
        guild_id: &str,
        action: &str,
    ) -> Result<GuildEconomy, EconomyError> {
        let result = self
            .update_guild(guild_id, |econ, now| {
                econ.energy = self
                    .ledger
                    .apply_reset_if_due(&econ.energy, now, self.reset_hour);
                econ.energy = self.ledger.consume(&econ.energy, action, econ.is_premium)?;
                Ok(())
            })
            .await;

        match &result {
            Ok(econ) => {
                metrics::inc_energy_consumed();
                debug!(
                    "guild {} consumed {} (energy now {}/{})",
                    escape_log(guild_id),
                    escape_log(action),
                    econ.energy.current,
                    econ.energy.max
                );
            }
            Err(EconomyError::InsufficientEnergy { required, available }) => {
                metrics::inc_consume_denials();
                info!(
                    "guild {} denied {}: need {}, have {}",
                    escape_log(guild_id),
                    escape_log(action),
                    required,
                    available
                );
            }
            Err(_) => {}
        }
        result
    }

    /// Buy energy with gold. The requested amount clamps to the per-call
    /// maximum and then to remaining capacity; a clamp to zero is a no-op
    /// success. Gold is debited before energy is credited, in the same
    /// persisted patch.
    pub async fn purchase_energy(
        &self,
        guild_id: &str,
        amount: i64,
    ) -> Result<GuildEconomy, EconomyError> {
        if amount <= 0 {
            return Err(EconomyError::InvalidAmount(format!(
                "purchase amount must be positive, got {}",
                amount
            )));
        }
        let requested = (amount as u64).min(u64::from(self.max_purchase)) as u32;
        if requested < self.min_purchase {
            return Err(EconomyError::InvalidAmount(format!(
                "purchase amount {} is below the minimum step {}",
                requested, self.min_purchase
            )));
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let snapshot = self.store.read(guild_id).await?;
            let now = self.clock.now();
            let mut econ = snapshot.economy;

            let before_reset = econ.energy.clone();
            econ.energy = self
                .ledger
                .apply_reset_if_due(&econ.energy, now, self.reset_hour);
            let (after_purchase, actual) = self.ledger.purchase(&econ.energy, requested);

            if actual == 0 && econ.energy == before_reset {
                debug!(
                    "guild {} purchase of {} clamped to zero, nothing to do",
                    escape_log(guild_id),
                    requested
                );
                return Ok(econ);
            }

            let mut gold_cost = 0u64;
            if actual > 0 {
                gold_cost = self.store.price_lookup(actual).await?;
                econ.gold = gold::debit_for_purchase(&econ.gold, gold_cost, actual, now)?;
                econ.energy = after_purchase;
            }
            econ.touch(now);

            match self.store.write(guild_id, &econ, snapshot.version).await? {
                WriteOutcome::Committed { .. } => {
                    if actual > 0 {
                        metrics::inc_energy_purchases();
                        info!(
                            "guild {} bought {} energy for {} gold",
                            escape_log(guild_id),
                            actual,
                            gold_cost
                        );
                    }
                    return Ok(econ);
                }
                WriteOutcome::Conflict => {
                    self.note_conflict(guild_id, attempt)?;
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
            }
        }
    }

    /// Complete a quest exactly once: reward computation, the zero-cost
    /// submission consume, the terminal quest record, the gold credit, and
    /// the XP total all land in one persisted patch. A second call for the
    /// same key is rejected by the completed-guard without any mutation or
    /// charge, which is what makes the whole operation safe to retry.
    pub async fn complete_quest(
        &self,
        guild_id: &str,
        quest_key: &str,
        inputs: serde_json::Value,
        rating: u8,
        member_attribute: Option<Attribute>,
        sage_conversation: Vec<SageMessage>,
    ) -> Result<GuildEconomy, EconomyError> {
        if !(1..=5).contains(&rating) {
            return Err(EconomyError::InvalidAmount(format!(
                "rating must be 1-5, got {}",
                rating
            )));
        }

        let result = self
            .update_guild(guild_id, |econ, now| {
                if let Some(existing) = econ.quest_progress.get(quest_key) {
                    if existing.completed {
                        return Err(EconomyError::AlreadyCompleted(quest_key.to_string()));
                    }
                }
                let definition = self
                    .catalog
                    .get(quest_key)
                    .ok_or_else(|| EconomyError::NotFound(format!("quest: {}", quest_key)))?;

                let ctx = GuildContext {
                    member_attribute,
                    quest_attribute: definition.attribute,
                    all_core_roles_filled: econ.core_roles_filled,
                };
                let xp = self.rewards.xp_reward(definition.base_xp, rating, &ctx);
                let gold_amount = self
                    .rewards
                    .gold_reward(definition.base_xp / 2, rating, &ctx);

                econ.energy = self
                    .ledger
                    .apply_reset_if_due(&econ.energy, now, self.reset_hour);
                // The submission consume is free but the hook still fires,
                // so the call stays in the sequence.
                econ.energy = self
                    .ledger
                    .consume(&econ.energy, ACTION_SUBMIT_QUEST, econ.is_premium)?;

                let started_at = econ
                    .quest_progress
                    .get(quest_key)
                    .map(|record| record.started_at)
                    .unwrap_or(now);
                econ.quest_progress.insert(
                    quest_key.to_string(),
                    QuestRecord {
                        quest_key: quest_key.to_string(),
                        completed: true,
                        rating: Some(rating),
                        xp_reward: xp,
                        gold_reward: gold_amount,
                        inputs: inputs.clone(),
                        sage_conversation: sage_conversation.clone(),
                        started_at,
                        completed_at: Some(now),
                    },
                );
                econ.gold = gold::credit(&econ.gold, gold_amount);
                econ.xp_total = econ.xp_total.saturating_add(xp);
                Ok(())
            })
            .await;

        if let Ok(econ) = &result {
            metrics::inc_energy_consumed();
            metrics::inc_quests_completed();
            if let Some(record) = econ.quest(quest_key) {
                info!(
                    "guild {} completed quest {} (+{} xp, +{} gold)",
                    escape_log(guild_id),
                    escape_log(quest_key),
                    record.xp_reward,
                    record.gold_reward
                );
            }
        }
        result
    }

    /// Record a quest as started. In-progress records stay mutable, so a
    /// repeat call replaces the stored inputs; a completed quest rejects.
    pub async fn start_quest(
        &self,
        guild_id: &str,
        quest_key: &str,
        inputs: serde_json::Value,
    ) -> Result<GuildEconomy, EconomyError> {
        self.update_guild(guild_id, |econ, now| {
            if let Some(existing) = econ.quest_progress.get(quest_key) {
                if existing.completed {
                    return Err(EconomyError::AlreadyCompleted(quest_key.to_string()));
                }
            }
            if self.catalog.get(quest_key).is_none() {
                return Err(EconomyError::NotFound(format!("quest: {}", quest_key)));
            }
            match econ.quest_progress.get_mut(quest_key) {
                Some(existing) => existing.inputs = inputs.clone(),
                None => {
                    econ.quest_progress.insert(
                        quest_key.to_string(),
                        QuestRecord::started(quest_key, inputs.clone(), now),
                    );
                }
            }
            Ok(())
        })
        .await
    }

    /// Toggle the unlimited-energy flag. Payment capture happens elsewhere;
    /// this is the hook its webhook calls.
    pub async fn set_premium(
        &self,
        guild_id: &str,
        is_premium: bool,
    ) -> Result<GuildEconomy, EconomyError> {
        self.update_guild(guild_id, |econ, _now| {
            econ.is_premium = is_premium;
            Ok(())
        })
        .await
    }

    /// Record whether every core guild role is staffed; feeds the
    /// full-roster reward bonus.
    pub async fn set_roster_filled(
        &self,
        guild_id: &str,
        filled: bool,
    ) -> Result<GuildEconomy, EconomyError> {
        self.update_guild(guild_id, |econ, _now| {
            econ.core_roles_filled = filled;
            Ok(())
        })
        .await
    }

    /// Time remaining until the next daily reset. Pure; no store round trip.
    pub fn time_until_reset(&self) -> ResetCountdown {
        clock::time_until_next_reset(self.clock.now(), self.reset_hour)
    }

    /// Read-modify-conditional-write loop shared by every mutation that
    /// can be computed synchronously against one snapshot. The closure runs
    /// once per attempt against freshly read state; domain errors abort the
    /// loop immediately.
    async fn update_guild<F>(&self, guild_id: &str, mut apply: F) -> Result<GuildEconomy, EconomyError>
    where
        F: FnMut(&mut GuildEconomy, DateTime<Utc>) -> Result<(), EconomyError>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let snapshot = self.store.read(guild_id).await?;
            let now = self.clock.now();
            let mut econ = snapshot.economy;
            apply(&mut econ, now)?;
            econ.touch(now);

            match self.store.write(guild_id, &econ, snapshot.version).await? {
                WriteOutcome::Committed { .. } => return Ok(econ),
                WriteOutcome::Conflict => {
                    self.note_conflict(guild_id, attempt)?;
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
            }
        }
    }

    fn note_conflict(&self, guild_id: &str, attempt: u32) -> Result<(), EconomyError> {
        metrics::inc_conflict_retries();
        if !self.retry.should_retry(attempt) {
            warn!(
                "guild {} write conflict persisted after {} attempts",
                escape_log(guild_id),
                attempt
            );
            return Err(EconomyError::ConcurrentModification);
        }
        debug!(
            "guild {} write conflict on attempt {}, retrying",
            escape_log(guild_id),
            attempt
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::clock::FixedClock;
    use crate::store::GuildStoreBuilder;
    use tempfile::TempDir;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid RFC 3339 timestamp")
    }

    async fn setup() -> (
        TempDir,
        GuildEconomyService<crate::store::SledEconomyStore, FixedClock>,
        FixedClock,
    ) {
        let dir = TempDir::new().expect("tempdir");
        let store = GuildStoreBuilder::new(dir.path()).open().expect("store");
        let clock = FixedClock::new(ts("2026-03-10T12:00:00Z"));
        let service = GuildEconomyService::new(store, clock.clone(), &EconomyConfig::default());
        service.create_guild("ember").await.expect("create guild");
        (dir, service, clock)
    }

    #[tokio::test]
    async fn create_guild_seeds_defaults() {
        let (_dir, service, _clock) = setup().await;
        let econ = service.guild_economy("ember").await.expect("read");
        assert_eq!(econ.energy.current, 100);
        assert_eq!(econ.energy.max, 100);
        assert_eq!(econ.gold.balance, 50);
        assert!(!econ.is_premium);
    }

    #[tokio::test]
    async fn duplicate_guild_rejected() {
        let (_dir, service, _clock) = setup().await;
        assert!(matches!(
            service.create_guild("ember").await,
            Err(EconomyError::GuildExists(_))
        ));
    }

    #[tokio::test]
    async fn invalid_rating_rejected_before_any_io() {
        let (_dir, service, _clock) = setup().await;
        for rating in [0u8, 6, 200] {
            let err = service
                .complete_quest(
                    "ember",
                    "forge_vision",
                    serde_json::Value::Null,
                    rating,
                    None,
                    Vec::new(),
                )
                .await
                .expect_err("rating out of range");
            assert!(matches!(err, EconomyError::InvalidAmount(_)));
        }
    }

    #[tokio::test]
    async fn non_positive_purchase_amount_rejected() {
        let (_dir, service, _clock) = setup().await;
        for amount in [0i64, -5] {
            let err = service
                .purchase_energy("ember", amount)
                .await
                .expect_err("bad amount");
            assert!(matches!(err, EconomyError::InvalidAmount(_)));
        }
    }

    #[tokio::test]
    async fn unknown_quest_key_is_not_found() {
        let (_dir, service, _clock) = setup().await;
        let err = service
            .complete_quest(
                "ember",
                "slay_the_unknown",
                serde_json::Value::Null,
                3,
                None,
                Vec::new(),
            )
            .await
            .expect_err("unknown quest");
        assert!(matches!(err, EconomyError::NotFound(_)));
    }

    #[tokio::test]
    async fn start_quest_records_in_progress_entry() {
        let (_dir, service, _clock) = setup().await;
        let econ = service
            .start_quest("ember", "forge_vision", serde_json::json!({"draft": 1}))
            .await
            .expect("start");
        let record = econ.quest("forge_vision").expect("record");
        assert!(!record.completed);
        assert_eq!(record.rating, None);

        // Restarting replaces inputs while in progress.
        let econ = service
            .start_quest("ember", "forge_vision", serde_json::json!({"draft": 2}))
            .await
            .expect("restart");
        let record = econ.quest("forge_vision").expect("record");
        assert_eq!(record.inputs, serde_json::json!({"draft": 2}));
    }

    #[tokio::test]
    async fn premium_toggle_round_trips() {
        let (_dir, service, _clock) = setup().await;
        let econ = service.set_premium("ember", true).await.expect("enable");
        assert!(econ.is_premium);
        let econ = service.set_premium("ember", false).await.expect("disable");
        assert!(!econ.is_premium);
    }
}
