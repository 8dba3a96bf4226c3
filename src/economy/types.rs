use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const GUILD_SCHEMA_VERSION: u8 = 1;

/// Action identifier for quest submission. Always zero-cost, regardless of
/// any cost table override.
pub const ACTION_SUBMIT_QUEST: &str = "SUBMIT_QUEST";

/// Role attribute carried by guild members and declared by quests. A quest
/// completed by a member whose attribute matches earns the attribute bonus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Vision,
    Execution,
    Influence,
    Insight,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Vision => "vision",
            Attribute::Execution => "execution",
            Attribute::Influence => "influence",
            Attribute::Insight => "insight",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vision" => Ok(Attribute::Vision),
            "execution" => Ok(Attribute::Execution),
            "influence" => Ok(Attribute::Influence),
            "insight" => Ok(Attribute::Insight),
            other => Err(format!("unknown attribute: {}", other)),
        }
    }
}

/// Rate-limited action budget, replenished to `max` at the daily reset
/// boundary. Invariant: `current <= max` at all times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnergyState {
    pub current: u32,
    pub max: u32,
    /// Monotonically non-decreasing; stamped with "now" whenever a reset
    /// is applied.
    pub last_reset: DateTime<Utc>,
}

impl EnergyState {
    pub fn new(current: u32, max: u32, last_reset: DateTime<Utc>) -> Self {
        Self {
            current: current.min(max),
            max,
            last_reset,
        }
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }
}

/// Record of a single gold-for-energy conversion. Immutable once appended
/// to the purchase history. Quest rewards never produce one of these; they
/// are tracked on the quest record instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub id: String,
    pub energy_amount: u32,
    pub gold_spent: u64,
    pub timestamp: DateTime<Utc>,
}

/// Spendable currency balance plus the append-only audit trail of
/// energy purchases. Invariant: `balance` never goes negative (enforced by
/// the fail-closed debit path; the field itself is unsigned).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoldState {
    pub balance: u64,
    /// Insertion order is meaningful; records are never rewritten.
    #[serde(default)]
    pub history: Vec<PurchaseRecord>,
}

impl GoldState {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            history: Vec::new(),
        }
    }
}

/// One message of the advice conversation attached to a quest submission.
/// The engine stores the transcript verbatim; it never talks to the advice
/// service itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SageMessage {
    pub role: String,
    pub content: String,
}

/// Per-quest progress entry in the guild aggregate.
///
/// Lifecycle: absent -> `completed == false` (in progress, mutable) ->
/// `completed == true` (terminal; no field may change afterwards).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestRecord {
    pub quest_key: String,
    pub completed: bool,
    /// Quality rating assigned at completion; `None` while in progress.
    pub rating: Option<u8>,
    pub xp_reward: u64,
    pub gold_reward: u64,
    /// Free-form submission payload from the client.
    #[serde(default)]
    pub inputs: serde_json::Value,
    #[serde(default)]
    pub sage_conversation: Vec<SageMessage>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuestRecord {
    /// Create a fresh in-progress record.
    pub fn started(quest_key: &str, inputs: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            quest_key: quest_key.to_string(),
            completed: false,
            rating: None,
            xp_reward: 0,
            gold_reward: 0,
            inputs,
            sage_conversation: Vec::new(),
            started_at: now,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.completed
    }
}

/// The aggregate root: one economy per guild, mutated only through the
/// service operations and persisted wholesale as a single document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildEconomy {
    pub schema_version: u8,
    pub guild_id: String,
    pub energy: EnergyState,
    pub gold: GoldState,
    pub xp_total: u64,
    pub is_premium: bool,
    /// True when every core guild role is staffed; feeds the full-roster
    /// reward bonus.
    #[serde(default)]
    pub core_roles_filled: bool,
    #[serde(default)]
    pub quest_progress: BTreeMap<String, QuestRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuildEconomy {
    pub fn new(guild_id: &str, energy: EnergyState, gold: GoldState, now: DateTime<Utc>) -> Self {
        Self {
            schema_version: GUILD_SCHEMA_VERSION,
            guild_id: guild_id.to_string(),
            energy,
            gold,
            xp_total: 0,
            is_premium: false,
            core_roles_filled: false,
            quest_progress: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn quest(&self, quest_key: &str) -> Option<&QuestRecord> {
        self.quest_progress.get(quest_key)
    }
}

/// Static mapping from action identifier to energy cost.
///
/// The table is closed: consuming an action with no entry fails for
/// non-premium guilds. `SUBMIT_QUEST` is pinned to zero here and cannot be
/// overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCostTable {
    costs: BTreeMap<String, u32>,
}

impl ActionCostTable {
    /// Built-in action costs for the coaching game loop.
    pub fn builtin() -> Self {
        let mut costs = BTreeMap::new();
        costs.insert(ACTION_SUBMIT_QUEST.to_string(), 0);
        costs.insert("SEEK_COUNSEL".to_string(), 10);
        costs.insert("SCOUT_AHEAD".to_string(), 5);
        costs.insert("CONFRONT_BEAST".to_string(), 40);
        costs.insert("RALLY_MEMBERS".to_string(), 15);
        Self { costs }
    }

    /// Built-ins merged with configured overrides. `SUBMIT_QUEST` stays
    /// zero-cost no matter what the overrides say.
    pub fn with_overrides(overrides: &BTreeMap<String, u32>) -> Self {
        let mut table = Self::builtin();
        for (action, cost) in overrides {
            table.costs.insert(action.clone(), *cost);
        }
        table.costs.insert(ACTION_SUBMIT_QUEST.to_string(), 0);
        table
    }

    pub fn cost_of(&self, action: &str) -> Option<u32> {
        if action == ACTION_SUBMIT_QUEST {
            return Some(0);
        }
        self.costs.get(action).copied()
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, u32)> {
        self.costs.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Inputs the reward calculator needs beyond the quest itself: who acted
/// and how staffed the guild is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuildContext {
    pub member_attribute: Option<Attribute>,
    pub quest_attribute: Option<Attribute>,
    pub all_core_roles_filled: bool,
}

impl GuildContext {
    pub fn attribute_match(&self) -> bool {
        matches!(
            (self.member_attribute, self.quest_attribute),
            (Some(member), Some(quest)) if member == quest
        )
    }
}

/// A quest the guild can undertake: base reward value plus the attribute
/// the quest calls for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestDefinition {
    pub quest_key: String,
    pub title: String,
    pub base_xp: u64,
    pub attribute: Option<Attribute>,
}

/// Catalog of known quests, keyed by quest key. Built-ins cover the core
/// coaching arc; deployments extend or override via `[economy.quests]`
/// config entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestCatalog {
    quests: BTreeMap<String, QuestDefinition>,
}

impl QuestCatalog {
    pub fn builtin() -> Self {
        let mut catalog = Self {
            quests: BTreeMap::new(),
        };
        catalog.insert("forge_vision", "Forge the Vision", 80, Some(Attribute::Vision));
        catalog.insert("map_the_market", "Map the Market", 100, Some(Attribute::Insight));
        catalog.insert(
            "confront_the_beast",
            "Confront the Beast",
            120,
            Some(Attribute::Execution),
        );
        catalog.insert("rally_the_guild", "Rally the Guild", 90, Some(Attribute::Influence));
        catalog.insert("first_revenue", "First Revenue", 150, Some(Attribute::Execution));
        catalog
    }

    fn insert(&mut self, key: &str, title: &str, base_xp: u64, attribute: Option<Attribute>) {
        self.quests.insert(
            key.to_string(),
            QuestDefinition {
                quest_key: key.to_string(),
                title: title.to_string(),
                base_xp,
                attribute,
            },
        );
    }

    /// Merge configured quest seeds over the built-ins.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, QuestSeed>) {
        for (key, seed) in overrides {
            self.quests.insert(
                key.clone(),
                QuestDefinition {
                    quest_key: key.clone(),
                    title: seed.title.clone().unwrap_or_else(|| key.clone()),
                    base_xp: seed.base_xp,
                    attribute: seed.attribute,
                },
            );
        }
    }

    pub fn get(&self, quest_key: &str) -> Option<&QuestDefinition> {
        self.quests.get(quest_key)
    }

    pub fn quest_keys(&self) -> impl Iterator<Item = &str> {
        self.quests.keys().map(|k| k.as_str())
    }
}

/// Config-file shape for a quest catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestSeed {
    pub base_xp: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub attribute: Option<Attribute>,
}
