//! Binary entrypoint for the Guildhall CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `create <guild>` - seed a fresh guild economy
//! - `status <guild>` - show energy, gold, XP, and the reset countdown
//! - `consume <guild> <action>` - spend energy on an action
//! - `buy <guild> <amount>` - convert gold into energy
//! - `complete <guild> <quest> --rating N` - submit and rate a quest
//! - `premium <guild> <on|off>` - toggle the unlimited-energy flag
//! - `quests` - list the quest catalog
//!
//! See the library crate docs for module-level details: `guildhall::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use guildhall::config::Config;
use guildhall::economy::{
    ActionCostTable, Attribute, EconomyError, GuildEconomy, GuildEconomyService, SystemClock,
};
use guildhall::store::{GuildStoreBuilder, SledEconomyStore};

#[derive(Parser)]
#[command(name = "guildhall")]
#[command(about = "Guild resource economy engine: energy, gold, and quest rewards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config.toml
    Init,
    /// Create a new guild economy
    Create {
        /// Guild identifier
        guild: String,
    },
    /// Show a guild's economy and the time until the next reset
    Status {
        /// Guild identifier
        guild: String,
    },
    /// Spend energy on an action
    Consume {
        /// Guild identifier
        guild: String,
        /// Action identifier, e.g. CONFRONT_BEAST
        action: String,
    },
    /// Buy energy with gold
    Buy {
        /// Guild identifier
        guild: String,
        /// Energy units to buy (clamps to remaining capacity)
        amount: i64,
    },
    /// Complete a quest and credit its rewards
    Complete {
        /// Guild identifier
        guild: String,
        /// Quest key, e.g. forge_vision
        quest: String,
        /// Quality rating, 1-5
        #[arg(short, long)]
        rating: u8,
        /// Submission payload as a JSON document
        #[arg(short, long)]
        input: Option<String>,
        /// Acting member's attribute (vision, execution, influence, insight)
        #[arg(short, long)]
        attribute: Option<String>,
    },
    /// Toggle the premium (unlimited energy) flag
    Premium {
        /// Guild identifier
        guild: String,
        /// "on" or "off"
        state: String,
    },
    /// List the quest catalog
    Quests,
    /// List the per-action energy costs
    Actions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            println!("Wrote default configuration to {}", cli.config);
            Ok(())
        }
        Commands::Create { guild } => {
            let (_config, service) = open_service(pre_config, &cli.config).await?;
            let economy = service.create_guild(&guild).await?;
            println!(
                "Created guild '{}': {}/{} energy, {} gold",
                guild, economy.energy.current, economy.energy.max, economy.gold.balance
            );
            Ok(())
        }
        Commands::Status { guild } => {
            let (_config, service) = open_service(pre_config, &cli.config).await?;
            let economy = service.guild_economy(&guild).await?;
            print_status(&economy);
            let countdown = service.time_until_reset();
            println!(
                "Next reset in {}h {}m",
                countdown.hours, countdown.minutes
            );
            Ok(())
        }
        Commands::Consume { guild, action } => {
            let (_config, service) = open_service(pre_config, &cli.config).await?;
            match service.consume_energy(&guild, &action).await {
                Ok(economy) => {
                    println!(
                        "{} spent on {}: {}/{} energy left",
                        guild, action, economy.energy.current, economy.energy.max
                    );
                    Ok(())
                }
                Err(EconomyError::InsufficientEnergy { required, available }) => {
                    println!(
                        "Not enough energy for {} (need {}, have {}). Buy more with `guildhall buy {} {}`.",
                        action,
                        required,
                        available,
                        guild,
                        required - available
                    );
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Buy { guild, amount } => {
            let (_config, service) = open_service(pre_config, &cli.config).await?;
            match service.purchase_energy(&guild, amount).await {
                Ok(economy) => {
                    println!(
                        "{} now at {}/{} energy, {} gold",
                        guild, economy.energy.current, economy.energy.max, economy.gold.balance
                    );
                    Ok(())
                }
                Err(EconomyError::InsufficientGold { required, available }) => {
                    println!(
                        "Not enough gold (need {}, have {}). Complete quests to earn more.",
                        required, available
                    );
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Complete {
            guild,
            quest,
            rating,
            input,
            attribute,
        } => {
            let (_config, service) = open_service(pre_config, &cli.config).await?;
            let inputs = match input {
                Some(raw) => serde_json::from_str(&raw)?,
                None => serde_json::Value::Null,
            };
            let attribute = match attribute {
                Some(raw) => Some(raw.parse::<Attribute>().map_err(|e| anyhow::anyhow!(e))?),
                None => None,
            };
            match service
                .complete_quest(&guild, &quest, inputs, rating, attribute, Vec::new())
                .await
            {
                Ok(economy) => {
                    if let Some(record) = economy.quest(&quest) {
                        println!(
                            "Quest '{}' complete: +{} xp, +{} gold (guild total {} xp, {} gold)",
                            quest,
                            record.xp_reward,
                            record.gold_reward,
                            economy.xp_total,
                            economy.gold.balance
                        );
                    }
                    Ok(())
                }
                // Double submission is an idempotent success from the
                // player's point of view, not a failure.
                Err(EconomyError::AlreadyCompleted(_)) => {
                    println!("Quest '{}' was already completed; nothing changed.", quest);
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Premium { guild, state } => {
            let (_config, service) = open_service(pre_config, &cli.config).await?;
            let enabled = match state.to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => anyhow::bail!("expected 'on' or 'off', got '{}'", other),
            };
            let economy = service.set_premium(&guild, enabled).await?;
            println!(
                "Premium for {} is now {}",
                guild,
                if economy.is_premium { "on" } else { "off" }
            );
            Ok(())
        }
        Commands::Quests => {
            let (_config, service) = open_service(pre_config, &cli.config).await?;
            for key in service.quest_catalog().quest_keys() {
                if let Some(def) = service.quest_catalog().get(key) {
                    let attribute = def
                        .attribute
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:24} {:32} {:>5} xp  {}", key, def.title, def.base_xp, attribute);
                }
            }
            Ok(())
        }
        Commands::Actions => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let table = ActionCostTable::with_overrides(&config.economy.action_costs);
            for (action, cost) in table.actions() {
                println!("{:20} {:>4} energy", action, cost);
            }
            Ok(())
        }
    }
}

async fn open_service(
    pre_config: Option<Config>,
    config_path: &str,
) -> Result<(Config, GuildEconomyService<SledEconomyStore, SystemClock>)> {
    let config = match pre_config {
        Some(config) => config,
        None => Config::load(config_path).await?,
    };
    let store = GuildStoreBuilder::new(&config.storage.data_dir)
        .gold_per_energy(config.economy.gold_per_energy)
        .open()?;
    let service = GuildEconomyService::new(store, SystemClock, &config.economy);
    info!("Guildhall v{} ready", env!("CARGO_PKG_VERSION"));
    Ok((config, service))
}

fn print_status(economy: &GuildEconomy) {
    println!("=== {} ===", economy.guild_id);
    println!("Energy : {}/{}", economy.energy.current, economy.energy.max);
    println!("Gold   : {}", economy.gold.balance);
    println!("XP     : {}", economy.xp_total);
    println!("Premium: {}", if economy.is_premium { "yes" } else { "no" });
    let completed = economy
        .quest_progress
        .values()
        .filter(|q| q.completed)
        .count();
    println!(
        "Quests : {} completed, {} in progress",
        completed,
        economy.quest_progress.len() - completed
    );
    if !economy.gold.history.is_empty() {
        println!("Energy purchases:");
        for record in economy.gold.history.iter().rev().take(5) {
            println!(
                "  {}  +{} energy for {} gold",
                record.timestamp.format("%Y-%m-%d %H:%M"),
                record.energy_amount,
                record.gold_spent
            );
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|cfg| cfg.logging.level.as_str())
            .unwrap_or("info")
            .parse()
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let _ = builder.try_init();
}
