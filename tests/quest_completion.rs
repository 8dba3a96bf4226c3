//! Integration tests for quest completion: reward math end to end,
//! idempotence under double submission, and the reward/purchase record
//! separation.

mod common;

use chrono::Duration;
use common::{fast_config, setup, ts};
use guildhall::config::EconomyConfig;
use guildhall::economy::{Attribute, EconomyError};

#[tokio::test]
async fn golden_reward_with_all_bonuses() {
    // map_the_market: base 100 xp, attribute insight. Rating 5 with an
    // attribute match and a full roster: 100 * 150% = 150, +30% = 195 xp.
    // Gold: half base 50 * 150% = 75, +10% roster = 82.
    let (_dir, service, _clock) = setup(&fast_config(), "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");
    service
        .set_roster_filled("ember", true)
        .await
        .expect("roster");

    let economy = service
        .complete_quest(
            "ember",
            "map_the_market",
            serde_json::json!({"segments": ["founders", "coaches"]}),
            5,
            Some(Attribute::Insight),
            Vec::new(),
        )
        .await
        .expect("complete");

    let record = economy.quest("map_the_market").expect("record");
    assert!(record.completed);
    assert_eq!(record.rating, Some(5));
    assert_eq!(record.xp_reward, 195);
    assert_eq!(record.gold_reward, 82);
    assert_eq!(economy.xp_total, 195);
    assert_eq!(economy.gold.balance, 50 + 82);
}

#[tokio::test]
async fn neutral_completion_without_bonuses() {
    let (_dir, service, _clock) = setup(&fast_config(), "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");

    let economy = service
        .complete_quest(
            "ember",
            "forge_vision",
            serde_json::Value::Null,
            3,
            None,
            Vec::new(),
        )
        .await
        .expect("complete");

    let record = economy.quest("forge_vision").expect("record");
    assert_eq!(record.xp_reward, 80);
    assert_eq!(record.gold_reward, 40);
}

#[tokio::test]
async fn double_submission_is_idempotent() {
    let (_dir, service, _clock) = setup(&fast_config(), "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");

    service
        .complete_quest(
            "ember",
            "forge_vision",
            serde_json::Value::Null,
            4,
            Some(Attribute::Vision),
            Vec::new(),
        )
        .await
        .expect("first completion");
    let after_first = service.guild_economy("ember").await.expect("read");

    let err = service
        .complete_quest(
            "ember",
            "forge_vision",
            serde_json::json!({"different": "inputs"}),
            1,
            None,
            Vec::new(),
        )
        .await
        .expect_err("second completion rejected");
    assert!(matches!(err, EconomyError::AlreadyCompleted(_)));

    // The terminal record is immutable: same rewards, same rating, no
    // extra credit.
    let after_second = service.guild_economy("ember").await.expect("reread");
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn quest_rewards_never_append_purchase_records() {
    let (_dir, service, _clock) = setup(&fast_config(), "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");

    let economy = service
        .complete_quest(
            "ember",
            "first_revenue",
            serde_json::Value::Null,
            5,
            Some(Attribute::Execution),
            Vec::new(),
        )
        .await
        .expect("complete");

    assert!(economy.gold.balance > 50);
    assert!(economy.gold.history.is_empty());
}

#[tokio::test]
async fn submission_is_free_for_non_premium_guilds() {
    let config = EconomyConfig {
        starting_energy: 0,
        ..fast_config()
    };
    let (_dir, service, _clock) = setup(&config, "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");

    // Zero energy, zero-cost submission: still succeeds, balance untouched.
    let economy = service
        .complete_quest(
            "ember",
            "rally_the_guild",
            serde_json::Value::Null,
            2,
            None,
            Vec::new(),
        )
        .await
        .expect("complete with empty pool");
    assert_eq!(economy.energy.current, 0);
}

#[tokio::test]
async fn start_then_complete_preserves_started_at() {
    let (_dir, service, clock) = setup(&fast_config(), "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");

    service
        .start_quest("ember", "forge_vision", serde_json::json!({"draft": true}))
        .await
        .expect("start");

    clock.advance(Duration::hours(3));
    let economy = service
        .complete_quest(
            "ember",
            "forge_vision",
            serde_json::json!({"draft": false}),
            4,
            None,
            Vec::new(),
        )
        .await
        .expect("complete");

    let record = economy.quest("forge_vision").expect("record");
    assert_eq!(record.started_at, ts("2026-03-10T12:00:00Z"));
    assert_eq!(record.completed_at, Some(ts("2026-03-10T15:00:00Z")));
    assert_eq!(record.inputs, serde_json::json!({"draft": false}));
}

#[tokio::test]
async fn sage_conversation_is_stored_with_the_record() {
    let (_dir, service, _clock) = setup(&fast_config(), "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");

    let transcript = vec![
        guildhall::economy::SageMessage {
            role: "member".to_string(),
            content: "How do we price the beta?".to_string(),
        },
        guildhall::economy::SageMessage {
            role: "sage".to_string(),
            content: "Anchor on value, not cost.".to_string(),
        },
    ];
    let economy = service
        .complete_quest(
            "ember",
            "first_revenue",
            serde_json::Value::Null,
            4,
            None,
            transcript.clone(),
        )
        .await
        .expect("complete");

    let record = economy.quest("first_revenue").expect("record");
    assert_eq!(record.sage_conversation, transcript);
}

#[tokio::test]
async fn xp_accumulates_across_quests() {
    let (_dir, service, _clock) = setup(&fast_config(), "2026-03-10T12:00:00Z");
    service.create_guild("ember").await.expect("create");

    let economy = service
        .complete_quest(
            "ember",
            "forge_vision",
            serde_json::Value::Null,
            3,
            None,
            Vec::new(),
        )
        .await
        .expect("first");
    assert_eq!(economy.xp_total, 80);

    let economy = service
        .complete_quest(
            "ember",
            "rally_the_guild",
            serde_json::Value::Null,
            3,
            None,
            Vec::new(),
        )
        .await
        .expect("second");
    assert_eq!(economy.xp_total, 80 + 90);
}
