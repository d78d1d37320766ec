//! Unit tests for BotUserRepository.

use crate::bot_user_repo::BotUserRepository;
use crate::models::NewUser;
use crate::sqlite_pool::SqlitePoolManager;

fn ada() -> NewUser {
    NewUser {
        telegram_id: 1111,
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        username: Some("ada".to_string()),
        language_code: Some("en".to_string()),
        is_bot: false,
    }
}

async fn setup() -> BotUserRepository {
    let pool_manager = SqlitePoolManager::new("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    BotUserRepository::new(pool_manager)
        .await
        .expect("Failed to create repository")
}

#[tokio::test]
async fn test_find_or_create_user_creates_once() {
    let repo = setup().await;

    let created = repo.find_or_create_user(&ada()).await.expect("create failed");
    assert_eq!(created.telegram_id, 1111);
    assert_eq!(created.first_name.as_deref(), Some("Ada"));

    let again = repo.find_or_create_user(&ada()).await.expect("lookup failed");
    assert_eq!(again.id, created.id);
}

#[tokio::test]
async fn test_get_user_by_telegram_id_absent() {
    let repo = setup().await;
    let user = repo.get_user_by_telegram_id(42).await.expect("query failed");
    assert!(user.is_none());
}

#[tokio::test]
async fn test_upsert_bot_by_token() {
    let repo = setup().await;

    repo.upsert_bot("token-1", "First").await.expect("upsert failed");
    repo.upsert_bot("token-1", "Renamed").await.expect("upsert failed");
    repo.upsert_bot("token-2", "Second").await.expect("upsert failed");

    let bots = repo.get_all_bots().await.expect("query failed");
    assert_eq!(bots.len(), 2);
    assert_eq!(bots[0].name.as_deref(), Some("Renamed"));

    let bot = repo
        .get_bot_by_token("token-2")
        .await
        .expect("query failed")
        .expect("bot missing");
    assert_eq!(bot.name.as_deref(), Some("Second"));

    let missing = repo.get_bot_by_token("nope").await.expect("query failed");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_user_bot_prompt_round_trip() {
    let repo = setup().await;
    let user = repo.find_or_create_user(&ada()).await.expect("create failed");
    repo.upsert_bot("token-1", "First").await.expect("upsert failed");
    let bot = repo
        .get_bot_by_token("token-1")
        .await
        .expect("query failed")
        .expect("bot missing");

    assert!(repo
        .get_user_bot_prompt(user.id, bot.id)
        .await
        .expect("query failed")
        .is_none());

    repo.set_user_bot_prompt(user.id, bot.id, "Be concise")
        .await
        .expect("set failed");
    assert_eq!(
        repo.get_user_bot_prompt(user.id, bot.id)
            .await
            .expect("query failed")
            .as_deref(),
        Some("Be concise")
    );

    // Replacing overwrites, not duplicates.
    repo.set_user_bot_prompt(user.id, bot.id, "Be thorough")
        .await
        .expect("set failed");
    let settings = repo.get_user_bots(user.id).await.expect("query failed");
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].prompt.as_deref(), Some("Be thorough"));
}
