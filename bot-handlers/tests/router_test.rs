//! Dispatch tests: command routing, sender guards, and fixed guidance replies.

mod common;

use common::{
    anonymous_text_message, empty_message, setup, text_message, ApiCall, BOT_TOKEN, MOCK_REPLY,
};

const CHAT: i64 = 7000;
const USER: i64 = 1111;

#[tokio::test]
async fn test_start_creates_user_and_welcomes() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/start"))
        .await;

    let user = stack
        .users_bots
        .get_user_by_telegram_id(USER)
        .await
        .expect("query failed")
        .expect("user not created");
    assert_eq!(user.telegram_id, USER);

    let texts = stack.api.sent_texts(CHAT);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Hello, Ada!"));

    // Standard menu published alongside the welcome.
    assert!(stack.api.calls().iter().any(|call| matches!(
        call,
        ApiCall::SetCommands { commands, .. } if commands.len() == 4
    )));
}

#[tokio::test]
async fn test_unknown_text_goes_to_ai() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/start"))
        .await;
    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "tell me a joke"))
        .await;

    assert_eq!(stack.ai.requests().len(), 1);
    let texts = stack.api.sent_texts(CHAT);
    assert_eq!(texts.last().map(String::as_str), Some(MOCK_REPLY));
}

#[tokio::test]
async fn test_cancel_routes_to_cancel_handler() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/cancel"))
        .await;

    let texts = stack.api.sent_texts(CHAT);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Operation cancelled"));
    assert!(stack.ai.requests().is_empty());
}

#[tokio::test]
async fn test_bots_lists_configured_and_available() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/start"))
        .await;
    let user = stack
        .users_bots
        .get_user_by_telegram_id(USER)
        .await
        .expect("query failed")
        .expect("user missing");
    stack
        .users_bots
        .set_user_bot_prompt(user.id, stack.bot_id, "Be concise")
        .await
        .expect("set prompt failed");

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/bots"))
        .await;

    let listing = stack.api.sent_texts(CHAT).last().cloned().unwrap();
    assert!(listing.contains("Configured Bots"));
    assert!(listing.contains("Be concise"));
}

#[tokio::test]
async fn test_bots_without_profile_sends_guidance() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/bots"))
        .await;

    let texts = stack.api.sent_texts(CHAT);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Please type /start first"));
}

#[tokio::test]
async fn test_setprompt_without_profile_sends_guidance() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/setprompt"))
        .await;

    let texts = stack.api.sent_texts(CHAT);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Please type /start first"));
    // No state was opened.
    assert!(stack
        .sessions
        .get_session(CHAT)
        .await
        .expect("query failed")
        .is_none());
}

#[tokio::test]
async fn test_setprompt_with_unregistered_bot_token() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &text_message(CHAT, USER, "/start"))
        .await;
    stack
        .router
        .dispatch("999:UNKNOWNTOKEN", &text_message(CHAT, USER, "/setprompt"))
        .await;

    let texts = stack.api.sent_texts(CHAT);
    assert!(texts.last().unwrap().contains("not registered"));
    assert!(stack
        .sessions
        .get_session(CHAT)
        .await
        .expect("query failed")
        .is_none());
}

#[tokio::test]
async fn test_message_without_sender_is_noop() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &anonymous_text_message(CHAT, "hello"))
        .await;

    assert!(stack.api.calls().is_empty());
    assert!(stack.ai.requests().is_empty());
}

#[tokio::test]
async fn test_message_without_text_or_voice_is_noop() {
    let stack = setup().await;

    stack
        .router
        .dispatch(BOT_TOKEN, &empty_message(CHAT, USER))
        .await;

    assert!(stack.api.calls().is_empty());
    assert!(stack.ai.requests().is_empty());
}
