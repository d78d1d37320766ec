//! Voice notes: fetch the audio from Telegram, transcribe, then re-enter the
//! text path with the transcript substituted for the message text.

use anyhow::Result;
use telegram_api::TelegramMessage;
use tracing::{error, info, warn};

use crate::context::BotContext;
use crate::message::handle_text_message;

pub async fn handle_voice_message(ctx: &BotContext, bot_token: &str, message: &TelegramMessage) {
    let chat_id = message.chat.id;
    let Some(voice) = &message.voice else {
        warn!(chat_id, "Voice handler called with message without voice data");
        return;
    };

    info!(
        chat_id,
        voice_file_id = %voice.file_id,
        duration = voice.duration,
        mime_type = ?voice.mime_type,
        "Processing voice message"
    );

    if let Err(err) = try_handle_voice(ctx, bot_token, message, &voice.file_id).await {
        error!(error = %err, chat_id, "Error processing voice message");
    }
}

async fn try_handle_voice(
    ctx: &BotContext,
    bot_token: &str,
    message: &TelegramMessage,
    file_id: &str,
) -> Result<()> {
    let chat_id = message.chat.id;

    let info = ctx.api.get_file(bot_token, file_id).await?;
    let Some(file_path) = info.file_path else {
        error!(chat_id, "Telegram returned file info without a file path");
        return Ok(());
    };
    info!(chat_id, file_path = %file_path, "Retrieved file info");

    let audio = ctx.api.download_file(bot_token, &file_path).await?;
    info!(chat_id, size = audio.len(), "Downloaded audio file");

    let transcript = ctx.asr.transcribe_audio(audio, None).await;
    info!(chat_id, transcript_len = transcript.len(), "Audio transcribed");

    let mut text_message = message.clone();
    text_message.text = Some(transcript);
    text_message.voice = None;

    handle_text_message(ctx, bot_token, &text_message).await;
    Ok(())
}
