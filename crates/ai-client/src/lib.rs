//! # AI provider abstraction
//!
//! Defines the [`AiProvider`] trait (text generation + speech transcription) and two
//! implementations: [`OpenAiProvider`] (chat completions + Whisper) and
//! [`GeminiProvider`] (Gemini REST + Google Cloud Speech).
//!
//! Providers never surface errors to callers: every failure degrades to a short,
//! non-technical reply string, with the full error detail logged. Selection happens
//! once at startup via [`ProviderKind`] and [`create_provider`]; consumers hold
//! `Arc<dyn AiProvider>` and stay unaware of the concrete variant.

use async_trait::async_trait;
use fleetbot_core::ChatMessage;

mod config;
mod gemini;
mod openai;

pub use config::{create_provider, AiSettings, ProviderKind};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Reply used when a generation call fails. Never includes error detail.
pub const GENERATION_ERROR_REPLY: &str =
    "Sorry, I encountered an error while contacting my AI service. Please try again later.";

/// Reply used when the model returns no content.
pub const EMPTY_RESPONSE_REPLY: &str =
    "I received an empty response. Could you please rephrase?";

/// Reply used when a transcription call fails.
pub const TRANSCRIPTION_ERROR_REPLY: &str =
    "Sorry, I encountered an error while transcribing your audio. Please try again later.";

/// Reply used when transcription yields no text.
pub const EMPTY_TRANSCRIPTION_REPLY: &str =
    "I couldn't understand the audio. Could you please try again?";

/// Options for a single generation call; unset fields use provider defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

/// Capability contract every AI provider implements.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generates a reply for the conversation. Failures return a generic
    /// apology string; the method itself is total.
    async fn generate_text_response(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<GenerationOptions>,
    ) -> String;

    /// Transcribes an audio payload (OGG/Opus voice note) into text. Same
    /// failure contract as [`AiProvider::generate_text_response`].
    async fn transcribe_audio(&self, audio: Vec<u8>, language: Option<String>) -> String;
}
