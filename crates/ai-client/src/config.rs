//! Provider selection: the [`ProviderKind`] variant, env-driven [`AiSettings`],
//! and the [`create_provider`] factory.
//!
//! The factory runs once in the composition root; everything downstream holds
//! `Arc<dyn AiProvider>` and never learns which variant it got.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::AiProvider;

/// Which provider implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            // "google" is accepted for ASR_PROVIDER configs.
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => anyhow::bail!("Unsupported AI provider: {}", other),
        }
    }
}

/// API keys and provider choices, loaded from the environment.
#[derive(Debug, Clone)]
pub struct AiSettings {
    pub text_provider: ProviderKind,
    pub asr_provider: ProviderKind,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub google_speech_api_key: Option<String>,
}

impl AiSettings {
    /// Reads `AI_PROVIDER` (default `openai`), `ASR_PROVIDER` (default: same as
    /// `AI_PROVIDER`), and the provider API keys. Key presence is validated by
    /// [`create_provider`], not here, so a deployment can configure only the
    /// provider it uses.
    pub fn from_env() -> Result<Self> {
        let text_provider: ProviderKind = env::var("AI_PROVIDER")
            .unwrap_or_else(|_| "openai".to_string())
            .parse()?;
        let asr_provider: ProviderKind = match env::var("ASR_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => text_provider,
        };

        Ok(Self {
            text_provider,
            asr_provider,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL").ok().filter(|v| !v.is_empty()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty()),
            google_speech_api_key: env::var("GOOGLE_SPEECH_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }
}

/// Constructs the provider for `kind`, validating the keys it needs.
pub fn create_provider(kind: ProviderKind, settings: &AiSettings) -> Result<Arc<dyn AiProvider>> {
    info!(provider = ?kind, "Initializing AI provider");

    match kind {
        ProviderKind::OpenAi => {
            let api_key = settings
                .openai_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required for provider openai"))?;
            let provider = match settings.openai_base_url.clone() {
                Some(base_url) => OpenAiProvider::with_base_url(api_key, base_url)?,
                None => OpenAiProvider::new(api_key)?,
            };
            Ok(Arc::new(provider))
        }
        ProviderKind::Gemini => {
            let api_key = settings
                .gemini_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is required for provider gemini"))?;
            let provider = GeminiProvider::new(api_key)?
                .with_speech_api_key(settings.google_speech_api_key.clone());
            Ok(Arc::new(provider))
        }
    }
}
