//! Gemini implementation of [`AiProvider`]: `generateContent` REST for text,
//! Google Cloud Speech-to-Text REST for voice transcription.
//!
//! Gemini has no `system` role; the last system message becomes the request's
//! system instruction and assistant messages map to the `model` role.

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use fleetbot_core::{ChatMessage, MessageRole};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    AiProvider, GenerationOptions, EMPTY_RESPONSE_REPLY, EMPTY_TRANSCRIPTION_REPLY,
    GENERATION_ERROR_REPLY, TRANSCRIPTION_ERROR_REPLY,
};

const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const SPEECH_API_BASE: &str = "https://speech.googleapis.com";

/// Reply when the conversation ends without a user message to answer.
pub const NO_MESSAGE_REPLY: &str =
    "It seems there was no message to process. Please try again.";

/// Reply when transcription is requested but no speech credentials are configured.
pub const TRANSCRIPTION_UNAVAILABLE_REPLY: &str =
    "Sorry, audio transcription is not available. Please configure Google Cloud credentials.";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    speech_api_key: Option<String>,
    model: String,
    base_url: String,
    speech_base_url: String,
}

/// The generic conversation split into what the Gemini API expects.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MappedConversation {
    pub system_instruction: Option<String>,
    /// (role, text) pairs in order; roles are `user` or `model`.
    pub contents: Vec<(&'static str, String)>,
}

/// Separates the system instruction (last system message wins) and maps the
/// remaining roles; `assistant` becomes Gemini's `model`.
pub(crate) fn map_messages(messages: &[ChatMessage]) -> MappedConversation {
    let system_instruction = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::System)
        .map(|m| m.content.clone());

    let contents = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| {
            let role = match m.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            (role, m.content.clone())
        })
        .collect();

    MappedConversation {
        system_instruction,
        contents,
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeConfig {
    encoding: &'static str,
    sample_rate_hertz: i32,
    language_code: String,
    audio_channel_count: i32,
}

#[derive(Serialize)]
struct RecognizeAudio {
    content: String,
}

#[derive(Serialize)]
struct RecognizeRequest {
    config: RecognizeConfig,
    audio: RecognizeAudio,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    results: Option<Vec<SpeechResult>>,
}

#[derive(Deserialize)]
struct SpeechResult {
    alternatives: Option<Vec<SpeechAlternative>>,
}

#[derive(Deserialize)]
struct SpeechAlternative {
    transcript: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            anyhow::bail!("Google Gemini API key is required");
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            speech_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            speech_base_url: SPEECH_API_BASE.to_string(),
        })
    }

    /// Enables transcription through Google Cloud Speech. Without a key,
    /// transcription degrades to [`TRANSCRIPTION_UNAVAILABLE_REPLY`].
    pub fn with_speech_api_key(mut self, speech_api_key: Option<String>) -> Self {
        self.speech_api_key = speech_api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    async fn try_generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<Option<String>> {
        let mapped = map_messages(messages);

        let request = GenerateContentRequest {
            system_instruction: mapped.system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: mapped
                .contents
                .into_iter()
                .map(|(role, text)| Content {
                    role: Some(role.to_string()),
                    parts: vec![Part { text }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            },
        };

        let model = options.model.as_deref().unwrap_or(&self.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateContentResponse>()
            .await?;

        let text = response
            .candidates
            .and_then(|mut candidates| candidates.drain(..).next())
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty());
        Ok(text)
    }

    async fn try_transcribe(
        &self,
        speech_api_key: &str,
        audio: Vec<u8>,
        language: Option<String>,
    ) -> Result<Option<String>> {
        let request = RecognizeRequest {
            config: RecognizeConfig {
                encoding: "OGG_OPUS",
                sample_rate_hertz: 16000,
                language_code: language.unwrap_or_else(|| "en-US".to_string()),
                audio_channel_count: 1,
            },
            audio: RecognizeAudio {
                content: base64::engine::general_purpose::STANDARD.encode(audio),
            },
        };

        let url = format!(
            "{}/v1/speech:recognize?key={}",
            self.speech_base_url, speech_api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<RecognizeResponse>()
            .await?;

        let transcript = response
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|result| {
                result
                    .alternatives
                    .unwrap_or_default()
                    .into_iter()
                    .next()
                    .and_then(|alt| alt.transcript)
            })
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Some(transcript).filter(|t| !t.is_empty()))
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn generate_text_response(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<GenerationOptions>,
    ) -> String {
        let last_is_user = messages
            .iter()
            .rev()
            .find(|m| m.role != MessageRole::System)
            .map(|m| m.role == MessageRole::User)
            .unwrap_or(false);
        if !last_is_user {
            warn!("No user message found to send to Gemini");
            return NO_MESSAGE_REPLY.to_string();
        }

        let options = options.unwrap_or_default();
        info!(
            model = %options.model.as_deref().unwrap_or(&self.model),
            message_count = messages.len(),
            "Requesting chat completion from Google Gemini"
        );

        match self.try_generate(&messages, &options).await {
            Ok(Some(text)) => {
                info!("Successfully received response from Gemini");
                text
            }
            Ok(None) => {
                warn!("Received an empty response from Gemini");
                EMPTY_RESPONSE_REPLY.to_string()
            }
            Err(err) => {
                error!(error = %err, "Error calling Google Gemini API");
                GENERATION_ERROR_REPLY.to_string()
            }
        }
    }

    async fn transcribe_audio(&self, audio: Vec<u8>, language: Option<String>) -> String {
        let Some(speech_api_key) = self.speech_api_key.clone() else {
            error!("Google Cloud Speech is not configured");
            return TRANSCRIPTION_UNAVAILABLE_REPLY.to_string();
        };

        info!(
            size = audio.len(),
            language = ?language,
            "Requesting audio transcription from Google Cloud Speech-to-Text"
        );

        match self.try_transcribe(&speech_api_key, audio, language).await {
            Ok(Some(transcript)) => {
                info!("Successfully transcribed audio with Google Cloud Speech");
                transcript
            }
            Ok(None) => {
                warn!("Received empty transcription from Google Cloud Speech");
                EMPTY_TRANSCRIPTION_REPLY.to_string()
            }
            Err(err) => {
                error!(error = %err, "Error calling Google Cloud Speech API");
                TRANSCRIPTION_ERROR_REPLY.to_string()
            }
        }
    }
}
