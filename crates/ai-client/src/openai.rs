//! OpenAI implementation of [`AiProvider`]: chat completions for text, Whisper
//! for voice transcription. Wraps async-openai.

use anyhow::Result;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    AudioInput, ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, CreateTranscriptionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use fleetbot_core::{ChatMessage, MessageRole};
use tracing::{error, info, warn};

use crate::{
    AiProvider, GenerationOptions, EMPTY_RESPONSE_REPLY, EMPTY_TRANSCRIPTION_REPLY,
    GENERATION_ERROR_REPLY, TRANSCRIPTION_ERROR_REPLY,
};

const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const WHISPER_MODEL: &str = "whisper-1";
const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

/// Converts a single [`ChatMessage`] into the OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            anyhow::bail!("OpenAI API key is required");
        }
        let config = OpenAIConfig::new().with_api_key(api_key);
        Ok(Self {
            client: Client::with_config(config),
            model: DEFAULT_CHAT_MODEL.to_string(),
        })
    }

    /// Builds a provider against a custom base URL (proxies, compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        if api_key.is_empty() {
            anyhow::bail!("OpenAI API key is required");
        }
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Ok(Self {
            client: Client::with_config(config),
            model: DEFAULT_CHAT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    async fn try_generate(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<GenerationOptions>,
    ) -> Result<Option<String>> {
        let options = options.unwrap_or_default();
        let model = options.model.as_deref().unwrap_or(&self.model);

        let mut openai_messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(messages.len());
        for msg in &messages {
            openai_messages.push(chat_message_to_openai(msg)?);
        }

        info!(
            model = %model,
            message_count = openai_messages.len(),
            "Requesting chat completion from OpenAI"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .temperature(options.temperature.unwrap_or(DEFAULT_TEMPERATURE))
            .messages(openai_messages)
            .build()?;

        let response = self.client.chat().create(request).await?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty()))
    }

    async fn try_transcribe(&self, audio: Vec<u8>, language: Option<String>) -> Result<String> {
        info!(
            size = audio.len(),
            language = ?language,
            "Requesting audio transcription from OpenAI Whisper"
        );

        let mut request = CreateTranscriptionRequestArgs::default();
        request
            .file(AudioInput::from_vec_u8("voice.ogg".to_string(), audio))
            .model(WHISPER_MODEL);
        if let Some(language) = language {
            request.language(language);
        }

        let response = self.client.audio().transcribe(request.build()?).await?;
        Ok(response.text)
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn generate_text_response(
        &self,
        messages: Vec<ChatMessage>,
        options: Option<GenerationOptions>,
    ) -> String {
        match self.try_generate(messages, options).await {
            Ok(Some(text)) => {
                info!("Successfully received response from OpenAI");
                text
            }
            Ok(None) => {
                warn!("Received an empty response from OpenAI");
                EMPTY_RESPONSE_REPLY.to_string()
            }
            Err(err) => {
                error!(error = %err, "Error calling OpenAI API");
                GENERATION_ERROR_REPLY.to_string()
            }
        }
    }

    async fn transcribe_audio(&self, audio: Vec<u8>, language: Option<String>) -> String {
        match self.try_transcribe(audio, language).await {
            Ok(text) if !text.is_empty() => {
                info!("Successfully transcribed audio with OpenAI Whisper");
                text
            }
            Ok(_) => {
                warn!("Received empty transcription from OpenAI Whisper");
                EMPTY_TRANSCRIPTION_REPLY.to_string()
            }
            Err(err) => {
                error!(error = %err, "Error calling OpenAI Whisper API");
                TRANSCRIPTION_ERROR_REPLY.to_string()
            }
        }
    }
}
