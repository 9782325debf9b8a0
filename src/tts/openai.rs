//! OpenAI speech endpoint.

use super::{split_text, SpeechSynthesizer};
use crate::config::TtsSettings;
use crate::error::{Result, WordcastError};
use crate::openai::{create_client, DEFAULT_TIMEOUT_SECS};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Input limit of the speech endpoint is 4096 characters.
const MAX_INPUT_CHARS: usize = 4000;

/// Speech synthesizer using OpenAI TTS.
pub struct OpenAISpeech {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
}

impl OpenAISpeech {
    pub fn from_settings(settings: &TtsSettings) -> Result<Self> {
        let client = create_client(
            settings.api_key.as_deref(),
            settings.api_base.as_deref(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )?;
        Ok(Self {
            client,
            model: parse_model(&settings.model),
        })
    }
}

fn parse_model(name: &str) -> SpeechModel {
    match name {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

/// Map a voice name to the API's voice.
pub fn parse_voice(name: &str) -> Result<Voice> {
    match name.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        other => Err(WordcastError::Config(format!("Unknown voice: {}", other))),
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeech {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str, voice: &str, dest: &Path) -> Result<()> {
        let voice = parse_voice(voice)?;
        let pieces = split_text(text, MAX_INPUT_CHARS);
        if pieces.is_empty() {
            return Err(WordcastError::Tts("Nothing to narrate".to_string()));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        for (i, piece) in pieces.iter().enumerate() {
            let request = CreateSpeechRequestArgs::default()
                .input(piece.as_str())
                .voice(voice.clone())
                .model(self.model.clone())
                .response_format(SpeechResponseFormat::Mp3)
                .build()
                .map_err(|e| WordcastError::Tts(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .audio()
                .speech(request)
                .await
                .map_err(|e| WordcastError::Tts(format!("Speech API error: {}", e)))?;

            file.write_all(&response.bytes).await?;
            debug!(piece = i + 1, total = pieces.len(), "Synthesized piece");
        }
        file.flush().await?;
        Ok(())
    }
}
