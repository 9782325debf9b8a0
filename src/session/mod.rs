//! Review session pipeline.
//!
//! One session fetches the vocabulary list, selects a bounded subset, delivers
//! an enrichment for each word in turn, composes and publishes a digest essay
//! and finally narrates it. Failures are contained at each stage boundary and
//! turned into diagnostic messages, so the destination always hears back.

mod audio;
mod digest;
mod enrich;
#[cfg(test)]
pub(crate) mod testing;

pub use digest::missing_words;

use crate::config::{Prompts, SessionConfig, Settings};
use crate::dictionary::{self, LocalDictionary};
use crate::error::Result;
use crate::llm::{ChatModel, OpenAIChat};
use crate::messaging::{ChatId, MessagingTransport, OutgoingMessage};
use crate::publish::{Publisher, TelegraphPublisher};
use crate::tts::{OpenAISpeech, SpeechSynthesizer};
use crate::vocabulary::{self, VocabularyEntry, VocabularySource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Stage of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Fetching,
    Selecting,
    Enriching { index: usize, total: usize },
    Composing,
    Narrating,
    Done,
    Failed(String),
}

/// Outcome of enriching one word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    pub word: String,
    pub links_text: String,
    pub explanation_text: Option<String>,
    pub error: Option<String>,
}

/// The composed essay and where it ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestArtifact {
    pub markdown_body: String,
    pub published_url: Option<String>,
    pub audio_caption: String,
}

/// Record of one session run.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub trigger_time: DateTime<Utc>,
    pub destination: ChatId,
    pub selection: Vec<VocabularyEntry>,
    pub enrichments: Vec<EnrichmentResult>,
    pub digest: Option<DigestArtifact>,
    pub states: Vec<SessionState>,
    /// Set when any stage reported a failure.
    pub degraded: bool,
}

impl Session {
    fn new(destination: ChatId) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_time: Utc::now(),
            destination,
            selection: Vec::new(),
            enrichments: Vec::new(),
            digest: None,
            states: vec![SessionState::Idle],
            degraded: false,
        }
    }

    fn enter(&mut self, state: SessionState) {
        debug!(state = ?state, "Session state");
        self.states.push(state);
    }

    /// The state the session ended in.
    pub fn final_state(&self) -> &SessionState {
        self.states.last().unwrap_or(&SessionState::Idle)
    }

    pub fn words(&self) -> Vec<String> {
        self.selection.iter().map(|e| e.word.clone()).collect()
    }
}

/// Collaborators a session talks to.
#[derive(Clone)]
pub struct Components {
    pub vocabulary: Arc<dyn VocabularySource>,
    pub llm: Arc<dyn ChatModel>,
    pub transport: Arc<dyn MessagingTransport>,
    pub publisher: Arc<dyn Publisher>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    pub dictionary: Arc<dyn LocalDictionary>,
}

impl Components {
    /// Build the production collaborators around the given transport.
    pub fn from_settings(settings: &Settings, transport: Arc<dyn MessagingTransport>) -> Result<Self> {
        Ok(Self {
            vocabulary: vocabulary::from_settings(settings)?,
            llm: Arc::new(OpenAIChat::from_settings(&settings.llm)?),
            transport,
            publisher: Arc::new(TelegraphPublisher::from_settings(&settings.publish)?),
            tts: Arc::new(OpenAISpeech::from_settings(&settings.tts)?),
            dictionary: dictionary::open(settings.dictionary_path().as_deref())?,
        })
    }
}

/// Runs review sessions, one at a time.
pub struct SessionRunner {
    config: SessionConfig,
    prompts: Prompts,
    components: Components,
    running: Mutex<()>,
}

impl SessionRunner {
    /// Create a runner with production collaborators.
    pub fn new(settings: &Settings, transport: Arc<dyn MessagingTransport>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let components = Components::from_settings(settings, transport)?;
        Ok(Self::with_components(settings.session_config(), prompts, components))
    }

    /// Create a runner with custom components.
    pub fn with_components(config: SessionConfig, prompts: Prompts, components: Components) -> Self {
        Self {
            config,
            prompts,
            components,
            running: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Run one full session for `destination`.
    ///
    /// Never returns an error: every failure is reported to the destination
    /// and recorded in the returned [`Session`]. Concurrent calls queue.
    pub async fn run_session(&self, destination: ChatId) -> Session {
        let _running = self.running.lock().await;
        let session = Session::new(destination);
        let span = info_span!("session", id = %session.id, chat = %destination);
        self.drive(session).instrument(span).await
    }

    async fn drive(&self, mut session: Session) -> Session {
        let chat = session.destination;
        info!("Session started");

        session.enter(SessionState::Fetching);
        let candidates = match self.components.vocabulary.list().await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => {
                return self
                    .fail(session, "Your vocabulary list is empty, nothing to review.".to_string())
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch vocabulary");
                return self.fail(session, format!("fetch vocabulary failed: {}", e)).await;
            }
        };

        session.enter(SessionState::Selecting);
        session.selection = {
            let mut rng = rand::rng();
            self.config
                .selection
                .select(&candidates, self.config.words_per_session, &mut rng)
        };
        info!(
            strategy = %self.config.selection,
            selected = session.selection.len(),
            candidates = candidates.len(),
            "Words selected"
        );

        let selection = session.selection.clone();
        let total = selection.len();
        for (i, entry) in selection.iter().enumerate() {
            session.enter(SessionState::Enriching { index: i + 1, total });
            let result = self.enrich_and_deliver(chat, i + 1, entry).await;
            session.degraded |= result.error.is_some();
            session.enrichments.push(result);
            tokio::time::sleep(self.config.message_interval).await;
        }

        let words = session.words();

        session.enter(SessionState::Composing);
        match self.compose_digest(chat, &words).await {
            Ok(digest) => {
                match &digest.published_url {
                    Some(url) => {
                        if let Err(e) = self
                            .components
                            .transport
                            .send_text(chat, &OutgoingMessage::plain(url.clone()))
                            .await
                        {
                            error!(error = %e, "Failed to deliver digest link");
                            self.notify(chat, format!("digest delivery failed: {}", e)).await;
                            session.degraded = true;
                        }
                    }
                    None => session.degraded = true,
                }
                session.digest = Some(digest);
            }
            Err(e) => {
                error!(error = %e, "Digest composition failed");
                self.notify(chat, format!("digest failed: {}", e)).await;
                session.degraded = true;
            }
        }

        session.enter(SessionState::Narrating);
        match &session.digest {
            Some(digest) => {
                if let Err(e) = self
                    .render_and_deliver_audio(chat, &digest.markdown_body, &words)
                    .await
                {
                    error!(error = %e, "Audio rendering failed");
                    self.notify(chat, format!("audio failed: {}", e)).await;
                    session.degraded = true;
                }
            }
            None => {
                self.notify(chat, "audio skipped: no digest to narrate".to_string())
                    .await;
                session.degraded = true;
            }
        }

        session.enter(SessionState::Done);
        info!(degraded = session.degraded, "Session finished");
        session
    }

    async fn fail(&self, mut session: Session, reason: String) -> Session {
        warn!(reason = %reason, "Session failed");
        self.notify(session.destination, reason.clone()).await;
        session.degraded = true;
        session.enter(SessionState::Failed(reason));
        session
    }

    /// Send a plain diagnostic, logging if even that fails.
    pub(crate) async fn notify(&self, chat: ChatId, text: String) {
        if let Err(e) = self
            .components
            .transport
            .send_text(chat, &OutgoingMessage::plain(text))
            .await
        {
            warn!(error = %e, "Could not deliver notice");
        }
    }
}
