//! In-crate fakes for exercising the session pipeline.

use super::{Components, SessionRunner};
use crate::config::{Prompts, SessionConfig};
use crate::dictionary::NoDictionary;
use crate::error::{Result, WordcastError};
use crate::llm::ChatModel;
use crate::messaging::{ChatId, MessageHandle, MessagingTransport, OutgoingMessage};
use crate::publish::{Page, Publisher};
use crate::tts::SpeechSynthesizer;
use crate::vocabulary::{MemoryVocabulary, VocabularyEntry, VocabularySource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

/// Chat model that answers from the prompt itself.
///
/// Explanations echo the word; essays echo the word list, so they use every
/// word unless told otherwise.
#[derive(Default)]
pub struct ScriptedChat {
    calls: Mutex<Vec<(String, String)>>,
    failing_word: Mutex<Option<String>>,
    fail_essays: AtomicBool,
    dropped_once: Mutex<Option<String>>,
}

impl ScriptedChat {
    pub fn fail_on_word(&self, word: &str) {
        *self.failing_word.lock().unwrap() = Some(word.to_string());
    }

    pub fn fail_essays(&self) {
        self.fail_essays.store(true, Ordering::SeqCst);
    }

    /// Leave `word` out of the next essay only.
    pub fn drop_from_first_essay(&self, word: &str) {
        *self.dropped_once.lock().unwrap() = Some(word.to_string());
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

fn explained_word(user: &str) -> Option<&str> {
    user.strip_prefix("word: \"")?.split('"').next()
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        if let Some(word) = explained_word(user) {
            if self.failing_word.lock().unwrap().as_deref() == Some(word) {
                return Err(WordcastError::Llm("scripted failure".to_string()));
            }
            return Ok(format!("**{}** /ipa/\n\n- meaning", word));
        }

        if self.fail_essays.load(Ordering::SeqCst) {
            return Err(WordcastError::Llm("scripted essay failure".to_string()));
        }
        let mut essay = format!("# Story\n\n{}", user);
        if let Some(word) = self.dropped_once.lock().unwrap().take() {
            essay = essay.replace(&word, "");
        }
        Ok(essay)
    }
}

/// A delivered audio file.
#[derive(Debug, Clone)]
pub struct SentAudio {
    pub path: PathBuf,
    pub caption: String,
    /// Whether the file existed at delivery time.
    pub existed: bool,
}

#[derive(Debug, Clone)]
enum Sent {
    Text(ChatId, OutgoingMessage),
    Audio(ChatId, SentAudio),
}

/// Transport that records everything it delivers.
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    timeline: Mutex<Vec<(Instant, String)>>,
    next_id: AtomicI64,
    max_message_len: usize,
    fail_text: Mutex<Option<String>>,
    fail_audio: AtomicBool,
}

impl RecordingTransport {
    pub fn new(max_message_len: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            timeline: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            max_message_len,
            fail_text: Mutex::new(None),
            fail_audio: AtomicBool::new(false),
        }
    }

    /// Reject text messages containing `needle`.
    pub fn fail_text_containing(&self, needle: &str) {
        *self.fail_text.lock().unwrap() = Some(needle.to_string());
    }

    pub fn fail_audio(&self) {
        self.fail_audio.store(true, Ordering::SeqCst);
    }

    pub fn texts(&self) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::Text(_, m) => Some(m.clone()),
                Sent::Audio(..) => None,
            })
            .collect()
    }

    /// Delivered texts with the (tokio) time they were sent.
    pub fn timeline(&self) -> Vec<(Instant, String)> {
        self.timeline.lock().unwrap().clone()
    }

    pub fn audio(&self) -> Vec<SentAudio> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                Sent::Audio(_, a) => Some(a.clone()),
                Sent::Text(..) => None,
            })
            .collect()
    }

    pub fn sent_chats(&self) -> Vec<ChatId> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| match s {
                Sent::Text(c, _) | Sent::Audio(c, _) => *c,
            })
            .collect()
    }

    fn handle(&self) -> MessageHandle {
        MessageHandle {
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl MessagingTransport for RecordingTransport {
    fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    async fn send_text(&self, chat: ChatId, message: &OutgoingMessage) -> Result<MessageHandle> {
        if let Some(needle) = self.fail_text.lock().unwrap().as_deref() {
            if message.text.contains(needle) {
                return Err(WordcastError::Messaging("scripted send failure".to_string()));
            }
        }
        self.timeline
            .lock()
            .unwrap()
            .push((Instant::now(), message.text.clone()));
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(chat, message.clone()));
        Ok(self.handle())
    }

    async fn send_audio(&self, chat: ChatId, file: &Path, caption: &str) -> Result<MessageHandle> {
        if self.fail_audio.load(Ordering::SeqCst) {
            return Err(WordcastError::Messaging("scripted audio failure".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Audio(
            chat,
            SentAudio {
                path: file.to_path_buf(),
                caption: caption.to_string(),
                existed: file.exists(),
            },
        ));
        Ok(self.handle())
    }
}

/// Publisher that can be told to fail its next calls.
#[derive(Default)]
pub struct FakePublisher {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    pages: Mutex<Vec<Page>>,
}

impl FakePublisher {
    pub const URL: &'static str = "https://telegra.ph/Glossary-test";

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn pages(&self) -> Vec<Page> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, page: &Page) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages.lock().unwrap().push(page.clone());
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(WordcastError::Publish("CONTENT_FORMAT_INVALID".to_string()));
        }
        Ok(Self::URL.to_string())
    }
}

/// Synthesizer that writes a stub file and remembers where.
#[derive(Default)]
pub struct FakeSpeech {
    paths: Mutex<Vec<PathBuf>>,
    texts: Mutex<Vec<String>>,
    fail_after_write: AtomicBool,
}

impl FakeSpeech {
    pub fn fail_after_write(&self) {
        self.fail_after_write.store(true, Ordering::SeqCst);
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, _voice: &str, dest: &Path) -> Result<()> {
        self.paths.lock().unwrap().push(dest.to_path_buf());
        self.texts.lock().unwrap().push(text.to_string());
        std::fs::write(dest, b"ID3")?;
        if self.fail_after_write.load(Ordering::SeqCst) {
            return Err(WordcastError::Tts("scripted tts failure".to_string()));
        }
        Ok(())
    }
}

/// Vocabulary source that is always down.
pub struct FailingVocabulary;

#[async_trait]
impl VocabularySource for FailingVocabulary {
    async fn list(&self) -> Result<Vec<VocabularyEntry>> {
        Err(WordcastError::Vocabulary("service unavailable".to_string()))
    }

    async fn add(&self, _words: &[String]) -> Result<String> {
        Err(WordcastError::Vocabulary("service unavailable".to_string()))
    }

    async fn remove(&self, _words: &[String]) -> Result<bool> {
        Err(WordcastError::Vocabulary("service unavailable".to_string()))
    }
}

/// A runner wired to fakes, with handles to inspect them.
pub struct Harness {
    pub runner: Arc<SessionRunner>,
    pub vocabulary: Arc<dyn VocabularySource>,
    pub chat: Arc<ScriptedChat>,
    pub transport: Arc<RecordingTransport>,
    pub publisher: Arc<FakePublisher>,
    pub speech: Arc<FakeSpeech>,
    _temp: TempDir,
}

impl Harness {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(Arc::new(MemoryVocabulary::from_words(words)), 4096, Duration::ZERO)
    }

    /// A harness that pauses `interval` after each word.
    pub fn with_interval<I, S>(words: I, interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(Arc::new(MemoryVocabulary::from_words(words)), 4096, interval)
    }

    pub fn with_max_len<I, S>(words: I, max_message_len: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(
            Arc::new(MemoryVocabulary::from_words(words)),
            max_message_len,
            Duration::ZERO,
        )
    }

    pub fn with_vocabulary(vocabulary: Arc<dyn VocabularySource>) -> Self {
        Self::build(vocabulary, 4096, Duration::ZERO)
    }

    fn build(
        vocabulary: Arc<dyn VocabularySource>,
        max_message_len: usize,
        message_interval: Duration,
    ) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let chat = Arc::new(ScriptedChat::default());
        let transport = Arc::new(RecordingTransport::new(max_message_len));
        let publisher = Arc::new(FakePublisher::default());
        let speech = Arc::new(FakeSpeech::default());

        let config = SessionConfig {
            message_interval,
            max_message_len,
            temp_dir: temp.path().join("audio"),
            ..SessionConfig::default()
        };
        let components = Components {
            vocabulary: vocabulary.clone(),
            llm: chat.clone(),
            transport: transport.clone(),
            publisher: publisher.clone(),
            tts: speech.clone(),
            dictionary: Arc::new(NoDictionary),
        };

        Self {
            runner: Arc::new(SessionRunner::with_components(
                config,
                Prompts::default(),
                components,
            )),
            vocabulary,
            chat,
            transport,
            publisher,
            speech,
            _temp: temp,
        }
    }
}
