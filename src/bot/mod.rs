//! Telegram bot: update polling and command dispatch.
//!
//! Privileged commands are gated here; everything behind the dispatcher
//! assumes an authorized caller.

mod command;
mod reader;

pub use command::{split_words, BotCommand, HELP};
pub use reader::{Reader, JINA_READER_BASE};

use crate::config::Settings;
use crate::error::Result;
use crate::links::pronunciation_url;
use crate::messaging::{
    CallbackQuery, ChatId, Message, OutgoingMessage, TelegramClient, Update, DELETE_PREFIX,
};
use crate::scheduler::Scheduler;
use crate::session::SessionRunner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

const CHAT_SYSTEM_PROMPT: &str =
    "You are a knowledgeable assistant. Answer thoroughly in Markdown, starting with a `#` title.";
const RETRY_DELAY: Duration = Duration::from_secs(5);
const TITLE_CHARS: usize = 60;

/// Polls Telegram and dispatches commands.
pub struct Bot {
    client: Arc<TelegramClient>,
    runner: Arc<SessionRunner>,
    scheduler: Scheduler,
    reader: Reader,
    settings: Settings,
}

impl Bot {
    /// Build the bot from settings, sending through Telegram.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Arc::new(TelegramClient::from_settings(&settings.telegram)?);
        let runner = Arc::new(SessionRunner::new(settings, client.clone())?);
        Self::with_parts(settings, client, runner, Reader::new(JINA_READER_BASE)?)
    }

    pub fn with_parts(
        settings: &Settings,
        client: Arc<TelegramClient>,
        runner: Arc<SessionRunner>,
        reader: Reader,
    ) -> Result<Self> {
        let scheduler = Scheduler::new(runner.clone(), settings.schedule.clone())?;
        if settings.telegram.allowed_user_ids.is_empty() {
            warn!("No allowed users configured (TG_IDS); privileged commands are disabled");
        }
        Ok(Self {
            client,
            runner,
            scheduler,
            reader,
            settings: settings.clone(),
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Poll for updates until the task is cancelled.
    pub async fn run(&self) -> Result<()> {
        info!("Bot polling started");
        let timeout = self.settings.telegram.poll_timeout_seconds;
        let mut offset = 0;
        loop {
            match self.client.get_updates(offset, timeout).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Polling failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    pub async fn handle_update(&self, update: Update) {
        if let Some(message) = &update.message {
            self.handle_message(message).await;
        } else if let Some(query) = &update.callback_query {
            self.handle_callback(query).await;
        }
    }

    async fn reply(&self, message: &Message, text: impl Into<String>) {
        let transport = &self.runner.components().transport;
        let text: String = text.into();
        let text: String = text.chars().take(transport.max_message_len()).collect();
        let outgoing = OutgoingMessage::plain(text).reply_to(message.handle());
        if let Err(e) = transport.send_text(ChatId(message.chat.id), &outgoing).await {
            error!(error = %e, "Failed to reply");
        }
    }

    async fn handle_message(&self, message: &Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let command = match BotCommand::parse(text) {
            Some(Ok(command)) => command,
            Some(Err(usage)) => return self.reply(message, usage).await,
            None => return,
        };

        let user_id = message.from.as_ref().map(|u| u.id).unwrap_or_default();
        if command.requires_authorization() && !self.settings.is_allowed_user(user_id) {
            warn!(user_id, command = ?command, "Unauthorized command");
            return self.reply(message, PERMISSION_DENIED).await;
        }

        debug!(user_id, command = ?command, "Dispatching command");
        self.dispatch(message, command).await;
    }

    async fn dispatch(&self, message: &Message, command: BotCommand) {
        let chat = ChatId(message.chat.id);
        let components = self.runner.components();

        match command {
            BotCommand::Help => self.reply(message, HELP).await,
            BotCommand::Set => match self.scheduler.schedule(chat).await {
                Ok(_) => self.reply(message, "Timer successfully set!").await,
                Err(e) => self.reply(message, format!("set failed: {}", e)).await,
            },
            BotCommand::Define(word) => {
                if let Err(e) = self.runner.define(chat, &word, Some(message.handle())).await {
                    self.reply(message, format!("explain {} failed: {}", word, e)).await;
                }
            }
            BotCommand::Audio(text) => {
                self.reply(message, pronunciation_url(&text, true)).await;
                if let Err(e) = self.runner.narrate(chat, &text, &text).await {
                    self.reply(message, format!("audio failed: {}", e)).await;
                }
            }
            BotCommand::Add(words) => {
                match components.vocabulary.add(&words).await {
                    Ok(ack) => self.reply(message, ack).await,
                    Err(e) => return self.reply(message, format!("add failed: {}", e)).await,
                }
                let prompts = self.runner.prompts();
                match components
                    .llm
                    .complete(&prompts.explanation_system(), &prompts.explanation_batch(&words))
                    .await
                {
                    Ok(explanation) => {
                        self.publish_and_reply(message, &words.join(", "), &explanation)
                            .await
                    }
                    Err(e) => self.reply(message, format!("explain failed: {}", e)).await,
                }
            }
            BotCommand::Remove(words) => match components.vocabulary.remove(&words).await {
                Ok(true) => self.reply(message, format!("Removed: {}", words.join(", "))).await,
                Ok(false) => {
                    self.reply(message, format!("Remove failed: {}", words.join(", ")))
                        .await
                }
                Err(e) => self.reply(message, format!("remove failed: {}", e)).await,
            },
            BotCommand::Mdict(word) => {
                let text = components.dictionary.lookup(&word);
                if text.is_empty() {
                    self.reply(message, format!("No entry for {} in the local dictionary.", word))
                        .await;
                } else {
                    self.reply(message, text).await;
                }
            }
            BotCommand::Chat(question) => {
                match components.llm.complete(CHAT_SYSTEM_PROMPT, &question).await {
                    Ok(answer) => self.publish_and_reply(message, &question, &answer).await,
                    Err(e) => self.reply(message, format!("chat failed: {}", e)).await,
                }
            }
            BotCommand::Jina(url) => match self.reader.fetch(&url).await {
                Ok(markdown) => self.publish_and_reply(message, &url, &markdown).await,
                Err(e) => self.reply(message, format!("fetch failed: {}", e)).await,
            },
        }
    }

    async fn publish_and_reply(&self, message: &Message, title: &str, markdown: &str) {
        let title: String = title.chars().take(TITLE_CHARS).collect();
        // publish_markdown reports its own failure
        if let Some(url) = self
            .runner
            .publish_markdown(ChatId(message.chat.id), &title, markdown)
            .await
        {
            self.reply(message, url).await;
        }
    }

    async fn handle_callback(&self, query: &CallbackQuery) {
        let Some(word) = query
            .data
            .as_deref()
            .and_then(|d| d.strip_prefix(DELETE_PREFIX))
        else {
            return;
        };

        let answer = if !self.settings.is_allowed_user(query.from.id) {
            warn!(user_id = query.from.id, "Unauthorized delete");
            PERMISSION_DENIED.to_string()
        } else {
            match self
                .runner
                .components()
                .vocabulary
                .remove(&[word.to_string()])
                .await
            {
                Ok(true) => format!("Deleted : {}", word),
                Ok(false) => format!("Delete failed : {}", word),
                Err(e) => {
                    error!(error = %e, word, "Delete failed");
                    format!("Delete failed : {}", word)
                }
            }
        };

        if let Err(e) = self.client.answer_callback(&query.id, &answer).await {
            error!(error = %e, "Failed to answer callback");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{Chat, User, MAX_CAPTION_LEN};
    use crate::session::testing::Harness;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OWNER: i64 = 7;
    const STRANGER: i64 = 8;

    fn bot(harness: &Harness, telegram: &MockServer) -> Bot {
        let mut settings = Settings::default();
        settings.telegram.allowed_user_ids = vec![OWNER];
        settings.schedule.initial_delay_seconds = 3600;
        let client = Arc::new(TelegramClient::new(&telegram.uri(), "TOKEN", 4096).unwrap());
        Bot::with_parts(&settings, client, harness.runner.clone(), Reader::default()).unwrap()
    }

    fn message(from: i64, text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                message_id: 100,
                chat: Chat { id: 42 },
                from: Some(User {
                    id: from,
                    username: None,
                    first_name: "U".to_string(),
                }),
                text: Some(text.to_string()),
            }),
            callback_query: None,
        }
    }

    fn callback(from: i64, data: &str) -> Update {
        Update {
            update_id: 2,
            message: None,
            callback_query: Some(CallbackQuery {
                id: "cb".to_string(),
                from: User {
                    id: from,
                    username: None,
                    first_name: "U".to_string(),
                },
                message: None,
                data: Some(data.to_string()),
            }),
        }
    }

    async fn words(harness: &Harness) -> Vec<String> {
        harness
            .vocabulary
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.word)
            .collect()
    }

    #[tokio::test]
    async fn test_unauthorized_add_is_refused() {
        let telegram = MockServer::start().await;
        let harness = Harness::new(["snug"]);
        let bot = bot(&harness, &telegram);

        bot.handle_update(message(STRANGER, "/add lean")).await;

        let texts = harness.transport.texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text, PERMISSION_DENIED);
        assert_eq!(words(&harness).await, vec!["snug"]);
    }

    #[tokio::test]
    async fn test_add_publishes_explanation() {
        let telegram = MockServer::start().await;
        let harness = Harness::new(["snug"]);
        let bot = bot(&harness, &telegram);

        bot.handle_update(message(OWNER, "/add lean, flounce")).await;

        assert_eq!(words(&harness).await, vec!["snug", "lean", "flounce"]);
        let texts = harness.transport.texts();
        assert_eq!(texts[0].text, "Added 2 word(s)");
        assert_eq!(texts[1].text, crate::session::testing::FakePublisher::URL);
        assert_eq!(harness.publisher.pages()[0].title, "lean, flounce");
    }

    #[tokio::test]
    async fn test_remove_reports_outcome() {
        let telegram = MockServer::start().await;
        let harness = Harness::new(["snug", "lean"]);
        let bot = bot(&harness, &telegram);

        bot.handle_update(message(OWNER, "/remove lean")).await;
        bot.handle_update(message(OWNER, "/remove missing")).await;

        let texts = harness.transport.texts();
        assert_eq!(texts[0].text, "Removed: lean");
        assert_eq!(texts[1].text, "Remove failed: missing");
        assert_eq!(words(&harness).await, vec!["snug"]);
    }

    #[tokio::test]
    async fn test_public_commands_and_usage() {
        let telegram = MockServer::start().await;
        let harness = Harness::new(["snug"]);
        let bot = bot(&harness, &telegram);

        bot.handle_update(message(STRANGER, "/mdict snug")).await;
        bot.handle_update(message(STRANGER, "/define")).await;
        bot.handle_update(message(STRANGER, "just chatting")).await;

        let texts = harness.transport.texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].text, "No entry for snug in the local dictionary.");
        assert_eq!(texts[1].text, "Usage: /define <word>");
        assert_eq!(texts[1].reply_to.map(|h| h.message_id), Some(100));
    }

    #[tokio::test]
    async fn test_audio_caption_fits_limit() {
        let telegram = MockServer::start().await;
        let harness = Harness::new(["snug"]);
        let bot = bot(&harness, &telegram);

        let long_text = "word ".repeat(400);
        bot.handle_update(message(STRANGER, &format!("/audio {}", long_text)))
            .await;

        let audio = harness.transport.audio();
        assert_eq!(audio.len(), 1);
        assert!(audio[0].caption.chars().count() <= MAX_CAPTION_LEN);
        assert!(audio[0].caption.starts_with("word word"));
        assert_eq!(harness.speech.texts(), vec![long_text.trim().to_string()]);
    }

    #[tokio::test]
    async fn test_set_schedules_triggers() {
        let telegram = MockServer::start().await;
        let harness = Harness::new(["snug"]);
        let bot = bot(&harness, &telegram);

        bot.handle_update(message(OWNER, "/set")).await;

        assert_eq!(harness.transport.texts()[0].text, "Timer successfully set!");
        assert_eq!(bot.scheduler().pending().await, 2);
        bot.scheduler().cancel().await;
    }

    #[tokio::test]
    async fn test_delete_callback() {
        let telegram = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/answerCallbackQuery"))
            .and(body_partial_json(json!({"callback_query_id": "cb", "text": "Deleted : snug"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
            .expect(1)
            .mount(&telegram)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/answerCallbackQuery"))
            .and(body_partial_json(json!({"text": PERMISSION_DENIED})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
            .expect(1)
            .mount(&telegram)
            .await;

        let harness = Harness::new(["snug", "lean"]);
        let bot = bot(&harness, &telegram);

        bot.handle_update(callback(STRANGER, "del:lean")).await;
        bot.handle_update(callback(OWNER, "del:snug")).await;

        assert_eq!(words(&harness).await, vec!["lean"]);
    }
}
