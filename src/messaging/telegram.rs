//! Telegram Bot API client.

use super::{ChatId, MessageHandle, MessagingTransport, OutgoingMessage, TextFormat};
use crate::config::TelegramSettings;
use crate::error::{Result, WordcastError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Telegram rejects callback data longer than this many bytes.
const MAX_CALLBACK_DATA: usize = 64;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Prefix of the callback data carried by delete buttons.
pub const DELETE_PREFIX: &str = "del:";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Message {
    pub fn handle(&self) -> MessageHandle {
        MessageHandle {
            message_id: self.message_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// Bot API client.
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
    max_message_len: usize,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, max_message_len: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
            max_message_len,
        })
    }

    pub fn from_settings(settings: &TelegramSettings) -> Result<Self> {
        let token = settings
            .bot_token
            .as_deref()
            .ok_or_else(|| WordcastError::Config("Telegram bot token not configured (TG_BOT_TOKEN)".to_string()))?;
        Self::new(&settings.api_base, token, settings.max_message_len)
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    async fn decode<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T> {
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.ok {
            return Err(WordcastError::Messaging(format!(
                "{} failed: {}",
                method,
                envelope.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        envelope
            .result
            .ok_or_else(|| WordcastError::Messaging(format!("{} returned no result", method)))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response = self.client.post(self.url(method)).json(body).send().await?;
        Self::decode(method, response).await
    }

    /// Long-poll for updates after `offset`.
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let response = self
            .client
            .post(self.url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs + REQUEST_TIMEOUT_SECS))
            .json(&body)
            .send()
            .await?;
        Self::decode("getUpdates", response).await
    }

    /// Acknowledge a button press, showing `text` to the user.
    #[instrument(skip(self))]
    pub async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({"callback_query_id": callback_id, "text": text}),
            )
            .await?;
        Ok(())
    }
}

/// Build the `sendMessage` payload for a message.
fn message_body(chat: ChatId, message: &OutgoingMessage) -> Value {
    let mut body = json!({
        "chat_id": chat.0,
        "text": message.text,
        "link_preview_options": {"is_disabled": true},
    });

    if message.format == TextFormat::Html {
        body["parse_mode"] = json!("HTML");
    }
    if let Some(reply) = message.reply_to {
        body["reply_parameters"] = json!({
            "message_id": reply.message_id,
            "allow_sending_without_reply": true,
        });
    }
    if let Some(word) = &message.delete_word {
        let data = format!("{}{}", DELETE_PREFIX, word);
        if data.len() <= MAX_CALLBACK_DATA {
            body["reply_markup"] = json!({
                "inline_keyboard": [[{"text": format!("Delete {}", word), "callback_data": data}]]
            });
        } else {
            warn!(word = %word, "Word too long for a delete button");
        }
    }
    body
}

#[async_trait]
impl MessagingTransport for TelegramClient {
    fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    #[instrument(skip(self, message), fields(chars = message.text.chars().count()))]
    async fn send_text(&self, chat: ChatId, message: &OutgoingMessage) -> Result<MessageHandle> {
        let sent: Message = self.call("sendMessage", &message_body(chat, message)).await?;
        debug!(message_id = sent.message_id, "Message sent");
        Ok(sent.handle())
    }

    #[instrument(skip(self, caption))]
    async fn send_audio(&self, chat: ChatId, file: &Path, caption: &str) -> Result<MessageHandle> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let part = Part::bytes(bytes).file_name(file_name).mime_str("audio/mpeg")?;
        let form = Form::new()
            .text("chat_id", chat.0.to_string())
            .text("caption", caption.to_string())
            .part("audio", part);

        let response = self
            .client
            .post(self.url("sendAudio"))
            .multipart(form)
            .send()
            .await?;
        let sent: Message = Self::decode("sendAudio", response).await?;
        Ok(sent.handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sent(message_id: i64) -> Value {
        json!({"ok": true, "result": {"message_id": message_id, "chat": {"id": 42}}})
    }

    #[test]
    fn test_message_body_reply_and_button() {
        let message = OutgoingMessage::html("<b>snug</b>")
            .reply_to(MessageHandle { message_id: 7 })
            .with_delete_button("snug");
        let body = message_body(ChatId(42), &message);

        assert_eq!(body["parse_mode"], "HTML");
        assert_eq!(body["reply_parameters"]["message_id"], 7);
        assert_eq!(
            body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "del:snug"
        );
    }

    #[test]
    fn test_message_body_skips_oversized_button() {
        let long_word = "x".repeat(70);
        let body = message_body(ChatId(1), &OutgoingMessage::plain("hi").with_delete_button(long_word));
        assert!(body.get("reply_markup").is_none());
        assert!(body.get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn test_send_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 42, "text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(5)))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new(&server.uri(), "TOKEN", 4096).unwrap();
        let handle = client
            .send_text(ChatId(42), &OutgoingMessage::plain("hello"))
            .await
            .unwrap();
        assert_eq!(handle.message_id, 5);
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: can't parse entities"
            })))
            .mount(&server)
            .await;

        let client = TelegramClient::new(&server.uri(), "TOKEN", 4096).unwrap();
        let err = client
            .send_text(ChatId(1), &OutgoingMessage::html("<b>"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("can't parse entities"));
    }

    #[tokio::test]
    async fn test_send_audio_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendAudio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(9)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("vocabulary.mp3");
        std::fs::write(&file, b"ID3").unwrap();

        let client = TelegramClient::new(&server.uri(), "TOKEN", 4096).unwrap();
        let handle = client.send_audio(ChatId(42), &file, "snug, lean").await.unwrap();
        assert_eq!(handle.message_id, 9);
    }

    #[tokio::test]
    async fn test_get_updates_parses_callbacks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/getUpdates"))
            .and(body_partial_json(json!({"offset": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 42},
                        "from": {"id": 7, "first_name": "A"}, "text": "/define snug"}},
                    {"update_id": 11, "callback_query": {"id": "cb1",
                        "from": {"id": 7, "first_name": "A"}, "data": "del:snug"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = TelegramClient::new(&server.uri(), "TOKEN", 4096).unwrap();
        let updates = client.get_updates(10, 0).await.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/define snug"));
        assert_eq!(
            updates[1].callback_query.as_ref().unwrap().data.as_deref(),
            Some("del:snug")
        );
    }
}
