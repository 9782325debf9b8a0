//! Telegraph (telegra.ph) publishing.

use super::{Page, Publisher};
use crate::config::PublishSettings;
use crate::error::{Result, WordcastError};
use crate::markdown::content_size;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Telegraph rejects page content above 64 KB.
const MAX_CONTENT_BYTES: usize = 64 * 1024;
const MAX_TITLE_CHARS: usize = 256;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PageResult {
    url: String,
}

/// Publishes pages to Telegraph, creating an account on first use if no
/// access token is configured.
pub struct TelegraphPublisher {
    client: reqwest::Client,
    api_base: String,
    short_name: String,
    access_token: OnceCell<String>,
}

impl TelegraphPublisher {
    pub fn new(api_base: &str, access_token: Option<String>, short_name: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let cell = match access_token {
            Some(token) => OnceCell::new_with(Some(token)),
            None => OnceCell::new(),
        };
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            short_name: short_name.to_string(),
            access_token: cell,
        })
    }

    pub fn from_settings(settings: &PublishSettings) -> Result<Self> {
        Self::new(
            &settings.api_base,
            settings.access_token.clone(),
            &settings.short_name,
        )
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.api_base, method))
            .json(body)
            .send()
            .await?;
        let envelope: Envelope<T> = response.json().await?;
        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(WordcastError::Publish(format!(
                "{}: {}",
                method,
                envelope.error.unwrap_or_else(|| "unknown error".to_string())
            ))),
        }
    }

    async fn token(&self) -> Result<&str> {
        let token = self
            .access_token
            .get_or_try_init(|| async {
                let account: Account = self
                    .call("createAccount", &json!({"short_name": self.short_name}))
                    .await?;
                info!("Created Telegraph account");
                Ok::<_, WordcastError>(account.access_token)
            })
            .await?;
        Ok(token.as_str())
    }
}

#[async_trait]
impl Publisher for TelegraphPublisher {
    #[instrument(skip(self, page), fields(title = %page.title))]
    async fn publish(&self, page: &Page) -> Result<String> {
        let size = content_size(&page.content);
        if size > MAX_CONTENT_BYTES {
            return Err(WordcastError::Publish(format!(
                "content is {} bytes, limit is {}",
                size, MAX_CONTENT_BYTES
            )));
        }

        let token = self.token().await?;
        let title: String = page.title.chars().take(MAX_TITLE_CHARS).collect();
        let result: PageResult = self
            .call(
                "createPage",
                &json!({
                    "access_token": token,
                    "title": title,
                    "content": page.content,
                    "return_content": false,
                }),
            )
            .await?;

        debug!(url = %result.url, "Published page");
        Ok(result.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::to_nodes;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page() -> Page {
        Page::new("Glossary - test", to_nodes("A **snug** story"))
    }

    #[tokio::test]
    async fn test_creates_account_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createAccount"))
            .and(body_partial_json(json!({"short_name": "anonymous"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": {"access_token": "abc", "short_name": "anonymous"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/createPage"))
            .and(body_partial_json(json!({"access_token": "abc", "title": "Glossary - test"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": {"url": "https://telegra.ph/Glossary-test-01-01", "path": "Glossary-test-01-01"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let publisher = TelegraphPublisher::new(&server.uri(), None, "anonymous").unwrap();
        assert_eq!(
            publisher.publish(&page()).await.unwrap(),
            "https://telegra.ph/Glossary-test-01-01"
        );
        publisher.publish(&page()).await.unwrap();
    }

    #[tokio::test]
    async fn test_configured_token_skips_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createPage"))
            .and(body_partial_json(json!({"access_token": "preset"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": {"url": "https://telegra.ph/x"}
            })))
            .mount(&server)
            .await;

        let publisher =
            TelegraphPublisher::new(&server.uri(), Some("preset".to_string()), "anonymous").unwrap();
        assert_eq!(publisher.publish(&page()).await.unwrap(), "https://telegra.ph/x");
    }

    #[tokio::test]
    async fn test_rejection_is_publish_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createPage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false, "error": "CONTENT_FORMAT_INVALID"
            })))
            .mount(&server)
            .await;

        let publisher =
            TelegraphPublisher::new(&server.uri(), Some("t".to_string()), "anonymous").unwrap();
        let err = publisher.publish(&page()).await.unwrap_err();
        assert!(matches!(err, WordcastError::Publish(ref m) if m.contains("CONTENT_FORMAT_INVALID")));
    }

    #[tokio::test]
    async fn test_oversized_content_rejected_locally() {
        let publisher =
            TelegraphPublisher::new("http://127.0.0.1:9", Some("t".to_string()), "anonymous").unwrap();
        let huge = Page::new("big", to_nodes(&"word ".repeat(20_000)));
        assert!(matches!(
            publisher.publish(&huge).await,
            Err(WordcastError::Publish(_))
        ));
    }
}
