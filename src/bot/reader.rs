//! Web page to Markdown through the r.jina.ai reader.

use crate::error::{Result, WordcastError};
use std::time::Duration;
use tracing::instrument;
use url::Url;

pub const JINA_READER_BASE: &str = "https://r.jina.ai";

pub struct Reader {
    client: reqwest::Client,
    base: String,
}

impl Reader {
    pub fn new(base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch `target` as Markdown.
    #[instrument(skip(self))]
    pub async fn fetch(&self, target: &str) -> Result<String> {
        let target = Url::parse(target.trim())
            .map_err(|e| WordcastError::InvalidInput(format!("'{}' is not a URL: {}", target, e)))?;
        if !matches!(target.scheme(), "http" | "https") {
            return Err(WordcastError::InvalidInput(format!(
                "Unsupported scheme: {}",
                target.scheme()
            )));
        }

        let response = self
            .client
            .get(format!("{}/{}", self.base, target))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WordcastError::InvalidInput(format!(
                "Reader returned status {}",
                status
            )));
        }
        Ok(response.text().await?)
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            base: JINA_READER_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/https://example.com/post"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Post\n\nBody"))
            .mount(&server)
            .await;

        let reader = Reader::new(&server.uri()).unwrap();
        let markdown = tokio_test::assert_ok!(reader.fetch("https://example.com/post").await);
        assert_eq!(markdown, "# Post\n\nBody");
        tokio_test::assert_err!(reader.fetch("https://example.com/missing").await);
    }

    #[tokio::test]
    async fn test_rejects_non_urls() {
        let reader = Reader::default();
        assert!(matches!(
            reader.fetch("not a url").await,
            Err(WordcastError::InvalidInput(_))
        ));
        assert!(matches!(
            reader.fetch("ftp://example.com/file").await,
            Err(WordcastError::InvalidInput(_))
        ));
    }
}
