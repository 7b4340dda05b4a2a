use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::sync::Arc;

use crate::config::YoutubeConfig;
use crate::extractors::CaptionTrackRef;
use crate::{CaptionError, CaptionResult};

/// Single-shot GET transport. One call, no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a URL and return its body as text. Non-success statuses are errors.
    async fn get_text(&self, url: &str) -> CaptionResult<String>;
}

/// reqwest-backed client presenting a browser identity to the platform
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(config: &YoutubeConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|e| anyhow::anyhow!("Invalid accept_language header: {}", e))?,
        );

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> CaptionResult<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CaptionError::Fetch(format!("HTTP {}", response.status())));
        }

        Ok(response.text().await?)
    }
}

/// Retrieves the raw timed-text document for a located track
#[derive(Clone)]
pub struct DocumentFetcher {
    client: Arc<dyn HttpClient>,
}

impl DocumentFetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, track: &CaptionTrackRef) -> CaptionResult<String> {
        tracing::debug!(language = %track.language_code, "Fetching caption document");

        let body = self.client.get_text(&track.source_url).await?;

        if body.trim().is_empty() {
            return Err(CaptionError::Fetch("caption document is empty".to_string()));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn track() -> CaptionTrackRef {
        CaptionTrackRef {
            language_code: "ko".to_string(),
            source_url: "https://example.com/captions".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mut client = MockHttpClient::new();
        client
            .expect_get_text()
            .withf(|url| url == "https://example.com/captions")
            .times(1)
            .returning(|_| Ok("<transcript/>".to_string()));

        let fetcher = DocumentFetcher::new(Arc::new(client));
        assert_eq!(fetcher.fetch(&track()).await.unwrap(), "<transcript/>");
    }

    #[tokio::test]
    async fn test_fetch_rejects_blank_body() {
        let mut client = MockHttpClient::new();
        client
            .expect_get_text()
            .returning(|_| Ok(" \n ".to_string()));

        let fetcher = DocumentFetcher::new(Arc::new(client));
        assert!(matches!(fetcher.fetch(&track()).await, Err(CaptionError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_propagates_transport_error() {
        let mut client = MockHttpClient::new();
        client
            .expect_get_text()
            .returning(|_| Err(CaptionError::Fetch("HTTP 429 Too Many Requests".to_string())));

        let fetcher = DocumentFetcher::new(Arc::new(client));
        let err = fetcher.fetch(&track()).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_fetch_error_without_url() {
        let client = ReqwestClient::new(&Config::default().youtube).unwrap();

        let err = client
            .get_text("http://127.0.0.1:1/youtube/v3/captions?part=snippet&videoId=abc123&key=super-secret")
            .await
            .unwrap_err();

        assert!(matches!(err, CaptionError::Fetch(_)));
        let message = err.to_string();
        assert!(!message.contains("super-secret"), "{}", message);
        assert!(!message.contains("videoId=abc123"), "{}", message);
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_error() {
        // Accepted by the OS backlog but never answered
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let mut config = Config::default();
        config.youtube.request_timeout_secs = 1;
        let client = ReqwestClient::new(&config.youtube).unwrap();

        let err = client
            .get_text(&format!("http://{}/api/timedtext?key=super-secret", address))
            .await
            .unwrap_err();

        match err {
            CaptionError::Fetch(message) => {
                assert!(message.contains("timed out"), "{}", message);
                assert!(!message.contains("super-secret"), "{}", message);
            }
            other => panic!("expected a fetch error, got {:?}", other),
        }

        drop(listener);
    }

    #[test]
    fn test_reqwest_client_builds_from_default_config() {
        assert!(ReqwestClient::new(&Config::default().youtube).is_ok());
    }

    #[test]
    fn test_reqwest_client_rejects_invalid_header() {
        let mut config = Config::default();
        config.youtube.accept_language = "ko\nKR".to_string();
        assert!(ReqwestClient::new(&config.youtube).is_err());
    }
}
