use serde::Serialize;
use std::sync::Arc;

use crate::captions::{parse_document, CaptionDocument};
use crate::config::Config;
use crate::extractors::{build_sources, CaptionSource, VideoId};
use crate::fetch::{DocumentFetcher, HttpClient, ReqwestClient};
use crate::{CaptionError, CaptionResult, StrategyFailure};

/// Captions from the first strategy that succeeded
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedCaptions {
    pub video_id: VideoId,

    /// Name of the strategy that produced the document
    pub strategy: &'static str,

    /// Language of the fetched track
    pub language: String,

    pub document: CaptionDocument,
}

impl RetrievedCaptions {
    pub fn raw_text(&self) -> String {
        self.document.raw_text()
    }
}

/// Tries each caption strategy in order and stops at the first success.
///
/// Strategies run one after another, never concurrently: earlier ones are the
/// cheap ones. Each strategy gets a single attempt per call.
pub struct CaptionPipeline {
    sources: Vec<Box<dyn CaptionSource>>,
    fetcher: DocumentFetcher,
}

impl CaptionPipeline {
    pub fn new(sources: Vec<Box<dyn CaptionSource>>, fetcher: DocumentFetcher) -> Self {
        Self { sources, fetcher }
    }

    /// Build the pipeline from configuration using the live HTTP client
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&config.youtube)?);
        Ok(Self::with_client(config, client))
    }

    /// Build the configured strategies on top of a given transport
    pub fn with_client(config: &Config, client: Arc<dyn HttpClient>) -> Self {
        let sources = build_sources(&config.youtube, client.clone());
        Self::new(sources, DocumentFetcher::new(client))
    }

    /// Names of the strategies in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Newline-joined cue text from the first strategy that succeeds
    pub async fn retrieve(&self, video_id: &VideoId) -> CaptionResult<String> {
        Ok(self.retrieve_captions(video_id).await?.raw_text())
    }

    /// Run strategies in order. Only the aggregate failure leaves this method.
    #[tracing::instrument(skip(self, video_id), fields(video_id = %video_id))]
    pub async fn retrieve_captions(&self, video_id: &VideoId) -> CaptionResult<RetrievedCaptions> {
        let mut failures = Vec::new();

        for source in &self.sources {
            let strategy = source.name();
            tracing::debug!(strategy, "Trying caption strategy");

            match self.attempt(source.as_ref(), video_id).await {
                Ok((language, document)) => {
                    tracing::info!(
                        strategy,
                        language = %language,
                        cues = document.len(),
                        "Captions retrieved"
                    );
                    return Ok(RetrievedCaptions {
                        video_id: video_id.clone(),
                        strategy,
                        language,
                        document,
                    });
                }
                Err(error) => {
                    tracing::warn!(strategy, error = %error, "Caption strategy failed");
                    failures.push(StrategyFailure { strategy, error });
                }
            }
        }

        let error = CaptionError::ExtractionFailed(failures);
        tracing::error!(error = %error, "Caption extraction failed");
        Err(error)
    }

    async fn attempt(
        &self,
        source: &dyn CaptionSource,
        video_id: &VideoId,
    ) -> CaptionResult<(String, CaptionDocument)> {
        let track = source.locate(video_id).await?;
        let body = self.fetcher.fetch(&track).await?;
        let document = parse_document(&body)?;
        Ok((track.language_code, document))
    }
}
