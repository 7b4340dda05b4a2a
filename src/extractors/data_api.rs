use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use super::{select_track, CaptionSource, CaptionTrackRef, VideoId};
use crate::config::YoutubeConfig;
use crate::fetch::HttpClient;
use crate::{CaptionError, CaptionResult};

#[derive(Debug, Deserialize)]
struct CaptionListResponse {
    items: Option<Vec<CaptionItem>>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    snippet: CaptionSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionSnippet {
    language: String,
    track_kind: Option<String>,
}

/// Lists tracks through the official captions API.
///
/// Downloading a track through that API needs OAuth, so the chosen track is
/// fetched from the timed-text endpoint by language instead.
pub struct DataApiSource {
    client: Arc<dyn HttpClient>,
    api_url: String,
    timedtext_url: String,
    api_key: String,
    preferred_language: String,
}

impl DataApiSource {
    pub fn new(client: Arc<dyn HttpClient>, config: &YoutubeConfig, api_key: String) -> Self {
        Self {
            client,
            api_url: config.endpoints.captions_api_url.clone(),
            timedtext_url: config.endpoints.timedtext_url.clone(),
            api_key,
            preferred_language: config.preferred_language.clone(),
        }
    }

    fn list_url(&self, video_id: &VideoId) -> CaptionResult<String> {
        Url::parse_with_params(
            &self.api_url,
            &[
                ("part", "snippet"),
                ("videoId", video_id.as_str()),
                ("key", self.api_key.as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| CaptionError::LocatorParse(format!("bad captions API URL: {}", e)))
    }

    fn track_url(&self, video_id: &VideoId, snippet: &CaptionSnippet) -> CaptionResult<String> {
        let mut params = vec![("v", video_id.as_str()), ("lang", snippet.language.as_str())];
        if snippet.track_kind.as_deref() == Some("asr") {
            params.push(("kind", "asr"));
        }

        Url::parse_with_params(&self.timedtext_url, &params)
            .map(String::from)
            .map_err(|e| CaptionError::LocatorParse(format!("bad timed-text URL: {}", e)))
    }
}

#[async_trait]
impl CaptionSource for DataApiSource {
    fn name(&self) -> &'static str {
        "data_api"
    }

    async fn locate(&self, video_id: &VideoId) -> CaptionResult<CaptionTrackRef> {
        // The list URL carries the key and is deliberately never logged
        let body = self.client.get_text(&self.list_url(video_id)?).await?;

        let listing: CaptionListResponse = serde_json::from_str(&body).map_err(|e| {
            CaptionError::LocatorParse(format!("unexpected captions API payload: {}", e))
        })?;

        let items = listing.items.ok_or_else(|| {
            CaptionError::LocatorParse("captions API payload has no items".to_string())
        })?;

        tracing::debug!(video_id = %video_id, tracks = items.len(), "Captions API listed tracks");

        let tracks = items
            .iter()
            .map(|item| -> CaptionResult<CaptionTrackRef> {
                Ok(CaptionTrackRef {
                    language_code: item.snippet.language.clone(),
                    source_url: self.track_url(video_id, &item.snippet)?,
                })
            })
            .collect::<CaptionResult<Vec<_>>>()?;

        select_track(tracks, &self.preferred_language)
    }
}
