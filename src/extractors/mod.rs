use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

pub mod data_api;
pub mod player_response;
pub mod timedtext;

use crate::config::YoutubeConfig;
use crate::fetch::HttpClient;
use crate::{CaptionError, CaptionResult};

const MAX_VIDEO_ID_LEN: usize = 64;

/// Platform video identifier, validated on construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accept either a bare identifier or any of the common watch URL shapes
    pub fn parse(input: &str) -> CaptionResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CaptionError::InvalidInput("videoId is required".to_string()));
        }

        let candidate = if looks_like_url(input) {
            id_from_url(input).ok_or_else(|| {
                CaptionError::InvalidInput(format!("no video id in URL: {}", input))
            })?
        } else {
            input.to_string()
        };

        if !is_valid_shape(&candidate) {
            return Err(CaptionError::InvalidInput(format!(
                "malformed video id: {}",
                candidate
            )));
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn looks_like_url(input: &str) -> bool {
    input.contains("://") || input.contains('/')
}

fn id_from_url(input: &str) -> Option<String> {
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_lowercase();
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if host.ends_with("youtu.be") {
        return segments.next().map(str::to_string);
    }

    if !host.ends_with("youtube.com") && !host.ends_with("youtube-nocookie.com") {
        return None;
    }

    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        return Some(v.into_owned());
    }

    match segments.next()? {
        "shorts" | "embed" | "live" | "v" => segments.next().map(str::to_string),
        _ => None,
    }
}

fn is_valid_shape(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_VIDEO_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Where to fetch one caption track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrackRef {
    pub language_code: String,
    pub source_url: String,
}

/// The acquisition strategies, in the names used by config and CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Scrape the player state embedded in the watch page
    PlayerResponse,
    /// List tracks through the official captions API
    DataApi,
    /// Ask the bare timed-text endpoint for the preferred language
    Timedtext,
}

impl StrategyKind {
    pub fn default_order() -> Vec<Self> {
        vec![
            StrategyKind::PlayerResponse,
            StrategyKind::DataApi,
            StrategyKind::Timedtext,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::PlayerResponse => "player_response",
            StrategyKind::DataApi => "data_api",
            StrategyKind::Timedtext => "timedtext",
        }
    }
}

/// Locates a caption track for a video using one acquisition strategy
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Strategy name used in logs and failure reports
    fn name(&self) -> &'static str;

    /// Find the track to fetch for this video
    async fn locate(&self, video_id: &VideoId) -> CaptionResult<CaptionTrackRef>;
}

/// Pick the track in the preferred language, else the first one upstream listed
pub fn select_track(
    tracks: Vec<CaptionTrackRef>,
    preferred_language: &str,
) -> CaptionResult<CaptionTrackRef> {
    let position = tracks
        .iter()
        .position(|t| t.language_code == preferred_language)
        .unwrap_or(0);

    tracks
        .into_iter()
        .nth(position)
        .ok_or(CaptionError::NoTracksFound)
}

/// Build the configured sources in order. `data_api` is skipped without a key.
pub fn build_sources(
    config: &YoutubeConfig,
    client: Arc<dyn HttpClient>,
) -> Vec<Box<dyn CaptionSource>> {
    let mut sources: Vec<Box<dyn CaptionSource>> = Vec::new();

    for kind in &config.strategies {
        match kind {
            StrategyKind::PlayerResponse => sources.push(Box::new(
                player_response::PlayerResponseSource::new(client.clone(), config),
            )),
            StrategyKind::DataApi => match &config.api_key {
                Some(key) if !key.trim().is_empty() => sources.push(Box::new(
                    data_api::DataApiSource::new(client.clone(), config, key.clone()),
                )),
                _ => tracing::warn!(
                    strategy = kind.as_str(),
                    "No API key configured, skipping strategy"
                ),
            },
            StrategyKind::Timedtext => sources.push(Box::new(
                timedtext::TimedTextSource::new(config),
            )),
        }
    }

    sources
}
