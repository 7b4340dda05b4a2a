//! ytjamak - YouTube caption extraction and clean-up
//!
//! This library retrieves timed captions for a video by trying several
//! extraction strategies in order (embedded player state, the official
//! captions API, the bare timed-text endpoint) and turns the raw caption
//! fragments into punctuated, one-sentence-per-line text.

pub mod captions;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod fetch;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod utils;

pub use captions::{CaptionCue, CaptionDocument};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{CaptionSource, CaptionTrackRef, VideoId};
pub use normalize::{normalize, NormalizedCaption};
pub use pipeline::{CaptionPipeline, RetrievedCaptions};

/// Result type used for application plumbing (config, CLI, server bootstrap)
pub type Result<T> = anyhow::Result<T>;

/// Result type used by the caption retrieval and normalization path
pub type CaptionResult<T> = std::result::Result<T, CaptionError>;

/// Error types specific to caption retrieval and clean-up
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No caption tracks found")]
    NoTracksFound,

    #[error("Unrecognized upstream structure: {0}")]
    LocatorParse(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Caption document could not be parsed: {0}")]
    Parse(String),

    #[error("All caption strategies failed: {}", summarize_failures(.0))]
    ExtractionFailed(Vec<StrategyFailure>),
}

/// One strategy's failure, kept for logging when every strategy is exhausted
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub error: CaptionError,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

fn summarize_failures(failures: &[StrategyFailure]) -> String {
    if failures.is_empty() {
        return "no strategies configured".to_string();
    }

    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Request URLs can carry the API key, so they are stripped from the message
impl From<reqwest::Error> for CaptionError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            CaptionError::Fetch(format!("request timed out: {}", err))
        } else {
            CaptionError::Fetch(err.to_string())
        }
    }
}
