use async_trait::async_trait;
use url::Url;

use super::{CaptionSource, CaptionTrackRef, VideoId};
use crate::config::YoutubeConfig;
use crate::{CaptionError, CaptionResult};

/// Last-resort source: asks the unofficial timed-text endpoint directly for
/// the preferred language, without discovering tracks first.
pub struct TimedTextSource {
    timedtext_url: String,
    language: String,
}

impl TimedTextSource {
    pub fn new(config: &YoutubeConfig) -> Self {
        Self {
            timedtext_url: config.endpoints.timedtext_url.clone(),
            language: config.preferred_language.clone(),
        }
    }
}

#[async_trait]
impl CaptionSource for TimedTextSource {
    fn name(&self) -> &'static str {
        "timedtext"
    }

    async fn locate(&self, video_id: &VideoId) -> CaptionResult<CaptionTrackRef> {
        let url = Url::parse_with_params(
            &self.timedtext_url,
            &[("lang", self.language.as_str()), ("v", video_id.as_str())],
        )
        .map_err(|e| CaptionError::LocatorParse(format!("bad timed-text URL: {}", e)))?;

        Ok(CaptionTrackRef {
            language_code: self.language.clone(),
            source_url: url.into(),
        })
    }
}
