use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use url::Url;

use super::{select_track, CaptionSource, CaptionTrackRef, VideoId};
use crate::config::YoutubeConfig;
use crate::fetch::HttpClient;
use crate::{CaptionError, CaptionResult};

fn player_response_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"ytInitialPlayerResponse\s*=\s*").expect("static regex is valid")
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    captions: Option<PlayerCaptions>,
    playability_status: Option<PlayabilityStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCaptions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<PlayerCaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCaptionTrack {
    base_url: String,
    language_code: String,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

/// Scrapes the player state JSON embedded in the watch page
pub struct PlayerResponseSource {
    client: Arc<dyn HttpClient>,
    watch_url: String,
    preferred_language: String,
}

impl PlayerResponseSource {
    pub fn new(client: Arc<dyn HttpClient>, config: &YoutubeConfig) -> Self {
        Self {
            client,
            watch_url: config.endpoints.watch_url.clone(),
            preferred_language: config.preferred_language.clone(),
        }
    }

    fn page_url(&self, video_id: &VideoId) -> String {
        format!("{}?v={}", self.watch_url, urlencoding::encode(video_id.as_str()))
    }

    /// Resolve a track URL, which upstream sometimes gives relative to the page
    fn resolve_track_url(&self, base_url: &str) -> CaptionResult<String> {
        let resolved = match Url::parse(base_url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&self.watch_url)
                .and_then(|page| page.join(base_url))
                .map_err(|e| CaptionError::LocatorParse(format!("bad track URL: {}", e)))?,
            Err(e) => return Err(CaptionError::LocatorParse(format!("bad track URL: {}", e))),
        };

        Ok(resolved.to_string())
    }
}

/// Find the embedded player state and deserialize exactly one JSON value after
/// it. Pages may assign the variable more than once (`= null` placeholders),
/// so the first assignment that decodes wins.
fn extract_player_response(html: &str) -> CaptionResult<PlayerResponse> {
    let mut last_error = CaptionError::LocatorParse("ytInitialPlayerResponse not found".to_string());

    for marker in player_response_marker().find_iter(html) {
        let mut values = serde_json::Deserializer::from_str(&html[marker.end()..])
            .into_iter::<PlayerResponse>();

        match values.next() {
            Some(Ok(response)) => return Ok(response),
            Some(Err(e)) => {
                last_error = CaptionError::LocatorParse(format!(
                    "ytInitialPlayerResponse is not valid JSON: {}",
                    e
                ));
            }
            None => {
                last_error = CaptionError::LocatorParse("ytInitialPlayerResponse is empty".to_string());
            }
        }
    }

    Err(last_error)
}

fn caption_tracks(response: PlayerResponse) -> Vec<PlayerCaptionTrack> {
    response
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .map(|r| r.caption_tracks)
        .unwrap_or_default()
}

#[async_trait]
impl CaptionSource for PlayerResponseSource {
    fn name(&self) -> &'static str {
        "player_response"
    }

    async fn locate(&self, video_id: &VideoId) -> CaptionResult<CaptionTrackRef> {
        let html = self.client.get_text(&self.page_url(video_id)).await?;
        let response = extract_player_response(&html)?;

        if let Some(status) = &response.playability_status {
            if status.status.as_deref() != Some("OK") {
                tracing::debug!(
                    video_id = %video_id,
                    status = ?status.status,
                    reason = ?status.reason,
                    "Video is not playable"
                );
            }
        }

        let tracks = caption_tracks(response)
            .into_iter()
            .map(|t| -> CaptionResult<CaptionTrackRef> {
                Ok(CaptionTrackRef {
                    language_code: t.language_code,
                    source_url: self.resolve_track_url(&t.base_url)?,
                })
            })
            .collect::<CaptionResult<Vec<_>>>()?;

        tracing::debug!(video_id = %video_id, tracks = tracks.len(), "Found caption tracks in page");

        select_track(tracks, &self.preferred_language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::MockHttpClient;

    fn page_with(player_response: &str) -> String {
        format!(
            r#"<html><head><script>var ytInitialPlayerResponse = {};var meta = {{"x":1}};</script></head><body></body></html>"#,
            player_response
        )
    }

    fn source_returning(html: String) -> PlayerResponseSource {
        let mut client = MockHttpClient::new();
        client
            .expect_get_text()
            .withf(|url| url == "https://www.youtube.com/watch?v=abc123")
            .times(1)
            .returning(move |_| Ok(html.clone()));

        PlayerResponseSource::new(Arc::new(client), &Config::default().youtube)
    }

    #[tokio::test]
    async fn test_locate_prefers_korean_track() {
        let html = page_with(
            r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[
                {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc123&lang=en","languageCode":"en"},
                {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc123&lang=ko","languageCode":"ko","kind":"asr"}
            ]}},"playabilityStatus":{"status":"OK"}}"#,
        );

        let track = source_returning(html)
            .locate(&VideoId::parse("abc123").unwrap())
            .await
            .unwrap();

        assert_eq!(track.language_code, "ko");
        assert_eq!(
            track.source_url,
            "https://www.youtube.com/api/timedtext?v=abc123&lang=ko"
        );
    }

    #[tokio::test]
    async fn test_locate_falls_back_to_first_track() {
        let html = page_with(
            r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[
                {"baseUrl":"https://example.com/en","languageCode":"en"},
                {"baseUrl":"https://example.com/ja","languageCode":"ja"}
            ]}}}"#,
        );

        let track = source_returning(html)
            .locate(&VideoId::parse("abc123").unwrap())
            .await
            .unwrap();

        assert_eq!(track.language_code, "en");
    }

    #[tokio::test]
    async fn test_locate_resolves_relative_track_url() {
        let html = page_with(
            r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[
                {"baseUrl":"/api/timedtext?v=abc123&lang=ko","languageCode":"ko"}
            ]}}}"#,
        );

        let track = source_returning(html)
            .locate(&VideoId::parse("abc123").unwrap())
            .await
            .unwrap();

        assert_eq!(
            track.source_url,
            "https://www.youtube.com/api/timedtext?v=abc123&lang=ko"
        );
    }

    #[tokio::test]
    async fn test_locate_without_captions() {
        let html = page_with(r#"{"playabilityStatus":{"status":"OK"}}"#);

        let result = source_returning(html)
            .locate(&VideoId::parse("abc123").unwrap())
            .await;

        assert!(matches!(result, Err(CaptionError::NoTracksFound)));
    }

    #[tokio::test]
    async fn test_locate_with_empty_track_list() {
        let html = page_with(r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[]}}}"#);

        let result = source_returning(html)
            .locate(&VideoId::parse("abc123").unwrap())
            .await;

        assert!(matches!(result, Err(CaptionError::NoTracksFound)));
    }

    #[tokio::test]
    async fn test_locate_without_marker() {
        let result = source_returning("<html>consent page</html>".to_string())
            .locate(&VideoId::parse("abc123").unwrap())
            .await;

        assert!(matches!(result, Err(CaptionError::LocatorParse(_))));
    }

    #[tokio::test]
    async fn test_locate_with_truncated_json() {
        let html = "<script>var ytInitialPlayerResponse = {\"captions\": {".to_string();

        let result = source_returning(html)
            .locate(&VideoId::parse("abc123").unwrap())
            .await;

        assert!(matches!(result, Err(CaptionError::LocatorParse(_))));
    }

    #[test]
    fn test_extract_skips_null_placeholder() {
        let html = format!(
            "<script>window.ytInitialPlayerResponse = null;</script>{}",
            page_with(r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.com/x","languageCode":"ko"}]}}}"#)
        );

        let response = extract_player_response(&html).unwrap();
        assert_eq!(caption_tracks(response).len(), 1);
    }

    #[test]
    fn test_extract_handles_braces_inside_strings() {
        let html = page_with(
            r#"{"videoDetails":{"title":"a }; b"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.com/x","languageCode":"ko"}]}}}"#,
        );

        let response = extract_player_response(&html).unwrap();
        assert_eq!(caption_tracks(response).len(), 1);
    }
}
