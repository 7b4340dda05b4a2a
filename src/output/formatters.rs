use anyhow::Result;
use chrono::Duration;
use serde::Serialize;

use crate::captions::{CaptionCue, CaptionDocument};
use crate::normalize::normalize;
use crate::pipeline::RetrievedCaptions;
use crate::utils::format_timestamp;

#[derive(Serialize)]
struct JsonCaptions<'a> {
    video_id: &'a str,
    strategy: &'a str,
    language: &'a str,
    cues: &'a CaptionDocument,
    text: String,
    sentences: Vec<String>,
}

/// Plain text: normalized sentences, or the newline-joined cues when `raw`
pub fn format_as_text(captions: &RetrievedCaptions, raw: bool) -> String {
    let text = captions.raw_text();
    if raw {
        text
    } else {
        normalize(&text).joined()
    }
}

/// JSON with cue timings, raw text and normalized sentences
pub fn format_as_json(captions: &RetrievedCaptions) -> Result<String> {
    let text = captions.raw_text();
    let sentences = normalize(&text).sentences().to_vec();

    let json = JsonCaptions {
        video_id: captions.video_id.as_str(),
        strategy: captions.strategy,
        language: &captions.language,
        cues: &captions.document,
        text,
        sentences,
    };

    Ok(serde_json::to_string_pretty(&json)?)
}

/// Start and end for each cue. Missing starts continue from the previous
/// cue's end; missing ends run until the next cue starts.
fn cue_spans(cues: &[CaptionCue]) -> Vec<(Duration, Duration)> {
    let mut spans = Vec::with_capacity(cues.len());
    let mut cursor = Duration::zero();

    for (index, cue) in cues.iter().enumerate() {
        let start = cue.start.unwrap_or(cursor);
        let end = match cue.end_from(start) {
            Some(end) => end,
            None => cues
                .get(index + 1)
                .and_then(|next| next.start)
                .filter(|next_start| *next_start > start)
                .unwrap_or(start),
        };

        spans.push((start, end));
        cursor = end;
    }

    spans
}

/// SRT subtitle file
pub fn format_as_srt(document: &CaptionDocument) -> String {
    let cues = document.cues();
    let mut out = String::new();

    for (index, (cue, (start, end))) in cues.iter().zip(cue_spans(cues)).enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(start, ','),
            format_timestamp(end, ','),
            cue.text.trim()
        ));
    }

    out
}

/// WebVTT file
pub fn format_as_vtt(document: &CaptionDocument) -> String {
    let cues = document.cues();
    let mut out = String::from("WEBVTT\n\n");

    for (cue, (start, end)) in cues.iter().zip(cue_spans(cues)) {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_timestamp(start, '.'),
            format_timestamp(end, '.'),
            cue.text.trim()
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::VideoId;

    fn ms(value: i64) -> Option<Duration> {
        Some(Duration::milliseconds(value))
    }

    fn captions() -> RetrievedCaptions {
        RetrievedCaptions {
            video_id: VideoId::parse("abc123").unwrap(),
            strategy: "timedtext",
            language: "ko".to_string(),
            document: CaptionDocument::new(vec![
                CaptionCue::new(ms(0), ms(1500), "Hi there."),
                CaptionCue::new(ms(1500), None, "How are"),
                CaptionCue::new(ms(4000), ms(1000), "you"),
            ])
            .unwrap(),
        }
    }

    #[test]
    fn test_text_normalized_and_raw() {
        assert_eq!(format_as_text(&captions(), false), "Hi there.\nHow are you.");
        assert_eq!(format_as_text(&captions(), true), "Hi there.\nHow are\nyou");
    }

    #[test]
    fn test_json_contains_cues_and_sentences() {
        let value: serde_json::Value = serde_json::from_str(&format_as_json(&captions()).unwrap()).unwrap();

        assert_eq!(value["video_id"], "abc123");
        assert_eq!(value["strategy"], "timedtext");
        assert_eq!(value["cues"][0]["dur"], 1.5);
        assert_eq!(value["cues"][1]["dur"], serde_json::Value::Null);
        assert_eq!(value["sentences"], serde_json::json!(["Hi there.", "How are you."]));
    }

    #[test]
    fn test_srt_fills_missing_end_from_next_start() {
        let srt = format_as_srt(&captions().document);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,500\nHi there.\n\n\
             2\n00:00:01,500 --> 00:00:04,000\nHow are\n\n\
             3\n00:00:04,000 --> 00:00:05,000\nyou\n\n"
        );
    }

    #[test]
    fn test_vtt_header_and_separator() {
        let vtt = format_as_vtt(&captions().document);
        assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nHi there.\n\n"));
    }

    #[test]
    fn test_srt_survives_extreme_timings() {
        let far = Duration::milliseconds(i64::MAX);
        let document = CaptionDocument::new(vec![
            CaptionCue::new(Some(far), Some(far), "late"),
            CaptionCue::new(None, Some(Duration::seconds(1)), "later"),
        ])
        .unwrap();

        let srt = format_as_srt(&document);
        assert!(srt.contains("late\n\n"));
        assert!(srt.contains("later\n\n"));
    }

    #[test]
    fn test_spans_without_any_timing() {
        let cues = vec![CaptionCue::new(None, None, "a"), CaptionCue::new(None, None, "b")];
        let spans = cue_spans(&cues);
        assert!(spans.iter().all(|(s, e)| *s == Duration::zero() && *e == Duration::zero()));
    }
}
