use chrono::Duration;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

use super::{CaptionCue, CaptionDocument};
use crate::{CaptionError, CaptionResult};

/// Timings past this many milliseconds (about a century) are treated as absent
const MAX_TIMING_MILLIS: f64 = 3.2e12;

/// Timing attribute layout of a caption element
#[derive(Debug, Clone, Copy)]
enum CueFormat {
    /// `<text start="1.23" dur="4.5">`
    Seconds,
    /// `<p t="1230" d="4500">`, timed-text format 3
    Milliseconds,
}

impl CueFormat {
    fn of(element: &BytesStart<'_>) -> Option<Self> {
        match element.local_name().as_ref() {
            b"text" => Some(CueFormat::Seconds),
            b"p" => Some(CueFormat::Milliseconds),
            _ => None,
        }
    }

    fn attribute_names(&self) -> (&'static str, &'static str) {
        match self {
            CueFormat::Seconds => ("start", "dur"),
            CueFormat::Milliseconds => ("t", "d"),
        }
    }

    fn to_duration(&self, value: f64) -> Option<Duration> {
        let millis = match self {
            CueFormat::Seconds => value * 1000.0,
            CueFormat::Milliseconds => value,
        };

        if millis > MAX_TIMING_MILLIS {
            return None;
        }

        Some(Duration::milliseconds(millis.round() as i64))
    }
}

struct OpenCue {
    start: Option<Duration>,
    duration: Option<Duration>,
    text: String,
    /// Nesting depth of child elements such as `<s>`
    depth: usize,
}

impl OpenCue {
    fn open(element: &BytesStart<'_>, format: CueFormat) -> Self {
        let (start_name, dur_name) = format.attribute_names();
        Self {
            start: timing_attribute(element, start_name, format),
            duration: timing_attribute(element, dur_name, format),
            text: String::new(),
            depth: 0,
        }
    }

    fn finish(self) -> CaptionCue {
        CaptionCue::new(self.start, self.duration, decode_double_escapes(self.text))
    }
}

/// Missing or unreadable timing is absent, not zero
fn timing_attribute(element: &BytesStart<'_>, name: &str, format: CueFormat) -> Option<Duration> {
    let attribute = element.try_get_attribute(name).ok().flatten()?;
    let value = attribute.unescape_value().ok()?;
    let number: f64 = value.trim().parse().ok()?;

    if !number.is_finite() || number < 0.0 {
        return None;
    }

    format.to_duration(number)
}

/// HTML entities that show up in caption text beyond the XML predefined set
fn html_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{a0}"),
        "hellip" => Some("\u{2026}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        _ => None,
    }
}

/// Timed-text bodies are often escaped twice (`&amp;#39;`)
fn decode_double_escapes(text: String) -> String {
    if !text.contains('&') {
        return text;
    }

    let decoded = match quick_xml::escape::unescape_with(&text, html_entity) {
        Ok(Cow::Owned(decoded)) => Some(decoded),
        _ => None,
    };

    decoded.unwrap_or(text)
}

/// Parse a timed-text markup document into cues, in document order
pub fn parse_document(document: &str) -> CaptionResult<CaptionDocument> {
    let mut reader = Reader::from_str(document);
    let mut cues = Vec::new();
    let mut open: Option<OpenCue> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            CaptionError::Parse(format!(
                "malformed markup at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(element) => match open.as_mut() {
                Some(cue) => cue.depth += 1,
                None => {
                    if let Some(format) = CueFormat::of(&element) {
                        open = Some(OpenCue::open(&element, format));
                    }
                }
            },
            Event::Empty(element) => {
                if open.is_none() {
                    if let Some(format) = CueFormat::of(&element) {
                        cues.push(OpenCue::open(&element, format).finish());
                    }
                }
            }
            Event::End(_) => {
                if let Some(mut cue) = open.take() {
                    if cue.depth == 0 {
                        cues.push(cue.finish());
                    } else {
                        cue.depth -= 1;
                        open = Some(cue);
                    }
                }
            }
            Event::Text(text) => {
                if let Some(cue) = open.as_mut() {
                    match text.unescape_with(html_entity) {
                        Ok(decoded) => cue.text.push_str(&decoded),
                        Err(e) => {
                            tracing::debug!(error = %e, "Keeping caption text with unknown escape as-is");
                            cue.text.push_str(&String::from_utf8_lossy(&text));
                        }
                    }
                }
            }
            Event::CData(data) => {
                if let Some(cue) = open.as_mut() {
                    cue.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if open.is_some() {
        return Err(CaptionError::Parse("unterminated caption element".to_string()));
    }

    CaptionDocument::new(cues)
}
