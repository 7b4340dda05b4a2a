use chrono::Duration;
use serde::{Serialize, Serializer};

pub mod parser;

pub use parser::parse_document;

use crate::{CaptionError, CaptionResult};

/// One timed caption fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionCue {
    /// Offset from the start of the video, if the document gave one
    #[serde(rename = "start", serialize_with = "serialize_seconds")]
    pub start: Option<Duration>,

    /// How long the cue stays on screen, if the document gave one
    #[serde(rename = "dur", serialize_with = "serialize_seconds")]
    pub duration: Option<Duration>,

    /// Cue text; may be empty
    pub text: String,
}

impl CaptionCue {
    pub fn new(start: Option<Duration>, duration: Option<Duration>, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    /// End offset, when both start and duration are known
    pub fn end(&self) -> Option<Duration> {
        self.end_from(self.start?)
    }

    /// End offset counted from `start`. `None` without a duration or on overflow.
    pub fn end_from(&self, start: Duration) -> Option<Duration> {
        start.checked_add(&self.duration?)
    }
}

fn serialize_seconds<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&(d.num_milliseconds() as f64 / 1000.0)),
        None => serializer.serialize_none(),
    }
}

/// Cues in document order, which is the temporal order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CaptionDocument {
    cues: Vec<CaptionCue>,
}

impl CaptionDocument {
    pub fn new(cues: Vec<CaptionCue>) -> CaptionResult<Self> {
        if cues.is_empty() {
            return Err(CaptionError::Parse("document contains no caption elements".to_string()));
        }

        Ok(Self { cues })
    }

    pub fn cues(&self) -> &[CaptionCue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Cue texts joined with newlines, the input to normalization
    pub fn raw_text(&self) -> String {
        self.cues
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
