//! Turns newline-joined caption fragments into one punctuated sentence per line.
//!
//! The rules are deliberately simple and must stay stable:
//!
//! 1. Collapse every whitespace run to one space and trim.
//! 2. Split after `.`, `?` or `!` when whitespace follows. The mark stays with
//!    the sentence before it.
//! 3. Append `.` to any sentence not already ending in one of those marks.
//! 4. Drop empty sentences.
//!
//! Abbreviations such as `Mr.` are sentence boundaries too, and runs such as
//! `!!` or `...` are left untouched.

use serde::Serialize;
use std::fmt;

const TERMINALS: [char; 3] = ['.', '?', '!'];

/// Sentences in caption order; each ends in exactly one terminal mark run and
/// holds no newline
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct NormalizedCaption {
    sentences: Vec<String>,
}

impl NormalizedCaption {
    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Sentences joined with newlines
    pub fn joined(&self) -> String {
        self.sentences.join("\n")
    }
}

impl fmt::Display for NormalizedCaption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

fn is_terminal(c: char) -> bool {
    TERMINALS.contains(&c)
}

/// Byte-order marks count as whitespace; they leak in from some caption files
fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split(is_space)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split at every space that directly follows a terminal mark
fn split_sentences(collapsed: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut previous = None;

    for (index, c) in collapsed.char_indices() {
        if c == ' ' && previous.map_or(false, is_terminal) {
            sentences.push(&collapsed[start..index]);
            start = index + c.len_utf8();
        }
        previous = Some(c);
    }

    sentences.push(&collapsed[start..]);
    sentences
}

fn punctuate(candidate: &str) -> Option<String> {
    let line = candidate.trim();
    if line.is_empty() {
        return None;
    }

    if line.ends_with(is_terminal) {
        Some(line.to_string())
    } else {
        Some(format!("{}.", line))
    }
}

/// Normalize raw caption text into punctuated sentences
pub fn normalize(raw: &str) -> NormalizedCaption {
    let collapsed = collapse_whitespace(raw);

    let sentences = split_sentences(&collapsed)
        .into_iter()
        .filter_map(punctuate)
        .collect();

    NormalizedCaption { sentences }
}
