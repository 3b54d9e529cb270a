use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex_automata::meta::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::typo_index::TypoIndexSet;

static WORD_DELIMITERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[',. ]").expect("delimiter pattern is valid"));

/// A word or separator of the original sentence, with its byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Sentence split into words and separators, whitespace-only pieces dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    segments: Vec<Segment>,
}

impl WordList {
    /// Split on apostrophe, comma, period and space, keeping each delimiter as its own piece
    pub fn split(sentence: &str) -> Self {
        let mut segments = Vec::new();
        let mut push = |start: usize, end: usize| {
            let text = &sentence[start..end];
            if !text.trim().is_empty() {
                segments.push(Segment {
                    text: text.to_string(),
                    start,
                    end,
                });
            }
        };

        let mut cursor = 0;
        for delimiter in WORD_DELIMITERS.find_iter(sentence) {
            push(cursor, delimiter.start());
            push(delimiter.start(), delimiter.end());
            cursor = delimiter.end();
        }
        push(cursor, sentence.len());

        Self { segments }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(|segment| segment.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|segment| segment.text.as_str())
    }
}

/// Opening and closing markers wrapped around each flagged word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub open: String,
    pub close: String,
}

impl Markers {
    pub fn wrap(&self, word: &str) -> String {
        format!("{}{}{}", self.open, word, self.close)
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            open: "<i>".to_string(),
            close: "</i>".to_string(),
        }
    }
}

/// How flagged words are marked in the sentence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStrategy {
    /// Wrap only the flagged word positions
    #[default]
    Positional,
    /// Wrap every literal occurrence of each flagged word
    Literal,
}

impl FromStr for AnnotationStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "positional" => Ok(Self::Positional),
            "literal" => Ok(Self::Literal),
            other => Err(format!("unknown annotation strategy '{}' (expected positional or literal)", other)),
        }
    }
}

impl fmt::Display for AnnotationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional => write!(f, "positional"),
            Self::Literal => write!(f, "literal"),
        }
    }
}

/// Look up the flagged words, skipping indexes the splitter never produced
pub fn typo_words<'a>(words: &'a WordList, typos: &TypoIndexSet) -> Vec<(usize, &'a str)> {
    typos
        .indexes()
        .iter()
        .filter_map(|&index| match words.get(index) {
            Some(word) => Some((index, word)),
            None => {
                warn!(
                    "⚠️ Word index {} has no counterpart among {} split words",
                    index,
                    words.len()
                );
                None
            }
        })
        .collect()
}

/// Rebuild the sentence, wrapping only the segments whose index was flagged
pub fn annotate_positional(
    sentence: &str,
    words: &WordList,
    typos: &TypoIndexSet,
    markers: &Markers,
) -> String {
    let mut annotated = String::with_capacity(sentence.len());
    let mut cursor = 0;

    for (index, segment) in words.segments().iter().enumerate() {
        annotated.push_str(&sentence[cursor..segment.start]);
        if typos.contains(index) {
            annotated.push_str(&markers.wrap(&segment.text));
        } else {
            annotated.push_str(&segment.text);
        }
        cursor = segment.end;
    }
    annotated.push_str(&sentence[cursor..]);

    annotated
}

/// Globally replace each distinct flagged word with its wrapped form.
///
/// Replacements run in order over the growing string, so a later word that
/// occurs inside the markers (`i` in `<i>`) also rewraps the earlier markers.
pub fn annotate_literal(sentence: &str, flagged: &[&str], markers: &Markers) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let mut annotated = sentence.to_string();

    for &word in flagged {
        if seen.contains(&word) {
            continue;
        }
        seen.push(word);
        annotated = annotated.replace(word, &markers.wrap(word));
    }

    annotated
}
