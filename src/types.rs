//! Core data model for exam questions.
//!
//! A [`QuestionRecord`] is created once during import and never mutated by
//! this crate. Its [`QuestionId`] is the key shared by the metadata store and
//! the similarity index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Stable identifier of a question.
///
/// Uses `NonZeroU32` so an id of zero (an unset spreadsheet cell, a default
/// value) can never reach the store or the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QuestionId(NonZeroU32);

impl QuestionId {
    /// Returns `None` if `id` is zero.
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    #[must_use]
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Little-endian bytes, the layout used in the index artifact.
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.get().to_le_bytes()
    }

    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Option<Self> {
        Self::new(u32::from_le_bytes(bytes))
    }

    /// Big-endian bytes, used as store keys so keys sort numerically.
    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.get().to_be_bytes()
    }

    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 4]) -> Option<Self> {
        Self::new(u32::from_be_bytes(bytes))
    }
}

impl TryFrom<u32> for QuestionId {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "question id must be non-zero".to_string())
    }
}

impl From<QuestionId> for u32 {
    fn from(id: QuestionId) -> u32 {
        id.get()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuestionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|e| format!("'{s}' is not a positive integer: {e}"))?;
        Self::new(value).ok_or_else(|| "question id must be non-zero".to_string())
    }
}

/// Category of an exam question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum QuestionType {
    /// "Which underlined part is grammatically wrong?"
    Underlined,
    /// Choose the correct word inside each box.
    Box,
    /// Fill in the blank.
    Blank,
    Other(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Underlined => "underlined",
            Self::Box => "box",
            Self::Blank => "blank",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "underlined" => Self::Underlined,
            "box" => Self::Box,
            "blank" => Self::Blank,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> String {
        value.as_str().to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single exam question with its structured metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub question_type: QuestionType,
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub vocabulary: String,
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionRecord {
    /// Text handed to the generation pipeline as the example question.
    pub fn as_prompt_text(&self) -> String {
        let mut text = self.question_text.clone();
        for (i, option) in self.options.iter().enumerate() {
            text.push_str(&format!("\n{}) {option}", i + 1));
        }
        text
    }
}

/// Splits an options cell into individual choices.
///
/// Choices are separated by `|`; when no `|` is present each non-blank line
/// is one choice.
pub fn parse_options(cell: &str) -> Vec<String> {
    let parts: Vec<&str> = if cell.contains('|') {
        cell.split('|').collect()
    } else {
        cell.lines().collect()
    };

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
