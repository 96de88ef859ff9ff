//! Category vocabulary.
//!
//! A `CategorySet` is the ordered list of labels the model is allowed to
//! assign. The last label is the fallback (`Unknown` by convention), used
//! when no other category fits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    labels: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category set is empty")]
    Empty,

    #[error("category label {0} is blank")]
    BlankLabel(usize),

    #[error("duplicate category label: {0}")]
    DuplicateLabel(String),
}

impl CategorySet {
    pub fn new(labels: Vec<String>) -> Result<Self, CategoryError> {
        if labels.is_empty() {
            return Err(CategoryError::Empty);
        }
        for (idx, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(CategoryError::BlankLabel(idx));
            }
            if labels[..idx].contains(label) {
                return Err(CategoryError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self { labels })
    }

    /// Parse user-edited category text: one label per line, trimmed, blank
    /// lines ignored, order preserved.
    pub fn from_lines(text: &str) -> Result<Self, CategoryError> {
        let labels: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The designated catch-all label (always the last entry).
    pub fn fallback(&self) -> &str {
        self.labels.last().expect("category set is never empty")
    }

    /// Exact string membership; no case folding, no trimming.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Comma-separated form used in the assignment instruction.
    pub fn joined(&self) -> String {
        self.labels.join(", ")
    }
}
