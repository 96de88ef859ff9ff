//! Prompt construction.
//!
//! The remote model is a free-text generator, so instruction wording is
//! the only lever the caller has over output shape. The templates pin the
//! format down hard and the decoder treats any deviation as an error
//! rather than assuming the contract held.

use serde::{Deserialize, Serialize};

use crate::category::CategorySet;

/// The two tasks the pipeline can ask of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SuggestCategories,
    AssignCategories,
}

/// Ordered text parts sent to the gateway as one request, tagged with the
/// task they encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub kind: TaskKind,
    pub parts: Vec<String>,
}

pub const CATEGORY_SUGGESTION_PROMPT: &str = r#"Analyze the complete CSV dataset below.
Infer broad, meaningful, high-level semantic categories suitable for
classifying each row.

OUTPUT RULES:
1. Output exactly {total} lines.
2. Lines 1 to {count} must be category names.
3. Each category name must be a single word.
4. Categories must be broad, high-level, and directly supported by patterns in the CSV.
5. Categories must avoid overly specific or narrow terminology.
6. Do not repeat any category.
7. Line {total} must be exactly: {fallback}
8. Output one category per line with no commas, bullets, numbering, quotes, or formatting.
9. Do not wrap the output in markdown or code fences.
10. Provide no explanations or commentary.
11. Output only the {total} category lines.

CSV DATA:
{csv_text}
"#;

pub const CATEGORY_ASSIGNMENT_PROMPT: &str = r#"Analyze the CSV data provided and add a new column called 'Category' as the last column.

OUTPUT RULES:
1. Add a new column called 'Category' as the last column.
2. Assign only one of the following categories to each row: {categories}.
3. Do NOT invent any new categories.
4. If a row does not fit any category, use '{fallback}'.
5. Return only the CSV text with the new column.
6. No markdown, code fences, explanations, or extra text.
7. Do not modify existing columns or their values.
8. Output exactly the same rows in the same order, none added or removed.
"#;

/// Build the suggestion payload: a single part with the CSV embedded in
/// the instruction. `inferred` is the number of model-chosen labels; the
/// fallback line comes on top of that.
pub fn build_suggestion_payload(csv_text: &str, inferred: usize, fallback: &str) -> Payload {
    let total = inferred + 1;
    let text = CATEGORY_SUGGESTION_PROMPT
        .replace("{total}", &total.to_string())
        .replace("{count}", &inferred.to_string())
        .replace("{fallback}", fallback)
        .replace("{csv_text}", csv_text);
    Payload {
        kind: TaskKind::SuggestCategories,
        parts: vec![text],
    }
}

/// Build the assignment payload: the CSV text as the first part, the
/// instruction as the second.
pub fn build_assignment_payload(csv_text: &str, categories: &CategorySet) -> Payload {
    let instruction = CATEGORY_ASSIGNMENT_PROMPT
        .replace("{categories}", &categories.joined())
        .replace("{fallback}", categories.fallback());
    Payload {
        kind: TaskKind::AssignCategories,
        parts: vec![csv_text.to_string(), instruction],
    }
}
