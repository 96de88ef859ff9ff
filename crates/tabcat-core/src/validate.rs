//! Decoder/validator for model responses.
//!
//! The model is an untrusted producer. Structural problems (unparseable
//! text, wrong row count, wrong columns) abort with the raw response and
//! the parsed data attached for inspection. Content problems (a category
//! outside the vocabulary, a rewritten source cell) are accumulated as
//! per-cell flags on an otherwise usable result, so one bad row never
//! sinks the batch; the human edit step is the final correctness gate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::{CategoryError, CategorySet};
use crate::csv::decode::{parse_csv, strip_response, DecodeError};
use crate::table::Table;

/// Name of the column the model must append. Exact, case-sensitive.
pub const CATEGORY_COLUMN: &str = "Category";

/// Non-fatal, per-cell annotation on a validated result. Row indexes are
/// 0-based positions in the result's rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CellFlag {
    /// The appended category is not in the supplied vocabulary.
    UnknownCategory { row: usize, value: String },

    /// The model rewrote a source cell it was told not to touch.
    ContentDrift {
        row: usize,
        column: String,
        expected: String,
        found: String,
    },
}

/// A validated result: the original columns plus the appended category
/// column, with any content-level flags attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedTable {
    pub table: Table,
    pub flags: Vec<CellFlag>,
}

impl CategorizedTable {
    /// True when validation produced no flags at all.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    /// The category value of each row, in order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        let last = self.table.column_count() - 1;
        self.table
            .rows()
            .iter()
            .map(move |row| row[last].as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The model added or dropped rows. The parsed data rides along so the
    /// caller can offer it for manual inspection instead of discarding it.
    #[error("expected {expected} rows, response has {actual}")]
    RowCountMismatch {
        expected: usize,
        actual: usize,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        raw: String,
    },

    /// The response columns are not the original columns plus exactly one
    /// trailing category column.
    #[error("expected columns {expected:?}, response has {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
        raw: String,
    },
}

/// Validate an assignment response against the source table and vocabulary.
pub fn validate_assignment(
    raw: &str,
    original: &Table,
    categories: &CategorySet,
) -> Result<CategorizedTable, ValidationError> {
    let stripped = strip_response(raw)?;
    let parsed = parse_csv(&stripped)?;

    if parsed.rows.len() != original.row_count() {
        return Err(ValidationError::RowCountMismatch {
            expected: original.row_count(),
            actual: parsed.rows.len(),
            headers: parsed.headers,
            rows: parsed.rows,
            raw: raw.to_string(),
        });
    }

    let mut expected_columns: Vec<String> = original.columns().to_vec();
    expected_columns.push(CATEGORY_COLUMN.to_string());
    if parsed.headers != expected_columns {
        return Err(ValidationError::SchemaMismatch {
            expected: expected_columns,
            found: parsed.headers,
            raw: raw.to_string(),
        });
    }

    let mut flags = Vec::new();
    let category_idx = original.column_count();
    for (row_idx, row) in parsed.rows.iter().enumerate() {
        for (col_idx, column) in original.columns().iter().enumerate() {
            let expected = &original.rows()[row_idx][col_idx];
            let found = &row[col_idx];
            if found != expected {
                flags.push(CellFlag::ContentDrift {
                    row: row_idx,
                    column: column.clone(),
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }
        let value = &row[category_idx];
        if !categories.contains(value) {
            flags.push(CellFlag::UnknownCategory {
                row: row_idx,
                value: value.clone(),
            });
        }
    }

    // The header check above guarantees unique columns here: the source
    // table cannot itself carry the category column (the pipeline refuses
    // such tables before encoding).
    let table = Table::new(parsed.headers.clone(), parsed.rows.clone()).map_err(|_| {
        ValidationError::SchemaMismatch {
            expected: expected_columns,
            found: parsed.headers,
            raw: raw.to_string(),
        }
    })?;

    Ok(CategorizedTable { table, flags })
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("expected {expected} category lines, response has {found}")]
    LineCountMismatch { expected: usize, found: usize },

    #[error("line {line} is not a single word: {value}")]
    MultiWordLabel { line: usize, value: String },

    #[error("last line must be the fallback label {expected}, found {found}")]
    WrongFallback { expected: String, found: String },

    #[error(transparent)]
    Category(#[from] CategoryError),
}

/// Validate a suggestion response: exactly `inferred` single-word labels
/// plus the fixed fallback on the final line. Blank lines are ignored;
/// everything else must match the instruction.
pub fn parse_suggestions(
    raw: &str,
    inferred: usize,
    fallback: &str,
) -> Result<CategorySet, SuggestionError> {
    let stripped = strip_response(raw)?;
    let labels: Vec<String> = stripped
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let expected = inferred + 1;
    if labels.len() != expected {
        return Err(SuggestionError::LineCountMismatch {
            expected,
            found: labels.len(),
        });
    }

    for (idx, label) in labels.iter().enumerate() {
        if label.split_whitespace().count() != 1 {
            return Err(SuggestionError::MultiWordLabel {
                line: idx + 1,
                value: label.clone(),
            });
        }
    }

    let last = &labels[labels.len() - 1];
    if last != fallback {
        return Err(SuggestionError::WrongFallback {
            expected: fallback.to_string(),
            found: last.clone(),
        });
    }

    Ok(CategorySet::new(labels)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn original() -> Table {
        Table::new(
            cells(&["Name", "Amount"]),
            vec![cells(&["Coffee", "4.50"]), cells(&["Rent", "1200.00"])],
        )
        .unwrap()
    }

    fn vocab() -> CategorySet {
        CategorySet::from_lines("Food\nHousing\nUnknown").unwrap()
    }

    #[test]
    fn test_well_formed_response_is_clean() {
        let raw = "Name,Amount,Category\nCoffee,4.50,Food\nRent,1200.00,Housing\n";
        let result = validate_assignment(raw, &original(), &vocab()).unwrap();
        assert!(result.is_clean());
        assert_eq!(result.table.row_count(), 2);
        assert_eq!(
            result.categories().collect::<Vec<_>>(),
            vec!["Food", "Housing"]
        );
    }

    #[test]
    fn test_row_count_mismatch_keeps_parsed_data() {
        let raw = "Name,Amount,Category\nCoffee,4.50,Food\n";
        let err = validate_assignment(raw, &original(), &vocab()).unwrap_err();
        match err {
            ValidationError::RowCountMismatch {
                expected,
                actual,
                rows,
                raw: attached,
                ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
                assert_eq!(rows, vec![cells(&["Coffee", "4.50", "Food"])]);
                assert_eq!(attached, raw);
            }
            other => panic!("expected RowCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_category_column_is_schema_mismatch() {
        let raw = "Name,Amount\nCoffee,4.50\nRent,1200.00\n";
        let err = validate_assignment(raw, &original(), &vocab()).unwrap_err();
        assert!(matches!(err, ValidationError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_extra_column_is_schema_mismatch() {
        let raw = "Name,Amount,Category,Confidence\nCoffee,4.50,Food,0.9\nRent,1200.00,Housing,0.8\n";
        let err = validate_assignment(raw, &original(), &vocab()).unwrap_err();
        assert!(matches!(err, ValidationError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_category_column_name_is_case_sensitive() {
        let raw = "Name,Amount,category\nCoffee,4.50,Food\nRent,1200.00,Housing\n";
        let err = validate_assignment(raw, &original(), &vocab()).unwrap_err();
        assert!(matches!(err, ValidationError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_unknown_category_is_flagged_not_fatal() {
        let raw = "Name,Amount,Category\nCoffee,4.50,Food\nRent,1200.00,Rent Expense\n";
        let result = validate_assignment(raw, &original(), &vocab()).unwrap();
        assert_eq!(
            result.flags,
            vec![CellFlag::UnknownCategory {
                row: 1,
                value: "Rent Expense".to_string(),
            }]
        );
        assert_eq!(result.table.row_count(), 2);
    }

    #[test]
    fn test_content_drift_flags_exactly_the_changed_cell() {
        let raw = "Name,Amount,Category\nCoffee,4.50,Food\nRent,1200,Housing\n";
        let result = validate_assignment(raw, &original(), &vocab()).unwrap();
        assert_eq!(
            result.flags,
            vec![CellFlag::ContentDrift {
                row: 1,
                column: "Amount".to_string(),
                expected: "1200.00".to_string(),
                found: "1200".to_string(),
            }]
        );
    }

    #[test]
    fn test_fenced_response_is_unwrapped() {
        let raw = "Here you go:\n```csv\nName,Amount,Category\nCoffee,4.50,Food\nRent,1200.00,Housing\n```";
        let result = validate_assignment(raw, &original(), &vocab()).unwrap();
        assert!(result.is_clean());
    }

    #[test]
    fn test_prose_response_is_decode_error() {
        // Ragged comma counts across lines cannot parse as a table.
        let raw = "Sure, here is the categorized data:\nIt went well overall\n";
        let err = validate_assignment(raw, &original(), &vocab()).unwrap_err();
        assert!(matches!(err, ValidationError::Decode(_)));
    }

    #[test]
    fn test_blank_response_is_decode_error() {
        let err = validate_assignment("   ", &original(), &vocab()).unwrap_err();
        assert!(matches!(err, ValidationError::Decode(_)));
    }

    #[test]
    fn test_headers_only_response_is_row_count_mismatch() {
        // A single prose line reads as a header record with no rows.
        let raw = "Sure! Each row was assigned, as requested.";
        let err = validate_assignment(raw, &original(), &vocab()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::RowCountMismatch { actual: 0, .. }
        ));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let raw = "Name,Amount,Category\nCoffee,4.50,Food\nRent,1200.00,Snacks\n";
        let first = validate_assignment(raw, &original(), &vocab()).unwrap();
        let second = validate_assignment(raw, &original(), &vocab()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_suggestions_well_formed() {
        let raw = "Food\nHousing\nTransport\nUtilities\nLeisure\nUnknown\n";
        let set = parse_suggestions(raw, 5, "Unknown").unwrap();
        assert_eq!(set.len(), 6);
        assert_eq!(set.fallback(), "Unknown");
    }

    #[test]
    fn test_parse_suggestions_skips_blank_lines() {
        let raw = "\nFood\n\nHousing\nTransport\nUtilities\nLeisure\n\nUnknown\n";
        let set = parse_suggestions(raw, 5, "Unknown").unwrap();
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn test_parse_suggestions_wrong_count() {
        let raw = "Food\nHousing\nUnknown\n";
        assert_eq!(
            parse_suggestions(raw, 5, "Unknown").unwrap_err(),
            SuggestionError::LineCountMismatch {
                expected: 6,
                found: 3,
            }
        );
    }

    #[test]
    fn test_parse_suggestions_rejects_multi_word() {
        let raw = "Food\nMonthly Bills\nTransport\nUtilities\nLeisure\nUnknown\n";
        assert_eq!(
            parse_suggestions(raw, 5, "Unknown").unwrap_err(),
            SuggestionError::MultiWordLabel {
                line: 2,
                value: "Monthly Bills".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_suggestions_requires_fallback_last() {
        let raw = "Food\nHousing\nTransport\nUtilities\nLeisure\nMisc\n";
        assert_eq!(
            parse_suggestions(raw, 5, "Unknown").unwrap_err(),
            SuggestionError::WrongFallback {
                expected: "Unknown".to_string(),
                found: "Misc".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_suggestions_rejects_duplicates() {
        let raw = "Food\nFood\nTransport\nUtilities\nLeisure\nUnknown\n";
        assert_eq!(
            parse_suggestions(raw, 5, "Unknown").unwrap_err(),
            SuggestionError::Category(CategoryError::DuplicateLabel("Food".to_string()))
        );
    }
}
