//! Table → CSV text, bounded by a size budget.
//!
//! The downstream model has a finite input context, so encoding refuses
//! tables that blow the configured row or character budget instead of
//! sending a truncated prompt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::csv::needs_quoting;
use crate::table::Table;

/// Size limits applied before a table is put into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeBudget {
    pub max_rows: usize,
    pub max_chars: usize,
}

impl Default for EncodeBudget {
    fn default() -> Self {
        Self {
            max_rows: 2_000,
            max_chars: 200_000,
        }
    }
}

impl EncodeBudget {
    /// No limits. Used when serializing a result for export rather than
    /// for a prompt.
    pub fn unbounded() -> Self {
        Self {
            max_rows: usize::MAX,
            max_chars: usize::MAX,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("table has {rows} rows, budget allows {max}")]
    TooManyRows { rows: usize, max: usize },

    #[error("encoded table is {chars} characters, budget allows {max}")]
    PayloadTooLarge { chars: usize, max: usize },

    #[error("cell at row {row}, column {column} contains a NUL byte")]
    Unrepresentable { row: usize, column: String },
}

/// Serialize a table as CSV text: header row first, one row per line,
/// quoting per RFC 4180. The output re-parses to an equal table.
pub fn encode_table(table: &Table, budget: &EncodeBudget) -> Result<String, EncodingError> {
    if table.row_count() > budget.max_rows {
        return Err(EncodingError::TooManyRows {
            rows: table.row_count(),
            max: budget.max_rows,
        });
    }

    let mut out = String::new();
    write_record(&mut out, table.columns());
    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            if value.contains('\0') {
                return Err(EncodingError::Unrepresentable {
                    row: row_idx,
                    column: table.columns()[col_idx].clone(),
                });
            }
        }
        write_record(&mut out, row);
    }

    let chars = out.chars().count();
    if chars > budget.max_chars {
        return Err(EncodingError::PayloadTooLarge {
            chars,
            max: budget.max_chars,
        });
    }

    Ok(out)
}

fn write_record(out: &mut String, values: &[String]) {
    // A record that is a single empty field must be quoted, or it would
    // read back as a blank line.
    if values.len() == 1 && values[0].is_empty() {
        out.push_str("\"\"\n");
        return;
    }
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        if needs_quoting(value) {
            out.push('"');
            for ch in value.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
            out.push('"');
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
}
