//! CSV text → records, for untrusted input.
//!
//! The decoder is the trust boundary: model output is parsed the way
//! untrusted network input would be. Malformed quoting or ragged records
//! are errors carrying the raw text, never silently dropped rows.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header row plus data records, exactly as parsed. Shape validation
/// against an original table happens in `validate`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorReason {
    #[error("input is empty")]
    Empty,

    #[error("record {record}: quoted value is never closed")]
    UnterminatedQuote { record: usize },

    #[error("record {record}: quote inside an unquoted value")]
    UnexpectedQuote { record: usize },

    #[error("record {record}: content after a closing quote")]
    TrailingAfterQuote { record: usize },

    #[error("record {record} has {found} values, expected {expected}")]
    ColumnCountMismatch {
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("markdown code fence is never closed")]
    UnterminatedFence,
}

/// Parse failure with the raw text attached for inspection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct DecodeError {
    pub reason: DecodeErrorReason,
    pub raw: String,
}

impl DecodeError {
    pub fn new(reason: DecodeErrorReason, raw: &str) -> Self {
        Self {
            reason,
            raw: raw.to_string(),
        }
    }
}

/// Strip whitespace and markdown wrapping from a raw model response.
///
/// Policy: if the response contains a complete fenced code block, the
/// block's contents win and any surrounding prose is dropped. A fence that
/// opens and never closes is an error. Responses without fences pass
/// through trimmed.
pub fn strip_response(raw: &str) -> Result<String, DecodeError> {
    let trimmed = raw.trim();
    let lines: Vec<&str> = trimmed.lines().collect();

    let open = lines
        .iter()
        .position(|line| line.trim_start().starts_with("```"));
    let Some(open) = open else {
        return Ok(trimmed.to_string());
    };

    let close = lines[open + 1..]
        .iter()
        .position(|line| line.trim_start().starts_with("```"));
    let Some(close) = close else {
        return Err(DecodeError::new(DecodeErrorReason::UnterminatedFence, raw));
    };

    Ok(lines[open + 1..open + 1 + close].join("\n"))
}

/// Parse CSV text into a header record plus data records.
///
/// Blank lines are skipped, matching common reader behavior. Record
/// numbers in errors are 1-based and count parsed records (a quoted value
/// may span several physical lines).
pub fn parse_csv(text: &str) -> Result<ParsedCsv, DecodeError> {
    let records = split_records(text)?;
    let mut iter = records.into_iter();
    let Some(headers) = iter.next() else {
        return Err(DecodeError::new(DecodeErrorReason::Empty, text));
    };

    let mut rows = Vec::new();
    for (idx, record) in iter.enumerate() {
        if record.len() != headers.len() {
            return Err(DecodeError::new(
                DecodeErrorReason::ColumnCountMismatch {
                    record: idx + 2,
                    expected: headers.len(),
                    found: record.len(),
                },
                text,
            ));
        }
        rows.push(record);
    }

    Ok(ParsedCsv { headers, rows })
}

/// Split text into records of fields, handling RFC-4180 quoting.
fn split_records(text: &str) -> Result<Vec<Vec<String>>, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::new(DecodeErrorReason::Empty, text));
    }

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    // True once the current field started with a quote; cleared per field.
    let mut quoted = false;
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    let record_num = |records: &[Vec<String>]| records.len() + 1;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                if field.is_empty() && !quoted {
                    quoted = true;
                    in_quotes = true;
                } else if quoted {
                    // Closed quote already seen for this field; only a
                    // delimiter or record end may follow.
                    return Err(DecodeError::new(
                        DecodeErrorReason::TrailingAfterQuote {
                            record: record_num(&records),
                        },
                        text,
                    ));
                } else {
                    return Err(DecodeError::new(
                        DecodeErrorReason::UnexpectedQuote {
                            record: record_num(&records),
                        },
                        text,
                    ));
                }
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\n' | '\r' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                // Blank lines are skipped. A genuine single empty field is
                // still representable: the encoder quotes it (`""`).
                if fields.is_empty() && field.is_empty() && !quoted {
                    continue;
                }
                fields.push(std::mem::take(&mut field));
                quoted = false;
                records.push(std::mem::take(&mut fields));
            }
            _ => {
                if quoted {
                    return Err(DecodeError::new(
                        DecodeErrorReason::TrailingAfterQuote {
                            record: record_num(&records),
                        },
                        text,
                    ));
                }
                field.push(ch);
            }
        }
    }

    if in_quotes {
        return Err(DecodeError::new(
            DecodeErrorReason::UnterminatedQuote {
                record: record_num(&records),
            },
            text,
        ));
    }

    // Final record without a trailing newline.
    if !field.is_empty() || !fields.is_empty() || quoted {
        fields.push(field);
        records.push(fields);
    }

    Ok(records)
}
