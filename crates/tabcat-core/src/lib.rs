//! AI-assisted CSV categorization pipeline.
//!
//! Four composable stages, each independently testable: encode a table as
//! delimited text, build a prompt around it, call the remote model
//! gateway, and decode/validate the free-text response back into a table.
//! The shell (CLI or GUI) owns file I/O, user edits, and session
//! lifecycle; everything here operates on explicit values.

pub mod category;
pub mod config;
pub mod csv;
pub mod gateway;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod table;
pub mod validate;

pub use category::{CategoryError, CategorySet};
pub use config::TabcatConfig;
pub use csv::decode::{parse_csv, strip_response, DecodeError, DecodeErrorReason, ParsedCsv};
pub use csv::encode::{encode_table, EncodeBudget, EncodingError};
pub use gateway::{
    generate_with_retry, GatewayConfig, GatewayError, GeminiClient, RetryPolicy, TextGenerator,
};
pub use pipeline::{assign_categories, suggest_categories, CategorizationRequest, PipelineError};
pub use prompt::{build_assignment_payload, build_suggestion_payload, Payload, TaskKind};
pub use session::{RequestTicket, Session};
pub use table::{Table, TableError};
pub use validate::{
    parse_suggestions, validate_assignment, CategorizedTable, CellFlag, SuggestionError,
    ValidationError, CATEGORY_COLUMN,
};
