//! Pipeline orchestration.
//!
//! Strictly linear: encode the table, build the prompt, call the gateway,
//! validate the response. Stateless; callers own the table, the
//! vocabulary, and the result, and nothing is shared across sessions.

use thiserror::Error;
use tracing::{debug, info};

use crate::category::CategorySet;
use crate::config::TabcatConfig;
use crate::csv::encode::{encode_table, EncodingError};
use crate::gateway::{generate_with_retry, GatewayError, TextGenerator};
use crate::prompt::{build_assignment_payload, build_suggestion_payload};
use crate::table::Table;
use crate::validate::{
    parse_suggestions, validate_assignment, CategorizedTable, SuggestionError, ValidationError,
    CATEGORY_COLUMN,
};

/// The unit of work: a table plus the vocabulary to categorize it with.
/// Owns its values so a request stays coherent even if the session state
/// it was built from changes while the call is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizationRequest {
    pub table: Table,
    pub categories: CategorySet,
}

impl CategorizationRequest {
    pub async fn run<G: TextGenerator>(
        &self,
        gateway: &G,
        config: &TabcatConfig,
    ) -> Result<CategorizedTable, PipelineError> {
        assign_categories(gateway, &self.table, &self.categories, config).await
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Encode(#[from] EncodingError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Validate(#[from] ValidationError),

    #[error(transparent)]
    Suggestion(#[from] SuggestionError),

    #[error("source table already has a Category column")]
    SourceHasCategoryColumn,
}

impl PipelineError {
    /// Whether retrying the same request could plausibly succeed. Only
    /// timeouts qualify; a malformed prompt or response will not
    /// self-correct.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Gateway(GatewayError::Timeout(_)))
    }
}

/// Ask the model to propose a category vocabulary for the table.
pub async fn suggest_categories<G: TextGenerator>(
    gateway: &G,
    table: &Table,
    config: &TabcatConfig,
) -> Result<CategorySet, PipelineError> {
    let csv_text = encode_table(table, &config.budget())?;
    let payload =
        build_suggestion_payload(&csv_text, config.suggest.inferred, &config.suggest.fallback);
    debug!(
        "built {:?} payload: {} characters",
        payload.kind,
        payload.parts[0].len()
    );

    let raw = generate_with_retry(gateway, &payload.parts, &config.retry_policy()).await?;
    let set = parse_suggestions(&raw, config.suggest.inferred, &config.suggest.fallback)?;
    info!("model suggested categories: {}", set.joined());
    Ok(set)
}

/// Ask the model to append a category column, then validate the result
/// against the source table.
pub async fn assign_categories<G: TextGenerator>(
    gateway: &G,
    table: &Table,
    categories: &CategorySet,
    config: &TabcatConfig,
) -> Result<CategorizedTable, PipelineError> {
    if table.has_column(CATEGORY_COLUMN) {
        return Err(PipelineError::SourceHasCategoryColumn);
    }

    let csv_text = encode_table(table, &config.budget())?;
    let payload = build_assignment_payload(&csv_text, categories);
    debug!(
        "built {:?} payload: {} part(s)",
        payload.kind,
        payload.parts.len()
    );

    let raw = generate_with_retry(gateway, &payload.parts, &config.retry_policy()).await?;
    let result = validate_assignment(&raw, table, categories)?;
    info!(
        "categorized {} rows, {} flagged",
        result.table.row_count(),
        result.flags.len()
    );
    Ok(result)
}
