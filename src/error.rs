use thiserror::Error;

/// Errors raised by the rule layer and the application engine.
///
/// Dangling rule references and unknown columns are deliberately *not*
/// errors: profiles are allowed to reference rules that have since left the
/// catalog, and those bindings are skipped.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// A `replace_pattern` transform carries a regex that does not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// A transform failed while processing one row; wraps the underlying
    /// failure with enough context to locate the cell.
    #[error("row {row}, column '{column}': {source}")]
    Row {
        row: usize,
        column: String,
        #[source]
        source: Box<CorrectionError>,
    },
}
