//! Error types for the roster maintenance passes.
//!
//! - [`FormatError`] - table shape problems (header, field counts, columns)
//! - [`ValueError`] - a cell that should hold an integer does not
//! - [`TableError`] - loading or saving a table
//! - [`TransformError`] - a pass failed on the loaded table
//! - [`ConfigError`] - configuration file problems
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Format Errors
// =============================================================================

/// The table does not have the shape every pass relies on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// No header row.
    #[error("No header row found")]
    MissingHeader,

    /// Two header cells carry the same name.
    #[error("Duplicate column in header: '{0}'")]
    DuplicateColumn(String),

    /// A data row does not have as many fields as the header.
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A column a pass needs is not in the header.
    #[error("Missing column: '{0}'")]
    MissingColumn(String),

    /// The file could not be decoded to text.
    #[error("Cannot decode table: {0}")]
    Encoding(String),

    /// Malformed delimited text.
    #[error("Invalid table format: {0}")]
    Malformed(String),
}

// =============================================================================
// Value Errors
// =============================================================================

/// A cell could not be parsed as an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    /// 1-based line in the source file (header is line 1)
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Line {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for ValueError {}

impl ValueError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

// =============================================================================
// Table I/O Errors
// =============================================================================

/// Errors while loading or saving a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The file could not be opened, read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The content is not a well-formed table.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors raised by a pass over a loaded table.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or checking a [`crate::config::RosterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON schema validation failed.
    #[error("Config does not match schema: {}", errors.join("; "))]
    Schema { errors: Vec<String> },

    /// Values are well-typed but inconsistent.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::process_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<FormatError> for PipelineError {
    fn from(err: FormatError) -> Self {
        PipelineError::Transform(TransformError::Format(err))
    }
}

impl From<ValueError> for PipelineError {
    fn from(err: ValueError) -> Self {
        PipelineError::Transform(TransformError::Value(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table load/save.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for passes over a table.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
