//! # Roster - maintenance passes for the club's player roster table
//!
//! The roster is a delimited text file, one row per player, holding a skill
//! tier, an overall rating, a position, a group, free-form tags and numeric
//! attributes. This crate loads it, runs deterministic (seeded) passes over
//! it and writes it back in the layout it was read in.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV File   │────▶│   Parser    │────▶│  Transform  │────▶│   Writer    │
//! │ (any enc.)  │     │  (auto-enc) │     │  (passes)   │     │  (atomic)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roster::{process_file, RosterConfig, RunOptions, Stage};
//!
//! fn main() -> Result<(), roster::PipelineError> {
//!     let config = RosterConfig::default().with_seed(7);
//!     let stages = [Stage::FixLevels, Stage::Optimize, Stage::Analyze];
//!     process_file("2025member.csv", &stages, &config, &RunOptions::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Table, records, rating spans
//! - [`parser`] - Loading with encoding/delimiter detection
//! - [`writer`] - Atomic saving and backups
//! - [`config`] - Run configuration (JSON, schema-checked)
//! - [`transform`] - The passes and the pipeline
//! - [`validation`] - JSON schema and table checks
//! - [`logs`] - Progress log broadcasting

// Core modules
pub mod error;
pub mod models;

// Table I/O
pub mod parser;
pub mod writer;

// Configuration
pub mod config;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, FormatError, PipelineError, TableError, TransformError, ValueError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{PositionFamily, Record, Span, Table, TableFormat, RATING_MAX, RATING_MIN};

// =============================================================================
// Re-exports - Table I/O
// =============================================================================

pub use parser::{detect_delimiter, detect_encoding, load_table, parse_bytes, parse_str};
pub use writer::{backup_file, save_table, table_to_bytes, write_table};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{RosterConfig, DEFAULT_SEED, DEFAULT_TABLE_FILE};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{check_table, validate, TableCheck, Violation};

// =============================================================================
// Re-exports - Passes
// =============================================================================

pub use transform::{
    analyze, cap_outliers, correct_tier_ranges, nudge_ratings, specialize_positions,
    value_players, CapReport, CorrectionReport, DistributionReport, Finding, NudgeReport,
    SpecializeReport, ValueReport,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    process_file, process_table, run_stage, RunOptions, RunResult, Stage, StageReport,
};
