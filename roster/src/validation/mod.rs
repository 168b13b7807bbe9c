//! Validation.
//!
//! - [`validate`]: JSON Schema (draft 7) validation, used for
//!   configuration files
//! - [`check_table`]: rating bounds and tier consistency of a loaded table
//!
//! # Example
//!
//! ```rust,ignore
//! use roster::{check_table, load_table, RosterConfig};
//!
//! let table = load_table("2025member.csv")?;
//! let report = check_table(&table, &RosterConfig::default())?;
//! for violation in &report.violations {
//!     println!("{}", violation);
//! }
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::config::RosterConfig;
use crate::error::FormatError;
use crate::models::{parse_int, Span, Table, RATING_MAX, RATING_MIN};

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every error otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// =============================================================================
// Table checks
// =============================================================================

/// One problem found in a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Numeric cell outside `RATING_MIN..=RATING_MAX`.
    OutOfRange { line: usize, name: String, column: String, value: i32 },
    /// Numeric cell that does not parse.
    NotAnInteger { line: usize, name: String, column: String, value: String },
    /// Tier label missing from the configuration.
    UnknownTier { line: usize, name: String, tier: String },
    /// Overall rating outside its tier's configured range.
    OutsideTierRange { line: usize, name: String, tier: String, rating: i32, range: Span },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::OutOfRange { line, name, column, value } => write!(
                f,
                "Line {} ({}): {} = {} outside {}..{}",
                line, name, column, value, RATING_MIN, RATING_MAX
            ),
            Violation::NotAnInteger { line, name, column, value } => {
                write!(f, "Line {} ({}): {} = '{}' is not an integer", line, name, column, value)
            }
            Violation::UnknownTier { line, name, tier } => {
                write!(f, "Line {} ({}): unknown tier '{}'", line, name, tier)
            }
            Violation::OutsideTierRange { line, name, tier, rating, range } => write!(
                f,
                "Line {} ({}): rating {} outside tier '{}' range {}",
                line, name, rating, tier, range
            ),
        }
    }
}

/// Result of [`check_table`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableCheck {
    pub records: usize,
    pub violations: Vec<Violation>,
}

impl TableCheck {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check every overall rating and attribute cell of `table`.
///
/// Attribute columns missing from the table are skipped; the name, tier and
/// overall rating columns are required.
pub fn check_table(table: &Table, config: &RosterConfig) -> Result<TableCheck, FormatError> {
    let cols = &config.columns;
    let name_col = table.column(&cols.name)?;
    let tier_col = table.column(&cols.skill_level)?;
    let rating_col = table.column(&cols.overall_rating)?;

    let numeric: Vec<(usize, &str)> = std::iter::once((rating_col, cols.overall_rating.as_str()))
        .chain(
            cols.attributes
                .iter()
                .filter_map(|a| table.find_column(a).map(|i| (i, a.as_str()))),
        )
        .collect();

    let mut report = TableCheck { records: table.len(), violations: Vec::new() };

    for record in table.records() {
        let line = record.line();
        let name = record.get(name_col).to_string();

        for &(col, column) in &numeric {
            let raw = record.get(col);
            match parse_int(raw) {
                Some(value) if !(RATING_MIN..=RATING_MAX).contains(&value) => {
                    report.violations.push(Violation::OutOfRange {
                        line,
                        name: name.clone(),
                        column: column.to_string(),
                        value,
                    });
                }
                Some(_) => {}
                None => report.violations.push(Violation::NotAnInteger {
                    line,
                    name: name.clone(),
                    column: column.to_string(),
                    value: raw.to_string(),
                }),
            }
        }

        let tier_label = record.get(tier_col);
        match config.tier(tier_label) {
            None => report.violations.push(Violation::UnknownTier {
                line,
                name: name.clone(),
                tier: tier_label.to_string(),
            }),
            Some(tier) => {
                if let Some(rating) = parse_int(record.get(rating_col)) {
                    if !tier.range.contains(rating) {
                        report.violations.push(Violation::OutsideTierRange {
                            line,
                            name: name.clone(),
                            tier: tier.label.clone(),
                            rating,
                            range: tier.range,
                        });
                    }
                }
            }
        }
    }

    Ok(report)
}
