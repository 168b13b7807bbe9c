//! High-level pipeline API: load a table, run passes over it, save it.
//!
//! Every pass works on the same in-memory [`Table`]; the file is read once
//! and, if any pass changed it, written once at the end.
//!
//! # Example
//!
//! ```rust,ignore
//! use roster::{process_file, RosterConfig, RunOptions, Stage};
//!
//! let result = process_file(
//!     "2025member.csv",
//!     &[Stage::FixLevels, Stage::Analyze],
//!     &RosterConfig::default(),
//!     &RunOptions::default(),
//! )?;
//! println!("{} stage(s) run", result.reports.len());
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::config::RosterConfig;
use crate::error::{PipelineResult, TransformResult};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::models::Table;
use crate::parser::load_table;
use crate::transform::analyzer::{analyze, log_report, DistributionReport};
use crate::transform::capper::{cap_outliers, CapReport};
use crate::transform::corrector::{correct_tier_ranges, CorrectionReport};
use crate::transform::nudger::{log_histograms, nudge_ratings, NudgeReport};
use crate::transform::specializer::{specialize_positions, SpecializeReport};
use crate::transform::valuation::{value_players, ValueReport};
use crate::writer::{backup_file, save_table};

// =============================================================================
// Stages
// =============================================================================

/// One pass over the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    FixLevels,
    Analyze,
    Optimize,
    Specialize,
    CapOutliers,
    Value,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::FixLevels,
        Stage::Analyze,
        Stage::Optimize,
        Stage::Specialize,
        Stage::CapOutliers,
        Stage::Value,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::FixLevels => "fix-levels",
            Stage::Analyze => "analyze",
            Stage::Optimize => "optimize",
            Stage::Specialize => "specialize",
            Stage::CapOutliers => "cap-outliers",
            Stage::Value => "value",
        }
    }

    /// Whether the stage can change the table.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Stage::Analyze)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = Stage::ALL.iter().map(|s| s.name()).collect();
                format!("unknown stage '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

// =============================================================================
// Options and results
// =============================================================================

/// Options for [`process_file`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Write here instead of replacing the input
    pub output: Option<PathBuf>,
    /// Run every stage but write nothing
    pub dry_run: bool,
    /// Copy the input aside before replacing it
    pub backup: bool,
}

/// What one stage reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", content = "report", rename_all = "kebab-case")]
pub enum StageReport {
    FixLevels(CorrectionReport),
    Analyze(DistributionReport),
    Optimize(NudgeReport),
    Specialize(SpecializeReport),
    CapOutliers(CapReport),
    Value(ValueReport),
}

/// Result of [`process_file`].
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub input: PathBuf,
    /// Where the table was saved, if it was
    pub written: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub reports: Vec<StageReport>,
}

impl RunResult {
    /// The distribution report of the last analyze stage.
    pub fn distribution(&self) -> Option<&DistributionReport> {
        self.reports.iter().rev().find_map(|r| match r {
            StageReport::Analyze(report) => Some(report),
            _ => None,
        })
    }
}

// =============================================================================
// Running
// =============================================================================

/// Run one stage over `table`.
pub fn run_stage(table: &mut Table, stage: Stage, config: &RosterConfig) -> TransformResult<StageReport> {
    let report = match stage {
        Stage::FixLevels => StageReport::FixLevels(correct_tier_ranges(table, config)?),
        Stage::Analyze => {
            let report = analyze(table, config)?;
            log_report(&report);
            StageReport::Analyze(report)
        }
        Stage::Optimize => {
            let report = nudge_ratings(table, config)?;
            log_histograms(&report);
            StageReport::Optimize(report)
        }
        Stage::Specialize => StageReport::Specialize(specialize_positions(table, config)?),
        Stage::CapOutliers => StageReport::CapOutliers(cap_outliers(table, config)?),
        Stage::Value => StageReport::Value(value_players(table, config)?),
    };
    Ok(report)
}

/// Run `stages` in order over `table`, stopping at the first failure.
///
/// On failure the table may hold the effects of the stages that completed.
pub fn process_table(
    table: &mut Table,
    stages: &[Stage],
    config: &RosterConfig,
) -> TransformResult<Vec<StageReport>> {
    stages
        .iter()
        .map(|&stage| {
            run_stage(table, stage, config).map_err(|e| {
                log_error(format!("Stage {} failed: {}", stage, e));
                e
            })
        })
        .collect()
}

/// Load the table at `path`, run `stages` and save the result.
///
/// Nothing is written unless every stage succeeds and at least one of them
/// can change the table.
pub fn process_file<P: AsRef<Path>>(
    path: P,
    stages: &[Stage],
    config: &RosterConfig,
    options: &RunOptions,
) -> PipelineResult<RunResult> {
    let path = path.as_ref();

    log_info(format!("📖 Reading {}...", path.display()));
    let mut table = load_table(path)?;
    let format = table.format();
    log_success(format!("Detected encoding: {}", format.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(format.delimiter)));
    log_success(format!("Read {} players, {} columns", table.len(), table.headers().len()));

    let reports = process_table(&mut table, stages, config)?;

    let mut result = RunResult {
        input: path.to_path_buf(),
        written: None,
        backup: None,
        reports,
    };

    if !stages.iter().any(Stage::is_mutating) {
        return Ok(result);
    }

    let destination = options.output.clone().unwrap_or_else(|| path.to_path_buf());
    if options.dry_run {
        log_warning(format!("Dry run: {} not written", destination.display()));
        return Ok(result);
    }

    if options.backup {
        let backup = backup_file(path)?;
        log_success(format!("💾 Backup saved to {}", backup.display()));
        result.backup = Some(backup);
    }

    save_table(&table, &destination)?;
    log_success(format!("💾 Saved {}", destination.display()));
    result.written = Some(destination);
    Ok(result)
}

/// Format delimiter for display
fn format_delimiter(d: u8) -> String {
    match d {
        b'\t' => "TAB".to_string(),
        other => (other as char).to_string(),
    }
}
