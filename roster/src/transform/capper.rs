//! Outlier capper.
//!
//! Attribute cells sitting exactly at the configured ceiling are redrawn from
//! the configured range, breaking up walls of maxed-out attributes.

use rand::Rng;
use serde::Serialize;

use crate::config::RosterConfig;
use crate::error::TransformResult;
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::{parse_int, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CappedCell {
    pub line: usize,
    pub name: String,
    pub column: String,
    pub new: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapReport {
    pub changes: Vec<CappedCell>,
}

impl CapReport {
    pub fn cells_capped(&self) -> usize {
        self.changes.len()
    }
}

/// Redraw ceiling-valued attribute cells with a generator seeded from `config`.
pub fn cap_outliers(table: &mut Table, config: &RosterConfig) -> TransformResult<CapReport> {
    let mut rng = config.rng();
    cap_outliers_with(table, config, &mut rng)
}

pub fn cap_outliers_with<R: Rng + ?Sized>(
    table: &mut Table,
    config: &RosterConfig,
    rng: &mut R,
) -> TransformResult<CapReport> {
    let name_col = table.column(&config.columns.name)?;
    let attributes: Vec<(usize, String)> = config
        .columns
        .attributes
        .iter()
        .filter_map(|a| table.find_column(a).map(|i| (i, a.clone())))
        .collect();
    let cap = &config.outlier_cap;

    log_info(format!("✂️  Capping attributes at {}...", cap.ceiling));

    let mut report = CapReport::default();
    for record in table.records_mut() {
        for (col, column) in &attributes {
            if parse_int(record.get(*col)) != Some(cap.ceiling) {
                continue;
            }
            let new = cap.redraw.draw(rng);
            record.set(*col, new.to_string());
            let cell = CappedCell {
                line: record.line(),
                name: record.get(name_col).to_string(),
                column: column.clone(),
                new,
            };
            log_info_indent(format!("{} {}: {} → {}", cell.name, cell.column, cap.ceiling, new), 1);
            report.changes.push(cell);
        }
    }

    log_success(format!("Capped {} attribute cell(s)", report.cells_capped()));
    Ok(report)
}
