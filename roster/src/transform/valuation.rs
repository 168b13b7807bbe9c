//! Market valuation.
//!
//! Every player gets a market value written to the configured column, which
//! is appended to the table when absent. The value is the overall rating
//! times the per-point price, scaled by position, age, tier and one random
//! factor per player, then rounded and capped.

use rand::Rng;
use serde::Serialize;

use crate::config::RosterConfig;
use crate::error::TransformResult;
use crate::logs::{log_info, log_success, log_success_indent, log_warning};
use crate::models::{parse_int, Record, Table};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValueReport {
    pub records: usize,
    /// Whether the market value column had to be appended
    pub column_added: bool,
    /// Values cut down to the cap
    pub capped: usize,
    /// Ratings that did not parse and were replaced by the fallback
    pub fallbacks: usize,
    pub total: i64,
    pub highest: Option<(String, i64)>,
}

/// Value every player with a generator seeded from `config`.
pub fn value_players(table: &mut Table, config: &RosterConfig) -> TransformResult<ValueReport> {
    let mut rng = config.rng();
    value_players_with(table, config, &mut rng)
}

/// Value every player drawing from `rng`.
pub fn value_players_with<R: Rng + ?Sized>(
    table: &mut Table,
    config: &RosterConfig,
    rng: &mut R,
) -> TransformResult<ValueReport> {
    let cols = &config.columns;
    let name_col = table.column(&cols.name)?;
    let tier_col = table.column(&cols.skill_level)?;
    let rating_col = table.column(&cols.overall_rating)?;
    let position_col = table.column(&cols.position)?;
    let age_col = table.find_column(&cols.age);

    let column_added = table.find_column(&cols.market_value).is_none();
    let value_col = table.add_column(&cols.market_value);
    if column_added {
        log_warning(format!("Column '{}' not found, appending it", cols.market_value));
    }

    log_info(format!("💰 Valuing players (seed {})...", config.seed));

    let mut report = ValueReport { records: table.len(), column_added, ..Default::default() };
    for record in table.records_mut() {
        let rating = match parse_int(record.get(rating_col)) {
            Some(rating) => rating,
            None => {
                report.fallbacks += 1;
                config.fallback_rating
            }
        };
        let age = age_col
            .and_then(|col| parse_int(record.get(col)))
            .unwrap_or(config.market_value.default_age);

        let (value, capped) = market_value(record, rating, age, position_col, tier_col, config, rng);
        if capped {
            report.capped += 1;
        }
        report.total += value;
        let name = record.get(name_col).to_string();
        if report.highest.as_ref().map_or(true, |(_, best)| value > *best) {
            report.highest = Some((name.clone(), value));
        }

        log_success_indent(format!("{}: {}", name, value), 1);
        record.set(value_col, value.to_string());
    }

    log_success(format!(
        "Valued {} players, {} at the cap of {}",
        report.records, report.capped, config.market_value.cap
    ));
    Ok(report)
}

/// Value of one player and whether it hit the cap.
fn market_value<R: Rng + ?Sized>(
    record: &Record,
    rating: i32,
    age: i32,
    position_col: usize,
    tier_col: usize,
    config: &RosterConfig,
    rng: &mut R,
) -> (i64, bool) {
    let model = &config.market_value;
    let (lo, hi) = model.random_factor;
    let factor = rng.gen_range(lo..=hi);

    let value = f64::from(rating)
        * model.per_rating_point
        * model.position_multiplier(record.get(position_col))
        * model.age_multiplier(age)
        * model.tier_multiplier(record.get(tier_col))
        * factor;
    let value = value.round().max(0.0);

    if value >= model.cap as f64 {
        (model.cap, true)
    } else {
        (value as i64, false)
    }
}
