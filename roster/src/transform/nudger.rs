//! Randomized rating nudger.
//!
//! For each player, in table order:
//!
//! 1. fill the configured tag slot when empty, picking from the tag
//!    vocabulary minus the player's other tags
//! 2. add a random delta to the overall rating, the sum of a tier, a group
//!    and a position contribution, and clamp to 51..=99
//! 3. if the rating did not move and its value was shared by more than
//!    `cluster_threshold` players before the pass, nudge it once more
//!
//! All draws come from one generator seeded from the config, so the same table
//! and seed always give the same output. Step 3 is best effort: duplicate
//! ratings can remain.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::config::RosterConfig;
use crate::error::TransformResult;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{clamp_rating, parse_int, Table};
use crate::transform::analyzer::rating_histogram;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NudgeReport {
    pub records: usize,
    pub tags_filled: usize,
    pub ratings_changed: usize,
    /// Ratings that did not parse and were replaced by the fallback
    pub fallbacks: usize,
    pub before: BTreeMap<i32, usize>,
    pub after: BTreeMap<i32, usize>,
}

/// Nudge every rating with a generator seeded from `config`.
pub fn nudge_ratings(table: &mut Table, config: &RosterConfig) -> TransformResult<NudgeReport> {
    let mut rng = config.rng();
    nudge_ratings_with(table, config, &mut rng)
}

/// Nudge every rating drawing from `rng`.
pub fn nudge_ratings_with<R: Rng + ?Sized>(
    table: &mut Table,
    config: &RosterConfig,
    rng: &mut R,
) -> TransformResult<NudgeReport> {
    let cols = &config.columns;
    let name_col = table.column(&cols.name)?;
    let tier_col = table.column(&cols.skill_level)?;
    let rating_col = table.column(&cols.overall_rating)?;
    let position_col = table.column(&cols.position)?;
    let group_col = table.column(&cols.group)?;
    let fill_col = table.column(&cols.fill_tag)?;
    let other_tag_cols: Vec<usize> = cols
        .tags
        .iter()
        .filter(|t| **t != cols.fill_tag)
        .filter_map(|t| table.find_column(t))
        .collect();

    let before = rating_histogram(table, config)?;
    let mut report = NudgeReport {
        records: table.len(),
        before: before.clone(),
        ..Default::default()
    };

    log_info(format!("🎲 Nudging ratings (seed {})...", config.seed));

    for record in table.records_mut() {
        if record.get(fill_col).trim().is_empty() {
            let present: Vec<&str> = other_tag_cols.iter().map(|&c| record.get(c)).collect();
            let candidates: Vec<&String> = config
                .tag_vocabulary
                .iter()
                .filter(|tag| !present.contains(&tag.as_str()))
                .collect();
            let chosen = candidates.choose(rng).map(|tag| tag.to_string());
            if let Some(tag) = chosen {
                log_info_indent(format!("{}: tag {}", record.get(name_col), tag), 1);
                record.set(fill_col, tag);
                report.tags_filled += 1;
            }
        }

        let current = match parse_int(record.get(rating_col)) {
            Some(rating) => rating,
            None => {
                log_warning(format!(
                    "Line {}: rating '{}' is not an integer, using {}",
                    record.line(),
                    record.get(rating_col),
                    config.fallback_rating
                ));
                report.fallbacks += 1;
                config.fallback_rating
            }
        };

        let mut delta = 0;
        if let Some(tier) = config.tier(record.get(tier_col)) {
            delta += tier.nudge.draw(rng);
        }
        delta += config.group_nudge(record.get(group_col)).draw(rng);
        if let Some(nudge) = config.position_nudge(record.get(position_col)) {
            delta += nudge.draw(rng);
        }

        let mut new = clamp_rating(current.saturating_add(delta));
        let crowded = before.get(&current).copied().unwrap_or(0) > config.cluster_threshold;
        if new == current && crowded {
            new = clamp_rating(current.saturating_add(config.cluster_nudge.draw(rng)));
        }

        if new.to_string() != record.get(rating_col) {
            report.ratings_changed += 1;
        }
        record.set(rating_col, new.to_string());
    }

    report.after = rating_histogram(table, config)?;
    log_success(format!(
        "Nudged {} players: {} ratings changed, {} tags filled",
        report.records, report.ratings_changed, report.tags_filled
    ));
    Ok(report)
}

/// Print the before/after histograms through the log.
pub fn log_histograms(report: &NudgeReport) {
    log_info("Shared ratings before:");
    for (rating, count) in report.before.iter().rev().filter(|(_, c)| **c > 1) {
        log_info_indent(format!("{}: {} players", rating, count), 1);
    }
    log_info("Ratings after:");
    for (rating, count) in report.after.iter().rev() {
        log_info_indent(format!("{}: {} players", rating, count), 1);
    }
}
