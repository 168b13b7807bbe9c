//! Tier-range corrector.
//!
//! Pulls every overall rating back into its tier's configured range. Ratings
//! below the range go to the tier minimum, or to the player's entry in
//! `rating_overrides` for that tier; ratings above go to the tier maximum. Tiers without a
//! configured range are left alone.

use serde::Serialize;

use crate::config::RosterConfig;
use crate::error::TransformResult;
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::Table;

/// One rating changed by the corrector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingAdjustment {
    pub line: usize,
    pub name: String,
    pub tier: String,
    pub old: i32,
    pub new: i32,
    /// The target came from `rating_overrides`
    pub overridden: bool,
}

impl std::fmt::Display for RatingAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {} → {}", self.name, self.tier, self.old, self.new)?;
        if self.overridden {
            write!(f, " (override)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionReport {
    pub adjustments: Vec<RatingAdjustment>,
}

impl CorrectionReport {
    pub fn count(&self) -> usize {
        self.adjustments.len()
    }
}

/// Correct every overall rating into its tier range.
///
/// A rating that does not parse aborts the pass before anything is changed.
pub fn correct_tier_ranges(table: &mut Table, config: &RosterConfig) -> TransformResult<CorrectionReport> {
    let cols = &config.columns;
    let name_col = table.column(&cols.name)?;
    let tier_col = table.column(&cols.skill_level)?;
    let rating_col = table.column(&cols.overall_rating)?;

    log_info("🔧 Correcting ratings into tier ranges...");

    let mut planned = Vec::new();
    for (row, record) in table.records().iter().enumerate() {
        let Some(tier) = config.tier(record.get(tier_col)) else {
            continue;
        };
        let current = record.int(rating_col, &cols.overall_rating)?;
        let name = record.get(name_col);

        let (new, overridden) = if current < tier.range.lo() {
            match config.rating_override(name, &tier.label) {
                Some(target) => (tier.range.clamp(target), true),
                None => (tier.range.lo(), false),
            }
        } else if current > tier.range.hi() {
            (tier.range.hi(), false)
        } else {
            continue;
        };

        planned.push((
            row,
            RatingAdjustment {
                line: record.line(),
                name: name.to_string(),
                tier: tier.label.clone(),
                old: current,
                new,
                overridden,
            },
        ));
    }

    let records = table.records_mut();
    let mut report = CorrectionReport::default();
    for (row, adjustment) in planned {
        records[row].set(rating_col, adjustment.new.to_string());
        log_info_indent(adjustment.to_string(), 1);
        report.adjustments.push(adjustment);
    }

    log_success(format!("Adjusted {} player rating(s)", report.count()));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingOverride;
    use crate::error::TransformError;
    use crate::parser::parse_str;

    const HEADER: &str = "姓名,水平,综合能力\n";

    fn table(rows: &str) -> Table {
        parse_str(&format!("{}{}", HEADER, rows)).unwrap()
    }

    #[test]
    fn test_low_tier_raised_to_minimum() {
        let mut t = table("庞博,低,65\n");
        let report = correct_tier_ranges(&mut t, &RosterConfig::default()).unwrap();

        assert_eq!(t.value(0, "综合能力"), Some("70"));
        assert_eq!(report.count(), 1);
        assert_eq!(report.adjustments[0].old, 65);
        assert_eq!(report.adjustments[0].new, 70);
        assert!(!report.adjustments[0].overridden);
    }

    #[test]
    fn test_override_takes_precedence_when_raising() {
        let mut t = table("杨林,极高,85\n孟夜,职业,90\n");
        correct_tier_ranges(&mut t, &RosterConfig::default()).unwrap();

        assert_eq!(t.value(0, "综合能力"), Some("93"));
        assert_eq!(t.value(1, "综合能力"), Some("97"));
    }

    #[test]
    fn test_override_ignored_when_lowering() {
        let mut t = table("孟夜,高,95\n");
        correct_tier_ranges(&mut t, &RosterConfig::default()).unwrap();
        assert_eq!(t.value(0, "综合能力"), Some("89"));
    }

    #[test]
    fn test_override_clamped_into_tier() {
        let mut config = RosterConfig::default();
        config.rating_overrides.push(RatingOverride {
            name: "庞博".into(),
            rating: 90,
            tier: None,
        });
        let mut t = table("庞博,低,60\n");
        correct_tier_ranges(&mut t, &config).unwrap();
        assert_eq!(t.value(0, "综合能力"), Some("78"));
    }

    #[test]
    fn test_override_only_in_its_tier() {
        let mut t = table("杨林,低,60\n孟夜,极高,80\n");
        let report = correct_tier_ranges(&mut t, &RosterConfig::default()).unwrap();

        assert_eq!(t.value(0, "综合能力"), Some("70"));
        assert_eq!(t.value(1, "综合能力"), Some("89"));
        assert!(report.adjustments.iter().all(|a| !a.overridden));
    }

    #[test]
    fn test_unknown_tier_untouched() {
        let mut t = table("迟骋,超神,40\n");
        let report = correct_tier_ranges(&mut t, &RosterConfig::default()).unwrap();
        assert_eq!(t.value(0, "综合能力"), Some("40"));
        assert_eq!(report.count(), 0);
    }

    #[test]
    fn test_in_range_untouched() {
        let mut t = table("荀洋,极高,90\n");
        let report = correct_tier_ranges(&mut t, &RosterConfig::default()).unwrap();
        assert_eq!(report.count(), 0);
        assert_eq!(t.value(0, "综合能力"), Some("90"));
    }

    #[test]
    fn test_idempotent() {
        let mut once = table("庞博,低,65\n杨林,极高,99\n刘帅,职业,80\n吕洋,中,79\n");
        let config = RosterConfig::default();
        correct_tier_ranges(&mut once, &config).unwrap();

        let mut twice = once.clone();
        let report = correct_tier_ranges(&mut twice, &config).unwrap();

        assert_eq!(report.count(), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_bad_rating_aborts_without_changes() {
        let mut t = table("庞博,低,65\n迟骋,高,??\n");
        let before = t.clone();
        let err = correct_tier_ranges(&mut t, &RosterConfig::default()).unwrap_err();

        match err {
            TransformError::Value(e) => {
                assert_eq!(e.line, 3);
                assert_eq!(e.value.as_deref(), Some("??"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(t, before);
    }
}
