//! Position-based attribute specializer.
//!
//! Every player's position selects at most one family rule (or one of its
//! variants) and at most one position override. Adjustments are applied in
//! listed order, family first, and each touched attribute is clamped to
//! 51..=99 right after its own adjustment.
//!
//! A draw is consumed for every adjustment even when the cell is empty,
//! unparseable or its column is missing, so one record's holes never shift
//! the values drawn for the next.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::Serialize;

use crate::config::{AttributeAdjustment, RosterConfig};
use crate::error::TransformResult;
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::{clamp_rating, parse_int, Record, Table};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecializeReport {
    pub records: usize,
    /// Family label → players
    pub by_family: BTreeMap<String, usize>,
    /// Position code → players, for positions with a family or override
    pub by_position: BTreeMap<String, usize>,
    pub attributes_changed: usize,
}

/// Specialize attributes with a generator seeded from `config`.
pub fn specialize_positions(
    table: &mut Table,
    config: &RosterConfig,
) -> TransformResult<SpecializeReport> {
    let mut rng = config.rng();
    specialize_positions_with(table, config, &mut rng)
}

/// Specialize attributes drawing from `rng`.
pub fn specialize_positions_with<R: Rng + ?Sized>(
    table: &mut Table,
    config: &RosterConfig,
    rng: &mut R,
) -> TransformResult<SpecializeReport> {
    let position_col = table.column(&config.columns.position)?;
    let columns: HashMap<String, usize> = table
        .headers()
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), i))
        .collect();
    let rules = &config.position_rules;

    log_info(format!("🎯 Specializing attributes by position (seed {})...", config.seed));

    let mut report = SpecializeReport { records: table.len(), ..Default::default() };

    for record in table.records_mut() {
        let position = record.get(position_col).to_string();
        let family = rules.family_of(&position);
        let over = rules.override_for(&position);

        if let Some(rule) = family {
            *report.by_family.entry(rule.family.label().to_string()).or_insert(0) += 1;
            report.attributes_changed +=
                apply(record, rule.adjustments_for(&position), &columns, rng);
        }
        if let Some(over) = over {
            report.attributes_changed += apply(record, &over.adjustments, &columns, rng);
        }
        if family.is_some() || over.is_some() {
            *report.by_position.entry(position).or_insert(0) += 1;
        }
    }

    for (family, count) in &report.by_family {
        log_info_indent(format!("{}: {} players", family, count), 1);
    }
    log_success(format!(
        "Specialized {} players, {} attribute cells changed",
        report.by_position.values().sum::<usize>(),
        report.attributes_changed
    ));
    Ok(report)
}

/// Apply `adjustments` to one record, returning how many cells changed.
fn apply<R: Rng + ?Sized>(
    record: &mut Record,
    adjustments: &[AttributeAdjustment],
    columns: &HashMap<String, usize>,
    rng: &mut R,
) -> usize {
    let mut changed = 0;
    for adjustment in adjustments {
        let delta = adjustment.delta.draw(rng);
        let Some(&col) = columns.get(adjustment.attribute.as_str()) else {
            continue;
        };
        let Some(value) = parse_int(record.get(col)) else {
            continue;
        };
        let new = clamp_rating(value.saturating_add(delta));
        if new.to_string() != record.get(col) {
            changed += 1;
        }
        record.set(col, new.to_string());
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Span;
    use crate::parser::parse_str;
    use crate::writer::table_to_bytes;

    const HEADER: &str = "姓名,主要位置,射门,远射,头球,传球,盘带,停球,抢断,强壮,速度\n";

    fn table(rows: &str) -> Table {
        parse_str(&format!("{}{}", HEADER, rows)).unwrap()
    }

    fn int(t: &Table, row: usize, column: &str) -> i32 {
        t.value(row, column).unwrap().parse().unwrap()
    }

    #[test]
    fn test_cdm_tackling_gains_family_and_override() {
        for seed in 0..50 {
            let mut t = table("a,CDM,70,70,70,70,70,70,70,70,70\n");
            specialize_positions(&mut t, &RosterConfig::default().with_seed(seed)).unwrap();

            let tackling = int(&t, 0, "抢断");
            assert!((77..=85).contains(&tackling), "seed {seed}: {tackling}");
            // family -7..-3 then override -5..-2
            let shooting = int(&t, 0, "射门");
            assert!((58..=65).contains(&shooting), "seed {seed}: {shooting}");
            assert_eq!(int(&t, 0, "速度"), 70);
        }
    }

    #[test]
    fn test_goalkeeper_unchanged() {
        let mut t = table("a,GK,60,60,60,60,60,60,60,60,60\n");
        let before = t.clone();
        let report = specialize_positions(&mut t, &RosterConfig::default()).unwrap();

        assert_eq!(t, before);
        assert_eq!(report.by_family.get("goalkeeper"), Some(&1));
        assert_eq!(report.attributes_changed, 0);
    }

    #[test]
    fn test_wide_midfielder_uses_variant() {
        let mut t = table("a,LM,70,70,70,70,70,70,70,70,70\nb,CM,70,70,70,70,70,70,70,70,70\n");
        specialize_positions(&mut t, &RosterConfig::default()).unwrap();

        assert!(int(&t, 0, "速度") > 70);
        assert_eq!(int(&t, 0, "停球"), 70);
        assert!(int(&t, 1, "停球") > 70);
        assert_eq!(int(&t, 1, "速度"), 70);
    }

    #[test]
    fn test_unknown_position_untouched() {
        let mut t = table("a,SW,70,70,70,70,70,70,70,70,70\n");
        let before = t.clone();
        let report = specialize_positions(&mut t, &RosterConfig::default()).unwrap();

        assert_eq!(t, before);
        assert!(report.by_position.is_empty());
        assert!(report.by_family.is_empty());
    }

    #[test]
    fn test_clamped_to_bounds() {
        let mut t = table("a,ST,98,97,99,70,99,70,53,70,70\nb,CB,52,51,99,70,52,70,97,99,70\n");
        specialize_positions(&mut t, &RosterConfig::default()).unwrap();

        assert_eq!(int(&t, 0, "射门"), 99);
        assert_eq!(int(&t, 0, "头球"), 99);
        assert_eq!(int(&t, 0, "抢断"), 51);
        assert_eq!(int(&t, 1, "射门"), 51);
        assert_eq!(int(&t, 1, "远射"), 51);
        assert_eq!(int(&t, 1, "抢断"), 99);
        assert_eq!(int(&t, 1, "强壮"), 99);
    }

    #[test]
    fn test_extreme_cells_saturate_into_bounds() {
        let mut t = table(
            "a,ST,2147483647,70,70,70,70,70,-2147483648,70,70\n\
             b,CB,-2147483648,70,70,70,70,70,2147483647,70,70\n",
        );
        specialize_positions(&mut t, &RosterConfig::default()).unwrap();

        // ST: 射门 +3..8, 抢断 -6..-2; CB: 射门 -7..-3, 抢断 +4..8
        assert_eq!(int(&t, 0, "射门"), 99);
        assert_eq!(int(&t, 0, "抢断"), 51);
        assert_eq!(int(&t, 1, "射门"), 51);
        assert_eq!(int(&t, 1, "抢断"), 99);
    }

    #[test]
    fn test_empty_cell_keeps_sequence() {
        let config = RosterConfig::default();
        let mut with_hole = table("a,ST,,70,70,70,70,70,70,70,70\nb,ST,70,70,70,70,70,70,70,70,70\n");
        let mut full = table("a,ST,70,70,70,70,70,70,70,70,70\nb,ST,70,70,70,70,70,70,70,70,70\n");
        specialize_positions(&mut with_hole, &config).unwrap();
        specialize_positions(&mut full, &config).unwrap();

        assert_eq!(with_hole.value(0, "射门"), Some(""));
        assert_eq!(with_hole.records()[1], full.records()[1]);
    }

    #[test]
    fn test_missing_column_skipped() {
        let mut t = parse_str("姓名,主要位置,射门\na,CB,70\n").unwrap();
        specialize_positions(&mut t, &RosterConfig::default()).unwrap();
        let shooting = int(&t, 0, "射门");
        assert!((63..=67).contains(&shooting));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let rows = "a,ST,70,70,70,70,70,70,70,70,70\nb,CDM,80,80,80,80,80,80,80,80,80\n";
        let config = RosterConfig::default().with_seed(7);
        let mut a = table(rows);
        let mut b = table(rows);
        specialize_positions(&mut a, &config).unwrap();
        specialize_positions(&mut b, &config).unwrap();
        assert_eq!(table_to_bytes(&a), table_to_bytes(&b));
    }

    #[test]
    fn test_counts_by_family_and_position() {
        let mut t = table(
            "a,ST,70,70,70,70,70,70,70,70,70\n\
             b,RW,70,70,70,70,70,70,70,70,70\n\
             c,CDM,70,70,70,70,70,70,70,70,70\n\
             d,GK,70,70,70,70,70,70,70,70,70\n",
        );
        let report = specialize_positions(&mut t, &RosterConfig::default()).unwrap();

        assert_eq!(report.by_family.get("attacking"), Some(&2));
        assert_eq!(report.by_family.get("defensive"), Some(&1));
        assert_eq!(report.by_position.get("CDM"), Some(&1));
        assert_eq!(report.by_position.get("GK"), Some(&1));
    }

    #[test]
    fn test_override_without_family_still_applies() {
        let mut config = RosterConfig::default();
        config.position_rules.overrides.push(crate::config::PositionOverride {
            position: "SW".into(),
            adjustments: vec![AttributeAdjustment { attribute: "抢断".into(), delta: Span(5, 5) }],
        });
        let mut t = table("a,SW,70,70,70,70,70,70,70,70,70\n");
        specialize_positions(&mut t, &config).unwrap();
        assert_eq!(int(&t, 0, "抢断"), 75);
    }
}
