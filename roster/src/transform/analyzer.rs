//! Read-only distribution analysis.
//!
//! Partitions players by tier, aggregates each partition, then evaluates two
//! consistency rules against the aggregates:
//!
//! - a named player must not be outrated by members of the tier below theirs
//!   (`cross_tier_checks`)
//! - the lowest rating of the top tier must exceed the highest rating of every
//!   other configured tier

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::RosterConfig;
use crate::error::TransformResult;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{parse_int, Table};

/// Number of players listed per tier in the summary.
const TOP_PLAYERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedPlayer {
    pub name: String,
    pub rating: i32,
}

/// Aggregates for one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: String,
    pub count: usize,
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    /// Highest rated players, best first
    pub top: Vec<RankedPlayer>,
}

/// A consistency rule that does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Finding {
    /// `name` in `tier` is rated below members of `lower_tier`.
    NamedBelowLowerTier {
        name: String,
        tier: String,
        rating: i32,
        lower_tier: String,
        outranked_by: Vec<RankedPlayer>,
    },
    /// The top tier's minimum does not exceed the other tiers' maximum.
    TopTierNotDominant {
        top_tier: String,
        top_min: i32,
        other_max: i32,
    },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::NamedBelowLowerTier { name, tier, rating, lower_tier, outranked_by } => {
                let names: Vec<String> = outranked_by
                    .iter()
                    .map(|p| format!("{} ({})", p.name, p.rating))
                    .collect();
                write!(
                    f,
                    "{} ({}, {}) is rated below {} player(s): {}",
                    name,
                    tier,
                    rating,
                    lower_tier,
                    names.join(", ")
                )
            }
            Finding::TopTierNotDominant { top_tier, top_min, other_max } => write!(
                f,
                "lowest {} rating ({}) does not exceed the highest other rating ({})",
                top_tier, top_min, other_max
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistributionReport {
    /// Configured tiers first (prestige order), then unconfigured ones as first seen
    pub summaries: Vec<TierSummary>,
    pub findings: Vec<Finding>,
    /// Overall rating → number of players
    pub histogram: BTreeMap<i32, usize>,
}

impl DistributionReport {
    pub fn summary(&self, tier: &str) -> Option<&TierSummary> {
        self.summaries.iter().find(|s| s.tier == tier)
    }
}

/// Players grouped by tier label, in report order.
pub fn group_by_tier(
    table: &Table,
    config: &RosterConfig,
) -> TransformResult<Vec<(String, Vec<RankedPlayer>)>> {
    let cols = &config.columns;
    let name_col = table.column(&cols.name)?;
    let tier_col = table.column(&cols.skill_level)?;
    let rating_col = table.column(&cols.overall_rating)?;

    let mut groups: Vec<(String, Vec<RankedPlayer>)> = Vec::new();
    for record in table.records() {
        let tier = record.get(tier_col);
        let player = RankedPlayer {
            name: record.get(name_col).to_string(),
            rating: record.int(rating_col, &cols.overall_rating)?,
        };
        match groups.iter_mut().find(|(label, _)| label == tier) {
            Some((_, players)) => players.push(player),
            None => groups.push((tier.to_string(), vec![player])),
        }
    }

    // Configured tiers in prestige order; unknown tiers keep first-seen order
    groups.sort_by_key(|(label, _)| config.tier_rank(label).unwrap_or(usize::MAX));
    Ok(groups)
}

/// Count players per overall rating. Cells that do not parse are skipped.
pub fn rating_histogram(table: &Table, config: &RosterConfig) -> TransformResult<BTreeMap<i32, usize>> {
    let rating_col = table.column(&config.columns.overall_rating)?;
    let mut histogram = BTreeMap::new();
    for record in table.records() {
        if let Some(rating) = parse_int(record.get(rating_col)) {
            *histogram.entry(rating).or_insert(0) += 1;
        }
    }
    Ok(histogram)
}

fn members<'a>(groups: &'a [(String, Vec<RankedPlayer>)], label: &str) -> &'a [RankedPlayer] {
    groups
        .iter()
        .find(|(l, _)| l == label)
        .map(|(_, m)| m.as_slice())
        .unwrap_or(&[])
}

fn summarize(tier: &str, members: &[RankedPlayer]) -> TierSummary {
    let ratings = members.iter().map(|p| p.rating);
    let min = ratings.clone().min().unwrap_or(0);
    let max = ratings.clone().max().unwrap_or(0);
    let total: i64 = ratings.map(i64::from).sum();
    let mean = if members.is_empty() { 0.0 } else { total as f64 / members.len() as f64 };

    let mut top = members.to_vec();
    top.sort_by(|a, b| b.rating.cmp(&a.rating));
    top.truncate(TOP_PLAYERS);

    TierSummary { tier: tier.to_string(), count: members.len(), min, max, mean, top }
}

/// Analyze the rating distribution of `table`. Never mutates.
pub fn analyze(table: &Table, config: &RosterConfig) -> TransformResult<DistributionReport> {
    let groups = group_by_tier(table, config)?;

    let summaries = groups
        .iter()
        .map(|(label, players)| summarize(label, players))
        .collect();

    let mut findings = Vec::new();

    for check in &config.cross_tier_checks {
        let Some(named) = members(&groups, &check.tier).iter().find(|p| p.name == check.name) else {
            continue;
        };
        let outranked_by: Vec<RankedPlayer> = members(&groups, &check.lower_tier)
            .iter()
            .filter(|p| p.rating > named.rating)
            .cloned()
            .collect();
        if !outranked_by.is_empty() {
            findings.push(Finding::NamedBelowLowerTier {
                name: named.name.clone(),
                tier: check.tier.clone(),
                rating: named.rating,
                lower_tier: check.lower_tier.clone(),
                outranked_by,
            });
        }
    }

    if let Some((top, rest)) = config.tiers.split_first() {
        let top_min = members(&groups, &top.label).iter().map(|p| p.rating).min();
        let other_max = rest
            .iter()
            .flat_map(|t| members(&groups, &t.label).iter().map(|p| p.rating))
            .max()
            .unwrap_or(0);
        if let Some(top_min) = top_min {
            if top_min <= other_max {
                findings.push(Finding::TopTierNotDominant {
                    top_tier: top.label.clone(),
                    top_min,
                    other_max,
                });
            }
        }
    }

    Ok(DistributionReport {
        summaries,
        findings,
        histogram: rating_histogram(table, config)?,
    })
}

/// Print a report through the log.
pub fn log_report(report: &DistributionReport) {
    log_info("📊 Rating distribution by tier:");
    for summary in &report.summaries {
        log_info_indent(
            format!(
                "{} ({} players): {}-{}, mean {:.1}",
                summary.tier, summary.count, summary.min, summary.max, summary.mean
            ),
            1,
        );
        for player in &summary.top {
            log_info_indent(format!("{}: {}", player.name, player.rating), 2);
        }
        if summary.count > summary.top.len() {
            log_info_indent(format!("... {} players in total", summary.count), 2);
        }
    }

    if report.findings.is_empty() {
        log_success("No consistency problems found");
    } else {
        log_warning(format!("🚨 {} consistency problem(s):", report.findings.len()));
        for finding in &report.findings {
            log_warning(finding.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn table(rows: &str) -> Table {
        parse_str(&format!("姓名,水平,综合能力\n{}", rows)).unwrap()
    }

    #[test]
    fn test_summaries_in_tier_order() {
        let t = table("a,中,76\nb,职业,95\nc,中,80\nd,神秘,60\nb2,职业,93\n");
        let report = analyze(&t, &RosterConfig::default()).unwrap();

        let tiers: Vec<&str> = report.summaries.iter().map(|s| s.tier.as_str()).collect();
        assert_eq!(tiers, vec!["职业", "中", "神秘"]);

        let mid = report.summary("中").unwrap();
        assert_eq!(mid.count, 2);
        assert_eq!(mid.min, 76);
        assert_eq!(mid.max, 80);
        assert!((mid.mean - 78.0).abs() < 1e-9);
        assert_eq!(mid.top[0].name, "c");
    }

    #[test]
    fn test_top_tier_dominant() {
        let t = table("a,职业,90\nb,职业,95\nc,高,80\nd,高,88\n");
        let report = analyze(&t, &RosterConfig::default()).unwrap();
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_top_tier_not_dominant() {
        let t = table("a,职业,85\nb,职业,95\nc,高,80\nd,高,88\n");
        let report = analyze(&t, &RosterConfig::default()).unwrap();
        assert_eq!(
            report.findings,
            vec![Finding::TopTierNotDominant {
                top_tier: "职业".into(),
                top_min: 85,
                other_max: 88,
            }]
        );
    }

    #[test]
    fn test_named_player_below_lower_tier() {
        let t = table("杨林,极高,86\n迟骋,高,88\n吕洋,高,87\n黄朝阳,高,86\n");
        let report = analyze(&t, &RosterConfig::default()).unwrap();

        let finding = report
            .findings
            .iter()
            .find(|f| matches!(f, Finding::NamedBelowLowerTier { .. }))
            .unwrap();
        match finding {
            Finding::NamedBelowLowerTier { outranked_by, rating, .. } => {
                assert_eq!(*rating, 86);
                let names: Vec<&str> = outranked_by.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["迟骋", "吕洋"]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_named_player_absent_no_finding() {
        let t = table("荀洋,极高,86\n迟骋,高,88\n");
        let report = analyze(&t, &RosterConfig::default()).unwrap();
        assert!(!report
            .findings
            .iter()
            .any(|f| matches!(f, Finding::NamedBelowLowerTier { .. })));
    }

    #[test]
    fn test_top_list_is_capped() {
        let rows: String = (0..8).map(|i| format!("p{},中,{}\n", i, 75 + i)).collect();
        let report = analyze(&table(&rows), &RosterConfig::default()).unwrap();
        let mid = report.summary("中").unwrap();
        assert_eq!(mid.top.len(), TOP_PLAYERS);
        assert_eq!(mid.top[0].rating, 82);
    }

    #[test]
    fn test_histogram() {
        let t = table("a,中,76\nb,中,76\nc,高,84\n");
        let histogram = rating_histogram(&t, &RosterConfig::default()).unwrap();
        assert_eq!(histogram.get(&76), Some(&2));
        assert_eq!(histogram.get(&84), Some(&1));
    }

    #[test]
    fn test_analyze_does_not_mutate() {
        let t = table("a,职业,85\nb,高,88\n");
        let before = t.clone();
        analyze(&t, &RosterConfig::default()).unwrap();
        assert_eq!(t, before);
    }

    #[test]
    fn test_bad_rating_is_fatal() {
        let t = table("a,职业,x\n");
        assert!(analyze(&t, &RosterConfig::default()).is_err());
    }
}
