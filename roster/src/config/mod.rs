//! Run configuration.
//!
//! Everything a pass needs beyond the table itself lives in [`RosterConfig`]:
//! the random seed, the column names, tier ranges, rating overrides, nudge
//! ranges, the tag vocabulary and the position rules. [`RosterConfig::default`]
//! carries the values the roster has always been maintained with; a JSON file
//! can override any subset of them.
//!
//! ```json
//! {
//!   "seed": 7,
//!   "tiers": [
//!     { "label": "职业", "range": [92, 99], "nudge": [-1, 2] },
//!     { "label": "高",   "range": [82, 89], "nudge": [-2, 2] }
//!   ],
//!   "rating_overrides": [{ "name": "孟夜", "rating": 97, "tier": "职业" }]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::models::{PositionFamily, Span, RATING_MAX, RATING_MIN};
use crate::validation::validate;

/// Table file used when none is given.
pub const DEFAULT_TABLE_FILE: &str = "2025member.csv";

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 42;

const CONFIG_SCHEMA: &str = include_str!("../../schemas/roster-config.json");

// =============================================================================
// Sections
// =============================================================================

/// Names of the columns the passes read and write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub name: String,
    pub skill_level: String,
    pub overall_rating: String,
    pub position: String,
    pub group: String,
    pub age: String,
    /// Written by the valuation pass, appended when absent
    pub market_value: String,
    /// Tag slots, in order
    pub tags: Vec<String>,
    /// Tag slot the nudger fills when empty; must be one of `tags`
    pub fill_tag: String,
    /// Numeric positional attributes
    pub attributes: Vec<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: "姓名".into(),
            skill_level: "水平".into(),
            overall_rating: "综合能力".into(),
            position: "主要位置".into(),
            group: "组别".into(),
            age: "年龄".into(),
            market_value: "身价".into(),
            tags: strings(&["标签1", "标签2", "标签3"]),
            fill_tag: "标签3".into(),
            attributes: strings(&[
                "射门", "远射", "头球", "传球", "盘带", "停球", "抢断", "强壮", "速度", "耐力",
                "体能恢复",
            ]),
        }
    }
}

/// One skill tier, listed from most to least prestigious.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub label: String,
    /// Allowed overall rating range
    pub range: Span,
    /// Random contribution to the overall rating in the nudger
    pub nudge: Span,
}

/// Target rating for a named player raised by the tier corrector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingOverride {
    pub name: String,
    pub rating: i32,
    /// Only applies while the player is in this tier; any tier when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// Named individual that must not be outrated by a lower tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTierCheck {
    pub name: String,
    pub tier: String,
    pub lower_tier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNudge {
    pub group: String,
    pub nudge: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionNudge {
    pub positions: Vec<String>,
    pub nudge: Span,
}

/// Signed random change to one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAdjustment {
    pub attribute: String,
    pub delta: Span,
}

/// Position-specific replacement for a family's adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyVariant {
    pub positions: Vec<String>,
    pub adjustments: Vec<AttributeAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRule {
    pub family: PositionFamily,
    pub positions: Vec<String>,
    #[serde(default)]
    pub adjustments: Vec<AttributeAdjustment>,
    #[serde(default)]
    pub variants: Vec<FamilyVariant>,
}

impl FamilyRule {
    /// Adjustments for `position`: a matching variant's, else the family's.
    pub fn adjustments_for(&self, position: &str) -> &[AttributeAdjustment] {
        self.variants
            .iter()
            .find(|v| v.positions.iter().any(|p| p == position))
            .map(|v| v.adjustments.as_slice())
            .unwrap_or(&self.adjustments)
    }
}

/// Extra adjustments for one position, applied after its family rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOverride {
    pub position: String,
    pub adjustments: Vec<AttributeAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionRules {
    pub families: Vec<FamilyRule>,
    pub overrides: Vec<PositionOverride>,
}

impl PositionRules {
    pub fn family_of(&self, position: &str) -> Option<&FamilyRule> {
        self.families
            .iter()
            .find(|f| f.positions.iter().any(|p| p == position))
    }

    pub fn override_for(&self, position: &str) -> Option<&PositionOverride> {
        self.overrides.iter().find(|o| o.position == position)
    }
}

impl Default for PositionRules {
    fn default() -> Self {
        Self {
            families: vec![
                FamilyRule {
                    family: PositionFamily::Attacking,
                    positions: strings(&["ST", "CAM", "LW", "RW"]),
                    adjustments: vec![
                        adjust("射门", 3, 8),
                        adjust("远射", 2, 6),
                        adjust("头球", 1, 5),
                        adjust("盘带", 2, 6),
                        adjust("抢断", -6, -2),
                    ],
                    variants: vec![],
                },
                FamilyRule {
                    family: PositionFamily::Defensive,
                    positions: strings(&["CB", "LB", "RB", "CDM"]),
                    adjustments: vec![
                        adjust("抢断", 4, 8),
                        adjust("强壮", 2, 6),
                        adjust("头球", 1, 4),
                        adjust("射门", -7, -3),
                        adjust("远射", -6, -2),
                        adjust("盘带", -4, -1),
                    ],
                    variants: vec![],
                },
                FamilyRule {
                    family: PositionFamily::Midfield,
                    positions: strings(&["CM", "LM", "RM"]),
                    adjustments: vec![adjust("传球", 2, 6), adjust("停球", 1, 4)],
                    variants: vec![FamilyVariant {
                        positions: strings(&["LM", "RM"]),
                        adjustments: vec![
                            adjust("传球", 2, 5),
                            adjust("盘带", 2, 5),
                            adjust("速度", 2, 5),
                        ],
                    }],
                },
                FamilyRule {
                    family: PositionFamily::Goalkeeper,
                    positions: strings(&["GK"]),
                    adjustments: vec![],
                    variants: vec![],
                },
            ],
            overrides: vec![PositionOverride {
                position: "CDM".into(),
                adjustments: vec![
                    adjust("抢断", 3, 7),
                    adjust("强壮", 1, 5),
                    adjust("传球", 1, 4),
                    adjust("射门", -5, -2),
                    adjust("远射", -4, -1),
                ],
            }],
        }
    }
}

/// Redraw attributes sitting exactly at `ceiling` from `redraw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierCap {
    pub ceiling: i32,
    pub redraw: Span,
}

impl Default for OutlierCap {
    fn default() -> Self {
        Self { ceiling: RATING_MAX, redraw: Span(92, 95) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionMultiplier {
    pub positions: Vec<String>,
    pub multiplier: f64,
}

/// Multiplier for players younger than `below`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBracket {
    pub below: i32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierMultiplier {
    pub tier: String,
    pub multiplier: f64,
}

/// Market value model of the valuation pass.
///
/// `rating * per_rating_point`, times the position, age and tier multipliers
/// and a random factor drawn from `random_factor`, rounded and capped at `cap`.
/// Unlisted positions and tiers use a multiplier of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketValue {
    pub per_rating_point: f64,
    pub position_multipliers: Vec<PositionMultiplier>,
    /// Checked in order; the first bracket whose bound exceeds the age wins
    pub age_brackets: Vec<AgeBracket>,
    /// Multiplier for ages past every bracket
    pub senior_multiplier: f64,
    /// Age assumed when the cell is empty, unparseable or missing
    pub default_age: i32,
    pub tier_multipliers: Vec<TierMultiplier>,
    pub random_factor: (f64, f64),
    pub cap: i64,
}

impl MarketValue {
    pub fn position_multiplier(&self, position: &str) -> f64 {
        self.position_multipliers
            .iter()
            .find(|p| p.positions.iter().any(|code| code == position))
            .map(|p| p.multiplier)
            .unwrap_or(1.0)
    }

    pub fn age_multiplier(&self, age: i32) -> f64 {
        self.age_brackets
            .iter()
            .find(|b| age < b.below)
            .map(|b| b.multiplier)
            .unwrap_or(self.senior_multiplier)
    }

    pub fn tier_multiplier(&self, tier: &str) -> f64 {
        self.tier_multipliers
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.multiplier)
            .unwrap_or(1.0)
    }
}

impl Default for MarketValue {
    fn default() -> Self {
        let position = |codes: &[&str], multiplier| PositionMultiplier {
            positions: strings(codes),
            multiplier,
        };
        let tier = |label: &str, multiplier| TierMultiplier { tier: label.into(), multiplier };
        Self {
            per_rating_point: 8000.0,
            position_multipliers: vec![
                position(&["ST", "CAM", "LW", "RW"], 1.3),
                position(&["CB", "LB", "RB"], 1.1),
                position(&["GK"], 1.2),
            ],
            age_brackets: vec![
                AgeBracket { below: 25, multiplier: 1.4 },
                AgeBracket { below: 30, multiplier: 1.2 },
                AgeBracket { below: 35, multiplier: 0.9 },
            ],
            senior_multiplier: 0.6,
            default_age: 30,
            tier_multipliers: vec![
                tier("职业", 1.5),
                tier("极高", 1.3),
                tier("高", 1.1),
                tier("中", 1.0),
                tier("低", 0.8),
            ],
            random_factor: (0.8, 1.2),
            cap: 1_000_000,
        }
    }
}

// =============================================================================
// RosterConfig
// =============================================================================

/// Configuration shared by every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Seed of every random pass
    pub seed: u64,
    pub columns: ColumnNames,
    /// Skill tiers, most prestigious first
    pub tiers: Vec<TierConfig>,
    pub rating_overrides: Vec<RatingOverride>,
    pub cross_tier_checks: Vec<CrossTierCheck>,
    pub group_nudges: Vec<GroupNudge>,
    /// Group contribution for groups not listed in `group_nudges`
    pub default_group_nudge: Span,
    pub position_nudges: Vec<PositionNudge>,
    /// Rating assumed by the nudger when the cell is not an integer
    pub fallback_rating: i32,
    /// An unchanged rating is nudged again if its value occurs more than this many times
    pub cluster_threshold: usize,
    pub cluster_nudge: Span,
    pub tag_vocabulary: Vec<String>,
    pub position_rules: PositionRules,
    pub outlier_cap: OutlierCap,
    pub market_value: MarketValue,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            columns: ColumnNames::default(),
            tiers: vec![
                tier("职业", Span(92, 99), Span(-1, 2)),
                tier("极高", Span(89, 94), Span(-2, 1)),
                tier("高", Span(82, 89), Span(-2, 2)),
                tier("中", Span(75, 83), Span(-3, 3)),
                tier("低", Span(70, 78), Span(-2, 4)),
            ],
            rating_overrides: [
                ("杨林", 93, "极高"),
                ("荀洋", 92, "极高"),
                ("孟宪勇", 94, "极高"),
                ("陈旭", 96, "职业"),
                ("刘帅", 95, "职业"),
                ("孟夜", 97, "职业"),
            ]
            .into_iter()
            .map(|(name, rating, tier)| RatingOverride {
                name: name.into(),
                rating,
                tier: Some(tier.into()),
            })
            .collect(),
            cross_tier_checks: vec![CrossTierCheck {
                name: "杨林".into(),
                tier: "极高".into(),
                lower_tier: "高".into(),
            }],
            group_nudges: vec![GroupNudge { group: "竞技组".into(), nudge: Span(-1, 1) }],
            default_group_nudge: Span(-1, 2),
            position_nudges: vec![
                position_nudge(&["GK"], Span(-1, 1)),
                position_nudge(&["ST", "CF"], Span(0, 2)),
                position_nudge(&["CM", "CAM", "CDM"], Span(-1, 1)),
                position_nudge(&["CB", "LB", "RB"], Span(-1, 1)),
                position_nudge(&["LW", "RW", "LM", "RM"], Span(0, 1)),
            ],
            fallback_rating: 75,
            cluster_threshold: 2,
            cluster_nudge: Span(-2, 2),
            tag_vocabulary: strings(&[
                "🌟团队之星", "🔥斗志昂扬", "⚽足球智者", "🛡️防守专家", "🚀进攻利器",
                "🎯精准打击", "💪体能怪兽", "🧠战术执行", "⚡闪电突破", "🎨技术流",
                "🗿稳如磐石", "🌊攻守转换", "🎪表演大师", "👑领袖气质", "🔧万能工具",
                "🦅制空权", "💎场上珍宝", "🏃不知疲倦", "🎼节拍大师", "🌪️旋风突击",
                "🎯百步穿杨", "⚔️边路尖兵", "🗡️锐利突破", "🎖️比赛经验", "🔥激情四射",
                "🛡️钢铁意志", "⭐明日之星", "🎨创意无限", "💡灵光一闪", "🌟希望之光",
            ]),
            position_rules: PositionRules::default(),
            outlier_cap: OutlierCap::default(),
            market_value: MarketValue::default(),
        }
    }
}

impl RosterConfig {
    /// Load a JSON config file, validate it and return it with any warnings.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<(Self, Vec<String>)> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse, schema-check and semantically check a JSON config.
    pub fn from_json_str(content: &str) -> ConfigResult<(Self, Vec<String>)> {
        let value: Value = serde_json::from_str(content)?;
        let schema: Value = serde_json::from_str(CONFIG_SCHEMA)?;
        validate(&schema, &value).map_err(|errors| ConfigError::Schema { errors })?;

        let config: RosterConfig = serde_json::from_value(value)?;
        let warnings = config.check()?;
        Ok((config, warnings))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fresh deterministic generator for one pass.
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    pub fn tier(&self, label: &str) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.label == label)
    }

    /// Override target for `name` while in `tier`.
    pub fn rating_override(&self, name: &str, tier: &str) -> Option<i32> {
        self.rating_overrides
            .iter()
            .find(|o| o.name == name && o.tier.as_deref().map_or(true, |t| t == tier))
            .map(|o| o.rating)
    }

    /// Position of `label` in prestige order.
    pub fn tier_rank(&self, label: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.label == label)
    }

    /// Group contribution for `group`.
    pub fn group_nudge(&self, group: &str) -> Span {
        self.group_nudges
            .iter()
            .find(|g| g.group == group)
            .map(|g| g.nudge)
            .unwrap_or(self.default_group_nudge)
    }

    pub fn position_nudge(&self, position: &str) -> Option<Span> {
        self.position_nudges
            .iter()
            .find(|p| p.positions.iter().any(|code| code == position))
            .map(|p| p.nudge)
    }

    /// Check semantic consistency. Returns warnings for suspicious but usable values.
    pub fn check(&self) -> ConfigResult<Vec<String>> {
        let mut warnings = Vec::new();

        if self.tiers.is_empty() {
            return Err(invalid("at least one tier is required"));
        }

        let mut labels = HashSet::new();
        for tier in &self.tiers {
            if !labels.insert(tier.label.as_str()) {
                return Err(invalid(format!("tier '{}' listed twice", tier.label)));
            }
            check_ordered(&tier.range, &format!("tier '{}' range", tier.label))?;
            check_rating_span(&tier.range, &format!("tier '{}' range", tier.label))?;
            check_ordered(&tier.nudge, &format!("tier '{}' nudge", tier.label))?;
        }

        for pair in self.tiers.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            if upper.range.lo() <= lower.range.lo() {
                return Err(invalid(format!(
                    "tier '{}' minimum {} must exceed tier '{}' minimum {}",
                    upper.label,
                    upper.range.lo(),
                    lower.label,
                    lower.range.lo()
                )));
            }
            if upper.range.overlaps(&lower.range) {
                warnings.push(format!(
                    "tier ranges overlap: '{}' {} and '{}' {}",
                    upper.label, upper.range, lower.label, lower.range
                ));
            }
        }

        for over in &self.rating_overrides {
            if !(RATING_MIN..=RATING_MAX).contains(&over.rating) {
                return Err(invalid(format!(
                    "override for '{}' ({}) outside {}..{}",
                    over.name, over.rating, RATING_MIN, RATING_MAX
                )));
            }
            if let Some(tier) = &over.tier {
                if self.tier(tier).is_none() {
                    return Err(invalid(format!(
                        "override for '{}' references unknown tier '{}'",
                        over.name, tier
                    )));
                }
            }
        }

        for check in &self.cross_tier_checks {
            for label in [&check.tier, &check.lower_tier] {
                if self.tier(label).is_none() {
                    return Err(invalid(format!(
                        "cross-tier check for '{}' references unknown tier '{}'",
                        check.name, label
                    )));
                }
            }
        }

        if !self.columns.tags.contains(&self.columns.fill_tag) {
            return Err(invalid(format!(
                "fill tag column '{}' is not one of the tag columns",
                self.columns.fill_tag
            )));
        }

        check_ordered(&self.default_group_nudge, "default group nudge")?;
        for group in &self.group_nudges {
            check_ordered(&group.nudge, &format!("group '{}' nudge", group.group))?;
        }
        for nudge in &self.position_nudges {
            check_ordered(&nudge.nudge, &format!("position {:?} nudge", nudge.positions))?;
        }
        check_ordered(&self.cluster_nudge, "cluster nudge")?;

        if !(RATING_MIN..=RATING_MAX).contains(&self.fallback_rating) {
            return Err(invalid(format!(
                "fallback rating {} outside {}..{}",
                self.fallback_rating, RATING_MIN, RATING_MAX
            )));
        }

        let mut seen_positions = HashSet::new();
        for family in &self.position_rules.families {
            for position in &family.positions {
                if !seen_positions.insert(position.as_str()) {
                    return Err(invalid(format!(
                        "position '{}' belongs to more than one family",
                        position
                    )));
                }
            }
            let all = family
                .adjustments
                .iter()
                .chain(family.variants.iter().flat_map(|v| v.adjustments.iter()));
            for adjustment in all {
                check_ordered(
                    &adjustment.delta,
                    &format!("{} adjustment of '{}'", family.family, adjustment.attribute),
                )?;
            }
        }
        for over in &self.position_rules.overrides {
            if self.position_rules.family_of(&over.position).is_none() {
                warnings.push(format!(
                    "override for position '{}' has no family rule",
                    over.position
                ));
            }
            for adjustment in &over.adjustments {
                check_ordered(
                    &adjustment.delta,
                    &format!("{} override of '{}'", over.position, adjustment.attribute),
                )?;
            }
        }

        self.check_market_value(&mut warnings)?;

        check_ordered(&self.outlier_cap.redraw, "outlier redraw")?;
        check_rating_span(&self.outlier_cap.redraw, "outlier redraw")?;

        if self.tag_vocabulary.is_empty() {
            warnings.push("tag vocabulary is empty; no tags will be filled".to_string());
        }

        Ok(warnings)
    }

    fn check_market_value(&self, warnings: &mut Vec<String>) -> ConfigResult<()> {
        let value = &self.market_value;
        let multipliers = value
            .position_multipliers
            .iter()
            .map(|p| p.multiplier)
            .chain(value.age_brackets.iter().map(|b| b.multiplier))
            .chain(value.tier_multipliers.iter().map(|t| t.multiplier))
            .chain([value.per_rating_point, value.senior_multiplier]);
        for multiplier in multipliers {
            if !multiplier.is_finite() || multiplier < 0.0 {
                return Err(invalid(format!(
                    "market value multiplier {} must be a non-negative number",
                    multiplier
                )));
            }
        }

        let (lo, hi) = value.random_factor;
        if !(lo.is_finite() && hi.is_finite()) || lo < 0.0 || lo > hi {
            return Err(invalid(format!("market value random factor ({}, {}) is invalid", lo, hi)));
        }
        if value.cap <= 0 {
            return Err(invalid(format!("market value cap {} must be positive", value.cap)));
        }

        if value.age_brackets.windows(2).any(|w| w[0].below >= w[1].below) {
            warnings.push("market value age brackets are not ascending".to_string());
        }
        for tier in &value.tier_multipliers {
            if self.tier(&tier.tier).is_none() {
                warnings.push(format!("market value multiplier for unknown tier '{}'", tier.tier));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn tier(label: &str, range: Span, nudge: Span) -> TierConfig {
    TierConfig { label: label.into(), range, nudge }
}

fn position_nudge(positions: &[&str], nudge: Span) -> PositionNudge {
    PositionNudge { positions: strings(positions), nudge }
}

fn adjust(attribute: &str, lo: i32, hi: i32) -> AttributeAdjustment {
    AttributeAdjustment { attribute: attribute.into(), delta: Span(lo, hi) }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn check_ordered(span: &Span, what: &str) -> ConfigResult<()> {
    if span.0 > span.1 {
        return Err(invalid(format!("{} {} is reversed", what, span)));
    }
    Ok(())
}

fn check_rating_span(span: &Span, what: &str) -> ConfigResult<()> {
    if span.lo() < RATING_MIN || span.hi() > RATING_MAX {
        return Err(invalid(format!(
            "{} {} outside {}..{}",
            what, span, RATING_MIN, RATING_MAX
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_default_config_is_valid() {
        let config = RosterConfig::default();
        let warnings = config.check().unwrap();
        // The curated default ranges overlap between neighbours
        assert!(warnings.iter().any(|w| w.contains("overlap")));
    }

    #[test]
    fn test_default_round_trips_through_json() {
        let config = RosterConfig::default();
        let json = config.to_json().unwrap();
        let (parsed, _) = RosterConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let (config, _) = RosterConfig::from_json_str(r#"{ "seed": 7 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.tiers.len(), 5);
        assert_eq!(config.columns.overall_rating, "综合能力");
    }

    #[test]
    fn test_schema_rejects_unknown_key() {
        let err = RosterConfig::from_json_str(r#"{ "sede": 7 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));
    }

    #[test]
    fn test_schema_rejects_bad_span() {
        let err = RosterConfig::from_json_str(r#"{ "default_group_nudge": [1] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));
    }

    #[test]
    fn test_tier_minimums_must_descend() {
        let json = r#"{ "tiers": [
            { "label": "高", "range": [80, 88], "nudge": [0, 0] },
            { "label": "职业", "range": [90, 95], "nudge": [0, 0] }
        ], "cross_tier_checks": [] }"#;
        let err = RosterConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("must exceed"));
    }

    #[test]
    fn test_tier_range_outside_ratings() {
        let mut config = RosterConfig::default();
        config.tiers[0].range = Span(92, 120);
        assert!(matches!(config.check(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_tier_in_cross_check() {
        let mut config = RosterConfig::default();
        config.cross_tier_checks[0].lower_tier = "超高".into();
        assert!(config.check().unwrap_err().to_string().contains("超高"));
    }

    #[test]
    fn test_position_in_two_families_rejected() {
        let mut config = RosterConfig::default();
        config.position_rules.families[2].positions.push("CDM".into());
        assert!(config.check().unwrap_err().to_string().contains("CDM"));
    }

    #[test]
    fn test_lookups() {
        let config = RosterConfig::default();
        assert_eq!(config.group_nudge("竞技组"), Span(-1, 1));
        assert_eq!(config.group_nudge("休闲组"), Span(-1, 2));
        assert_eq!(config.position_nudge("CF"), Some(Span(0, 2)));
        assert_eq!(config.position_nudge("SW"), None);
        assert_eq!(config.tier_rank("中"), Some(3));

        let midfield = config.position_rules.family_of("LM").unwrap();
        assert_eq!(midfield.adjustments_for("LM").len(), 3);
        assert_eq!(midfield.adjustments_for("CM").len(), 2);
    }

    #[test]
    fn test_rating_override_scoped_to_tier() {
        let mut config = RosterConfig::default();
        assert_eq!(config.rating_override("杨林", "极高"), Some(93));
        assert_eq!(config.rating_override("杨林", "低"), None);
        assert_eq!(config.rating_override("路人", "极高"), None);

        config.rating_overrides.push(RatingOverride { name: "庞博".into(), rating: 76, tier: None });
        assert_eq!(config.rating_override("庞博", "低"), Some(76));
        assert_eq!(config.rating_override("庞博", "中"), Some(76));
    }

    #[test]
    fn test_override_with_unknown_tier_rejected() {
        let json = r#"{ "rating_overrides": [{ "name": "孟夜", "rating": 97, "tier": "超神" }] }"#;
        let err = RosterConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("超神"));
    }

    #[test]
    fn test_market_value_multipliers() {
        let value = MarketValue::default();
        assert_eq!(value.position_multiplier("ST"), 1.3);
        assert_eq!(value.position_multiplier("RB"), 1.1);
        assert_eq!(value.position_multiplier("GK"), 1.2);
        assert_eq!(value.position_multiplier("CM"), 1.0);

        assert_eq!(value.age_multiplier(18), 1.4);
        assert_eq!(value.age_multiplier(25), 1.2);
        assert_eq!(value.age_multiplier(34), 0.9);
        assert_eq!(value.age_multiplier(35), 0.6);

        assert_eq!(value.tier_multiplier("职业"), 1.5);
        assert_eq!(value.tier_multiplier("低"), 0.8);
        assert_eq!(value.tier_multiplier("超神"), 1.0);
    }

    #[test]
    fn test_market_value_reversed_factor_rejected() {
        let mut config = RosterConfig::default();
        config.market_value.random_factor = (1.2, 0.8);
        assert!(matches!(config.check(), Err(ConfigError::Invalid(_))));

        let mut config = RosterConfig::default();
        config.market_value.cap = 0;
        assert!(matches!(config.check(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_market_value_keeps_defaults() {
        let json = r#"{ "market_value": { "cap": 500000, "random_factor": [1.0, 1.0] } }"#;
        let (config, _) = RosterConfig::from_json_str(json).unwrap();
        assert_eq!(config.market_value.cap, 500_000);
        assert_eq!(config.market_value.random_factor, (1.0, 1.0));
        assert_eq!(config.market_value.per_rating_point, 8000.0);
    }

    #[test]
    fn test_rng_is_seeded() {
        let config = RosterConfig::default().with_seed(9);
        let a: Vec<u32> = (0..5).map(|_| config.rng().gen()).collect();
        let mut rng = config.rng();
        let b: Vec<u32> = (0..5).map(|_| rng.gen()).collect();
        // A fresh generator per call always starts at the same point
        assert!(a.iter().all(|v| *v == a[0]));
        assert_eq!(a[0], b[0]);
    }
}
