//! Transformation module.
//!
//! Passes over a loaded roster table:
//! - Corrector: pull overall ratings into their tier range
//! - Analyzer: read-only distribution report
//! - Nudger: seeded random rating variation and tag filling
//! - Specializer: position-dependent attribute adjustments
//! - Capper: redraw attributes stuck at the ceiling
//! - Valuation: seeded market value per player
//! - Pipeline: run several passes in one load/save cycle

pub mod analyzer;
pub mod capper;
pub mod corrector;
pub mod nudger;
pub mod pipeline;
pub mod specializer;
pub mod valuation;

pub use analyzer::{analyze, DistributionReport, Finding, TierSummary};
pub use capper::{cap_outliers, CapReport};
pub use corrector::{correct_tier_ranges, CorrectionReport, RatingAdjustment};
pub use nudger::{nudge_ratings, NudgeReport};
pub use pipeline::*;
pub use specializer::{specialize_positions, SpecializeReport};
pub use valuation::{value_players, ValueReport};
