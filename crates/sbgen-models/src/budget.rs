//! Budget estimation.
//!
//! A pure mapping from budget tier, total duration and project type to a cost
//! band in a fixed currency. Each tier has a base fee plus a per-second rate;
//! the project type scales the result, and the band spans 80% to 120% of the
//! point estimate. All values are rounded to the nearest 100.
//!
//! # Example
//!
//! ```
//! use sbgen_models::{BudgetEstimator, BudgetTier, ProjectType};
//!
//! let estimate = BudgetEstimator::estimate(BudgetTier::Medium, 30.0, ProjectType::Tvc);
//! assert_eq!(estimate.total, 66_000); // (20_000 + 800 * 30) * 1.5
//! assert_eq!(estimate.min, 52_800);
//! assert_eq!(estimate.max, 79_200);
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::brief::{BudgetTier, ProjectType};

/// Currency of every estimate.
pub const BUDGET_CURRENCY: &str = "CNY";

/// Lower edge of the band, in percent of the point estimate.
const BAND_LOW_PERCENT: u64 = 80;

/// Upper edge of the band, in percent of the point estimate.
const BAND_HIGH_PERCENT: u64 = 120;

/// Base fee and per-second rate for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRates {
    pub base: u64,
    pub per_second: u64,
}

impl TierRates {
    pub fn for_tier(tier: BudgetTier) -> Self {
        match tier {
            BudgetTier::Low => Self {
                base: 8_000,
                per_second: 300,
            },
            BudgetTier::Medium => Self {
                base: 20_000,
                per_second: 800,
            },
            BudgetTier::High => Self {
                base: 50_000,
                per_second: 2_000,
            },
            BudgetTier::Premium => Self {
                base: 120_000,
                per_second: 5_000,
            },
        }
    }
}

/// Production cost multiplier per project type, in percent.
fn project_multiplier_percent(project_type: ProjectType) -> u64 {
    match project_type {
        ProjectType::Tvc => 150,
        ProjectType::Brand => 120,
        ProjectType::Corporate => 100,
        ProjectType::Kol => 80,
        ProjectType::Social => 60,
    }
}

/// Estimated cost band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEstimate {
    pub min: u64,
    pub max: u64,
    /// Point estimate the band is built around
    pub total: u64,
    pub currency: String,
}

impl BudgetEstimate {
    /// Format as `"CNY 52,800 - 79,200"`.
    pub fn format_range(&self) -> String {
        format!(
            "{} {} - {}",
            self.currency,
            group_thousands(self.min),
            group_thousands(self.max)
        )
    }

    /// Format the point estimate as `"CNY 66,000"`.
    pub fn format_total(&self) -> String {
        format!("{} {}", self.currency, group_thousands(self.total))
    }
}

/// Pure budget calculator.
pub struct BudgetEstimator;

impl BudgetEstimator {
    /// Estimate the budget for a tier, total duration and project type.
    ///
    /// Negative or non-finite durations count as zero seconds.
    pub fn estimate(tier: BudgetTier, total_seconds: f64, project_type: ProjectType) -> BudgetEstimate {
        let seconds = if total_seconds.is_finite() && total_seconds > 0.0 {
            total_seconds
        } else {
            0.0
        };

        let rates = TierRates::for_tier(tier);
        let raw = rates.base as f64 + rates.per_second as f64 * seconds;
        let scaled = raw * project_multiplier_percent(project_type) as f64 / 100.0;
        let total = round_to_hundred(scaled);

        BudgetEstimate {
            min: round_to_hundred(total as f64 * BAND_LOW_PERCENT as f64 / 100.0),
            max: round_to_hundred(total as f64 * BAND_HIGH_PERCENT as f64 / 100.0),
            total,
            currency: BUDGET_CURRENCY.to_string(),
        }
    }

    /// Same as [`BudgetEstimator::estimate`] but from a raw tier label;
    /// unknown labels use the medium tier.
    pub fn estimate_for_label(tier: &str, total_seconds: f64, project_type: ProjectType) -> BudgetEstimate {
        Self::estimate(BudgetTier::parse_or_medium(tier), total_seconds, project_type)
    }
}

fn round_to_hundred(value: f64) -> u64 {
    ((value / 100.0).round() * 100.0) as u64
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
