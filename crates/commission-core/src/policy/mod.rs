pub mod presets;
pub mod scales;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CommissionError;
use crate::types::{BusinessLine, Money, Percent, Rate};
use crate::CommissionResult;

pub use presets::standard_policy;
pub use scales::{
    BoundedTier, CoverageBracket, CoverageScale, FinancialBracket, FinancialScale,
    COVERAGE_SCALE_LEN, FINANCIAL_SCALE_LEN,
};

// ---------------------------------------------------------------------------
// Policy types
// ---------------------------------------------------------------------------

/// Flat reward for an invoice from a new or recovered client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRule {
    /// Informational goal shown to reps; not used by the per-invoice rule
    pub target_qty: u32,
    pub reward_amount: Money,
    /// Invoice amount must reach this for the bonus to apply
    pub min_purchase_amount: Money,
}

/// One-off reward once enough distinct new clients were invoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBonusRule {
    pub target_qty: u32,
    pub reward_amount: Money,
}

/// Versioned, data-driven compensation policy. Treated as an immutable value
/// for the duration of a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationPolicy {
    /// Period sales target
    pub global_target: Money,
    /// Applied when period sales exceed the target (ascending thresholds)
    pub positive_scales: FinancialScale,
    /// Applied when period sales do not exceed the target (descending thresholds)
    pub negative_scales: FinancialScale,

    pub enable_portfolio_coverage: bool,
    /// Active-customer target the portfolio attainment is measured against
    pub portfolio_activity_target: Percent,
    pub portfolio_scales: CoverageScale,

    pub enable_closing_coverage: bool,
    /// Closing-rate target (percentage of opportunities won)
    pub closing_percentage_target: Percent,
    pub closing_scales: CoverageScale,

    pub enable_bonus_new_client: bool,
    pub enable_bonus_recovered: bool,
    pub enable_bonus_volume: bool,
    pub bonus_new_client: BonusRule,
    pub bonus_recovered_client: BonusRule,
    pub bonus_volume_clients: VolumeBonusRule,

    /// Commission rate per business line (0.015 = 1.5%)
    pub rates: BTreeMap<BusinessLine, Rate>,
    /// Informational sales target per line, used by reporting only
    #[serde(default)]
    pub line_targets: BTreeMap<BusinessLine, Money>,
}

impl CompensationPolicy {
    /// Parse a JSON policy document and validate it. Bracket arity is checked
    /// during deserialisation; ordering and sign rules by [`Self::validate`].
    pub fn from_json(json: &str) -> CommissionResult<Self> {
        let policy: CompensationPolicy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Same as [`Self::from_json`] for an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> CommissionResult<Self> {
        let policy: CompensationPolicy = serde_json::from_value(value)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Commission rate for a business line, if one is configured.
    pub fn rate_for(&self, line: &BusinessLine) -> Option<Rate> {
        self.rates.get(line).copied()
    }

    /// Check the ordering and sign invariants the bracket walks rely on.
    ///
    /// Returns non-fatal observations (gaps between coverage brackets, an
    /// unreachable negative tier) as warnings.
    pub fn validate(&self) -> CommissionResult<Vec<String>> {
        let mut warnings: Vec<String> = Vec::new();

        if self.global_target < Decimal::ZERO {
            return Err(CommissionError::policy(
                "global_target",
                "global target cannot be negative",
            ));
        }

        // --- Financial scales ---
        if !self.positive_scales.is_strictly_ascending() {
            return Err(CommissionError::policy(
                "positive_scales",
                "end amounts must be strictly ascending",
            ));
        }
        if let Some(first) = self.positive_scales.bounded().first() {
            if first.end_amount <= self.global_target {
                return Err(CommissionError::policy(
                    "positive_scales[0].end_amount",
                    "first positive bracket must end above the global target",
                ));
            }
        }
        if !self.negative_scales.is_strictly_descending() {
            return Err(CommissionError::policy(
                "negative_scales",
                "end amounts must be strictly descending",
            ));
        }
        if let Some(first) = self.negative_scales.bounded().first() {
            if first.end_amount >= self.global_target {
                warnings.push(format!(
                    "negative_scales[0] ends at {} which is not below the global target {}; \
                     its bracket can never be selected",
                    first.end_amount, self.global_target
                ));
            }
        }

        // --- Coverage scales ---
        for (field, scale, target) in [
            (
                "portfolio",
                &self.portfolio_scales,
                self.portfolio_activity_target,
            ),
            (
                "closing",
                &self.closing_scales,
                self.closing_percentage_target,
            ),
        ] {
            if !scale.is_descending() {
                return Err(CommissionError::policy(
                    format!("{field}_scales"),
                    "brackets must be ordered from highest to lowest attainment",
                ));
            }
            if target < Decimal::ZERO {
                return Err(CommissionError::policy(
                    format!("{field}_target"),
                    "coverage target cannot be negative",
                ));
            }
            for (low, high) in scale.gaps() {
                warnings.push(format!(
                    "{field}_scales: attainment strictly between {low}% and {high}% \
                     matches no bracket; the factor stays neutral (1.0)"
                ));
            }
        }

        // --- Bonuses ---
        for (field, amount) in [
            (
                "bonus_new_client.reward_amount",
                self.bonus_new_client.reward_amount,
            ),
            (
                "bonus_recovered_client.reward_amount",
                self.bonus_recovered_client.reward_amount,
            ),
            (
                "bonus_volume_clients.reward_amount",
                self.bonus_volume_clients.reward_amount,
            ),
        ] {
            if amount < Decimal::ZERO {
                return Err(CommissionError::policy(field, "reward cannot be negative"));
            }
        }

        // --- Rates ---
        for (line, rate) in &self.rates {
            if *rate < Decimal::ZERO {
                return Err(CommissionError::policy(
                    format!("rates.{line}"),
                    "rate cannot be negative",
                ));
            }
        }

        for w in &warnings {
            tracing::warn!(warning = %w, "compensation policy");
        }

        Ok(warnings)
    }
}
