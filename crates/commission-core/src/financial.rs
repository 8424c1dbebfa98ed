use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::policy::{CompensationPolicy, FinancialScale};
use crate::types::{Money, Percent, Rate};

/// Which financial table a period's sales were resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleSide {
    /// Sales exceeded the global target
    Positive,
    /// Sales were at or below the global target
    Negative,
}

/// The bracket selected for the period, kept for audit trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTier {
    pub side: ScaleSide,
    /// Index into the side's table; the last index is the open-ended bracket
    pub tier_index: usize,
    pub commission_percentage: Percent,
    pub factor: Rate,
}

/// Resolve the period-wide sales-attainment multiplier.
pub fn resolve_financial_factor(period_sales: Money, policy: &CompensationPolicy) -> Rate {
    resolve_financial_tier(period_sales, policy).factor
}

/// Resolve the financial bracket for the period.
///
/// Above target, each positive bracket starts one currency unit above the
/// previous bracket's end (the first at `global_target + 1`) and the highest
/// bracket whose start has been reached wins. At or below target, the first
/// negative bracket whose end is strictly exceeded wins. The two comparisons
/// differ on purpose and must not be unified.
pub fn resolve_financial_tier(period_sales: Money, policy: &CompensationPolicy) -> FinancialTier {
    let (side, tier_index) = if period_sales > policy.global_target {
        (
            ScaleSide::Positive,
            positive_tier_index(period_sales, policy.global_target, &policy.positive_scales),
        )
    } else {
        (
            ScaleSide::Negative,
            negative_tier_index(period_sales, &policy.negative_scales),
        )
    };

    let scale = match side {
        ScaleSide::Positive => &policy.positive_scales,
        ScaleSide::Negative => &policy.negative_scales,
    };
    let commission_percentage = scale
        .percentage(tier_index)
        .unwrap_or_else(|| scale.terminal_percentage());

    let tier = FinancialTier {
        side,
        tier_index,
        commission_percentage,
        factor: commission_percentage / dec!(100),
    };
    tracing::debug!(
        %period_sales,
        side = ?tier.side,
        tier = tier.tier_index,
        factor = %tier.factor,
        "financial factor resolved"
    );
    tier
}

fn positive_tier_index(period_sales: Money, global_target: Money, scale: &FinancialScale) -> usize {
    // lower_bounds[i] is the first amount that lands in bracket i
    let mut lower_bounds: Vec<Money> = Vec::with_capacity(scale.len());
    lower_bounds.push(global_target.saturating_add(Decimal::ONE));
    lower_bounds.extend(
        scale
            .bounded()
            .iter()
            .map(|t| t.end_amount.saturating_add(Decimal::ONE)),
    );

    lower_bounds
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .find(|(_, start)| period_sales >= **start)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn negative_tier_index(period_sales: Money, scale: &FinancialScale) -> usize {
    scale
        .bounded()
        .iter()
        .position(|t| period_sales > t.end_amount)
        .unwrap_or(scale.bounded().len())
}
