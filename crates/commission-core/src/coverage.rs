use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::policy::{CompensationPolicy, CoverageScale};
use crate::types::{Percent, Rate};

/// Which of the policy's two coverage tables a KPI is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageKind {
    /// Distinct active customers against `portfolio_activity_target`
    Portfolio,
    /// Won-opportunity rate against `closing_percentage_target`
    Closing,
}

/// How a coverage factor was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageTier {
    /// Coverage switched off in the policy; factor is 1
    Disabled,
    /// Attainment above the first bracket's start; clamped to its factor
    Clamped,
    /// Attainment inside the bracket at this index
    Bracket(usize),
    /// Attainment between two brackets that leave a hole; factor is 1
    Gap,
    /// Attainment below the lowest bracket; factor is 0
    BelowFloor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageResolution {
    pub attainment_pct: Percent,
    pub factor: Rate,
    pub tier: CoverageTier,
}

/// `actual / target * 100`, or 0 when the target is not positive.
///
/// Saturates at the decimal range instead of overflowing, so a tiny target
/// reads as (clamped) over-attainment.
pub fn attainment_percentage(actual: Decimal, target: Percent) -> Percent {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    actual
        .checked_div(target)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .unwrap_or(if actual.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

/// Resolve a coverage multiplier (portfolio activity or closing rate).
pub fn resolve_coverage_factor(
    actual: Decimal,
    target: Percent,
    scales: &CoverageScale,
    enabled: bool,
) -> Rate {
    resolve_coverage(actual, target, scales, enabled).factor
}

/// Resolve a coverage multiplier and report which rule produced it.
///
/// The ceiling clamp (`attainment > start` of the first bracket) is checked
/// before the inclusive bracket match, so attainment exactly on the ceiling
/// matches the first bracket rather than the clamp.
pub fn resolve_coverage(
    actual: Decimal,
    target: Percent,
    scales: &CoverageScale,
    enabled: bool,
) -> CoverageResolution {
    if !enabled {
        return CoverageResolution {
            attainment_pct: Decimal::ZERO,
            factor: Decimal::ONE,
            tier: CoverageTier::Disabled,
        };
    }

    let attainment_pct = attainment_percentage(actual, target);
    let ceiling = scales.ceiling();

    let (factor, tier) = if attainment_pct > ceiling.start_percentage {
        (ceiling.payout_factor, CoverageTier::Clamped)
    } else if let Some((i, bracket)) = scales
        .brackets()
        .iter()
        .enumerate()
        .find(|(_, b)| b.contains(attainment_pct))
    {
        (bracket.payout_factor, CoverageTier::Bracket(i))
    } else if attainment_pct < scales.floor().end_percentage {
        (Decimal::ZERO, CoverageTier::BelowFloor)
    } else {
        (Decimal::ONE, CoverageTier::Gap)
    };

    tracing::debug!(
        %actual,
        %target,
        %attainment_pct,
        %factor,
        tier = ?tier,
        "coverage factor resolved"
    );

    CoverageResolution {
        attainment_pct,
        factor,
        tier,
    }
}

/// Resolve one of the policy's coverage factors for a measured KPI.
/// `target` overrides the policy's target for that KPI.
pub fn resolve_policy_coverage(
    kind: CoverageKind,
    actual: Decimal,
    target: Option<Percent>,
    policy: &CompensationPolicy,
) -> CoverageResolution {
    let (policy_target, scales, enabled) = match kind {
        CoverageKind::Portfolio => (
            policy.portfolio_activity_target,
            &policy.portfolio_scales,
            policy.enable_portfolio_coverage,
        ),
        CoverageKind::Closing => (
            policy.closing_percentage_target,
            &policy.closing_scales,
            policy.enable_closing_coverage,
        ),
    };
    resolve_coverage(actual, target.unwrap_or(policy_target), scales, enabled)
}
