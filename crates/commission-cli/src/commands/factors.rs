use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;

use commission_core::coverage;
use commission_core::financial;

use crate::commands::policy::load_policy;
use crate::config::CliConfig;

/// Arguments for the financial (sales attainment) factor
#[derive(Args)]
pub struct FinancialFactorArgs {
    /// Sales for the period
    #[arg(long, allow_hyphen_values = true)]
    pub sales: Decimal,

    /// Policy document (JSON or YAML)
    #[arg(long)]
    pub policy: Option<PathBuf>,
}

pub fn run_financial_factor(
    args: FinancialFactorArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let policy = load_policy(args.policy.as_deref(), config)?;
    let tier = financial::resolve_financial_tier(args.sales, &policy);
    Ok(serde_json::json!({
        "period_sales": args.sales,
        "global_target": policy.global_target,
        "side": tier.side,
        "tier_index": tier.tier_index,
        "commission_percentage": tier.commission_percentage,
        "factor": tier.factor,
    }))
}

/// Which coverage table to resolve against
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CoverageKind {
    /// Distinct active customers against the portfolio activity target
    Portfolio,
    /// Won-opportunity rate against the closing target
    Closing,
}

/// Arguments for a coverage factor
#[derive(Args)]
pub struct CoverageFactorArgs {
    #[arg(long, value_enum)]
    pub kind: CoverageKind,

    /// Measured KPI (customer count or won-opportunity percent)
    #[arg(long)]
    pub actual: Decimal,

    /// Override the policy's target for this KPI
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Policy document (JSON or YAML)
    #[arg(long)]
    pub policy: Option<PathBuf>,
}

pub fn run_coverage_factor(
    args: CoverageFactorArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let policy = load_policy(args.policy.as_deref(), config)?;
    let kind = match args.kind {
        CoverageKind::Portfolio => coverage::CoverageKind::Portfolio,
        CoverageKind::Closing => coverage::CoverageKind::Closing,
    };
    let target = args.target.unwrap_or(match kind {
        coverage::CoverageKind::Portfolio => policy.portfolio_activity_target,
        coverage::CoverageKind::Closing => policy.closing_percentage_target,
    });
    let resolution = coverage::resolve_policy_coverage(kind, args.actual, Some(target), &policy);
    Ok(serde_json::json!({
        "actual": args.actual,
        "target": target,
        "attainment_pct": resolution.attainment_pct.round_dp(2),
        "tier": resolution.tier,
        "factor": resolution.factor,
    }))
}
