use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use commission_core::coverage::CoverageKind;
use commission_core::policy::CompensationPolicy;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Batch processing
// ---------------------------------------------------------------------------

#[napi]
pub fn process_commissions(input_json: String) -> NapiResult<String> {
    let input: commission_core::CommissionBatchInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = commission_core::process_batch(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_commissions(input_json: String) -> NapiResult<String> {
    let input: commission_core::CommissionBatchInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        commission_core::reporting::summarize_batch(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Factors and schedule
// ---------------------------------------------------------------------------

/// Takes and returns `YYYY-MM-DD`.
#[napi]
pub fn resolve_payment_date(invoice_date: String) -> NapiResult<String> {
    let date = NaiveDate::parse_from_str(&invoice_date, "%Y-%m-%d").map_err(to_napi_error)?;
    let paid = commission_core::resolve_payment_date(date).map_err(to_napi_error)?;
    Ok(paid.format("%Y-%m-%d").to_string())
}

#[derive(Deserialize)]
struct FinancialFactorInput {
    period_sales: Decimal,
    /// Standard preset when omitted
    #[serde(default)]
    policy: Option<CompensationPolicy>,
}

#[napi]
pub fn resolve_financial_factor(input_json: String) -> NapiResult<String> {
    let input: FinancialFactorInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = checked_policy(input.policy)?;
    let tier = commission_core::financial::resolve_financial_tier(input.period_sales, &policy);
    serde_json::to_string(&tier).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct CoverageFactorInput {
    kind: CoverageKind,
    /// Customer count (portfolio) or won-opportunity percent (closing)
    actual: Decimal,
    /// Overrides the policy's target for this KPI
    #[serde(default)]
    target: Option<Decimal>,
    #[serde(default)]
    policy: Option<CompensationPolicy>,
}

#[napi]
pub fn resolve_coverage_factor(input_json: String) -> NapiResult<String> {
    let input: CoverageFactorInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = checked_policy(input.policy)?;
    let resolution = commission_core::coverage::resolve_policy_coverage(
        input.kind,
        input.actual,
        input.target,
        &policy,
    );
    serde_json::to_string(&resolution).map_err(to_napi_error)
}

/// Validate a supplied policy, or fall back to the standard preset.
fn checked_policy(policy: Option<CompensationPolicy>) -> NapiResult<CompensationPolicy> {
    match policy {
        Some(policy) => {
            policy.validate().map_err(to_napi_error)?;
            Ok(policy)
        }
        None => Ok(commission_core::policy::standard_policy()),
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Returns the non-fatal warnings as a JSON array; invalid policies throw.
#[napi]
pub fn validate_policy(policy_json: String) -> NapiResult<String> {
    let policy: CompensationPolicy = serde_json::from_str(&policy_json).map_err(to_napi_error)?;
    let warnings = policy.validate().map_err(to_napi_error)?;
    serde_json::to_string(&warnings).map_err(to_napi_error)
}

#[napi]
pub fn standard_policy() -> NapiResult<String> {
    serde_json::to_string(&commission_core::policy::standard_policy()).map_err(to_napi_error)
}
