use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::batch::{process_batch, CommissionBatch, CommissionBatchInput};
use crate::bonus::invoice_bonuses;
use crate::policy::CompensationPolicy;
use crate::types::*;
use crate::CommissionResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Step-by-step build-up of the period payout. Each `impact_*` is the money
/// gained or lost at that step of the cascade. Amounts are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    pub total_base_commission: Money,
    pub after_financial: Money,
    pub impact_financial: Money,
    pub after_portfolio: Money,
    pub impact_portfolio: Money,
    pub after_closing: Money,
    pub impact_closing: Money,
    pub bonus_new_client_total: Money,
    pub bonus_recovered_total: Money,
    pub volume_bonus: Money,
    pub grand_total: Money,
}

/// Per business line totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSummary {
    pub business_line: BusinessLine,
    pub invoice_count: usize,
    pub income: Money,
    pub target: Option<Money>,
    /// income / target * 100, when a positive target exists
    pub target_attainment_pct: Option<Percent>,
    pub rate: Option<Rate>,
    /// Final commission of the line's invoices, excluding the volume bonus
    pub commission: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionSummary {
    pub invoice_count: usize,
    pub total_sales: Money,
    pub financial_factor: Rate,
    pub portfolio_factor: Rate,
    pub closing_factor: Rate,
    pub breakdown: CommissionBreakdown,
    pub lines: Vec<LineSummary>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Rebuild the payout step by step from a processed batch.
pub fn breakdown(batch: &CommissionBatch, policy: &CompensationPolicy) -> CommissionBreakdown {
    let total_base = batch
        .records
        .iter()
        .fold(Decimal::ZERO, |total, r| total.saturating_add(r.base_commission_amount));

    let after_financial = total_base.saturating_mul(batch.financial_factor());
    let after_portfolio = after_financial.saturating_mul(batch.portfolio_factor());
    let after_closing = after_portfolio.saturating_mul(batch.closing_factor());

    let (bonus_new, bonus_recovered) =
        batch
            .records
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(new, rec), r| {
                let b = invoice_bonuses(&r.invoice, policy);
                (
                    new.saturating_add(b.new_client),
                    rec.saturating_add(b.recovered_client),
                )
            });

    let grand_total = after_closing
        .saturating_add(bonus_new)
        .saturating_add(bonus_recovered)
        .saturating_add(batch.volume_bonus);

    CommissionBreakdown {
        total_base_commission: round_money(total_base),
        after_financial: round_money(after_financial),
        impact_financial: round_money(after_financial.saturating_sub(total_base)),
        after_portfolio: round_money(after_portfolio),
        impact_portfolio: round_money(after_portfolio.saturating_sub(after_financial)),
        after_closing: round_money(after_closing),
        impact_closing: round_money(after_closing.saturating_sub(after_portfolio)),
        bonus_new_client_total: round_money(bonus_new),
        bonus_recovered_total: round_money(bonus_recovered),
        volume_bonus: round_money(batch.volume_bonus),
        grand_total: round_money(grand_total),
    }
}

/// Totals per business line. Lines from the policy's rate table come first,
/// in table order, followed by any unrated lines seen on invoices.
pub fn line_summaries(batch: &CommissionBatch, policy: &CompensationPolicy) -> Vec<LineSummary> {
    let mut lines: BTreeMap<&BusinessLine, (usize, Money, Money)> = BTreeMap::new();
    for r in &batch.records {
        let entry = lines
            .entry(&r.invoice.business_line)
            .or_insert((0, Decimal::ZERO, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(r.invoice.amount);
        entry.2 = entry.2.saturating_add(r.final_commission_amount);
    }

    let unrated: Vec<&BusinessLine> = lines
        .keys()
        .copied()
        .filter(|line| !policy.rates.contains_key(*line))
        .collect();

    policy
        .rates
        .keys()
        .chain(unrated)
        .map(|line| {
            let (invoice_count, income, commission) = lines
                .get(line)
                .copied()
                .unwrap_or((0, Decimal::ZERO, Decimal::ZERO));
            let target = policy.line_targets.get(line).copied();
            let target_attainment_pct = target
                .filter(|t| *t > Decimal::ZERO)
                .and_then(|t| income.checked_div(t))
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .map(|pct| pct.round_dp(2));

            LineSummary {
                business_line: line.clone(),
                invoice_count,
                income,
                target,
                target_attainment_pct,
                rate: policy.rate_for(line),
                commission: round_money(commission),
            }
        })
        .collect()
}

pub fn summarize(batch: &CommissionBatch, policy: &CompensationPolicy) -> CommissionSummary {
    CommissionSummary {
        invoice_count: batch.records.len(),
        total_sales: batch
            .records
            .iter()
            .fold(Decimal::ZERO, |total, r| total.saturating_add(r.invoice.amount)),
        financial_factor: batch.financial_factor(),
        portfolio_factor: batch.portfolio_factor(),
        closing_factor: batch.closing_factor(),
        breakdown: breakdown(batch, policy),
        lines: line_summaries(batch, policy),
    }
}

/// Process a batch and return only its summary, in the output envelope.
pub fn summarize_batch(
    input: &CommissionBatchInput,
) -> CommissionResult<ComputationOutput<CommissionSummary>> {
    let start = Instant::now();
    let processed = process_batch(input)?;
    let summary = summarize(&processed.result, &input.policy);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Commission summary (sequential factor impact, per-line totals)",
        &processed.assumptions,
        processed.warnings,
        elapsed,
        summary,
    ))
}
