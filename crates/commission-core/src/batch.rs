use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::bonus::{apply_invoice_bonuses, apply_volume_bonus};
use crate::coverage::{resolve_coverage, CoverageResolution, CoverageTier};
use crate::financial::{resolve_financial_tier, FinancialTier};
use crate::error::CommissionError;
use crate::kpi::{self, ClientActivity, CoverageKpis, Opportunity};
use crate::policy::CompensationPolicy;
use crate::schedule::{credit_base_date, resolve_payment_date};
use crate::types::*;
use crate::CommissionResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Everything needed to compute one period's commissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionBatchInput {
    pub invoices: Vec<Invoice>,
    pub policy: CompensationPolicy,
    /// Period sales used for the financial bracket; defaults to the sum of
    /// the batch's invoice amounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_sales: Option<Money>,
    /// Measured coverage KPIs. When absent they are derived from
    /// `activities` and `opportunities`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpis: Option<CoverageKpis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<ClientActivity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opportunities: Vec<Opportunity>,
}

/// Where the batch's coverage KPIs came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiSource {
    Input,
    Crm,
    Missing,
}

impl CommissionBatchInput {
    /// Batch with measured KPIs and period sales taken from the invoices.
    pub fn new(invoices: Vec<Invoice>, policy: CompensationPolicy, kpis: CoverageKpis) -> Self {
        CommissionBatchInput {
            invoices,
            policy,
            period_sales: None,
            kpis: Some(kpis),
            activities: Vec::new(),
            opportunities: Vec::new(),
        }
    }

    /// KPIs to resolve coverage against. Explicit `kpis` win; otherwise they
    /// are derived from the CRM lists, and anything missing counts as zero.
    pub fn resolved_kpis(&self) -> (CoverageKpis, KpiSource) {
        match self.kpis {
            Some(kpis) => (kpis, KpiSource::Input),
            None if self.activities.is_empty() && self.opportunities.is_empty() => {
                (CoverageKpis::default(), KpiSource::Missing)
            }
            None => (
                CoverageKpis::from_crm(&self.activities, &self.opportunities),
                KpiSource::Crm,
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One record per invoice plus the batch-level volume bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionBatch {
    pub records: Vec<CommissionRecord>,
    /// Not attributable to any single invoice
    pub volume_bonus: Money,
    pub period_sales: Money,
    pub financial: FinancialTier,
    pub portfolio: CoverageResolution,
    pub closing: CoverageResolution,
}

impl CommissionBatch {
    pub fn financial_factor(&self) -> Rate {
        self.financial.factor
    }

    pub fn portfolio_factor(&self) -> Rate {
        self.portfolio.factor
    }

    pub fn closing_factor(&self) -> Rate {
        self.closing.factor
    }

    /// Sum of per-invoice final amounts plus the volume bonus.
    pub fn total_payable(&self) -> Money {
        self.records
            .iter()
            .fold(self.volume_bonus, |total, r| {
                total.saturating_add(r.final_commission_amount)
            })
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute commission records for a batch of invoices.
///
/// Factors are resolved once and applied uniformly; bonuses are added after
/// the multiplicative cascade. Assumes `policy` satisfies
/// [`CompensationPolicy::validate`].
pub fn process(
    invoices: &[Invoice],
    policy: &CompensationPolicy,
    period_sales: Money,
    kpis: &CoverageKpis,
) -> CommissionResult<CommissionBatch> {
    let financial = resolve_financial_tier(period_sales, policy);
    let portfolio = resolve_coverage(
        Decimal::from(kpis.distinct_active_customers),
        policy.portfolio_activity_target,
        &policy.portfolio_scales,
        policy.enable_portfolio_coverage,
    );
    let closing = resolve_coverage(
        kpis.won_opportunity_rate,
        policy.closing_percentage_target,
        &policy.closing_scales,
        policy.enable_closing_coverage,
    );

    let combined_factor = financial
        .factor
        .checked_mul(portfolio.factor)
        .and_then(|f| f.checked_mul(closing.factor))
        .ok_or_else(|| {
            CommissionError::policy("scales", "combined factor exceeds the decimal range")
        })?;

    let records = invoices
        .iter()
        .map(|inv| -> CommissionResult<CommissionRecord> {
            let applied_rate = policy.rate_for(&inv.business_line).unwrap_or(Decimal::ZERO);
            let bonus_amount = apply_invoice_bonuses(inv, policy);
            let base_commission_amount = inv
                .amount
                .checked_mul(applied_rate)
                .ok_or_else(|| out_of_range(inv))?;
            let final_commission_amount = base_commission_amount
                .checked_mul(combined_factor)
                .and_then(|adjusted| adjusted.checked_add(bonus_amount))
                .ok_or_else(|| out_of_range(inv))?;

            Ok(CommissionRecord {
                invoice: inv.clone(),
                base_date: credit_base_date(inv.date)?,
                payment_date: resolve_payment_date(inv.date)?,
                applied_rate,
                base_commission_amount,
                bonus_amount,
                final_commission_amount,
                financial_factor: financial.factor,
                portfolio_factor: portfolio.factor,
                closing_factor: closing.factor,
                combined_factor,
                status: CommissionStatus::Pending,
            })
        })
        .collect::<CommissionResult<Vec<CommissionRecord>>>()?;

    let volume_bonus = apply_volume_bonus(invoices, policy);

    // Totals are summed again by reporting and by callers of `total_payable`
    checked_total(records.iter().map(|r| r.base_commission_amount), "base_commission_amount")?;
    checked_total(
        records
            .iter()
            .map(|r| r.final_commission_amount)
            .chain(std::iter::once(volume_bonus)),
        "final_commission_amount",
    )?;

    tracing::debug!(
        invoices = records.len(),
        %period_sales,
        %combined_factor,
        %volume_bonus,
        "commission batch processed"
    );

    Ok(CommissionBatch {
        records,
        volume_bonus,
        period_sales,
        financial,
        portfolio,
        closing,
    })
}

fn out_of_range(invoice: &Invoice) -> CommissionError {
    CommissionError::InvalidInput {
        field: format!("invoices[{}].amount", invoice.id),
        reason: "commission exceeds the decimal range".into(),
    }
}

fn checked_total(mut amounts: impl Iterator<Item = Money>, field: &str) -> CommissionResult<Money> {
    amounts
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or_else(|| CommissionError::InvalidInput {
            field: field.to_string(),
            reason: "batch total exceeds the decimal range".into(),
        })
}

/// Serialisable entry point: validates the policy, runs [`process`] and wraps
/// the batch in the standard output envelope with non-fatal warnings.
///
/// Policy-shape warnings (bracket gaps) belong to policy validation and are
/// not repeated here; only observations about this batch are reported.
pub fn process_batch(
    input: &CommissionBatchInput,
) -> CommissionResult<ComputationOutput<CommissionBatch>> {
    let start = Instant::now();
    input.policy.validate()?;
    let (kpis, kpi_source) = input.resolved_kpis();
    let mut warnings = batch_warnings(input);

    let period_sales = match input.period_sales {
        Some(sales) => sales,
        None => kpi::period_sales(&input.invoices)?,
    };

    let batch = process(&input.invoices, &input.policy, period_sales, &kpis)?;

    for (name, resolution) in [("portfolio", &batch.portfolio), ("closing", &batch.closing)] {
        match resolution.tier {
            CoverageTier::Gap => warnings.push(format!(
                "{name} attainment {}% falls between configured brackets; factor left at 1",
                resolution.attainment_pct.round_dp(2)
            )),
            CoverageTier::BelowFloor => warnings.push(format!(
                "{name} attainment {}% is below the lowest bracket; factor is 0",
                resolution.attainment_pct.round_dp(2)
            )),
            _ => {}
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tiered commission cascade (financial x portfolio x closing + flat bonuses)",
        &serde_json::json!({
            "invoice_count": input.invoices.len(),
            "period_sales": period_sales.to_string(),
            "period_sales_source": if input.period_sales.is_some() { "input" } else { "invoice_sum" },
            "global_target": input.policy.global_target.to_string(),
            "kpi_source": kpi_source,
            "distinct_active_customers": kpis.distinct_active_customers,
            "won_opportunity_rate": kpis.won_opportunity_rate.to_string(),
        }),
        warnings,
        elapsed,
        batch,
    ))
}

fn batch_warnings(input: &CommissionBatchInput) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    if input.invoices.is_empty() {
        warnings.push("No invoices in batch; only the volume bonus rule was evaluated.".into());
    }

    let unrated: BTreeSet<&BusinessLine> = input
        .invoices
        .iter()
        .map(|inv| &inv.business_line)
        .filter(|line| input.policy.rate_for(line).is_none())
        .collect();
    for line in unrated {
        warnings.push(format!(
            "Business line '{line}' has no configured rate; its invoices earn 0 base commission."
        ));
    }

    // A KPI nobody measured reads as zero attainment and cuts the payout
    let no_kpis = input.kpis.is_none();
    let policy = &input.policy;
    if no_kpis && input.activities.is_empty() && policy.enable_portfolio_coverage {
        warnings.push(
            "No portfolio KPI supplied (kpis or activities); distinct active customers taken as 0."
                .into(),
        );
    }
    if no_kpis && input.opportunities.is_empty() && policy.enable_closing_coverage {
        warnings.push(
            "No closing KPI supplied (kpis or opportunities); won-opportunity rate taken as 0%."
                .into(),
        );
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::standard_policy;
    use crate::error::CommissionError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// KPIs that land both coverage factors in their top bracket
    fn full_coverage() -> CoverageKpis {
        CoverageKpis {
            distinct_active_customers: 50,
            won_opportunity_rate: dec!(30),
        }
    }

    #[test]
    fn test_single_invoice_cascade() {
        let inv = Invoice::new("1", "C-1", date(2024, 1, 20), dec!(100000), "Ventas");
        let batch = process(&[inv], &standard_policy(), dec!(760000), &full_coverage()).unwrap();
        let rec = &batch.records[0];

        assert_eq!(rec.applied_rate, dec!(0.015));
        assert_eq!(rec.base_commission_amount, dec!(1500));
        assert_eq!(rec.financial_factor, dec!(1.10));
        assert_eq!(rec.portfolio_factor, dec!(1.0));
        assert_eq!(rec.closing_factor, dec!(1.0));
        assert_eq!(rec.final_commission_amount, dec!(1650));
        assert_eq!(rec.base_date, date(2024, 3, 20));
        assert_eq!(rec.payment_date, date(2024, 4, 15));
        assert_eq!(rec.status, CommissionStatus::Pending);
    }

    #[test]
    fn test_all_factors_multiply() {
        // Portfolio 40/50 = 80% -> 0.9; closing 24/30 = 80% -> 0.9
        let kpis = CoverageKpis {
            distinct_active_customers: 40,
            won_opportunity_rate: dec!(24),
        };
        let inv = Invoice::new("1", "C-1", date(2024, 1, 1), dec!(10000), "Renta");
        let batch = process(&[inv], &standard_policy(), dec!(550000), &kpis).unwrap();
        let rec = &batch.records[0];

        // 10000 * 0.02 = 200; 200 * 0.80 * 0.9 * 0.9 = 129.6
        assert_eq!(rec.base_commission_amount, dec!(200));
        assert_eq!(rec.combined_factor, dec!(0.648));
        assert_eq!(rec.final_commission_amount, dec!(129.6));
    }

    #[test]
    fn test_bonus_added_after_factors() {
        let kpis = CoverageKpis {
            distinct_active_customers: 0,
            won_opportunity_rate: dec!(30),
        };
        let mut policy = standard_policy();
        // Zero attainment lands below a 20% floor
        policy.portfolio_scales = crate::policy::CoverageScale::from_parts([
            crate::policy::CoverageBracket::new(dec!(100), dec!(90), dec!(1.0)),
            crate::policy::CoverageBracket::new(dec!(89), dec!(80), dec!(0.9)),
            crate::policy::CoverageBracket::new(dec!(79), dec!(20), dec!(0.8)),
        ]);
        let mut inv = Invoice::new("1", "C-1", date(2024, 1, 1), dec!(10000), "Ventas");
        inv.is_new_client = true;
        inv.is_recovered_client = true;

        let batch = process(&[inv], &policy, dec!(760000), &kpis).unwrap();
        let rec = &batch.records[0];

        assert_eq!(rec.portfolio_factor, Decimal::ZERO);
        assert_eq!(rec.bonus_amount, dec!(1000));
        assert_eq!(rec.final_commission_amount, dec!(1000));
    }

    #[test]
    fn test_unknown_line_earns_zero_rate() {
        let inv = Invoice::new("1", "C-1", date(2024, 1, 1), dec!(10000), "Consultoría");
        let input = CommissionBatchInput {
            period_sales: Some(dec!(760000)),
            ..CommissionBatchInput::new(vec![inv], standard_policy(), full_coverage())
        };
        let out = process_batch(&input).unwrap();
        let rec = &out.result.records[0];
        assert_eq!(rec.applied_rate, Decimal::ZERO);
        assert_eq!(rec.final_commission_amount, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("Consultoría")));
    }

    #[test]
    fn test_period_sales_defaults_to_invoice_sum() {
        let invoices = vec![
            Invoice::new("1", "C-1", date(2024, 1, 1), dec!(400000), "Ventas"),
            Invoice::new("2", "C-2", date(2024, 1, 2), dec!(360000), "Ventas"),
        ];
        let input = CommissionBatchInput::new(invoices, standard_policy(), full_coverage());
        let out = process_batch(&input).unwrap();
        assert_eq!(out.result.period_sales, dec!(760000));
        assert_eq!(out.result.financial_factor(), dec!(1.10));
    }

    #[test]
    fn test_volume_bonus_reported_separately() {
        let invoices: Vec<Invoice> = (1..=5)
            .map(|i| {
                let mut inv = Invoice::new(
                    i.to_string(),
                    format!("C-{i}"),
                    date(2024, 2, 1),
                    dec!(1000),
                    "Otros",
                );
                inv.is_new_client = true;
                inv
            })
            .collect();
        let batch = process(&invoices, &standard_policy(), dec!(5000), &full_coverage()).unwrap();

        assert_eq!(batch.volume_bonus, dec!(1500));
        // Invoices below the 5000 minimum earn no per-invoice bonus; Otros rate is 0
        assert!(batch
            .records
            .iter()
            .all(|r| r.final_commission_amount == Decimal::ZERO));
        assert_eq!(batch.total_payable(), dec!(1500));
    }

    #[test]
    fn test_empty_batch() {
        let input = CommissionBatchInput::new(vec![], standard_policy(), CoverageKpis::default());
        let out = process_batch(&input).unwrap();
        assert!(out.result.records.is_empty());
        assert_eq!(out.result.volume_bonus, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_gap_attainment_warns() {
        // 89.5 / 100 -> gap between 89 and 90
        let mut policy = standard_policy();
        policy.closing_percentage_target = dec!(100);
        let kpis = CoverageKpis {
            distinct_active_customers: 50,
            won_opportunity_rate: dec!(89.5),
        };
        let invoices = vec![Invoice::new("1", "C-1", date(2024, 1, 1), dec!(1000), "Ventas")];
        let input = CommissionBatchInput {
            period_sales: Some(dec!(760000)),
            ..CommissionBatchInput::new(invoices, policy, kpis)
        };
        let out = process_batch(&input).unwrap();
        assert_eq!(out.result.closing.tier, CoverageTier::Gap);
        assert_eq!(out.result.closing_factor(), Decimal::ONE);
        assert!(out.warnings.iter().any(|w| w.starts_with("closing attainment")));
    }

    #[test]
    fn test_policy_gap_notices_stay_out_of_batch_warnings() {
        // The standard preset has gaps (89-90, 79-80) in both coverage tables
        assert!(!standard_policy().validate().unwrap().is_empty());

        let invoices = vec![Invoice::new("1", "C-1", date(2024, 1, 1), dec!(1000), "Ventas")];
        let out = process_batch(&CommissionBatchInput::new(
            invoices,
            standard_policy(),
            full_coverage(),
        ))
        .unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[test]
    fn test_missing_kpis_are_reported() {
        let input: CommissionBatchInput = serde_json::from_value(serde_json::json!({
            "invoices": [{
                "id": "1",
                "customer_id": "C-1",
                "date": "2024-01-20",
                "amount": "100000",
                "business_line": "Ventas"
            }],
            "policy": standard_policy(),
            "period_sales": "760000"
        }))
        .unwrap();
        assert_eq!(input.resolved_kpis().1, KpiSource::Missing);

        let out = process_batch(&input).unwrap();
        // Zero attainment on both KPIs: 1500 * 1.1 * 0.8 * 0.8
        assert_eq!(out.result.records[0].final_commission_amount, dec!(1056));
        assert!(out.warnings.iter().any(|w| w.starts_with("No portfolio KPI")));
        assert!(out.warnings.iter().any(|w| w.starts_with("No closing KPI")));
        assert_eq!(out.assumptions["kpi_source"], "missing");
    }

    #[test]
    fn test_missing_kpi_not_reported_when_coverage_disabled() {
        let mut policy = standard_policy();
        policy.enable_portfolio_coverage = false;
        policy.enable_closing_coverage = false;
        let input = CommissionBatchInput {
            kpis: None,
            ..CommissionBatchInput::new(vec![], policy, CoverageKpis::default())
        };
        let out = process_batch(&input).unwrap();
        assert!(out.warnings.iter().all(|w| !w.contains("KPI")));
    }

    #[test]
    fn test_kpis_derived_from_crm_lists() {
        let activities = (0..45)
            .map(|i| ClientActivity {
                client_id: format!("C-{i}"),
                client_name: None,
                calls: 1,
                emails: 0,
                visits: 0,
                meetings: 0,
            })
            .collect();
        // 3 of 10 won -> 30%
        let opportunities = (0..10)
            .map(|i| Opportunity {
                id: i.to_string(),
                client_id: format!("C-{i}"),
                status: if i < 3 {
                    kpi::OpportunityStatus::Won
                } else {
                    kpi::OpportunityStatus::Lost
                },
                amount: dec!(1000),
                invoice_id: None,
            })
            .collect();
        let invoices = vec![Invoice::new("1", "C-1", date(2024, 1, 20), dec!(100000), "Ventas")];
        let input = CommissionBatchInput {
            period_sales: Some(dec!(760000)),
            kpis: None,
            activities,
            opportunities,
            ..CommissionBatchInput::new(invoices, standard_policy(), CoverageKpis::default())
        };

        let (kpis, source) = input.resolved_kpis();
        assert_eq!(source, KpiSource::Crm);
        assert_eq!(kpis.distinct_active_customers, 45);
        assert_eq!(kpis.won_opportunity_rate, dec!(30));

        // Portfolio 45/50 = 90% -> 1.0; closing 30/30 -> 1.0
        let out = process_batch(&input).unwrap();
        assert_eq!(out.result.records[0].final_commission_amount, dec!(1650));
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[test]
    fn test_commission_overflow_is_an_input_error() {
        let mut policy = standard_policy();
        policy.rates.insert(BusinessLine::new("Capacitación"), dec!(1000));
        let invoices = vec![Invoice::new("X-1", "C-1", date(2024, 1, 1), Decimal::MAX, "Capacitación")];
        let input = CommissionBatchInput {
            period_sales: Some(dec!(760000)),
            ..CommissionBatchInput::new(invoices, policy, full_coverage())
        };
        match process_batch(&input) {
            Err(CommissionError::InvalidInput { field, .. }) => {
                assert_eq!(field, "invoices[X-1].amount")
            }
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_period_sales_overflow_is_an_input_error() {
        let invoices = vec![
            Invoice::new("1", "C-1", date(2024, 1, 1), Decimal::MAX, "Otros"),
            Invoice::new("2", "C-2", date(2024, 1, 1), Decimal::MAX, "Otros"),
        ];
        let input = CommissionBatchInput::new(invoices, standard_policy(), full_coverage());
        match process_batch(&input) {
            Err(CommissionError::InvalidInput { field, .. }) => {
                assert_eq!(field, "invoices.amount")
            }
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn test_process_batch_rejects_invalid_policy() {
        let mut policy = standard_policy();
        policy.rates.insert(BusinessLine::new("Renta"), dec!(-0.02));
        let invoices = vec![Invoice::new("1", "C-1", date(2024, 1, 1), dec!(1000), "Renta")];
        let input = CommissionBatchInput::new(invoices, policy, full_coverage());
        match process_batch(&input) {
            Err(CommissionError::InvalidPolicy { field, .. }) => assert_eq!(field, "rates.Renta"),
            other => panic!("Expected InvalidPolicy, got: {other:?}"),
        }
    }
}
