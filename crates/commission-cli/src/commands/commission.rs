use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;

use commission_core::kpi::{ClientActivity, Opportunity};
use commission_core::reporting;
use commission_core::selection::InvoiceFilter;
use commission_core::{process_batch, CommissionBatchInput, Invoice};

use crate::commands::policy::load_policy;
use crate::config::CliConfig;
use crate::input;

/// Batch inputs shared by `process` and `summary`
#[derive(Args)]
pub struct BatchArgs {
    /// Path to a full batch document: invoices, policy, period_sales, kpis
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Path to a JSON or YAML list of invoices (alternative to --input)
    #[arg(long, conflicts_with = "input")]
    pub invoices: Option<PathBuf>,

    /// Policy document used with --invoices
    #[arg(long, requires = "invoices")]
    pub policy: Option<PathBuf>,

    /// Period sales for the financial bracket (defaults to the invoice total)
    #[arg(long)]
    pub period_sales: Option<Decimal>,

    /// Distinct customers with CRM activity in the period
    #[arg(long)]
    pub active_customers: Option<u32>,

    /// Won-opportunity rate, in percent
    #[arg(long)]
    pub won_rate: Option<Decimal>,

    /// CRM activity log (list of client activities) to derive the portfolio KPI from
    #[arg(long, conflicts_with = "active_customers")]
    pub activities: Option<PathBuf>,

    /// CRM opportunities to derive the won-opportunity rate from
    #[arg(long, conflicts_with = "won_rate")]
    pub opportunities: Option<PathBuf>,

    /// Only invoices dated in this year
    #[arg(long)]
    pub year: Option<i32>,

    /// Only invoices dated in this month (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Only invoices for this territory
    #[arg(long)]
    pub territory: Option<String>,

    /// Only invoices for this sales rep id
    #[arg(long)]
    pub sales_rep: Option<String>,
}

impl BatchArgs {
    fn filter(&self) -> InvoiceFilter {
        InvoiceFilter {
            year: self.year,
            month: self.month,
            territory: self.territory.clone(),
            sales_rep_id: self.sales_rep.clone(),
        }
    }
}

/// Build the batch from the arguments, then apply the command-line overrides.
fn load_batch(
    args: &BatchArgs,
    config: &CliConfig,
) -> Result<CommissionBatchInput, Box<dyn std::error::Error>> {
    let mut batch: CommissionBatchInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(ref path) = args.invoices {
        let invoices: Vec<Invoice> = input::file::read_document(path)?;
        CommissionBatchInput {
            invoices,
            policy: load_policy(args.policy.as_deref(), config)?,
            period_sales: None,
            kpis: None,
            activities: Vec::new(),
            opportunities: Vec::new(),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <batch.json>, --invoices <invoices.json> or stdin required".into());
    };

    let filter = args.filter();
    if filter != InvoiceFilter::default() {
        let before = batch.invoices.len();
        batch.invoices = filter.apply(&batch.invoices);
        tracing::info!(before, after = batch.invoices.len(), "invoice filter applied");
    }

    if let Some(sales) = args.period_sales {
        batch.period_sales = Some(sales);
    }
    if let Some(ref path) = args.activities {
        let activities: Vec<ClientActivity> = input::file::read_document(path)?;
        batch.activities = activities;
    }
    if let Some(ref path) = args.opportunities {
        let opportunities: Vec<Opportunity> = input::file::read_document(path)?;
        batch.opportunities = opportunities;
    }
    apply_kpi_overrides(&mut batch, args.active_customers, args.won_rate)?;

    Ok(batch)
}

/// Fold `--active-customers`/`--won-rate` into the batch KPIs. Without KPIs
/// in the batch, a single flag would silently leave the other KPI at zero,
/// so both must be given together.
fn apply_kpi_overrides(
    batch: &mut CommissionBatchInput,
    active_customers: Option<u32>,
    won_rate: Option<Decimal>,
) -> Result<(), Box<dyn std::error::Error>> {
    if active_customers.is_none() && won_rate.is_none() {
        return Ok(());
    }

    let mut kpis = match batch.kpis {
        Some(kpis) => kpis,
        None => {
            let derived_portfolio = !batch.activities.is_empty() || active_customers.is_some();
            let derived_closing = !batch.opportunities.is_empty() || won_rate.is_some();
            if !(derived_portfolio && derived_closing) {
                return Err("batch has no KPIs: give both --active-customers and --won-rate \
                            (or --activities and --opportunities)"
                    .into());
            }
            batch.resolved_kpis().0
        }
    };
    if let Some(customers) = active_customers {
        kpis.distinct_active_customers = customers;
    }
    if let Some(rate) = won_rate {
        kpis.won_opportunity_rate = rate;
    }
    batch.kpis = Some(kpis);
    Ok(())
}

/// Arguments for per-invoice commission processing
#[derive(Args)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run_process(
    args: ProcessArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let batch = load_batch(&args.batch, config)?;
    let result = process_batch(&batch)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the period commission summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run_summary(
    args: SummaryArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let batch = load_batch(&args.batch, config)?;
    let result = reporting::summarize_batch(&batch)?;
    Ok(serde_json::to_value(result)?)
}
