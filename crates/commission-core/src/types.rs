use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Ratios expressed as decimals (1.10 = 110%). Used for rates and factors.
pub type Rate = Decimal;

/// Percentages on a 0-100 scale (105 = 105%), as authored in policy tables.
pub type Percent = Decimal;

/// Decimal places used when presenting aggregate money.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Round a money amount to cents, half away from zero.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Business line an invoice is booked against (e.g. "Ventas", "Renta").
///
/// Kept open-ended: the policy rate table decides which lines earn commission,
/// and a line missing from it simply earns nothing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessLine(String);

impl BusinessLine {
    pub fn new(name: impl Into<String>) -> Self {
        BusinessLine(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusinessLine {
    fn from(name: &str) -> Self {
        BusinessLine::new(name)
    }
}

/// A posted sales invoice for the evaluation period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub business_line: BusinessLine,
    #[serde(default)]
    pub is_new_client: bool,
    #[serde(default)]
    pub is_recovered_client: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_rep_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_rep_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Invoice {
    /// Minimal invoice with no client flags and no attribution.
    pub fn new(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        date: NaiveDate,
        amount: Money,
        business_line: impl Into<BusinessLine>,
    ) -> Self {
        Invoice {
            id: id.into(),
            customer_id: customer_id.into(),
            date,
            amount,
            business_line: business_line.into(),
            is_new_client: false,
            is_recovered_client: false,
            customer_name: None,
            sales_rep_id: None,
            sales_rep_name: None,
            manager_name: None,
            territory: None,
            currency: None,
        }
    }
}

/// Lifecycle of a commission line. The engine only ever emits `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionStatus {
    #[default]
    Pending,
    Approved,
    Paid,
}

/// Payable commission for one invoice, with every factor that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRecord {
    #[serde(flatten)]
    pub invoice: Invoice,
    /// Invoice date plus the credit term, before snapping to a cut-off
    pub base_date: NaiveDate,
    pub payment_date: NaiveDate,
    /// Line rate applied to the invoice amount (0 when the line has no rate)
    pub applied_rate: Rate,
    /// amount * applied_rate, before any factor
    pub base_commission_amount: Money,
    /// Flat per-invoice bonuses, added after the factor cascade
    pub bonus_amount: Money,
    pub final_commission_amount: Money,
    pub financial_factor: Rate,
    pub portfolio_factor: Rate,
    pub closing_factor: Rate,
    /// financial * portfolio * closing
    pub combined_factor: Rate,
    pub status: CommissionStatus,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
