use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use commission_core::schedule;

/// Arguments for payment date resolution
#[derive(Args)]
pub struct PaymentDateArgs {
    /// Invoice date (YYYY-MM-DD); repeat for several invoices
    #[arg(long = "date", required = true)]
    pub dates: Vec<NaiveDate>,
}

pub fn run_payment_date(args: PaymentDateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rows = args
        .dates
        .iter()
        .map(|&invoice_date| -> Result<Value, Box<dyn std::error::Error>> {
            Ok(serde_json::json!({
                "invoice_date": invoice_date,
                "base_date": schedule::credit_base_date(invoice_date)?,
                "payment_date": schedule::resolve_payment_date(invoice_date)?,
            }))
        })
        .collect::<Result<Vec<Value>, _>>()?;

    // A single date keeps the flat shape so `--output minimal` prints the date
    match <[Value; 1]>::try_from(rows) {
        Ok([row]) => Ok(row),
        Err(rows) => Ok(Value::Array(rows)),
    }
}
