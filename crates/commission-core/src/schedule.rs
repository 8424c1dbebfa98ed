use chrono::{Datelike, Days, NaiveDate};

use crate::error::CommissionError;
use crate::CommissionResult;

/// Calendar days of credit granted on every invoice.
pub const CREDIT_TERM_DAYS: u64 = 60;

/// Day of month on which commissions are paid out.
pub const PAYOUT_DAY: u32 = 15;

/// Invoice date plus the credit term.
pub fn credit_base_date(invoice_date: NaiveDate) -> CommissionResult<NaiveDate> {
    invoice_date
        .checked_add_days(Days::new(CREDIT_TERM_DAYS))
        .ok_or_else(|| {
            CommissionError::DateError(format!(
                "{invoice_date} + {CREDIT_TERM_DAYS} days is out of range"
            ))
        })
}

/// Commission payout date for an invoice.
///
/// The credit-term base date is snapped onto the twice-monthly cash cut-off:
/// on or before the 15th pays on the 15th of that month, later pays on the
/// 15th of the next month.
pub fn resolve_payment_date(invoice_date: NaiveDate) -> CommissionResult<NaiveDate> {
    let base = credit_base_date(invoice_date)?;

    let (year, month) = if base.day() <= PAYOUT_DAY {
        (base.year(), base.month())
    } else if base.month() == 12 {
        (base.year() + 1, 1)
    } else {
        (base.year(), base.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, PAYOUT_DAY).ok_or_else(|| {
        CommissionError::DateError(format!("no payout date {year}-{month:02}-{PAYOUT_DAY}"))
    })
}
