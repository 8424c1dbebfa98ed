use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::types::Invoice;

/// Narrow an invoice list to one period and, optionally, one territory or
/// sales rep. `None` on any field means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// 1-12
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_rep_id: Option<String>,
}

impl InvoiceFilter {
    pub fn period(year: i32, month: u32) -> Self {
        InvoiceFilter {
            year: Some(year),
            month: Some(month),
            ..Default::default()
        }
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.year.map_or(true, |y| invoice.date.year() == y)
            && self.month.map_or(true, |m| invoice.date.month() == m)
            && self
                .territory
                .as_deref()
                .map_or(true, |t| invoice.territory.as_deref() == Some(t))
            && self
                .sales_rep_id
                .as_deref()
                .map_or(true, |r| invoice.sales_rep_id.as_deref() == Some(r))
    }

    pub fn apply(&self, invoices: &[Invoice]) -> Vec<Invoice> {
        invoices
            .iter()
            .filter(|inv| self.matches(inv))
            .cloned()
            .collect()
    }
}
