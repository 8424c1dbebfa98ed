use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CommissionError;
use crate::types::{Invoice, Money, Percent};
use crate::CommissionResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// CRM activity logged against one client during the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientActivity {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default)]
    pub calls: u32,
    #[serde(default)]
    pub emails: u32,
    #[serde(default)]
    pub visits: u32,
    #[serde(default)]
    pub meetings: u32,
}

impl ClientActivity {
    pub fn total_activities(&self) -> u32 {
        self.calls + self.emails + self.visits + self.meetings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityStatus {
    Won,
    Lost,
    Open,
}

/// A sales opportunity tracked in the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub client_id: String,
    pub status: OpportunityStatus,
    #[serde(default)]
    pub amount: Money,
    /// Invoice the opportunity converted into, when won
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
}

/// Secondary KPIs the coverage factors are measured on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageKpis {
    /// Distinct customers with CRM activity in the period
    pub distinct_active_customers: u32,
    /// Percentage of opportunities won (0-100)
    pub won_opportunity_rate: Percent,
}

impl CoverageKpis {
    /// Derive both KPIs from raw CRM data.
    pub fn from_crm(activities: &[ClientActivity], opportunities: &[Opportunity]) -> Self {
        CoverageKpis {
            distinct_active_customers: distinct_active_customers(activities),
            won_opportunity_rate: won_opportunity_rate(opportunities),
        }
    }
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// Sum of invoice amounts for the batch.
pub fn period_sales(invoices: &[Invoice]) -> CommissionResult<Money> {
    invoices
        .iter()
        .try_fold(Decimal::ZERO, |total, inv| total.checked_add(inv.amount))
        .ok_or_else(|| CommissionError::InvalidInput {
            field: "invoices.amount".into(),
            reason: "sum of invoice amounts exceeds the decimal range".into(),
        })
}

/// Distinct clients with at least one logged activity.
pub fn distinct_active_customers(activities: &[ClientActivity]) -> u32 {
    let active: BTreeSet<&str> = activities
        .iter()
        .filter(|a| a.total_activities() > 0)
        .map(|a| a.client_id.as_str())
        .collect();
    active.len() as u32
}

/// Won opportunities as a percentage of all opportunities; 0 when none exist.
pub fn won_opportunity_rate(opportunities: &[Opportunity]) -> Percent {
    if opportunities.is_empty() {
        return Decimal::ZERO;
    }
    let won = opportunities
        .iter()
        .filter(|o| o.status == OpportunityStatus::Won)
        .count();
    Decimal::from(won as u64) / Decimal::from(opportunities.len() as u64) * dec!(100)
}
