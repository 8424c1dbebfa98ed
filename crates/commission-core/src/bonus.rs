use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::policy::{BonusRule, CompensationPolicy};
use crate::types::{Invoice, Money};

/// Flat bonuses earned by a single invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceBonus {
    pub new_client: Money,
    pub recovered_client: Money,
}

impl InvoiceBonus {
    pub fn total(&self) -> Money {
        self.new_client.saturating_add(self.recovered_client)
    }
}

fn qualifies(enabled: bool, flagged: bool, amount: Money, rule: &BonusRule) -> bool {
    enabled && flagged && amount >= rule.min_purchase_amount
}

/// Per-invoice bonuses, split by rule. New-client and recovered-client
/// rewards are independent and may both apply.
pub fn invoice_bonuses(invoice: &Invoice, policy: &CompensationPolicy) -> InvoiceBonus {
    let mut bonus = InvoiceBonus::default();

    if qualifies(
        policy.enable_bonus_new_client,
        invoice.is_new_client,
        invoice.amount,
        &policy.bonus_new_client,
    ) {
        bonus.new_client = policy.bonus_new_client.reward_amount;
    }

    if qualifies(
        policy.enable_bonus_recovered,
        invoice.is_recovered_client,
        invoice.amount,
        &policy.bonus_recovered_client,
    ) {
        bonus.recovered_client = policy.bonus_recovered_client.reward_amount;
    }

    bonus
}

/// Total flat bonus for one invoice. Never multiplied by the factor cascade.
pub fn apply_invoice_bonuses(invoice: &Invoice, policy: &CompensationPolicy) -> Money {
    invoice_bonuses(invoice, policy).total()
}

/// Number of distinct customers among invoices flagged as new clients.
pub fn distinct_new_clients(invoices: &[Invoice]) -> usize {
    invoices
        .iter()
        .filter(|inv| inv.is_new_client)
        .map(|inv| inv.customer_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Batch-level volume bonus: paid once when enough distinct new clients were
/// invoiced, regardless of how many invoices or customers exceed the goal.
pub fn apply_volume_bonus(invoices: &[Invoice], policy: &CompensationPolicy) -> Money {
    if !policy.enable_bonus_volume {
        return Decimal::ZERO;
    }

    let distinct = distinct_new_clients(invoices);
    if distinct >= policy.bonus_volume_clients.target_qty as usize {
        tracing::debug!(distinct, "volume bonus reached");
        policy.bonus_volume_clients.reward_amount
    } else {
        Decimal::ZERO
    }
}
