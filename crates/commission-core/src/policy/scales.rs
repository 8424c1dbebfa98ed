use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CommissionError;
use crate::types::{Money, Percent, Rate};
use crate::CommissionResult;

/// Number of brackets in each financial (sales-attainment) table.
pub const FINANCIAL_SCALE_LEN: usize = 4;

/// Number of brackets in each coverage table.
pub const COVERAGE_SCALE_LEN: usize = 3;

// ---------------------------------------------------------------------------
// Financial scales
// ---------------------------------------------------------------------------

/// Wire form of one financial bracket. `end_amount` is omitted only on the
/// terminal bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialBracket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_amount: Option<Money>,
    /// Percentage applied to commission (105 = 105%)
    pub commission_percentage: Percent,
}

/// A financial bracket with a closed end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedTier {
    pub end_amount: Money,
    pub commission_percentage: Percent,
}

impl BoundedTier {
    pub fn new(end_amount: Money, commission_percentage: Percent) -> Self {
        BoundedTier {
            end_amount,
            commission_percentage,
        }
    }
}

/// Ordered financial bracket table.
///
/// Stores the bounded tiers separately from the terminal percentage, so an
/// open-ended bracket anywhere but the last position cannot be represented.
/// Threshold direction (ascending for the positive table, descending for the
/// negative one) is checked by [`CompensationPolicy::validate`].
///
/// [`CompensationPolicy::validate`]: super::CompensationPolicy::validate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<FinancialBracket>",
    into = "Vec<FinancialBracket>"
)]
pub struct FinancialScale {
    tiers: [BoundedTier; FINANCIAL_SCALE_LEN - 1],
    terminal_percentage: Percent,
}

impl FinancialScale {
    /// Build from fixed parts; arity and the open terminal hold by type.
    pub fn from_parts(
        tiers: [BoundedTier; FINANCIAL_SCALE_LEN - 1],
        terminal_percentage: Percent,
    ) -> Self {
        FinancialScale {
            tiers,
            terminal_percentage,
        }
    }

    /// Build from the wire form, rejecting wrong arity, a bounded terminal
    /// bracket, an unbounded non-terminal bracket, or a negative percentage.
    pub fn new(brackets: Vec<FinancialBracket>) -> CommissionResult<Self> {
        if brackets.len() != FINANCIAL_SCALE_LEN {
            return Err(CommissionError::policy(
                "financial_scale",
                format!(
                    "expected exactly {FINANCIAL_SCALE_LEN} brackets, got {}",
                    brackets.len()
                ),
            ));
        }

        for (i, b) in brackets.iter().enumerate() {
            if b.commission_percentage < Decimal::ZERO {
                return Err(CommissionError::policy(
                    format!("financial_scale[{i}].commission_percentage"),
                    "percentage cannot be negative",
                ));
            }
        }

        let mut tiers = [BoundedTier::new(Decimal::ZERO, Decimal::ZERO); FINANCIAL_SCALE_LEN - 1];
        for (i, slot) in tiers.iter_mut().enumerate() {
            let bracket = &brackets[i];
            let end_amount = bracket.end_amount.ok_or_else(|| {
                CommissionError::policy(
                    format!("financial_scale[{i}].end_amount"),
                    "only the last bracket may be open-ended",
                )
            })?;
            *slot = BoundedTier::new(end_amount, bracket.commission_percentage);
        }

        let terminal = &brackets[FINANCIAL_SCALE_LEN - 1];
        if terminal.end_amount.is_some() {
            return Err(CommissionError::policy(
                format!("financial_scale[{}].end_amount", FINANCIAL_SCALE_LEN - 1),
                "the last bracket must be open-ended",
            ));
        }

        Ok(FinancialScale {
            tiers,
            terminal_percentage: terminal.commission_percentage,
        })
    }

    /// The closed brackets, in table order.
    pub fn bounded(&self) -> &[BoundedTier] {
        &self.tiers
    }

    pub fn terminal_percentage(&self) -> Percent {
        self.terminal_percentage
    }

    /// Percentage of the bracket at `index`; the terminal is the last index.
    pub fn percentage(&self, index: usize) -> Option<Percent> {
        match index {
            i if i < self.tiers.len() => Some(self.tiers[i].commission_percentage),
            i if i == self.tiers.len() => Some(self.terminal_percentage),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        FINANCIAL_SCALE_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_strictly_ascending(&self) -> bool {
        self.tiers
            .windows(2)
            .all(|w| w[0].end_amount < w[1].end_amount)
    }

    pub fn is_strictly_descending(&self) -> bool {
        self.tiers
            .windows(2)
            .all(|w| w[0].end_amount > w[1].end_amount)
    }

    pub fn brackets(&self) -> Vec<FinancialBracket> {
        let mut out: Vec<FinancialBracket> = self
            .tiers
            .iter()
            .map(|t| FinancialBracket {
                end_amount: Some(t.end_amount),
                commission_percentage: t.commission_percentage,
            })
            .collect();
        out.push(FinancialBracket {
            end_amount: None,
            commission_percentage: self.terminal_percentage,
        });
        out
    }
}

impl TryFrom<Vec<FinancialBracket>> for FinancialScale {
    type Error = CommissionError;

    fn try_from(brackets: Vec<FinancialBracket>) -> Result<Self, Self::Error> {
        FinancialScale::new(brackets)
    }
}

impl From<FinancialScale> for Vec<FinancialBracket> {
    fn from(scale: FinancialScale) -> Self {
        scale.brackets()
    }
}

// ---------------------------------------------------------------------------
// Coverage scales
// ---------------------------------------------------------------------------

/// One coverage bracket: an inclusive attainment range, authored high to low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageBracket {
    pub start_percentage: Percent,
    pub end_percentage: Percent,
    pub payout_factor: Rate,
}

impl CoverageBracket {
    pub fn new(start_percentage: Percent, end_percentage: Percent, payout_factor: Rate) -> Self {
        CoverageBracket {
            start_percentage,
            end_percentage,
            payout_factor,
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, attainment_pct: Percent) -> bool {
        attainment_pct <= self.start_percentage && attainment_pct >= self.end_percentage
    }
}

/// Ordered coverage table. The first bracket's `start_percentage` doubles as
/// the ceiling above which attainment is clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CoverageBracket>", into = "Vec<CoverageBracket>")]
pub struct CoverageScale {
    brackets: [CoverageBracket; COVERAGE_SCALE_LEN],
}

impl CoverageScale {
    pub fn from_parts(brackets: [CoverageBracket; COVERAGE_SCALE_LEN]) -> Self {
        CoverageScale { brackets }
    }

    /// Build from the wire form, rejecting wrong arity, inverted ranges and
    /// negative payout factors.
    pub fn new(brackets: Vec<CoverageBracket>) -> CommissionResult<Self> {
        let brackets: [CoverageBracket; COVERAGE_SCALE_LEN] =
            brackets.try_into().map_err(|v: Vec<CoverageBracket>| {
                CommissionError::policy(
                    "coverage_scale",
                    format!(
                        "expected exactly {COVERAGE_SCALE_LEN} brackets, got {}",
                        v.len()
                    ),
                )
            })?;

        for (i, b) in brackets.iter().enumerate() {
            if b.start_percentage < b.end_percentage {
                return Err(CommissionError::policy(
                    format!("coverage_scale[{i}]"),
                    "start_percentage must not be below end_percentage",
                ));
            }
            if b.payout_factor < Decimal::ZERO {
                return Err(CommissionError::policy(
                    format!("coverage_scale[{i}].payout_factor"),
                    "payout factor cannot be negative",
                ));
            }
        }

        Ok(CoverageScale { brackets })
    }

    pub fn brackets(&self) -> &[CoverageBracket] {
        &self.brackets
    }

    /// Top bracket; its start is the clamp ceiling.
    pub fn ceiling(&self) -> &CoverageBracket {
        &self.brackets[0]
    }

    /// Lowest bracket; attainment below its end earns nothing.
    pub fn floor(&self) -> &CoverageBracket {
        &self.brackets[COVERAGE_SCALE_LEN - 1]
    }

    pub fn is_descending(&self) -> bool {
        self.brackets
            .windows(2)
            .all(|w| w[1].start_percentage <= w[0].end_percentage)
    }

    /// Attainment ranges between adjacent brackets that no bracket covers,
    /// as `(low, high)` exclusive bounds.
    pub fn gaps(&self) -> Vec<(Percent, Percent)> {
        self.brackets
            .windows(2)
            .filter(|w| w[1].start_percentage < w[0].end_percentage)
            .map(|w| (w[1].start_percentage, w[0].end_percentage))
            .collect()
    }
}

impl TryFrom<Vec<CoverageBracket>> for CoverageScale {
    type Error = CommissionError;

    fn try_from(brackets: Vec<CoverageBracket>) -> Result<Self, Self::Error> {
        CoverageScale::new(brackets)
    }
}

impl From<CoverageScale> for Vec<CoverageBracket> {
    fn from(scale: CoverageScale) -> Self {
        scale.brackets.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bracket(end: Option<Money>, pct: Percent) -> FinancialBracket {
        FinancialBracket {
            end_amount: end,
            commission_percentage: pct,
        }
    }

    #[test]
    fn test_financial_scale_accepts_open_terminal() {
        let scale = FinancialScale::new(vec![
            bracket(Some(dec!(750000)), dec!(105)),
            bracket(Some(dec!(850000)), dec!(110)),
            bracket(Some(dec!(1000000)), dec!(115)),
            bracket(None, dec!(120)),
        ])
        .unwrap();
        assert_eq!(scale.bounded().len(), 3);
        assert_eq!(scale.terminal_percentage(), dec!(120));
        assert_eq!(scale.percentage(1), Some(dec!(110)));
        assert_eq!(scale.percentage(3), Some(dec!(120)));
        assert_eq!(scale.percentage(4), None);
        assert!(scale.is_strictly_ascending());
    }

    #[test]
    fn test_financial_scale_rejects_wrong_arity() {
        let err = FinancialScale::new(vec![
            bracket(Some(dec!(750000)), dec!(105)),
            bracket(None, dec!(120)),
        ])
        .unwrap_err();
        assert!(matches!(err, CommissionError::InvalidPolicy { .. }));
    }

    #[test]
    fn test_financial_scale_rejects_open_middle_bracket() {
        let result = FinancialScale::new(vec![
            bracket(Some(dec!(750000)), dec!(105)),
            bracket(None, dec!(110)),
            bracket(Some(dec!(1000000)), dec!(115)),
            bracket(None, dec!(120)),
        ]);
        match result.unwrap_err() {
            CommissionError::InvalidPolicy { field, .. } => {
                assert_eq!(field, "financial_scale[1].end_amount");
            }
            other => panic!("Expected InvalidPolicy, got: {other:?}"),
        }
    }

    #[test]
    fn test_financial_scale_rejects_bounded_terminal() {
        let result = FinancialScale::new(vec![
            bracket(Some(dec!(600000)), dec!(90)),
            bracket(Some(dec!(500000)), dec!(80)),
            bracket(Some(dec!(400000)), dec!(70)),
            bracket(Some(dec!(0)), dec!(50)),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_financial_scale_serde_shape() {
        let json = r#"[
            {"end_amount": "600000", "commission_percentage": "90"},
            {"end_amount": "500000", "commission_percentage": "80"},
            {"end_amount": "400000", "commission_percentage": "70"},
            {"commission_percentage": "50"}
        ]"#;
        let scale: FinancialScale = serde_json::from_str(json).unwrap();
        assert!(scale.is_strictly_descending());
        let back = serde_json::to_value(&scale).unwrap();
        assert!(back[3].get("end_amount").is_none());
        assert_eq!(back[0]["end_amount"], "600000");
    }

    #[test]
    fn test_coverage_scale_rejects_wrong_arity() {
        let result = CoverageScale::new(vec![CoverageBracket::new(
            dec!(100),
            dec!(0),
            dec!(1.0),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_coverage_scale_rejects_inverted_range() {
        let result = CoverageScale::new(vec![
            CoverageBracket::new(dec!(90), dec!(100), dec!(1.0)),
            CoverageBracket::new(dec!(89), dec!(80), dec!(0.9)),
            CoverageBracket::new(dec!(79), dec!(0), dec!(0.8)),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_coverage_scale_gaps() {
        let scale = CoverageScale::from_parts([
            CoverageBracket::new(dec!(100), dec!(90), dec!(1.0)),
            CoverageBracket::new(dec!(89), dec!(80), dec!(0.9)),
            CoverageBracket::new(dec!(79), dec!(0), dec!(0.8)),
        ]);
        assert!(scale.is_descending());
        assert_eq!(
            scale.gaps(),
            vec![(dec!(89), dec!(90)), (dec!(79), dec!(80))]
        );
        assert_eq!(scale.ceiling().start_percentage, dec!(100));
        assert_eq!(scale.floor().end_percentage, dec!(0));
    }

    #[test]
    fn test_coverage_bracket_contains_is_inclusive() {
        let b = CoverageBracket::new(dec!(89), dec!(80), dec!(0.9));
        assert!(b.contains(dec!(89)));
        assert!(b.contains(dec!(80)));
        assert!(!b.contains(dec!(89.01)));
        assert!(!b.contains(dec!(79.99)));
    }
}
