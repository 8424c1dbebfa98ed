use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::scales::{BoundedTier, CoverageBracket, CoverageScale, FinancialScale};
use super::{BonusRule, CompensationPolicy, VolumeBonusRule};
use crate::types::BusinessLine;

/// Business lines the standard policy carries rates and targets for.
pub const STANDARD_LINES: [&str; 8] = [
    "Ventas",
    "Renta",
    "Mantenimiento",
    "Calibración",
    "Capacitación",
    "Supervisión",
    "Proyectos",
    "Otros",
];

fn standard_coverage() -> CoverageScale {
    CoverageScale::from_parts([
        CoverageBracket::new(dec!(100), dec!(90), dec!(1.0)),
        CoverageBracket::new(dec!(89), dec!(80), dec!(0.9)),
        CoverageBracket::new(dec!(79), dec!(0), dec!(0.8)),
    ])
}

/// The house policy: 700k monthly target, four brackets either side of it,
/// 50% portfolio-activity and 30% closing-rate coverage, and flat bonuses.
pub fn standard_policy() -> CompensationPolicy {
    let rates = [
        dec!(0.015),
        dec!(0.02),
        dec!(0.015),
        dec!(0.015),
        dec!(0.10),
        dec!(0.03),
        dec!(0.03),
        dec!(0.00),
    ];
    let targets = [
        dec!(300000),
        dec!(250000),
        dec!(30000),
        dec!(30000),
        dec!(20000),
        dec!(40000),
        dec!(30000),
        dec!(0),
    ];

    CompensationPolicy {
        global_target: dec!(700000),
        positive_scales: FinancialScale::from_parts(
            [
                BoundedTier::new(dec!(750000), dec!(105)),
                BoundedTier::new(dec!(850000), dec!(110)),
                BoundedTier::new(dec!(1000000), dec!(115)),
            ],
            dec!(120),
        ),
        negative_scales: FinancialScale::from_parts(
            [
                BoundedTier::new(dec!(600000), dec!(90)),
                BoundedTier::new(dec!(500000), dec!(80)),
                BoundedTier::new(dec!(400000), dec!(70)),
            ],
            dec!(50),
        ),
        enable_portfolio_coverage: true,
        portfolio_activity_target: dec!(50),
        portfolio_scales: standard_coverage(),
        enable_closing_coverage: true,
        closing_percentage_target: dec!(30),
        closing_scales: standard_coverage(),
        enable_bonus_new_client: true,
        enable_bonus_recovered: true,
        enable_bonus_volume: true,
        bonus_new_client: BonusRule {
            target_qty: 2,
            reward_amount: dec!(500),
            min_purchase_amount: dec!(5000),
        },
        bonus_recovered_client: BonusRule {
            target_qty: 2,
            reward_amount: dec!(500),
            min_purchase_amount: dec!(5000),
        },
        bonus_volume_clients: VolumeBonusRule {
            target_qty: 5,
            reward_amount: dec!(1500),
        },
        rates: STANDARD_LINES
            .iter()
            .zip(rates)
            .map(|(line, rate)| (BusinessLine::new(*line), rate))
            .collect::<BTreeMap<_, _>>(),
        line_targets: STANDARD_LINES
            .iter()
            .zip(targets)
            .map(|(line, target)| (BusinessLine::new(*line), target))
            .collect::<BTreeMap<_, _>>(),
    }
}
