use super::super::factors::{FactorContribution, FactorContributions, FactorKind};
use super::super::features::{FeatureSet, OwnershipPolicy};
use super::super::ladder::ThresholdLadder;
use super::{ModelVariant, OwnershipWeights, ProbabilityBounds, ScoreModel};
use serde::{Deserialize, Serialize};

const FACTORS: [FactorKind; 5] = [
    FactorKind::FinancialPressure,
    FactorKind::OwnershipComplexity,
    FactorKind::AssessmentShock,
    FactorKind::HoldingPeriod,
    FactorKind::DebtLoad,
];

/// Point-scale weights of the original weighted model.
///
/// Financial, ownership and shock scores are accumulated as integer points,
/// capped, then scaled into a fixed slice of probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicConfig {
    pub bounds: ProbabilityBounds,
    pub ownership_policy: OwnershipPolicy,
    pub debt_ratio_points: ThresholdLadder<f64>,
    pub prior_year_points: ThresholdLadder<f64>,
    pub high_assessment: f64,
    pub high_assessment_points: f64,
    pub penalty_points: f64,
    pub financial_point_cap: f64,
    pub financial_weight: f64,
    pub ownership_points: OwnershipWeights,
    pub absentee_points: f64,
    pub out_of_jurisdiction_points: f64,
    pub ownership_point_cap: f64,
    pub ownership_weight: f64,
    pub shock_points: ThresholdLadder<f64>,
    pub shock_point_cap: f64,
    pub shock_weight: f64,
    pub holding_period: ThresholdLadder<f64>,
    pub recent_transfer_years: f64,
    pub recent_transfer_value: f64,
    pub holding_period_cap: f64,
    pub debt_load: ThresholdLadder<f64>,
    pub debt_load_cap: f64,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            bounds: ProbabilityBounds::new(0.05, 0.95),
            ownership_policy: OwnershipPolicy::Exclusive,
            debt_ratio_points: ThresholdLadder::above(&[(0.15, 3.0), (0.10, 2.0), (0.05, 1.0)], 0.0),
            prior_year_points: ThresholdLadder::at_least(&[(5.0, 2.0), (3.0, 1.0)], 0.0),
            high_assessment: 2_000_000.0,
            high_assessment_points: 1.0,
            penalty_points: 1.0,
            financial_point_cap: 8.0,
            financial_weight: 0.40,
            ownership_points: OwnershipWeights {
                estate: 3.0,
                trust: 2.0,
                partnership: 1.0,
                corporate: 1.0,
                multiple_owners: 0.0,
            },
            absentee_points: 1.0,
            out_of_jurisdiction_points: 1.0,
            ownership_point_cap: 5.0,
            ownership_weight: 0.25,
            shock_points: ThresholdLadder::above(
                &[(0.50, 4.0), (0.30, 3.0), (0.20, 2.0), (0.10, 1.0)],
                0.0,
            ),
            shock_point_cap: 4.0,
            shock_weight: 0.15,
            holding_period: ThresholdLadder::above(
                &[(20.0, 0.20), (15.0, 0.16), (10.0, 0.12), (5.0, 0.08)],
                0.04,
            ),
            recent_transfer_years: 2.0,
            recent_transfer_value: 0.02,
            holding_period_cap: 0.20,
            debt_load: ThresholdLadder::above(&[(0.10, 0.15), (0.05, 0.10)], 0.0),
            debt_load_cap: 0.15,
        }
    }
}

fn scale(points: f64, point_cap: f64, weight: f64) -> f64 {
    if point_cap <= 0.0 {
        return 0.0;
    }
    (points.min(point_cap) / point_cap).min(1.0) * weight
}

pub fn financial_pressure(features: &FeatureSet, config: &BasicConfig) -> FactorContribution {
    let mut points = 0.0;
    if features.assessment > 0.0 {
        points += config.debt_ratio_points.resolve(features.debt_ratio);
        points += config
            .prior_year_points
            .resolve(f64::from(features.prior_year_balance_count));
        if features.assessment > config.high_assessment {
            points += config.high_assessment_points;
        }
        if features.has_penalty_or_interest {
            points += config.penalty_points;
        }
    }
    let points = points.min(config.financial_point_cap);

    FactorContribution::capped(
        FactorKind::FinancialPressure,
        scale(points, config.financial_point_cap, config.financial_weight),
        config.financial_weight,
        format!(
            "{points:.0} of {:.0} distress points (debt ratio {:.2}, {} prior-year balances)",
            config.financial_point_cap, features.debt_ratio, features.prior_year_balance_count
        ),
    )
}

pub fn ownership_complexity(features: &FeatureSet, config: &BasicConfig) -> FactorContribution {
    let mut points = config.ownership_points.total(&features.ownership);
    if features.absentee_owner {
        points += config.absentee_points;
    }
    if features.out_of_jurisdiction {
        points += config.out_of_jurisdiction_points;
    }
    let points = points.min(config.ownership_point_cap);

    let structure = features
        .ownership
        .primary()
        .map(|kind| kind.label())
        .unwrap_or("Individual");

    FactorContribution::capped(
        FactorKind::OwnershipComplexity,
        scale(points, config.ownership_point_cap, config.ownership_weight),
        config.ownership_weight,
        format!(
            "{structure} ownership, {points:.0} of {:.0} complexity points",
            config.ownership_point_cap
        ),
    )
}

pub fn assessment_shock(features: &FeatureSet, config: &BasicConfig) -> FactorContribution {
    let points = config
        .shock_points
        .resolve(features.assessment_change_ratio)
        .min(config.shock_point_cap);

    FactorContribution::capped(
        FactorKind::AssessmentShock,
        scale(points, config.shock_point_cap, config.shock_weight),
        config.shock_weight,
        format!(
            "assessment up {:.0}%",
            features.assessment_change_ratio * 100.0
        ),
    )
}

pub fn holding_period(features: &FeatureSet, config: &BasicConfig) -> FactorContribution {
    let years = features.years_since_transfer;
    let value = if years < config.recent_transfer_years {
        config.recent_transfer_value
    } else {
        config.holding_period.resolve(years)
    };

    FactorContribution::capped(
        FactorKind::HoldingPeriod,
        value,
        config.holding_period_cap,
        format!("{years:.1} years since last transfer"),
    )
}

pub fn debt_load(features: &FeatureSet, config: &BasicConfig) -> FactorContribution {
    FactorContribution::capped(
        FactorKind::DebtLoad,
        config.debt_load.resolve(features.debt_ratio),
        config.debt_load_cap,
        format!("debt-to-assessment ratio {:.3}", features.debt_ratio),
    )
}

/// Original weighted model: five capped slices, no multipliers.
#[derive(Debug, Clone)]
pub struct BasicModel {
    config: BasicConfig,
}

impl BasicModel {
    pub fn new(config: BasicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BasicConfig {
        &self.config
    }
}

impl ScoreModel for BasicModel {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Basic
    }

    fn bounds(&self) -> ProbabilityBounds {
        self.config.bounds
    }

    fn base_probability(&self) -> f64 {
        0.0
    }

    fn ownership_policy(&self) -> OwnershipPolicy {
        self.config.ownership_policy
    }

    fn factor_kinds(&self) -> &'static [FactorKind] {
        &FACTORS
    }

    fn contributions(&self, features: &FeatureSet) -> FactorContributions {
        [
            financial_pressure(features, &self.config),
            ownership_complexity(features, &self.config),
            assessment_shock(features, &self.config),
            holding_period(features, &self.config),
            debt_load(features, &self.config),
        ]
        .into_iter()
        .collect()
    }
}
