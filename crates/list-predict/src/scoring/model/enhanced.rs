use super::super::factors::{FactorContribution, FactorContributions, FactorKind};
use super::super::features::{FeatureSet, OwnershipPolicy, PropertyCategory};
use super::super::ladder::ThresholdLadder;
use super::super::RunContext;
use super::{
    Confidence, ConfidencePolicy, ModelVariant, Multipliers, OwnershipWeights, ProbabilityBounds,
    ScoreModel,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const FACTORS: [FactorKind; 9] = [
    FactorKind::FinancialPressure,
    FactorKind::OwnershipComplexity,
    FactorKind::AssessmentShock,
    FactorKind::MarketPressure,
    FactorKind::TaxSaleHistory,
    FactorKind::PaymentRecency,
    FactorKind::HomesteadProtection,
    FactorKind::Vacancy,
    FactorKind::MixedUse,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryMultipliers {
    pub residential: f64,
    pub commercial: f64,
    pub other: f64,
}

impl CategoryMultipliers {
    pub fn get(&self, category: PropertyCategory) -> f64 {
        match category {
            PropertyCategory::Residential => self.residential,
            PropertyCategory::Commercial => self.commercial,
            PropertyCategory::Other => self.other,
        }
    }
}

/// Constants of the multi-factor model. Every cap is a probability slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedConfig {
    pub bounds: ProbabilityBounds,
    pub base_probability: f64,
    pub ownership_policy: OwnershipPolicy,
    pub debt_ratio_points: ThresholdLadder<f64>,
    pub balance_points: ThresholdLadder<f64>,
    pub high_value_threshold: f64,
    pub high_value_points: f64,
    pub financial_point_cap: f64,
    pub financial_weight: f64,
    pub ownership_weights: OwnershipWeights,
    pub ownership_cap: f64,
    pub shock_tiers: ThresholdLadder<f64>,
    pub shock_amplifier: ThresholdLadder<f64>,
    pub shock_cap: f64,
    pub appreciation_tiers: ThresholdLadder<f64>,
    pub holding_fallback: ThresholdLadder<f64>,
    pub assessment_fallback: ThresholdLadder<f64>,
    pub market_cap: f64,
    pub tax_sale_tiers: ThresholdLadder<f64>,
    pub tax_sale_cap: f64,
    pub payment_tiers: ThresholdLadder<f64>,
    pub unpaid_balance_tiers: ThresholdLadder<f64>,
    pub payment_cap: f64,
    pub homestead_offsets: BTreeMap<String, f64>,
    pub homestead_bound: f64,
    pub vacancy_bonus: f64,
    pub mixed_use_base: f64,
    pub mixed_use_class_multiplier: ThresholdLadder<f64>,
    pub mixed_use_cap: f64,
    pub ward_multipliers: BTreeMap<String, f64>,
    pub ward_fallback: f64,
    pub property_type_multipliers: CategoryMultipliers,
    pub seasonal_adjustment: bool,
    /// January first.
    pub seasonal_multipliers: [f64; 12],
    pub confidence: ConfidencePolicy,
}

impl Default for EnhancedConfig {
    fn default() -> Self {
        let ward_multipliers = [
            ("1", 1.10),
            ("2", 0.95),
            ("3", 0.90),
            ("4", 1.05),
            ("5", 1.20),
            ("6", 1.10),
            ("7", 1.25),
            ("8", 1.30),
        ]
        .into_iter()
        .map(|(ward, multiplier)| (ward.to_string(), multiplier))
        .collect();

        let homestead_offsets = [("1", -0.05), ("5", -0.08)]
            .into_iter()
            .map(|(code, offset)| (code.to_string(), offset))
            .collect();

        Self {
            bounds: ProbabilityBounds::new(0.10, 0.95),
            base_probability: 0.10,
            ownership_policy: OwnershipPolicy::Additive,
            debt_ratio_points: ThresholdLadder::above(&[(0.15, 3.0), (0.10, 2.0), (0.05, 1.0)], 0.0),
            balance_points: ThresholdLadder::above(&[(50_000.0, 2.0), (10_000.0, 1.0)], 0.0),
            high_value_threshold: 1_000_000.0,
            high_value_points: 2.0,
            financial_point_cap: 7.0,
            financial_weight: 0.30,
            ownership_weights: OwnershipWeights {
                estate: 0.15,
                trust: 0.10,
                partnership: 0.08,
                corporate: 0.06,
                multiple_owners: 0.05,
            },
            ownership_cap: 0.35,
            shock_tiers: ThresholdLadder::above(
                &[(0.50, 0.12), (0.30, 0.09), (0.20, 0.06), (0.10, 0.03)],
                0.0,
            ),
            shock_amplifier: ThresholdLadder::above(&[(20.0, 1.4), (10.0, 1.2)], 1.0),
            shock_cap: 0.15,
            appreciation_tiers: ThresholdLadder::above(
                &[(3.0, 0.12), (2.0, 0.08), (1.5, 0.05), (1.2, 0.02)],
                0.0,
            ),
            holding_fallback: ThresholdLadder::above(&[(20.0, 0.08), (15.0, 0.06), (10.0, 0.04)], 0.0),
            assessment_fallback: ThresholdLadder::above(
                &[(1_000_000.0, 0.04), (500_000.0, 0.02)],
                0.0,
            ),
            market_cap: 0.15,
            tax_sale_tiers: ThresholdLadder::above(&[(2.0, 0.15), (1.0, 0.10), (0.0, 0.06)], 0.0),
            tax_sale_cap: 0.15,
            payment_tiers: ThresholdLadder::above(
                &[(730.0, 0.10), (365.0, 0.07), (180.0, 0.04), (90.0, 0.02)],
                0.0,
            ),
            unpaid_balance_tiers: ThresholdLadder::above(
                &[(25_000.0, 0.08), (5_000.0, 0.05), (0.0, 0.02)],
                0.0,
            ),
            payment_cap: 0.10,
            homestead_offsets,
            homestead_bound: 0.08,
            vacancy_bonus: 0.08,
            mixed_use_base: 0.04,
            mixed_use_class_multiplier: ThresholdLadder::at_least(&[(3.0, 2.0), (2.0, 1.5)], 1.0),
            mixed_use_cap: 0.08,
            ward_multipliers,
            ward_fallback: 1.0,
            property_type_multipliers: CategoryMultipliers {
                residential: 1.05,
                commercial: 0.95,
                other: 1.0,
            },
            seasonal_adjustment: true,
            seasonal_multipliers: [
                0.95, 0.95, 1.05, 1.05, 1.05, 1.02, 1.02, 1.02, 1.0, 1.0, 1.0, 0.95,
            ],
            confidence: ConfidencePolicy::default(),
        }
    }
}

impl EnhancedConfig {
    /// Unknown or blank wards fall back to the neutral multiplier.
    pub fn ward_multiplier(&self, ward: Option<&str>) -> f64 {
        ward.and_then(|ward| self.ward_multipliers.get(ward))
            .copied()
            .unwrap_or(self.ward_fallback)
    }

    pub fn seasonal_multiplier(&self, context: &RunContext) -> f64 {
        if !self.seasonal_adjustment {
            return 1.0;
        }
        let month = context.reference_date.month0() as usize;
        self.seasonal_multipliers.get(month).copied().unwrap_or(1.0)
    }
}

pub fn financial_pressure(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    let mut points = config.debt_ratio_points.resolve(features.debt_ratio)
        + config.balance_points.resolve(features.total_balance);
    if features.assessment > config.high_value_threshold && features.has_lien() {
        points += config.high_value_points;
    }
    let points = points.min(config.financial_point_cap);
    let value = if config.financial_point_cap > 0.0 {
        points / config.financial_point_cap * config.financial_weight
    } else {
        0.0
    };

    FactorContribution::capped(
        FactorKind::FinancialPressure,
        value,
        config.financial_weight,
        format!(
            "{points:.0} of {:.0} points (debt ratio {:.2}, balance ${:.0})",
            config.financial_point_cap, features.debt_ratio, features.total_balance
        ),
    )
}

pub fn ownership_complexity(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    let matched: Vec<&str> = features.ownership.kinds().map(|kind| kind.label()).collect();
    let notes = if matched.is_empty() {
        "individual owner".to_string()
    } else {
        matched.join(", ")
    };

    FactorContribution::capped(
        FactorKind::OwnershipComplexity,
        config.ownership_weights.total(&features.ownership),
        config.ownership_cap,
        notes,
    )
}

/// Long-held properties feel the same increase harder.
pub fn assessment_shock(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    let tier = config.shock_tiers.resolve(features.assessment_change_ratio);
    let amplifier = config.shock_amplifier.resolve(features.years_since_transfer);

    FactorContribution::capped(
        FactorKind::AssessmentShock,
        tier * amplifier,
        config.shock_cap,
        format!(
            "assessment up {:.0}%, amplified x{amplifier:.1}",
            features.assessment_change_ratio * 100.0
        ),
    )
}

pub fn market_pressure(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    let (value, notes) = if features.sale_price > 0.0 {
        let appreciation = features.assessment / features.sale_price;
        (
            config.appreciation_tiers.resolve(appreciation),
            format!("assessed at {appreciation:.2}x last sale price"),
        )
    } else {
        (
            config.holding_fallback.resolve(features.years_since_transfer)
                + config.assessment_fallback.resolve(features.assessment),
            format!(
                "no sale price; {:.1} years held, assessed ${:.0}",
                features.years_since_transfer, features.assessment
            ),
        )
    };

    FactorContribution::capped(FactorKind::MarketPressure, value, config.market_cap, notes)
}

pub fn tax_sale_history(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    FactorContribution::capped(
        FactorKind::TaxSaleHistory,
        config
            .tax_sale_tiers
            .resolve(f64::from(features.tax_sale_count)),
        config.tax_sale_cap,
        format!("{} tax sale flag(s)", features.tax_sale_count),
    )
}

pub fn payment_recency(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    let (value, notes) = match features.days_since_payment {
        Some(days) => (
            config.payment_tiers.resolve(days as f64),
            format!("{days} days since last payment"),
        ),
        None => (
            config.unpaid_balance_tiers.resolve(features.total_balance),
            format!(
                "no payment on record, balance ${:.0}",
                features.total_balance
            ),
        ),
    };

    FactorContribution::capped(FactorKind::PaymentRecency, value, config.payment_cap, notes)
}

pub fn homestead_protection(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    let offset = config
        .homestead_offsets
        .get(features.homestead_code.as_str())
        .copied()
        .unwrap_or(0.0);
    let notes = if offset < 0.0 {
        format!("homestead code {}", features.homestead_code)
    } else {
        "no homestead deduction".to_string()
    };

    FactorContribution::capped(
        FactorKind::HomesteadProtection,
        offset,
        config.homestead_bound,
        notes,
    )
}

pub fn vacancy(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    let (value, notes) = if features.vacant {
        (config.vacancy_bonus, "vacant")
    } else {
        (0.0, "occupied")
    };
    FactorContribution::capped(FactorKind::Vacancy, value, config.vacancy_bonus, notes)
}

/// Zero unless the mixed-use flag is set.
pub fn mixed_use(features: &FeatureSet, config: &EnhancedConfig) -> FactorContribution {
    if !features.mixed_use {
        return FactorContribution::capped(
            FactorKind::MixedUse,
            0.0,
            config.mixed_use_cap,
            "single use",
        );
    }

    let class = features.tax_class.map(f64::from).unwrap_or(0.0);
    let multiplier = config.mixed_use_class_multiplier.resolve(class);

    FactorContribution::capped(
        FactorKind::MixedUse,
        config.mixed_use_base * multiplier,
        config.mixed_use_cap,
        format!("mixed use, class multiplier x{multiplier:.1}"),
    )
}

/// Multi-factor model with geographic, property-type and seasonal multipliers.
#[derive(Debug, Clone)]
pub struct EnhancedModel {
    config: EnhancedConfig,
}

impl EnhancedModel {
    pub fn new(config: EnhancedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnhancedConfig {
        &self.config
    }
}

impl ScoreModel for EnhancedModel {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Enhanced
    }

    fn bounds(&self) -> ProbabilityBounds {
        self.config.bounds
    }

    fn base_probability(&self) -> f64 {
        self.config.base_probability
    }

    fn ownership_policy(&self) -> OwnershipPolicy {
        self.config.ownership_policy
    }

    fn factor_kinds(&self) -> &'static [FactorKind] {
        &FACTORS
    }

    fn contributions(&self, features: &FeatureSet) -> FactorContributions {
        let config = &self.config;
        [
            financial_pressure(features, config),
            ownership_complexity(features, config),
            assessment_shock(features, config),
            market_pressure(features, config),
            tax_sale_history(features, config),
            payment_recency(features, config),
            homestead_protection(features, config),
            vacancy(features, config),
            mixed_use(features, config),
        ]
        .into_iter()
        .collect()
    }

    fn multipliers(&self, features: &FeatureSet, context: &RunContext) -> Multipliers {
        Multipliers {
            geographic: self.config.ward_multiplier(features.ward.as_deref()),
            property_type: self
                .config
                .property_type_multipliers
                .get(features.property_category),
            seasonal: self.config.seasonal_multiplier(context),
        }
    }

    fn confidence(&self, probability: f64) -> Option<Confidence> {
        Some(self.config.confidence.label(probability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::{context, features};
    use crate::scoring::RiskCategory;
    use chrono::NaiveDate;

    #[test]
    fn financial_pressure_combines_ratio_balance_and_value_tiers() {
        let config = EnhancedConfig::default();
        let mut record = features();
        record.assessment = 1_500_000.0;
        record.total_balance = 300_000.0;
        record.debt_ratio = 0.20;

        let contribution = financial_pressure(&record, &config);
        // 3 + 2 + 2 = 7 points, the full slice
        assert!((contribution.value - 0.30).abs() < 1e-12);

        record.assessment = 100_000.0;
        record.total_balance = 20_000.0;
        let contribution = financial_pressure(&record, &config);
        assert!((contribution.value - 4.0 / 7.0 * 0.30).abs() < 1e-12);
    }

    #[test]
    fn additive_ownership_is_capped() {
        let config = EnhancedConfig::default();
        let mut record = features();
        record.ownership.estate = true;
        record.ownership.trust = true;
        record.ownership.partnership = true;
        record.ownership.corporate = true;
        record.ownership.multiple_owners = true;

        let contribution = ownership_complexity(&record, &config);
        assert_eq!(contribution.value, 0.35);
    }

    #[test]
    fn assessment_shock_is_amplified_by_holding_period() {
        let config = EnhancedConfig::default();
        let mut record = features();
        record.assessment_change_ratio = 0.25;
        record.years_since_transfer = 22.0;
        assert!((assessment_shock(&record, &config).value - 0.06 * 1.4).abs() < 1e-12);

        record.years_since_transfer = 12.0;
        assert!((assessment_shock(&record, &config).value - 0.06 * 1.2).abs() < 1e-12);

        record.assessment_change_ratio = 0.9;
        record.years_since_transfer = 30.0;
        assert_eq!(assessment_shock(&record, &config).value, 0.15);
    }

    #[test]
    fn market_pressure_switches_path_on_sale_price() {
        let config = EnhancedConfig::default();
        let mut record = features();
        record.assessment = 900_000.0;
        record.sale_price = 250_000.0;
        assert_eq!(market_pressure(&record, &config).value, 0.12);

        record.sale_price = 0.0;
        record.years_since_transfer = 18.0;
        assert!((market_pressure(&record, &config).value - 0.08).abs() < 1e-12);
    }

    #[test]
    fn payment_recency_falls_back_to_balance() {
        let config = EnhancedConfig::default();
        let mut record = features();
        record.days_since_payment = Some(400);
        assert_eq!(payment_recency(&record, &config).value, 0.07);

        record.days_since_payment = None;
        record.total_balance = 30_000.0;
        assert_eq!(payment_recency(&record, &config).value, 0.08);

        record.total_balance = 0.0;
        assert_eq!(payment_recency(&record, &config).value, 0.0);
    }

    #[test]
    fn tax_sale_history_is_monotonic_in_flag_count() {
        let config = EnhancedConfig::default();
        let mut record = features();
        let mut previous = 0.0;
        for count in 0..=5 {
            record.tax_sale_count = count;
            let value = tax_sale_history(&record, &config).value;
            assert!(value >= previous);
            assert!(value <= config.tax_sale_cap);
            previous = value;
        }
        assert_eq!(previous, 0.15);
    }

    #[test]
    fn homestead_is_the_only_negative_factor() {
        let config = EnhancedConfig::default();
        let mut record = features();
        record.homestead_code = "5".to_string();
        assert_eq!(homestead_protection(&record, &config).value, -0.08);
        record.homestead_code = "9".to_string();
        assert_eq!(homestead_protection(&record, &config).value, 0.0);
    }

    #[test]
    fn mixed_use_is_gated_and_amplified_by_class() {
        let config = EnhancedConfig::default();
        let mut record = features();
        record.tax_class = Some(2);
        assert_eq!(mixed_use(&record, &config).value, 0.0);

        record.mixed_use = true;
        assert!((mixed_use(&record, &config).value - 0.06).abs() < 1e-12);
        record.tax_class = Some(3);
        assert_eq!(mixed_use(&record, &config).value, 0.08);
    }

    #[test]
    fn multipliers_use_ward_type_and_season() {
        let model = EnhancedModel::new(EnhancedConfig::default());
        let mut record = features();
        record.ward = Some("8".to_string());
        let multipliers = model.multipliers(&record, &context());
        assert_eq!(multipliers.geographic, 1.30);
        assert_eq!(multipliers.property_type, 1.05);
        assert_eq!(multipliers.seasonal, 1.05);

        record.ward = Some("12".to_string());
        let winter = RunContext::new(NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"));
        let multipliers = model.multipliers(&record, &winter);
        assert_eq!(multipliers.geographic, 1.0);
        assert_eq!(multipliers.seasonal, 0.95);
    }

    #[test]
    fn every_contribution_stays_within_its_cap() {
        let model = EnhancedModel::new(EnhancedConfig::default());
        let mut record = features();
        record.ownership.estate = true;
        record.ownership.trust = true;
        record.debt_ratio = 3.0;
        record.total_balance = 1_000_000.0;
        record.assessment = 5_000_000.0;
        record.assessment_change_ratio = 4.0;
        record.years_since_transfer = 40.0;
        record.tax_sale_count = 5;
        record.homestead_code = "5".to_string();
        record.vacant = true;
        record.mixed_use = true;
        record.tax_class = Some(4);

        let outcome = model.score(&record, &context());
        for contribution in outcome.contributions.iter() {
            assert!(
                contribution.value.abs() <= contribution.cap + 1e-12,
                "{:?} exceeded its cap",
                contribution.factor
            );
        }
        assert!(model.bounds().contains(outcome.probability));
        assert_eq!(outcome.confidence, Some(Confidence::High));
    }

    #[test]
    fn long_held_estate_in_high_pressure_ward_is_very_high() {
        let model = EnhancedModel::new(EnhancedConfig::default());
        let mut record = features();
        record.assessment = 100_000.0;
        record.total_balance = 20_000.0;
        record.debt_ratio = 0.20;
        record.years_since_transfer = 22.0;
        record.ownership.estate = true;
        record.ward = Some("8".to_string());
        record.property_category = PropertyCategory::Other;

        let outcome = model.score(&record, &context());

        let additive = 0.10 + 4.0 / 7.0 * 0.30 + 0.15 + 0.08 + 0.05;
        assert!((outcome.raw_score - additive).abs() < 1e-9);
        assert!((outcome.probability - additive * 1.30 * 1.05).abs() < 1e-9);
        assert!(outcome.category >= RiskCategory::VeryHigh);
        assert_eq!(outcome.confidence, Some(Confidence::High));
    }
}
