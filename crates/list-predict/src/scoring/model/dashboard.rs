use super::super::factors::{FactorContribution, FactorContributions, FactorKind};
use super::super::features::{FeatureSet, OwnershipPolicy};
use super::super::tiers::TierBasis;
use super::{ModelVariant, ProbabilityBounds, ScoreModel};
use serde::{Deserialize, Serialize};

const FACTORS: [FactorKind; 5] = [
    FactorKind::Lien,
    FactorKind::LongTermOwnership,
    FactorKind::EntityOwnership,
    FactorKind::AssessmentChange,
    FactorKind::BuildingAge,
];

/// Flat point table of the dashboard lead score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub bounds: ProbabilityBounds,
    pub ownership_policy: OwnershipPolicy,
    pub lien_points: f64,
    pub long_term_years: f64,
    pub long_term_points: f64,
    pub entity_points: f64,
    pub assessment_change_ratio: f64,
    pub assessment_change_points: f64,
    pub building_age_years: i32,
    pub building_age_points: f64,
    /// Divisor turning points into a probability slice.
    pub point_scale: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bounds: ProbabilityBounds::new(0.05, 0.95),
            ownership_policy: OwnershipPolicy::Exclusive,
            lien_points: 3.0,
            long_term_years: 20.0,
            long_term_points: 2.0,
            entity_points: 1.0,
            assessment_change_ratio: 0.25,
            assessment_change_points: 1.0,
            building_age_years: 75,
            building_age_points: 1.0,
            point_scale: 8.0,
        }
    }
}

impl DashboardConfig {
    fn award(&self, factor: FactorKind, hit: bool, points: f64, notes: String) -> FactorContribution {
        let cap = if self.point_scale > 0.0 {
            points / self.point_scale
        } else {
            0.0
        };
        FactorContribution::capped(factor, if hit { cap } else { 0.0 }, cap, notes)
    }
}

pub fn lien(features: &FeatureSet, config: &DashboardConfig) -> FactorContribution {
    config.award(
        FactorKind::Lien,
        features.has_lien(),
        config.lien_points,
        format!("balance ${:.0}", features.total_balance),
    )
}

pub fn long_term_ownership(features: &FeatureSet, config: &DashboardConfig) -> FactorContribution {
    config.award(
        FactorKind::LongTermOwnership,
        features.transfer_date_known && features.years_since_transfer > config.long_term_years,
        config.long_term_points,
        if features.transfer_date_known {
            format!("{:.1} years held", features.years_since_transfer)
        } else {
            "transfer date unknown".to_string()
        },
    )
}

pub fn entity_ownership(features: &FeatureSet, config: &DashboardConfig) -> FactorContribution {
    let structure = features
        .ownership
        .primary()
        .map(|kind| kind.label())
        .unwrap_or("Individual");
    config.award(
        FactorKind::EntityOwnership,
        features.ownership.is_entity(),
        config.entity_points,
        structure.to_string(),
    )
}

pub fn assessment_change(features: &FeatureSet, config: &DashboardConfig) -> FactorContribution {
    config.award(
        FactorKind::AssessmentChange,
        features.assessment_change_ratio > config.assessment_change_ratio,
        config.assessment_change_points,
        format!(
            "assessment up {:.0}%",
            features.assessment_change_ratio * 100.0
        ),
    )
}

pub fn building_age(features: &FeatureSet, config: &DashboardConfig) -> FactorContribution {
    let notes = match features.building_age {
        Some(age) => format!("built {age} years ago"),
        None => "year built unknown".to_string(),
    };
    config.award(
        FactorKind::BuildingAge,
        features
            .building_age
            .is_some_and(|age| age > config.building_age_years),
        config.building_age_points,
        notes,
    )
}

/// Point model whose tiers are cut on the batch-relative lead score.
#[derive(Debug, Clone)]
pub struct DashboardModel {
    config: DashboardConfig,
}

impl DashboardModel {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
}

impl ScoreModel for DashboardModel {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Dashboard
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
        let config = &self.config;
        [
            lien(features, config),
            long_term_ownership(features, config),
            entity_ownership(features, config),
            assessment_change(features, config),
            building_age(features, config),
        ]
        .into_iter()
        .collect()
    }

    fn tier_basis(&self) -> TierBasis {
        TierBasis::LeadScore
    }
}
