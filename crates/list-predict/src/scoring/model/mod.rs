//! Composite risk model and its interchangeable scoring strategies.

mod basic;
mod dashboard;
mod enhanced;
mod policy;

pub use basic::{BasicConfig, BasicModel};
pub use dashboard::{DashboardConfig, DashboardModel};
pub use enhanced::{EnhancedConfig, EnhancedModel};
pub use policy::{Confidence, ConfidencePolicy, RiskCategory};

use super::factors::{FactorContributions, FactorKind};
use super::features::{FeatureSet, OwnershipFlags, OwnershipKind, OwnershipPolicy};
use super::tiers::TierBasis;
use super::RunContext;
use serde::{Deserialize, Serialize};

/// Selectable scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    Basic,
    Enhanced,
    Dashboard,
}

impl ModelVariant {
    pub const fn ordered() -> [Self; 3] {
        [Self::Basic, Self::Enhanced, Self::Dashboard]
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "enhanced" | "multi-factor" | "multi_factor" => Some(Self::Enhanced),
            "dashboard" | "relative" | "lead" => Some(Self::Dashboard),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Enhanced => "enhanced",
            Self::Dashboard => "dashboard",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic weighted model",
            Self::Enhanced => "Multi-factor model",
            Self::Dashboard => "Dashboard lead score",
        }
    }

    /// Builds the model with its default constants, optionally overriding
    /// how ownership is classified.
    pub fn build(self, ownership_policy: Option<OwnershipPolicy>) -> Box<dyn ScoreModel> {
        match self {
            Self::Basic => {
                let mut config = BasicConfig::default();
                if let Some(policy) = ownership_policy {
                    config.ownership_policy = policy;
                }
                Box::new(BasicModel::new(config))
            }
            Self::Enhanced => {
                let mut config = EnhancedConfig::default();
                if let Some(policy) = ownership_policy {
                    config.ownership_policy = policy;
                }
                Box::new(EnhancedModel::new(config))
            }
            Self::Dashboard => {
                let mut config = DashboardConfig::default();
                if let Some(policy) = ownership_policy {
                    config.ownership_policy = policy;
                }
                Box::new(DashboardModel::new(config))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ProbabilityBounds {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.lower
        } else {
            value.clamp(self.lower, self.upper)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Per-kind ownership weights, summed over the matched kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OwnershipWeights {
    pub estate: f64,
    pub trust: f64,
    pub partnership: f64,
    pub corporate: f64,
    pub multiple_owners: f64,
}

impl OwnershipWeights {
    pub fn weight(&self, kind: OwnershipKind) -> f64 {
        match kind {
            OwnershipKind::Estate => self.estate,
            OwnershipKind::Trust => self.trust,
            OwnershipKind::Partnership => self.partnership,
            OwnershipKind::Corporate => self.corporate,
            OwnershipKind::MultipleOwners => self.multiple_owners,
        }
    }

    pub fn total(&self, flags: &OwnershipFlags) -> f64 {
        flags.kinds().map(|kind| self.weight(kind)).sum()
    }
}

/// Compounding adjustments applied after the additive factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Multipliers {
    pub geographic: f64,
    pub property_type: f64,
    pub seasonal: f64,
}

impl Multipliers {
    pub const fn neutral() -> Self {
        Self {
            geographic: 1.0,
            property_type: 1.0,
            seasonal: 1.0,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.geographic * self.property_type * self.seasonal
    }
}

impl Default for Multipliers {
    fn default() -> Self {
        Self::neutral()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub probability: f64,
    /// Base plus factor sum, before multipliers and clamping.
    pub raw_score: f64,
    pub category: RiskCategory,
    pub confidence: Option<Confidence>,
    pub multipliers: Multipliers,
    pub contributions: FactorContributions,
}

/// Sums contributions onto the base, compounds the multipliers and clamps.
pub fn composite(
    base_probability: f64,
    contributions: &FactorContributions,
    multipliers: &Multipliers,
    bounds: ProbabilityBounds,
) -> (f64, RiskCategory) {
    let adjusted = multipliers.apply(base_probability + contributions.total());
    let probability = bounds.clamp(adjusted);
    (probability, RiskCategory::from_probability(probability))
}

/// Shared capability of every scoring strategy.
pub trait ScoreModel: Send + Sync {
    fn variant(&self) -> ModelVariant;

    fn bounds(&self) -> ProbabilityBounds;

    fn base_probability(&self) -> f64;

    fn ownership_policy(&self) -> OwnershipPolicy;

    /// Factors this model emits, in output order.
    fn factor_kinds(&self) -> &'static [FactorKind];

    fn contributions(&self, features: &FeatureSet) -> FactorContributions;

    fn multipliers(&self, _features: &FeatureSet, _context: &RunContext) -> Multipliers {
        Multipliers::neutral()
    }

    fn confidence(&self, _probability: f64) -> Option<Confidence> {
        None
    }

    fn tier_basis(&self) -> TierBasis {
        TierBasis::Probability
    }

    fn score(&self, features: &FeatureSet, context: &RunContext) -> ScoreOutcome {
        let contributions = self.contributions(features);
        let multipliers = self.multipliers(features, context);
        let (probability, category) = composite(
            self.base_probability(),
            &contributions,
            &multipliers,
            self.bounds(),
        );

        ScoreOutcome {
            probability,
            raw_score: self.base_probability() + contributions.total(),
            category,
            confidence: self.confidence(probability),
            multipliers,
            contributions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::factors::FactorContribution;
    use super::*;

    #[test]
    fn composite_compounds_multipliers_then_clamps() {
        let contributions: FactorContributions = [FactorContribution::capped(
            FactorKind::FinancialPressure,
            0.30,
            0.30,
            "",
        )]
        .into_iter()
        .collect();
        let multipliers = Multipliers {
            geographic: 1.3,
            property_type: 1.05,
            seasonal: 1.0,
        };
        let bounds = ProbabilityBounds::new(0.10, 0.95);

        let (probability, category) = composite(0.10, &contributions, &multipliers, bounds);
        assert!((probability - 0.4 * 1.3 * 1.05).abs() < 1e-12);
        assert_eq!(category, RiskCategory::High);

        let heavy = Multipliers {
            geographic: 5.0,
            ..Multipliers::neutral()
        };
        let (probability, category) = composite(0.10, &contributions, &heavy, bounds);
        assert_eq!(probability, 0.95);
        assert_eq!(category, RiskCategory::ExtremelyHigh);

        let (probability, _) = composite(
            0.0,
            &FactorContributions::new(),
            &Multipliers::neutral(),
            bounds,
        );
        assert_eq!(probability, 0.10);
    }

    #[test]
    fn variants_parse_from_config_strings() {
        assert_eq!(ModelVariant::parse("Enhanced"), Some(ModelVariant::Enhanced));
        assert_eq!(ModelVariant::parse("relative"), Some(ModelVariant::Dashboard));
        assert_eq!(ModelVariant::parse("neural"), None);
        for variant in ModelVariant::ordered() {
            assert_eq!(ModelVariant::parse(variant.key()), Some(variant));
            assert_eq!(variant.build(None).variant(), variant);
        }
    }

    #[test]
    fn build_applies_ownership_override() {
        let model = ModelVariant::Basic.build(Some(OwnershipPolicy::Additive));
        assert_eq!(model.ownership_policy(), OwnershipPolicy::Additive);
        let model = ModelVariant::Enhanced.build(None);
        assert_eq!(model.ownership_policy(), OwnershipPolicy::Additive);
    }
}
