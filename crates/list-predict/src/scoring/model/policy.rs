use super::super::ladder::ThresholdLadder;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Discrete risk band; declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
    ExtremelyHigh,
}

static CATEGORY_LADDER: OnceLock<ThresholdLadder<RiskCategory>> = OnceLock::new();

fn category_ladder() -> &'static ThresholdLadder<RiskCategory> {
    CATEGORY_LADDER.get_or_init(|| {
        ThresholdLadder::at_least(
            &[
                (0.80, RiskCategory::ExtremelyHigh),
                (0.60, RiskCategory::VeryHigh),
                (0.40, RiskCategory::High),
                (0.20, RiskCategory::Moderate),
            ],
            RiskCategory::Low,
        )
    })
}

impl RiskCategory {
    /// Highest band first, as reports list them.
    pub const fn ordered() -> [Self; 5] {
        [
            Self::ExtremelyHigh,
            Self::VeryHigh,
            Self::High,
            Self::Moderate,
            Self::Low,
        ]
    }

    pub fn from_probability(probability: f64) -> Self {
        category_ladder().resolve(probability)
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "extremely high" => Some(Self::ExtremelyHigh),
            "very high" => Some(Self::VeryHigh),
            "high" => Some(Self::High),
            "moderate" => Some(Self::Moderate),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ExtremelyHigh => "Extremely High",
            Self::VeryHigh => "Very High",
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

/// Policy label marking probabilities in an extreme band.
///
/// This is not a statistical confidence interval: it only says the estimate
/// sits far enough from the middle that small weight changes would not flip
/// the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
}

impl Confidence {
    pub const fn ordered() -> [Self; 2] {
        [Self::High, Self::Medium]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    pub high_at_or_above: f64,
    pub high_at_or_below: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            high_at_or_above: 0.70,
            high_at_or_below: 0.20,
        }
    }
}

impl ConfidencePolicy {
    pub fn label(&self, probability: f64) -> Confidence {
        if probability >= self.high_at_or_above || probability <= self.high_at_or_below {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_boundaries_are_inclusive_on_the_lower_end() {
        assert_eq!(RiskCategory::from_probability(0.80), RiskCategory::ExtremelyHigh);
        assert_eq!(RiskCategory::from_probability(0.7999), RiskCategory::VeryHigh);
        assert_eq!(RiskCategory::from_probability(0.60), RiskCategory::VeryHigh);
        assert_eq!(RiskCategory::from_probability(0.40), RiskCategory::High);
        assert_eq!(RiskCategory::from_probability(0.20), RiskCategory::Moderate);
        assert_eq!(RiskCategory::from_probability(0.1999), RiskCategory::Low);
    }

    #[test]
    fn category_is_monotone_in_probability() {
        let mut previous = RiskCategory::Low;
        for step in 0..=1000 {
            let category = RiskCategory::from_probability(step as f64 / 1000.0);
            assert!(category >= previous, "rank dropped at step {step}");
            previous = category;
        }
    }

    #[test]
    fn parse_accepts_labels_and_keys() {
        assert_eq!(RiskCategory::parse("Very High"), Some(RiskCategory::VeryHigh));
        assert_eq!(
            RiskCategory::parse("extremely_high"),
            Some(RiskCategory::ExtremelyHigh)
        );
        assert_eq!(RiskCategory::parse("severe"), None);
    }

    #[test]
    fn confidence_is_high_only_in_extreme_bands() {
        let policy = ConfidencePolicy::default();
        assert_eq!(policy.label(0.85), Confidence::High);
        assert_eq!(policy.label(0.15), Confidence::High);
        assert_eq!(policy.label(0.45), Confidence::Medium);
    }
}
