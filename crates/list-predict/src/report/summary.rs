use super::views::{BatchSummary, CategoryCount, ConfidenceCount, TierCount};
use crate::scoring::tiers::percentile;
use crate::scoring::{BatchResult, Confidence, RiskCategory, Tier};
use std::collections::HashMap;

/// Probability at or above which a property counts as a high opportunity.
pub const HIGH_OPPORTUNITY: f64 = 0.60;

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

impl BatchSummary {
    pub fn from_batch(batch: &BatchResult) -> Self {
        let records = batch.records();

        let mut categories: HashMap<RiskCategory, usize> = HashMap::new();
        let mut confidence: HashMap<Confidence, usize> = HashMap::new();
        let mut tiers: HashMap<Tier, usize> = HashMap::new();
        for tiered in records {
            let outcome = &tiered.record().outcome;
            *categories.entry(outcome.category).or_default() += 1;
            if let Some(label) = outcome.confidence {
                *confidence.entry(label).or_default() += 1;
            }
            *tiers.entry(tiered.tier()).or_default() += 1;
        }

        let risk_categories = RiskCategory::ordered()
            .into_iter()
            .map(|category| CategoryCount {
                category,
                category_label: category.label(),
                count: categories.get(&category).copied().unwrap_or(0),
            })
            .collect();

        // models without a confidence policy report no confidence rows
        let confidence = if confidence.is_empty() {
            Vec::new()
        } else {
            Confidence::ordered()
                .into_iter()
                .map(|label| ConfidenceCount {
                    confidence: label,
                    confidence_label: label.label(),
                    count: confidence.get(&label).copied().unwrap_or(0),
                })
                .collect()
        };

        let tiers = Tier::ordered()
            .into_iter()
            .map(|tier| TierCount {
                tier,
                tier_label: tier.label(),
                count: tiers.get(&tier).copied().unwrap_or(0),
            })
            .collect();

        let mut assessments: Vec<f64> = records
            .iter()
            .map(|tiered| tiered.record().features.assessment)
            .collect();
        assessments.sort_by(f64::total_cmp);

        BatchSummary {
            model: batch.variant(),
            model_label: batch.variant().label(),
            reference_date: batch.reference_date(),
            total: records.len(),
            excluded: batch.excluded(),
            risk_categories,
            confidence,
            tiers,
            high_opportunity: records
                .iter()
                .filter(|tiered| tiered.probability() >= HIGH_OPPORTUNITY)
                .count(),
            average_probability: mean(records.iter().map(|tiered| tiered.probability())),
            average_debt_ratio: mean(
                records
                    .iter()
                    .map(|tiered| tiered.record().features.debt_ratio),
            ),
            median_assessment: percentile(&assessments, 0.5).unwrap_or(0.0),
            average_years_since_transfer: mean(
                records
                    .iter()
                    .map(|tiered| tiered.record().features.years_since_transfer),
            ),
            thresholds: batch.thresholds().copied(),
        }
    }
}
