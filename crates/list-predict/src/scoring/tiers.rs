//! Batch-relative tiering: the second pass over a fully scored batch.

use super::factors::FactorKind;
use super::model::ModelVariant;
use super::ScoredRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub const fn ordered() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Which score the percentile cut points are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBasis {
    Probability,
    LeadScore,
}

impl TierBasis {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Probability => "probability",
            Self::LeadScore => "lead score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub high_quantile: f64,
    pub medium_quantile: f64,
    /// Overrides the basis the model prefers.
    pub basis: Option<TierBasis>,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            high_quantile: 0.95,
            medium_quantile: 0.80,
            basis: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierThresholds {
    pub basis: TierBasis,
    pub high: f64,
    pub medium: f64,
}

impl TierThresholds {
    /// `None` for an empty batch.
    pub fn compute(scores: &[f64], config: &TierConfig, basis: TierBasis) -> Option<Self> {
        let mut sorted: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            basis,
            high: percentile(&sorted, config.high_quantile)?,
            medium: percentile(&sorted, config.medium_quantile)?,
        })
    }

    /// Ties go to the higher tier.
    pub fn classify(&self, score: f64) -> Tier {
        if score >= self.high {
            Tier::High
        } else if score >= self.medium {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}

/// Linear interpolation between closest ranks of an ascending slice.
pub fn percentile(sorted: &[f64], quantile: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = quantile.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Min-max rescale of raw scores onto 1..=10.
pub fn lead_scores(raw: &[f64]) -> Vec<f64> {
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = (max - min) + 0.0001;

    raw.iter()
        .map(|score| 1.0 + 9.0 * (score - min) / spread)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TieredRecord {
    record: ScoredRecord,
    tier: Tier,
    lead_score: Option<f64>,
}

impl TieredRecord {
    pub fn record(&self) -> &ScoredRecord {
        &self.record
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn lead_score(&self) -> Option<f64> {
        self.lead_score
    }

    pub fn probability(&self) -> f64 {
        self.record.outcome.probability
    }
}

/// Labels every record against thresholds computed over the whole batch.
///
/// Record order is preserved; thresholds depend only on the multiset of
/// scores, so any permutation of the same batch tiers identically.
pub fn assign_tiers(
    records: Vec<ScoredRecord>,
    basis: TierBasis,
    config: &TierConfig,
) -> (Vec<TieredRecord>, Option<TierThresholds>) {
    let lead = match basis {
        TierBasis::LeadScore => {
            let raw: Vec<f64> = records.iter().map(|r| r.outcome.raw_score).collect();
            Some(lead_scores(&raw))
        }
        TierBasis::Probability => None,
    };

    let scores: Vec<f64> = match &lead {
        Some(lead) => lead.clone(),
        None => records.iter().map(|r| r.outcome.probability).collect(),
    };

    let Some(thresholds) = TierThresholds::compute(&scores, config, basis) else {
        return (Vec::new(), None);
    };
    debug!(
        basis = basis.label(),
        high = thresholds.high,
        medium = thresholds.medium,
        "computed tier thresholds"
    );

    let tiered = records
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(index, (record, score))| TieredRecord {
            record,
            tier: thresholds.classify(score),
            lead_score: lead.as_ref().map(|lead| lead[index]),
        })
        .collect();

    (tiered, Some(thresholds))
}

/// Scored, sorted and tiered output of one run. Read-only once assembled.
#[derive(Debug, Clone)]
pub struct BatchResult {
    variant: ModelVariant,
    factor_kinds: &'static [FactorKind],
    reference_date: NaiveDate,
    excluded: usize,
    thresholds: Option<TierThresholds>,
    records: Vec<TieredRecord>,
}

impl BatchResult {
    /// Sorts descending by probability (stable) and tiers the batch.
    pub fn assemble(
        mut records: Vec<ScoredRecord>,
        variant: ModelVariant,
        factor_kinds: &'static [FactorKind],
        basis: TierBasis,
        config: &TierConfig,
        reference_date: NaiveDate,
        excluded: usize,
    ) -> Self {
        records.sort_by(|a, b| b.outcome.probability.total_cmp(&a.outcome.probability));
        let (records, thresholds) = assign_tiers(records, basis, config);

        Self {
            variant,
            factor_kinds,
            reference_date,
            excluded,
            thresholds,
            records,
        }
    }

    pub fn empty(
        variant: ModelVariant,
        factor_kinds: &'static [FactorKind],
        reference_date: NaiveDate,
    ) -> Self {
        Self {
            variant,
            factor_kinds,
            reference_date,
            excluded: 0,
            thresholds: None,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[TieredRecord] {
        &self.records
    }

    pub fn thresholds(&self) -> Option<&TierThresholds> {
        self.thresholds.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn factor_kinds(&self) -> &'static [FactorKind] {
        self.factor_kinds
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Records dropped before scoring (blank rows, excluded owners).
    pub fn excluded(&self) -> usize {
        self.excluded
    }
}
