//! Listing-probability scoring pipeline.
//!
//! Pass one runs per record and in parallel: normalize, extract features,
//! score factors, combine. Pass two needs the whole batch: sort, compute
//! percentile thresholds and assign tiers.

pub mod factors;
pub mod features;
pub mod ladder;
pub mod model;
pub mod normalizer;
pub mod record;
pub mod tiers;

#[cfg(test)]
pub(crate) mod test_support;

pub use factors::{FactorContribution, FactorContributions, FactorKind};
pub use features::{
    ExtractionConfig, FeatureSet, OwnershipFlags, OwnershipKind, OwnershipPolicy,
    PropertyCategory,
};
pub use model::{
    Confidence, ModelVariant, Multipliers, ProbabilityBounds, RiskCategory, ScoreModel,
    ScoreOutcome,
};
pub use normalizer::NormalizedFields;
pub use record::{RawRecord, RawValue};
pub use tiers::{BatchResult, Tier, TierBasis, TierConfig, TierThresholds, TieredRecord};

use chrono::{Local, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Reference "now" of one run, captured once and threaded through extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub reference_date: NaiveDate,
}

impl RunContext {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }
}

/// Descriptive columns carried through to exports untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyIdentity {
    pub ssl: String,
    pub premise_address: String,
    pub owner_name: String,
    pub mailing_line_1: String,
    pub mailing_line_2: String,
    pub city_state_zip: String,
    pub ward: String,
    pub property_type: String,
}

impl PropertyIdentity {
    pub fn from_fields(fields: &NormalizedFields) -> Self {
        let property_type = if fields.property_type.is_empty() {
            "Unknown".to_string()
        } else {
            fields.property_type.clone()
        };

        Self {
            ssl: fields.ssl.clone(),
            premise_address: fields.premise_address.clone(),
            owner_name: fields.owner_name.clone(),
            mailing_line_1: fields.mailing_line_1.clone(),
            mailing_line_2: fields.mailing_line_2.clone(),
            city_state_zip: fields.city_state_zip.clone(),
            ward: fields.ward.clone(),
            property_type,
        }
    }
}

/// One property after pass one. Never mutated by tiering.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub identity: PropertyIdentity,
    pub features: FeatureSet,
    pub outcome: ScoreOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub model: ModelVariant,
    /// Replaces the model's own ownership policy when set.
    pub ownership_policy: Option<OwnershipPolicy>,
    pub unknown_transfer_years: f64,
    pub home_jurisdiction: String,
    pub exclude_government_owners: bool,
    pub tiers: TierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let extraction = ExtractionConfig::default();
        Self {
            model: ModelVariant::Enhanced,
            ownership_policy: None,
            unknown_transfer_years: extraction.unknown_transfer_years,
            home_jurisdiction: extraction.home_jurisdiction,
            exclude_government_owners: false,
            tiers: TierConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn for_model(model: ModelVariant) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }
}

pub struct ScoringPipeline {
    model: Box<dyn ScoreModel>,
    extraction: ExtractionConfig,
    exclude_government_owners: bool,
    tiers: TierConfig,
}

impl ScoringPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let model = config.model.build(config.ownership_policy);
        Self::with_model(model, config)
    }

    /// Runs a caller-built model; `config.model` and its ownership override
    /// are ignored.
    pub fn with_model(model: Box<dyn ScoreModel>, config: PipelineConfig) -> Self {
        let extraction = ExtractionConfig {
            ownership_policy: model.ownership_policy(),
            unknown_transfer_years: config.unknown_transfer_years,
            home_jurisdiction: config.home_jurisdiction,
        };

        Self {
            model,
            extraction,
            exclude_government_owners: config.exclude_government_owners,
            tiers: config.tiers,
        }
    }

    pub fn model(&self) -> &dyn ScoreModel {
        self.model.as_ref()
    }

    pub fn tier_basis(&self) -> TierBasis {
        self.tiers.basis.unwrap_or_else(|| self.model.tier_basis())
    }

    /// Scores normalized fields. Never fails; bad input scores on defaults.
    pub fn score_fields(&self, fields: &NormalizedFields, context: &RunContext) -> ScoredRecord {
        let features = features::extract(fields, &self.extraction, context);
        let outcome = self.model.score(&features, context);

        ScoredRecord {
            identity: PropertyIdentity::from_fields(fields),
            features,
            outcome,
        }
    }

    /// `None` when the row is blank or excluded by owner.
    pub fn score_record(&self, raw: &RawRecord, context: &RunContext) -> Option<ScoredRecord> {
        let fields = NormalizedFields::from_raw(raw);
        if fields.is_blank() {
            return None;
        }

        let record = self.score_fields(&fields, context);
        if self.exclude_government_owners && record.features.government_owned {
            debug!(ssl = %record.identity.ssl, "excluding government-owned property");
            return None;
        }

        Some(record)
    }

    pub fn run(&self, records: &[RawRecord], context: &RunContext) -> BatchResult {
        let scored: Vec<ScoredRecord> = records
            .par_iter()
            .filter_map(|raw| self.score_record(raw, context))
            .collect();
        let excluded = records.len() - scored.len();

        info!(
            model = self.model.variant().key(),
            input = records.len(),
            scored = scored.len(),
            excluded,
            reference_date = %context.reference_date,
            "scored batch"
        );

        BatchResult::assemble(
            scored,
            self.model.variant(),
            self.model.factor_kinds(),
            self.tier_basis(),
            &self.tiers,
            context.reference_date,
            excluded,
        )
    }

    pub fn empty_batch(&self, context: &RunContext) -> BatchResult {
        BatchResult::empty(
            self.model.variant(),
            self.model.factor_kinds(),
            context.reference_date,
        )
    }
}
