use crate::scoring::{
    Confidence, ModelVariant, RiskCategory, Tier, TierThresholds, TieredRecord,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: RiskCategory,
    pub category_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceCount {
    pub confidence: Confidence,
    pub confidence_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierCount {
    pub tier: Tier,
    pub tier_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub model: ModelVariant,
    pub model_label: &'static str,
    pub reference_date: NaiveDate,
    pub total: usize,
    pub excluded: usize,
    pub risk_categories: Vec<CategoryCount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub confidence: Vec<ConfidenceCount>,
    pub tiers: Vec<TierCount>,
    pub high_opportunity: usize,
    pub average_probability: f64,
    pub average_debt_ratio: f64,
    pub median_assessment: f64,
    pub average_years_since_transfer: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<TierThresholds>,
}

impl BatchSummary {
    pub fn tier_count(&self, tier: Tier) -> usize {
        self.tiers
            .iter()
            .find(|entry| entry.tier == tier)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}

/// Flat, rounded row for the static export and the dashboard API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionExport {
    pub rank: usize,
    pub ssl: String,
    pub premise_address: String,
    pub owner_name: String,
    pub mailing_line_1: String,
    pub mailing_line_2: String,
    pub city_state_zip: String,
    pub ward: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    pub property_type: String,
    pub listing_probability: f64,
    pub risk_category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<&'static str>,
    pub tier: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_score: Option<f64>,
    pub assessment: i64,
    pub total_balance: f64,
    pub years_since_transfer: f64,
    pub debt_ratio: f64,
    pub factors: BTreeMap<&'static str, f64>,
    pub is_corporate: bool,
    pub is_trust: bool,
    pub is_estate: bool,
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

impl PredictionExport {
    /// `rank` is 1-based batch position.
    pub fn from_tiered(rank: usize, tiered: &TieredRecord) -> Self {
        let record = tiered.record();
        let identity = &record.identity;
        let features = &record.features;
        let outcome = &record.outcome;

        Self {
            rank,
            ssl: identity.ssl.clone(),
            premise_address: identity.premise_address.clone(),
            owner_name: identity.owner_name.clone(),
            mailing_line_1: identity.mailing_line_1.clone(),
            mailing_line_2: identity.mailing_line_2.clone(),
            city_state_zip: identity.city_state_zip.clone(),
            ward: identity.ward.clone(),
            zip_code: features.zip_code.clone(),
            property_type: identity.property_type.clone(),
            listing_probability: round_to(outcome.probability, 3),
            risk_category: outcome.category.label(),
            confidence: outcome.confidence.map(Confidence::label),
            tier: tiered.tier().label(),
            lead_score: tiered.lead_score().map(|score| round_to(score, 2)),
            assessment: features.assessment.round() as i64,
            total_balance: round_to(features.total_balance, 2),
            years_since_transfer: round_to(features.years_since_transfer, 1),
            debt_ratio: round_to(features.debt_ratio, 4),
            factors: outcome
                .contributions
                .iter()
                .map(|entry| (entry.factor.key(), round_to(entry.value, 3)))
                .collect(),
            is_corporate: features.ownership.corporate,
            is_trust: features.ownership.trust,
            is_estate: features.ownership.estate,
        }
    }
}
