use super::factors::FactorContributions;
use super::features::{FeatureSet, OwnershipFlags, PropertyCategory};
use super::model::{Multipliers, RiskCategory, ScoreOutcome};
use super::{PropertyIdentity, RunContext, ScoredRecord};
use chrono::NaiveDate;

pub(crate) fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 15).expect("valid reference date")
}

pub(crate) fn context() -> RunContext {
    RunContext::new(reference_date())
}

/// A quiet, owner-occupied residential record; tests flip individual signals.
pub(crate) fn features() -> FeatureSet {
    FeatureSet {
        ownership: OwnershipFlags::default(),
        years_since_transfer: 8.0,
        transfer_date_known: true,
        assessment: 500_000.0,
        total_balance: 0.0,
        debt_ratio: 0.0,
        assessment_change_ratio: 0.0,
        prior_year_balance_count: 0,
        has_penalty_or_interest: false,
        sale_price: 0.0,
        days_since_payment: None,
        tax_sale_count: 0,
        homestead_code: String::new(),
        vacant: false,
        mixed_use: false,
        tax_class: None,
        ward: None,
        zip_code: None,
        property_category: PropertyCategory::Residential,
        absentee_owner: false,
        out_of_jurisdiction: false,
        government_owned: false,
        building_age: None,
    }
}

/// A scored record carrying only an identifier and a probability.
pub(crate) fn scored(ssl: &str, probability: f64) -> ScoredRecord {
    ScoredRecord {
        identity: PropertyIdentity {
            ssl: ssl.to_string(),
            ..PropertyIdentity::default()
        },
        features: features(),
        outcome: ScoreOutcome {
            probability,
            raw_score: probability,
            category: RiskCategory::from_probability(probability),
            confidence: None,
            multipliers: Multipliers::neutral(),
            contributions: FactorContributions::new(),
        },
    }
}
