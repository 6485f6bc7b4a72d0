use super::views::PredictionExport;
use crate::scoring::features::normalize_ward;
use crate::scoring::{BatchResult, PropertyCategory, RiskCategory, TieredRecord};
use serde::{Deserialize, Serialize};

/// Dashboard selection. Empty sets match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ViewFilter {
    #[serde(default)]
    pub wards: Vec<String>,
    #[serde(default)]
    pub zip_codes: Vec<String>,
    #[serde(default)]
    pub categories: Vec<PropertyCategory>,
    #[serde(default)]
    pub risk_categories: Vec<RiskCategory>,
    #[serde(default)]
    pub liens_only: bool,
    pub limit: Option<usize>,
}

impl ViewFilter {
    pub fn matches(&self, tiered: &TieredRecord) -> bool {
        let record = tiered.record();
        let features = &record.features;

        let ward_ok = self.wards.is_empty()
            || features.ward.as_deref().is_some_and(|ward| {
                self.wards
                    .iter()
                    .filter_map(|wanted| normalize_ward(wanted))
                    .any(|wanted| wanted == ward)
            });
        let zip_ok = self.zip_codes.is_empty()
            || features.zip_code.as_deref().is_some_and(|zip| {
                self.zip_codes.iter().any(|wanted| wanted.trim() == zip)
            });
        let category_ok =
            self.categories.is_empty() || self.categories.contains(&features.property_category);
        let risk_ok = self.risk_categories.is_empty()
            || self.risk_categories.contains(&record.outcome.category);
        let lien_ok = !self.liens_only || features.has_lien();

        ward_ok && zip_ok && category_ok && risk_ok && lien_ok
    }

    /// Filters in batch order. Tiers stay as computed over the whole batch.
    pub fn apply(&self, batch: &BatchResult) -> DashboardView {
        let matching: Vec<PredictionExport> = batch
            .records()
            .iter()
            .enumerate()
            .filter(|(_, tiered)| self.matches(tiered))
            .map(|(index, tiered)| PredictionExport::from_tiered(index + 1, tiered))
            .collect();

        let total_matching = matching.len();
        let records = match self.limit {
            Some(limit) => matching.into_iter().take(limit).collect(),
            None => matching,
        };

        DashboardView {
            total_matching,
            records,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub total_matching: usize,
    pub records: Vec<PredictionExport>,
}
