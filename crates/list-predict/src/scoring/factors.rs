use serde::{Deserialize, Serialize};

/// Scoring dimensions across every model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    FinancialPressure,
    OwnershipComplexity,
    AssessmentShock,
    MarketPressure,
    TaxSaleHistory,
    PaymentRecency,
    HomesteadProtection,
    Vacancy,
    MixedUse,
    HoldingPeriod,
    DebtLoad,
    Lien,
    LongTermOwnership,
    EntityOwnership,
    AssessmentChange,
    BuildingAge,
}

impl FactorKind {
    pub const fn key(self) -> &'static str {
        match self {
            Self::FinancialPressure => "financial_pressure",
            Self::OwnershipComplexity => "ownership_complexity",
            Self::AssessmentShock => "assessment_shock",
            Self::MarketPressure => "market_pressure",
            Self::TaxSaleHistory => "tax_sale_history",
            Self::PaymentRecency => "payment_recency",
            Self::HomesteadProtection => "homestead_protection",
            Self::Vacancy => "vacancy",
            Self::MixedUse => "mixed_use",
            Self::HoldingPeriod => "holding_period",
            Self::DebtLoad => "debt_load",
            Self::Lien => "lien",
            Self::LongTermOwnership => "long_term_ownership",
            Self::EntityOwnership => "entity_ownership",
            Self::AssessmentChange => "assessment_change",
            Self::BuildingAge => "building_age",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FinancialPressure => "Financial Pressure",
            Self::OwnershipComplexity => "Ownership Complexity",
            Self::AssessmentShock => "Assessment Shock",
            Self::MarketPressure => "Market Pressure",
            Self::TaxSaleHistory => "Tax Sale History",
            Self::PaymentRecency => "Payment Recency",
            Self::HomesteadProtection => "Homestead Protection",
            Self::Vacancy => "Vacancy",
            Self::MixedUse => "Mixed-Use Complexity",
            Self::HoldingPeriod => "Holding Period",
            Self::DebtLoad => "Debt Load",
            Self::Lien => "Outstanding Lien",
            Self::LongTermOwnership => "Long-Term Ownership",
            Self::EntityOwnership => "Entity Ownership",
            Self::AssessmentChange => "Assessment Change",
            Self::BuildingAge => "Building Age",
        }
    }

    /// Only homestead protection may pull a score down.
    pub const fn allows_negative(self) -> bool {
        matches!(self, Self::HomesteadProtection)
    }
}

/// One capped addend to the composite probability, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub factor: FactorKind,
    pub value: f64,
    pub cap: f64,
    pub notes: String,
}

impl FactorContribution {
    pub fn capped(factor: FactorKind, raw: f64, cap: f64, notes: impl Into<String>) -> Self {
        let cap = cap.abs();
        let value = if !raw.is_finite() {
            0.0
        } else if factor.allows_negative() {
            raw.clamp(-cap, 0.0)
        } else {
            raw.clamp(0.0, cap)
        };

        Self {
            factor,
            value,
            cap,
            notes: notes.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FactorContributions {
    entries: Vec<FactorContribution>,
}

impl FactorContributions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, contribution: FactorContribution) {
        self.entries.push(contribution);
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.value).sum()
    }

    pub fn get(&self, factor: FactorKind) -> Option<&FactorContribution> {
        self.entries.iter().find(|entry| entry.factor == factor)
    }

    pub fn value(&self, factor: FactorKind) -> f64 {
        self.get(factor).map(|entry| entry.value).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FactorContribution> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<FactorContribution> for FactorContributions {
    fn from_iter<I: IntoIterator<Item = FactorContribution>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capping_respects_sign_rules() {
        let positive = FactorContribution::capped(FactorKind::Vacancy, 0.5, 0.08, "vacant");
        assert_eq!(positive.value, 0.08);

        let clipped = FactorContribution::capped(FactorKind::Vacancy, -0.2, 0.08, "");
        assert_eq!(clipped.value, 0.0);

        let homestead =
            FactorContribution::capped(FactorKind::HomesteadProtection, -0.5, 0.08, "");
        assert_eq!(homestead.value, -0.08);

        let invalid = FactorContribution::capped(FactorKind::Lien, f64::INFINITY, 0.375, "");
        assert_eq!(invalid.value, 0.0);
    }

    #[test]
    fn total_sums_entries() {
        let contributions: FactorContributions = [
            FactorContribution::capped(FactorKind::Vacancy, 0.08, 0.08, ""),
            FactorContribution::capped(FactorKind::HomesteadProtection, -0.05, 0.08, ""),
        ]
        .into_iter()
        .collect();
        assert!((contributions.total() - 0.03).abs() < 1e-12);
        assert_eq!(contributions.value(FactorKind::MixedUse), 0.0);
        assert_eq!(contributions.len(), 2);
    }
}
