use super::normalizer::{is_truthy, NormalizedFields};
use super::RunContext;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Ownership structures recognised from the owner name, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipKind {
    Estate,
    Trust,
    Partnership,
    Corporate,
    MultipleOwners,
}

impl OwnershipKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Estate,
            Self::Trust,
            Self::Partnership,
            Self::Corporate,
            Self::MultipleOwners,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Estate => "Estate",
            Self::Trust => "Trust",
            Self::Partnership => "Partnership",
            Self::Corporate => "Corporate",
            Self::MultipleOwners => "Multiple Owners",
        }
    }

    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Estate => &["ESTATE", "DECEASED", "HEIRS", "SUCCESSION"],
            Self::Trust => &["TRUST", "TRUSTEE", "REVOCABLE", "IRREVOCABLE"],
            Self::Partnership => &["PARTNERSHIP", "PARTNERS", "L.P.", "LLP"],
            Self::Corporate => &[
                "LLC",
                "L.L.C",
                "INC",
                "CORP",
                "COMPANY",
                "PROPERTIES",
                "HOLDINGS",
                "VENTURES",
                "GROUP",
            ],
            Self::MultipleOwners => &[" & ", " AND ", "ET AL", "ET UX"],
        }
    }
}

/// Whether ownership classification keeps only the top match or every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipPolicy {
    Exclusive,
    Additive,
}

impl OwnershipPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclusive" | "priority" => Some(Self::Exclusive),
            "additive" | "all" => Some(Self::Additive),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Exclusive => "exclusive",
            Self::Additive => "additive",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OwnershipFlags {
    pub estate: bool,
    pub trust: bool,
    pub partnership: bool,
    pub corporate: bool,
    pub multiple_owners: bool,
}

impl OwnershipFlags {
    pub fn contains(&self, kind: OwnershipKind) -> bool {
        match kind {
            OwnershipKind::Estate => self.estate,
            OwnershipKind::Trust => self.trust,
            OwnershipKind::Partnership => self.partnership,
            OwnershipKind::Corporate => self.corporate,
            OwnershipKind::MultipleOwners => self.multiple_owners,
        }
    }

    fn insert(&mut self, kind: OwnershipKind) {
        match kind {
            OwnershipKind::Estate => self.estate = true,
            OwnershipKind::Trust => self.trust = true,
            OwnershipKind::Partnership => self.partnership = true,
            OwnershipKind::Corporate => self.corporate = true,
            OwnershipKind::MultipleOwners => self.multiple_owners = true,
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = OwnershipKind> + '_ {
        OwnershipKind::ordered()
            .into_iter()
            .filter(|kind| self.contains(*kind))
    }

    pub fn primary(&self) -> Option<OwnershipKind> {
        self.kinds().next()
    }

    /// Held through a legal entity rather than by individuals.
    pub fn is_entity(&self) -> bool {
        self.estate || self.trust || self.partnership || self.corporate
    }
}

/// Case-insensitive keyword match against the owner names.
pub fn classify_ownership(
    owner_name: &str,
    secondary_owner: &str,
    policy: OwnershipPolicy,
) -> OwnershipFlags {
    let owner = owner_name.to_ascii_uppercase();
    let mut flags = OwnershipFlags::default();

    for kind in OwnershipKind::ordered() {
        let matched = kind
            .keywords()
            .iter()
            .any(|keyword| owner.contains(keyword))
            || (kind == OwnershipKind::MultipleOwners && !secondary_owner.trim().is_empty());
        if !matched {
            continue;
        }

        flags.insert(kind);
        if policy == OwnershipPolicy::Exclusive {
            break;
        }
    }

    flags
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    Residential,
    Commercial,
    Other,
}

impl PropertyCategory {
    pub fn classify(property_type: &str) -> Self {
        let upper = property_type.to_ascii_uppercase();
        if upper.contains("RESIDENTIAL") {
            Self::Residential
        } else if upper.contains("COMMERCIAL") {
            Self::Commercial
        } else {
            Self::Other
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "residential" => Some(Self::Residential),
            "commercial" => Some(Self::Commercial),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Residential => "Residential",
            Self::Commercial => "Commercial",
            Self::Other => "Other",
        }
    }
}

/// `"Ward 08"`, `"8"` and `"08"` all become `"8"`.
pub fn normalize_ward(raw: &str) -> Option<String> {
    let upper = raw.trim().to_ascii_uppercase();
    let stripped = upper.strip_prefix("WARD").unwrap_or(&upper).trim();
    let token = stripped.trim_start_matches('0');
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// First run of exactly five digits.
pub fn extract_zip(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 5)
        .map(str::to_string)
}

const GOVERNMENT_OWNERS: [&str; 2] = ["DISTRICT OF COLUMBIA", "UNITED STATES"];

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub ownership_policy: OwnershipPolicy,
    /// Elapsed years assumed when neither sale nor deed date parses.
    pub unknown_transfer_years: f64,
    /// Mailing token marking an in-jurisdiction owner.
    pub home_jurisdiction: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ownership_policy: OwnershipPolicy::Exclusive,
            unknown_transfer_years: 25.0,
            home_jurisdiction: "DC".to_string(),
        }
    }
}

/// Derived signals for one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    pub ownership: OwnershipFlags,
    pub years_since_transfer: f64,
    pub transfer_date_known: bool,
    pub assessment: f64,
    pub total_balance: f64,
    pub debt_ratio: f64,
    pub assessment_change_ratio: f64,
    pub prior_year_balance_count: u8,
    pub has_penalty_or_interest: bool,
    pub sale_price: f64,
    pub days_since_payment: Option<i64>,
    pub tax_sale_count: u8,
    pub homestead_code: String,
    pub vacant: bool,
    pub mixed_use: bool,
    pub tax_class: Option<u32>,
    pub ward: Option<String>,
    pub zip_code: Option<String>,
    pub property_category: PropertyCategory,
    pub absentee_owner: bool,
    pub out_of_jurisdiction: bool,
    pub government_owned: bool,
    pub building_age: Option<i32>,
}

impl FeatureSet {
    pub fn has_lien(&self) -> bool {
        self.total_balance > 0.0
    }
}

pub fn extract(
    fields: &NormalizedFields,
    config: &ExtractionConfig,
    context: &RunContext,
) -> FeatureSet {
    // a zero ASSESSMENT means the column was not populated
    let assessment = if fields.assessment > 0.0 {
        fields.assessment
    } else {
        fields.new_total
    };

    let last_transfer = match (fields.sale_date, fields.deed_date) {
        (Some(sale), Some(deed)) => Some(sale.max(deed)),
        (sale, deed) => sale.or(deed),
    };
    let years_since_transfer = match last_transfer {
        Some(date) => ((context.reference_date - date).num_days() as f64 / 365.25).max(0.0),
        None => config.unknown_transfer_years,
    };

    let debt_ratio = if assessment > 0.0 {
        fields.total_balance / assessment
    } else {
        0.0
    };

    let assessment_change_ratio =
        if fields.old_total > 0.0 && fields.new_total > fields.old_total {
            (fields.new_total - fields.old_total) / fields.old_total
        } else {
            0.0
        };

    let owner_upper = fields.owner_name.to_ascii_uppercase();
    let premise_upper = fields.premise_address.to_ascii_uppercase();
    let mailing_upper = fields.mailing_line_1.to_ascii_uppercase();
    let city_state_zip_upper = fields.city_state_zip.to_ascii_uppercase();
    let home = config.home_jurisdiction.to_ascii_uppercase();

    let tax_class = fields.tax_class;
    let vacant = is_truthy(&fields.vacant_flag) || tax_class.is_some_and(|class| class >= 3);

    FeatureSet {
        ownership: classify_ownership(
            &fields.owner_name,
            &fields.secondary_owner,
            config.ownership_policy,
        ),
        years_since_transfer,
        transfer_date_known: last_transfer.is_some(),
        assessment,
        total_balance: fields.total_balance,
        debt_ratio,
        assessment_change_ratio,
        prior_year_balance_count: fields
            .prior_year_balances
            .iter()
            .filter(|balance| **balance > 0.0)
            .count() as u8,
        has_penalty_or_interest: fields
            .penalties_and_interest
            .iter()
            .any(|amount| *amount > 0.0),
        sale_price: fields.sale_price,
        days_since_payment: fields
            .last_payment_date
            .map(|paid| (context.reference_date - paid).num_days().max(0)),
        tax_sale_count: fields
            .tax_sale_flags
            .iter()
            .filter(|flag| is_truthy(flag))
            .count() as u8,
        homestead_code: fields.homestead_code.clone(),
        vacant,
        mixed_use: is_truthy(&fields.mixed_use_flag),
        tax_class,
        ward: normalize_ward(&fields.ward),
        zip_code: extract_zip(&fields.premise_address)
            .or_else(|| extract_zip(&fields.city_state_zip)),
        property_category: PropertyCategory::classify(&fields.property_type),
        absentee_owner: !premise_upper.is_empty()
            && !mailing_upper.is_empty()
            && !mailing_upper.contains(&premise_upper),
        out_of_jurisdiction: !city_state_zip_upper.is_empty()
            && !city_state_zip_upper.contains(&home),
        government_owned: GOVERNMENT_OWNERS
            .iter()
            .any(|owner| owner_upper.contains(owner)),
        building_age: fields
            .year_built
            .and_then(|year| i32::try_from(year).ok())
            .and_then(|year| context.reference_date.year().checked_sub(year)),
    }
}
