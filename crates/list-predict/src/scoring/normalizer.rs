//! Field normalization.
//!
//! Every function here is total: unparsable input resolves to the field's
//! documented default instead of an error.

use super::record::{fields, RawRecord, RawValue};
use chrono::NaiveDate;

/// Candidate date layouts, tried in order after any time component is dropped.
pub const DATE_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y", "%Y/%m/%d"];

const TRUTHY_TOKENS: [&str; 6] = ["Y", "YES", "TRUE", "T", "1", "X"];

/// Currency amount, `0.0` when absent or unparsable.
pub fn currency(value: &RawValue) -> f64 {
    currency_or(value, 0.0)
}

/// Keeps digits, `.` and `-`, then parses. Amounts are never negative.
pub fn currency_or(value: &RawValue, default: f64) -> f64 {
    let parsed = match value {
        RawValue::Number(number) => Some(*number),
        RawValue::Text(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        RawValue::Missing => None,
    };

    match parsed {
        Some(amount) if amount.is_finite() => amount.max(0.0),
        _ => default,
    }
}

/// Parsed calendar date, `None` when no candidate format matches.
pub fn date(value: &RawValue) -> Option<NaiveDate> {
    let RawValue::Text(text) = value else {
        return None;
    };

    let date_part = text
        .trim()
        .split([' ', 'T'])
        .next()
        .unwrap_or_default();
    if date_part.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// Trimmed text, empty when blank or the `nan` placeholder.
pub fn text(value: &RawValue) -> String {
    text_or(value, "")
}

pub fn text_or(value: &RawValue, default: &str) -> String {
    match value {
        RawValue::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        RawValue::Number(number) if number.is_finite() => {
            if number.fract() == 0.0 {
                format!("{}", *number as i64)
            } else {
                number.to_string()
            }
        }
        _ => default.to_string(),
    }
}

/// Upper-case code or flag token.
pub fn token(value: &RawValue) -> String {
    text(value).to_ascii_uppercase()
}

pub fn is_truthy(token: &str) -> bool {
    TRUTHY_TOKENS.contains(&token)
}

/// Small positive integer code; zero reads as missing.
fn whole_number(value: &RawValue) -> Option<u32> {
    let amount = currency(value).trunc();
    if amount >= 1.0 && amount <= u32::MAX as f64 {
        Some(amount as u32)
    } else {
        None
    }
}

/// Typed projection of a [`RawRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFields {
    pub ssl: String,
    pub premise_address: String,
    pub owner_name: String,
    pub secondary_owner: String,
    pub mailing_line_1: String,
    pub mailing_line_2: String,
    pub city_state_zip: String,
    pub assessment: f64,
    pub new_total: f64,
    pub old_total: f64,
    pub total_balance: f64,
    pub sale_price: f64,
    pub prior_year_balances: [f64; 10],
    pub penalties_and_interest: [f64; 4],
    pub sale_date: Option<NaiveDate>,
    pub deed_date: Option<NaiveDate>,
    pub last_payment_date: Option<NaiveDate>,
    pub ward: String,
    pub property_type: String,
    pub homestead_code: String,
    pub mixed_use_flag: String,
    pub vacant_flag: String,
    pub tax_class: Option<u32>,
    pub year_built: Option<u32>,
    pub tax_sale_flags: Vec<String>,
}

impl NormalizedFields {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            ssl: text(raw.get(fields::SSL)),
            premise_address: text(raw.get(fields::PREMISE_ADDRESS)),
            owner_name: text(raw.get(fields::OWNER_NAME)),
            secondary_owner: text(raw.get(fields::SECONDARY_OWNER)),
            mailing_line_1: text(raw.get(fields::MAILING_LINE_1)),
            mailing_line_2: text(raw.get(fields::MAILING_LINE_2)),
            city_state_zip: text(raw.get(fields::CITY_STATE_ZIP)),
            assessment: currency(raw.get(fields::ASSESSMENT)),
            new_total: currency(raw.get(fields::NEW_TOTAL)),
            old_total: currency(raw.get(fields::OLD_TOTAL)),
            total_balance: currency(raw.get(fields::TOTAL_BALANCE)),
            sale_price: currency(raw.get(fields::SALE_PRICE)),
            prior_year_balances: fields::PRIOR_YEAR_BALANCES.map(|field| currency(raw.get(field))),
            penalties_and_interest: fields::PENALTIES_AND_INTEREST
                .map(|field| currency(raw.get(field))),
            sale_date: date(raw.get(fields::SALE_DATE)),
            deed_date: date(raw.get(fields::DEED_DATE)),
            last_payment_date: date(raw.get(fields::LAST_PAYMENT_DATE)),
            ward: text(raw.get(fields::WARD)),
            property_type: text(raw.get(fields::PROPERTY_TYPE)),
            homestead_code: token(raw.get(fields::HOMESTEAD_CODE)),
            mixed_use_flag: token(raw.get(fields::MIXED_USE)),
            vacant_flag: token(raw.get(fields::VACANT)),
            tax_class: whole_number(raw.get(fields::TAX_CLASS)),
            year_built: whole_number(raw.get(fields::YEAR_BUILT)),
            tax_sale_flags: fields::TAX_SALE_FLAGS
                .iter()
                .map(|field| token(raw.get(field)))
                .collect(),
        }
    }

    /// Rows with no identifier, address, owner or assessment carry nothing to score.
    pub fn is_blank(&self) -> bool {
        self.ssl.is_empty()
            && self.premise_address.is_empty()
            && self.owner_name.is_empty()
            && self.assessment == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_value(raw: &str) -> RawValue {
        RawValue::Text(raw.to_string())
    }

    #[test]
    fn currency_strips_symbols_and_defaults_on_garbage() {
        assert_eq!(currency(&text_value("$1,250,000.50")), 1_250_000.5);
        assert_eq!(currency(&text_value("  ")), 0.0);
        assert_eq!(currency(&text_value("N/A")), 0.0);
        assert_eq!(currency(&text_value("1.2.3")), 0.0);
        assert_eq!(currency(&RawValue::Missing), 0.0);
        assert_eq!(currency(&RawValue::Number(f64::NAN)), 0.0);
        assert_eq!(currency(&text_value("0")), 0.0);
        assert_eq!(currency_or(&text_value("--"), 7.0), 7.0);
    }

    #[test]
    fn currency_never_goes_negative() {
        assert_eq!(currency(&text_value("-500")), 0.0);
        assert_eq!(currency(&RawValue::Number(-12.0)), 0.0);
    }

    #[test]
    fn date_accepts_every_listed_format() {
        let expected = NaiveDate::from_ymd_opt(2003, 5, 14).expect("valid date");
        for raw in [
            "05/14/2003",
            "2003-05-14",
            "05-14-2003",
            "2003/05/14",
            "2003/05/14 00:00:00+00",
            "2003-05-14T08:30:00Z",
        ] {
            assert_eq!(date(&text_value(raw)), Some(expected), "format {raw}");
        }
    }

    #[test]
    fn date_returns_unknown_for_unparsable_values() {
        assert_eq!(date(&text_value("not-a-date")), None);
        assert_eq!(date(&text_value("")), None);
        assert_eq!(date(&RawValue::Number(20030514.0)), None);
        assert_eq!(date(&RawValue::Missing), None);
    }

    #[test]
    fn text_treats_nan_and_blank_as_empty() {
        assert_eq!(text(&text_value("  nan ")), "");
        assert_eq!(text(&text_value("   ")), "");
        assert_eq!(text(&text_value(" 1200 K ST NW ")), "1200 K ST NW");
        assert_eq!(text(&RawValue::Number(8.0)), "8");
        assert_eq!(text_or(&RawValue::Missing, "Unknown"), "Unknown");
    }

    #[test]
    fn tokens_are_upper_case_and_truthy_set_is_fixed() {
        assert_eq!(token(&text_value(" yes ")), "YES");
        assert!(is_truthy("Y"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("N"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn from_raw_fills_defaults_for_missing_columns() {
        let raw = RawRecord::new()
            .with(fields::SSL, "0001//0001")
            .with(fields::TAX_CLASS, "0")
            .with(fields::YEAR_BUILT, "1925");
        let normalized = NormalizedFields::from_raw(&raw);

        assert_eq!(normalized.ssl, "0001//0001");
        assert_eq!(normalized.assessment, 0.0);
        assert_eq!(normalized.sale_date, None);
        assert_eq!(normalized.tax_class, None);
        assert_eq!(normalized.year_built, Some(1925));
        assert_eq!(normalized.tax_sale_flags.len(), 5);
        assert!(!normalized.is_blank());
        assert!(NormalizedFields::from_raw(&RawRecord::new()).is_blank());
    }
}
