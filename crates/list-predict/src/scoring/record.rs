use std::collections::HashMap;

/// Column names of the assessment roll extract.
pub mod fields {
    pub const SSL: &str = "SSL";
    pub const PREMISE_ADDRESS: &str = "PREMISEADD";
    pub const OWNER_NAME: &str = "OWNERNAME";
    pub const SECONDARY_OWNER: &str = "OWNNAME2";
    pub const MAILING_LINE_1: &str = "ADDRESS1";
    pub const MAILING_LINE_2: &str = "ADDRESS2";
    pub const CITY_STATE_ZIP: &str = "CITYSTZIP";
    pub const ASSESSMENT: &str = "ASSESSMENT";
    pub const NEW_TOTAL: &str = "NEWTOTAL";
    pub const OLD_TOTAL: &str = "OLDTOTAL";
    pub const TOTAL_BALANCE: &str = "TOTBALAMT";
    pub const SALE_PRICE: &str = "SALEPRICE";
    pub const SALE_DATE: &str = "SALEDATE";
    pub const DEED_DATE: &str = "DEEDDATE";
    pub const LAST_PAYMENT_DATE: &str = "LASTPAYDT";
    pub const WARD: &str = "PRMS_WARD";
    pub const PROPERTY_TYPE: &str = "PROPTYPE";
    pub const HOMESTEAD_CODE: &str = "HSTDCODE";
    pub const MIXED_USE: &str = "MIXEDUSE";
    pub const VACANT: &str = "VACANT";
    pub const TAX_CLASS: &str = "CLASSTYPE";
    pub const YEAR_BUILT: &str = "AYB";

    pub const PRIOR_YEAR_BALANCES: [&str; 10] = [
        "PY1BAL", "PY2BAL", "PY3BAL", "PY4BAL", "PY5BAL", "PY6BAL", "PY7BAL", "PY8BAL", "PY9BAL",
        "PY10BAL",
    ];

    pub const PENALTIES_AND_INTEREST: [&str; 4] = ["CY1PEN", "CY2PEN", "CY1INT", "CY2INT"];

    pub const TAX_SALE_FLAGS: [&str; 5] = [
        "CY1TAXSALE",
        "CY2TAXSALE",
        "PY1TAXSALE",
        "PY2TAXSALE",
        "PY3TAXSALE",
    ];
}

/// Untyped scalar as it arrived from the source extract.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Missing,
}

static MISSING: RawValue = RawValue::Missing;

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One row of the extract keyed by upper-cased column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    values: HashMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: RawValue) {
        self.values.insert(field_key(field), value);
    }

    /// Absent columns read as [`RawValue::Missing`].
    pub fn get(&self, field: &str) -> &RawValue {
        self.values.get(&field_key(field)).unwrap_or(&MISSING)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn field_key(field: &str) -> String {
    field
        .replace('\u{feff}', "")
        .trim()
        .to_ascii_uppercase()
}
