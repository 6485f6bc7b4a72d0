use chrono::NaiveDate;
use list_predict::config::{self, ScoringSettings};
use list_predict::error::AppError;
use list_predict::ingest::{Delimiter, IngestError, PropertyImporter};
use list_predict::scoring::{
    BatchResult, ModelVariant, OwnershipPolicy, PropertyCategory, RiskCategory, RunContext,
    ScoringPipeline,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) batch: Arc<BatchResult>,
    pub(crate) settings: Arc<ScoringSettings>,
}

/// Scores the configured extract. No input configured means an empty batch.
pub(crate) fn load_configured_batch(
    settings: &ScoringSettings,
    context: &RunContext,
) -> Result<BatchResult, AppError> {
    let pipeline = ScoringPipeline::new(settings.pipeline_config());
    match &settings.input {
        Some(path) => {
            let records = PropertyImporter::new(settings.delimiter).from_path(path)?;
            Ok(pipeline.run(&records, context))
        }
        None => Ok(pipeline.empty_batch(context)),
    }
}

/// Like [`load_configured_batch`] but an input path is mandatory.
pub(crate) fn load_required_batch(
    settings: &ScoringSettings,
    context: &RunContext,
) -> Result<BatchResult, AppError> {
    if settings.input.is_none() {
        return Err(IngestError::SourceUnavailable {
            path: PathBuf::from("(not configured)"),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no input path given; pass --input",
            ),
        }
        .into());
    }
    load_configured_batch(settings, context)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_model(raw: &str) -> Result<ModelVariant, String> {
    config::parse_model(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_ownership(raw: &str) -> Result<OwnershipPolicy, String> {
    config::parse_ownership(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_delimiter(raw: &str) -> Result<Delimiter, String> {
    config::parse_delimiter(raw).map_err(|err| err.to_string())
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Splits a comma list query value, dropping blanks.
pub(crate) fn comma_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub(crate) fn parse_categories(raw: Option<&str>) -> Result<Vec<PropertyCategory>, AppError> {
    comma_list(raw)
        .iter()
        .map(|item| {
            PropertyCategory::parse(item).ok_or_else(|| {
                AppError::InvalidRequest(format!("unknown property category '{item}'"))
            })
        })
        .collect()
}

pub(crate) fn parse_risk_categories(raw: Option<&str>) -> Result<Vec<RiskCategory>, AppError> {
    comma_list(raw)
        .iter()
        .map(|item| {
            RiskCategory::parse(item)
                .ok_or_else(|| AppError::InvalidRequest(format!("unknown risk category '{item}'")))
        })
        .collect()
}
