use crate::infra::{
    comma_list, deserialize_optional_date, parse_categories, parse_risk_categories, AppState,
};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use list_predict::config;
use list_predict::error::AppError;
use list_predict::ingest::PropertyImporter;
use list_predict::report::{export_rows, BatchSummary, DashboardView, PredictionExport, ViewFilter};
use list_predict::scoring::{RunContext, ScoringPipeline};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;

const DEFAULT_SCORE_LIMIT: usize = 25;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PredictionQuery {
    #[serde(default)]
    pub(crate) ward: Option<String>,
    #[serde(default)]
    pub(crate) zip: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) risk: Option<String>,
    #[serde(default)]
    pub(crate) liens_only: bool,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl PredictionQuery {
    fn into_filter(self) -> Result<ViewFilter, AppError> {
        Ok(ViewFilter {
            wards: comma_list(self.ward.as_deref()),
            zip_codes: comma_list(self.zip.as_deref()),
            categories: parse_categories(self.category.as_deref())?,
            risk_categories: parse_risk_categories(self.risk.as_deref())?,
            liens_only: self.liens_only,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) csv: String,
    #[serde(default)]
    pub(crate) model: Option<String>,
    #[serde(default)]
    pub(crate) ownership: Option<String>,
    #[serde(default)]
    pub(crate) delimiter: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) exclude_government: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) summary: BatchSummary,
    pub(crate) records: Vec<PredictionExport>,
}

pub(crate) fn router() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/predictions",
            axum::routing::get(predictions_endpoint),
        )
        .route("/api/v1/summary", axum::routing::get(summary_endpoint))
        .route("/api/v1/score", axum::routing::post(score_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready", "records": state.batch.len() })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn predictions_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<DashboardView>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(filter.apply(&state.batch)))
}

pub(crate) async fn summary_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<BatchSummary> {
    Json(BatchSummary::from_batch(&state.batch))
}

/// Scores an inline extract without touching the loaded batch.
pub(crate) async fn score_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let ScoreRequest {
        csv,
        model,
        ownership,
        delimiter,
        as_of,
        limit,
        exclude_government,
    } = payload;

    let invalid = |err: config::ConfigError| AppError::InvalidRequest(err.to_string());
    let mut settings = (*state.settings).clone();
    if let Some(model) = model {
        settings.model = config::parse_model(&model).map_err(invalid)?;
    }
    if let Some(ownership) = ownership {
        settings.ownership = Some(config::parse_ownership(&ownership).map_err(invalid)?);
    }
    if let Some(delimiter) = delimiter {
        settings.delimiter = config::parse_delimiter(&delimiter).map_err(invalid)?;
    }
    if let Some(exclude) = exclude_government {
        settings.exclude_government_owners = exclude;
    }

    let records =
        PropertyImporter::new(settings.delimiter).from_reader(Cursor::new(csv.into_bytes()))?;
    let context = as_of.map(RunContext::new).unwrap_or_else(RunContext::today);
    let batch = ScoringPipeline::new(settings.pipeline_config()).run(&records, &context);

    let mut rows = export_rows(&batch);
    rows.truncate(limit.unwrap_or(DEFAULT_SCORE_LIMIT));

    Ok(Json(ScoreResponse {
        summary: BatchSummary::from_batch(&batch),
        records: rows,
    }))
}
