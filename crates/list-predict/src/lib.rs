pub mod config;
pub mod error;
pub mod ingest;
pub mod report;
pub mod scoring;
pub mod telemetry;

pub use error::AppError;
pub use ingest::{Delimiter, IngestError, PropertyImporter};
pub use report::{BatchSummary, PredictionExport, ViewFilter};
pub use scoring::{BatchResult, ModelVariant, PipelineConfig, RunContext, ScoringPipeline};
