use crate::infra::{load_required_batch, parse_date, parse_delimiter, parse_model, parse_ownership};
use chrono::NaiveDate;
use clap::Args;
use list_predict::config::{AppConfig, ScoringSettings};
use list_predict::error::AppError;
use list_predict::ingest::Delimiter;
use list_predict::report::{export_csv_file, export_json_file, export_rows, BatchSummary};
use list_predict::scoring::{BatchResult, ModelVariant, OwnershipPolicy, RunContext};
use list_predict::telemetry;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// Property extract to score (CSV or TSV)
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Scoring model: basic, enhanced or dashboard
    #[arg(long, value_parser = parse_model)]
    pub(crate) model: Option<ModelVariant>,
    /// Ownership weighting: exclusive or additive
    #[arg(long, value_parser = parse_ownership)]
    pub(crate) ownership: Option<OwnershipPolicy>,
    /// Reference date for age and seasonal calculations (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Field delimiter: auto, comma or tab
    #[arg(long, value_parser = parse_delimiter)]
    pub(crate) delimiter: Option<Delimiter>,
    /// Drop government-owned parcels before tiering
    #[arg(long)]
    pub(crate) exclude_government: bool,
    /// Write the ranked predictions as JSON
    #[arg(long)]
    pub(crate) json: Option<PathBuf>,
    /// Write the ranked predictions as CSV
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Number of top-ranked properties to print
    #[arg(long, default_value_t = 10)]
    pub(crate) top: usize,
}

impl ScoreArgs {
    fn apply(&self, settings: &mut ScoringSettings) {
        if let Some(input) = &self.input {
            settings.input = Some(input.clone());
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if let Some(ownership) = self.ownership {
            settings.ownership = Some(ownership);
        }
        if let Some(delimiter) = self.delimiter {
            settings.delimiter = delimiter;
        }
        if self.exclude_government {
            settings.exclude_government_owners = true;
        }
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    args.apply(&mut config.scoring);

    let context = args.as_of.map(RunContext::new).unwrap_or_else(RunContext::today);
    let batch = load_required_batch(&config.scoring, &context)?;

    if let Some(path) = &args.json {
        export_json_file(path, &batch)?;
    }
    if let Some(path) = &args.csv {
        export_csv_file(path, &batch)?;
    }

    print!("{}", render_summary(&batch, args.top));
    Ok(())
}

pub(crate) fn render_summary(batch: &BatchResult, top: usize) -> String {
    let summary = BatchSummary::from_batch(batch);
    let mut out = String::new();

    let _ = writeln!(out, "Listing probability report");
    let _ = writeln!(
        out,
        "Model: {} | Reference date: {}",
        summary.model_label, summary.reference_date
    );
    let _ = writeln!(
        out,
        "Scored {} properties ({} excluded)",
        summary.total, summary.excluded
    );
    if summary.total == 0 {
        let _ = writeln!(out, "No scorable records.");
        return out;
    }

    let _ = writeln!(out, "\nRisk categories");
    for entry in &summary.risk_categories {
        let _ = writeln!(out, "  {:<15} {}", entry.category_label, entry.count);
    }

    if !summary.confidence.is_empty() {
        let _ = writeln!(out, "\nConfidence");
        for entry in &summary.confidence {
            let _ = writeln!(out, "  {:<15} {}", entry.confidence_label, entry.count);
        }
    }

    let _ = writeln!(out, "\nTiers");
    for entry in &summary.tiers {
        let _ = writeln!(out, "  {:<15} {}", entry.tier_label, entry.count);
    }
    if let Some(thresholds) = &summary.thresholds {
        let _ = writeln!(
            out,
            "  cutoffs on {}: high >= {:.3}, medium >= {:.3}",
            thresholds.basis.label(),
            thresholds.high,
            thresholds.medium
        );
    }

    let _ = writeln!(
        out,
        "\nHigh opportunity: {} | Avg probability: {:.3} | Avg debt ratio: {:.3}",
        summary.high_opportunity, summary.average_probability, summary.average_debt_ratio
    );

    let rows = export_rows(batch);
    let _ = writeln!(out, "\nTop {}", top.min(rows.len()));
    for row in rows.iter().take(top) {
        let _ = writeln!(
            out,
            "  {:>3}. {:<12} {:.3} {:<15} {:<6} {}",
            row.rank, row.ssl, row.listing_probability, row.risk_category, row.tier, row.premise_address
        );
    }

    out
}
