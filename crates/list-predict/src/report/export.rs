use super::views::PredictionExport;
use crate::scoring::{BatchResult, FactorKind};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode csv export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode json export: {0}")]
    Json(#[from] serde_json::Error),
}

const LEADING_COLUMNS: [&str; 19] = [
    "rank",
    "ssl",
    "premise_address",
    "owner_name",
    "mailing_line_1",
    "mailing_line_2",
    "city_state_zip",
    "ward",
    "zip_code",
    "property_type",
    "listing_probability",
    "risk_category",
    "confidence",
    "tier",
    "lead_score",
    "assessment",
    "total_balance",
    "years_since_transfer",
    "debt_ratio",
];

const TRAILING_COLUMNS: [&str; 3] = ["is_corporate", "is_trust", "is_estate"];

/// Every record in batch order.
pub fn export_rows(batch: &BatchResult) -> Vec<PredictionExport> {
    batch
        .records()
        .iter()
        .enumerate()
        .map(|(index, tiered)| PredictionExport::from_tiered(index + 1, tiered))
        .collect()
}

pub fn write_json<W: Write>(writer: W, rows: &[PredictionExport]) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

/// One column per factor of `factors`, in that order.
pub fn write_csv<W: Write>(
    writer: W,
    factors: &[FactorKind],
    rows: &[PredictionExport],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let header = LEADING_COLUMNS
        .iter()
        .copied()
        .chain(factors.iter().map(|factor| factor.key()))
        .chain(TRAILING_COLUMNS.iter().copied());
    csv_writer.write_record(header)?;

    for row in rows {
        let mut fields = vec![
            row.rank.to_string(),
            row.ssl.clone(),
            row.premise_address.clone(),
            row.owner_name.clone(),
            row.mailing_line_1.clone(),
            row.mailing_line_2.clone(),
            row.city_state_zip.clone(),
            row.ward.clone(),
            row.zip_code.clone().unwrap_or_default(),
            row.property_type.clone(),
            format!("{:.3}", row.listing_probability),
            row.risk_category.to_string(),
            row.confidence.unwrap_or_default().to_string(),
            row.tier.to_string(),
            row.lead_score
                .map(|score| format!("{score:.2}"))
                .unwrap_or_default(),
            row.assessment.to_string(),
            format!("{:.2}", row.total_balance),
            format!("{:.1}", row.years_since_transfer),
            format!("{:.4}", row.debt_ratio),
        ];
        fields.extend(factors.iter().map(|factor| {
            let value = row.factors.get(factor.key()).copied().unwrap_or(0.0);
            format!("{value:.3}")
        }));
        fields.extend(
            [row.is_corporate, row.is_trust, row.is_estate]
                .iter()
                .map(|flag| flag.to_string()),
        );
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_json_file<P: AsRef<Path>>(path: P, batch: &BatchResult) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_json(&mut writer, &export_rows(batch))?;
    writer.flush()?;
    info!(path = %path.display(), records = batch.len(), "wrote json export");
    Ok(())
}

pub fn export_csv_file<P: AsRef<Path>>(path: P, batch: &BatchResult) -> Result<(), ExportError> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    write_csv(writer, batch.factor_kinds(), &export_rows(batch))?;
    info!(path = %path.display(), records = batch.len(), "wrote csv export");
    Ok(())
}
