mod export;
mod filter;
mod summary;
pub mod views;

pub use export::{
    export_csv_file, export_json_file, export_rows, write_csv, write_json, ExportError,
};
pub use filter::{DashboardView, ViewFilter};
pub use summary::HIGH_OPPORTUNITY;
pub use views::{BatchSummary, PredictionExport};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::record::fields;
    use crate::scoring::{
        ModelVariant, PipelineConfig, PropertyCategory, RawRecord, RiskCategory, RunContext,
        ScoringPipeline, Tier,
    };
    use chrono::NaiveDate;

    fn context() -> RunContext {
        RunContext::new(NaiveDate::from_ymd_opt(2025, 4, 15).expect("valid date"))
    }

    fn property(ssl: &str, owner: &str, ward: &str, balance: f64, proptype: &str) -> RawRecord {
        RawRecord::new()
            .with(fields::SSL, ssl)
            .with(fields::PREMISE_ADDRESS, format!("{ssl} MAIN ST NW WASHINGTON DC 20001"))
            .with(fields::OWNER_NAME, owner)
            .with(fields::ASSESSMENT, "400000")
            .with(fields::TOTAL_BALANCE, balance)
            .with(fields::WARD, ward)
            .with(fields::PROPERTY_TYPE, proptype)
            .with(fields::SALE_DATE, "06/01/2001")
    }

    fn batch() -> crate::scoring::BatchResult {
        let records = vec![
            property("100", "SMITH JOHN", "Ward 2", 0.0, "Residential"),
            property("200", "ESTATE OF JONES", "8", 60_000.0, "Residential"),
            property("300", "ACME HOLDINGS LLC", "7", 15_000.0, "Commercial"),
            property("400", "DOE JANE", "3", 0.0, "Residential"),
        ];
        ScoringPipeline::new(PipelineConfig::for_model(ModelVariant::Enhanced))
            .run(&records, &context())
    }

    #[test]
    fn summary_counts_every_ladder_entry() {
        let batch = batch();
        let summary = BatchSummary::from_batch(&batch);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.risk_categories.len(), RiskCategory::ordered().len());
        let counted: usize = summary.risk_categories.iter().map(|entry| entry.count).sum();
        assert_eq!(counted, 4);
        let tiered: usize = summary.tiers.iter().map(|entry| entry.count).sum();
        assert_eq!(tiered, 4);
        assert_eq!(summary.confidence.len(), 2);
        assert_eq!(summary.median_assessment, 400_000.0);
        assert!(summary.thresholds.is_some());
        assert!(summary.tier_count(Tier::High) >= 1);
    }

    #[test]
    fn empty_batch_summarizes_to_zeroes() {
        let pipeline = ScoringPipeline::new(PipelineConfig::default());
        let summary = BatchSummary::from_batch(&pipeline.run(&[], &context()));

        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_probability, 0.0);
        assert_eq!(summary.median_assessment, 0.0);
        assert!(summary.thresholds.is_none());
        assert!(summary.risk_categories.iter().all(|entry| entry.count == 0));
    }

    #[test]
    fn exports_round_and_rank_in_batch_order() {
        let rows = export_rows(&batch());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].ssl, "200");
        assert!(rows[0].is_estate);
        for window in rows.windows(2) {
            assert!(window[0].listing_probability >= window[1].listing_probability);
        }
        for row in &rows {
            assert_eq!(row.assessment, 400_000);
            assert_eq!(row.factors.len(), 9);
            assert_eq!(row.zip_code.as_deref(), Some("20001"));
            let scaled = row.listing_probability * 1000.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn csv_has_one_column_per_factor() {
        let batch = batch();
        let mut buffer = Vec::new();
        write_csv(&mut buffer, batch.factor_kinds(), &export_rows(&batch)).expect("csv export");

        let text = String::from_utf8(buffer).expect("utf8 csv");
        let mut lines = text.lines();
        let header: Vec<&str> = lines.next().expect("header").split(',').collect();
        assert_eq!(header.len(), 19 + batch.factor_kinds().len() + 3);
        assert!(header.contains(&"homestead_protection"));
        assert_eq!(lines.count(), 4);
    }

    #[test]
    fn mailing_lines_export_as_separate_columns() {
        let record = property("500", "DOE JANE", "3", 0.0, "Residential")
            .with(fields::MAILING_LINE_1, "PO BOX 42")
            .with(fields::MAILING_LINE_2, "SUITE 9")
            .with(fields::CITY_STATE_ZIP, "BETHESDA MD 20814");
        let batch = ScoringPipeline::new(PipelineConfig::default()).run(&[record], &context());
        let rows = export_rows(&batch);
        assert_eq!(rows[0].mailing_line_1, "PO BOX 42");
        assert_eq!(rows[0].mailing_line_2, "SUITE 9");
        assert_eq!(rows[0].city_state_zip, "BETHESDA MD 20814");

        let mut buffer = Vec::new();
        write_csv(&mut buffer, batch.factor_kinds(), &rows).expect("csv export");
        let text = String::from_utf8(buffer).expect("utf8 csv");
        let mut lines = text.lines();
        let header: Vec<&str> = lines.next().expect("header").split(',').collect();
        assert!(header.contains(&"mailing_line_1"));
        assert!(header.contains(&"mailing_line_2"));
        assert!(!header.contains(&"mailing_address"));
        assert_eq!(text.matches("BETHESDA MD 20814").count(), 1);
    }

    #[test]
    fn json_export_is_an_array() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &export_rows(&batch())).expect("json export");
        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("valid json");
        let rows = value.as_array().expect("array");
        assert_eq!(rows.len(), 4);
        assert!(rows[0]["factors"]["financial_pressure"].is_number());
    }

    #[test]
    fn filter_keeps_global_tiers_and_batch_rank() {
        let batch = batch();
        let everything = ViewFilter::default().apply(&batch);
        let global_tier = |ssl: &str| {
            everything
                .records
                .iter()
                .find(|row| row.ssl == ssl)
                .map(|row| row.tier)
                .expect("record present")
        };

        let liens = ViewFilter {
            liens_only: true,
            ..ViewFilter::default()
        }
        .apply(&batch);
        assert_eq!(liens.total_matching, 2);
        for row in &liens.records {
            assert_eq!(row.tier, global_tier(&row.ssl));
        }

        let commercial = ViewFilter {
            categories: vec![PropertyCategory::Commercial],
            ..ViewFilter::default()
        }
        .apply(&batch);
        assert_eq!(commercial.total_matching, 1);
        assert_eq!(commercial.records[0].ssl, "300");

        let ward = ViewFilter {
            wards: vec!["Ward 02".to_string()],
            limit: Some(5),
            ..ViewFilter::default()
        }
        .apply(&batch);
        assert_eq!(ward.total_matching, 1);
        assert_eq!(ward.records[0].ssl, "100");

        let limited = ViewFilter {
            limit: Some(1),
            ..ViewFilter::default()
        }
        .apply(&batch);
        assert_eq!(limited.total_matching, 4);
        assert_eq!(limited.records.len(), 1);
        assert_eq!(limited.records[0].rank, 1);
    }
}
