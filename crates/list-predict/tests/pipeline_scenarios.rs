use chrono::NaiveDate;
use list_predict::ingest::{Delimiter, IngestError, PropertyImporter};
use list_predict::report::{export_rows, write_csv, BatchSummary};
use list_predict::scoring::{
    FactorKind, ModelVariant, PipelineConfig, RiskCategory, RunContext, ScoreModel, ScoringPipeline,
    Tier,
};

fn context() -> RunContext {
    RunContext::new(NaiveDate::from_ymd_opt(2025, 4, 15).expect("valid reference date"))
}

fn import(text: &str) -> Vec<list_predict::scoring::RawRecord> {
    PropertyImporter::default()
        .from_reader(text.as_bytes())
        .expect("extract parses")
}

const ROLL: &str = "SSL\tPREMISEADD\tOWNERNAME\tASSESSMENT\tTOTBALAMT\tPRMS_WARD\tSALEDATE\tHSTDCODE\n\
0001\t100 A ST SE 20020\tESTATE OF SMITH\t100000\t20000\t8\t2003-04-15\t\n\
0002\t200 B ST NW 20001\tJONES MARY\t650000\t0\t2\t2019-06-01\t1\n\
\t\t\t\t\t\t\t\n\
0003\t300 C ST SE 20003\tACME HOLDINGS LLC\t1200000\t30000\t6\tnot-a-date\t\n\
0004\t400 D ST NE 20002\tDISTRICT OF COLUMBIA\t900000\t0\t5\t1990-01-01\t\n";

#[test]
fn long_held_estate_in_ward_eight_ranks_first() {
    let batch = ScoringPipeline::new(PipelineConfig::default()).run(&import(ROLL), &context());

    assert_eq!(batch.len(), 4);
    assert_eq!(batch.excluded(), 1);

    let top = &batch.records()[0];
    assert_eq!(top.record().identity.ssl, "0001");
    assert!(top.record().features.ownership.estate);
    assert!((top.record().features.debt_ratio - 0.20).abs() < 1e-9);
    assert!(top.record().outcome.category >= RiskCategory::VeryHigh);
    assert_eq!(top.tier(), Tier::High);
}

#[test]
fn unparsable_sale_date_falls_back_to_default_holding_period() {
    let batch = ScoringPipeline::new(PipelineConfig::default()).run(&import(ROLL), &context());

    let llc = batch
        .records()
        .iter()
        .find(|tiered| tiered.record().identity.ssl == "0003")
        .expect("llc parcel scored");
    assert!(!llc.record().features.transfer_date_known);
    assert_eq!(llc.record().features.years_since_transfer, 25.0);
}

#[test]
fn government_owners_drop_out_when_requested() {
    let config = PipelineConfig {
        exclude_government_owners: true,
        ..PipelineConfig::default()
    };
    let batch = ScoringPipeline::new(config).run(&import(ROLL), &context());

    assert_eq!(batch.len(), 3);
    assert_eq!(batch.excluded(), 2);
    assert!(batch
        .records()
        .iter()
        .all(|tiered| tiered.record().identity.ssl != "0004"));
}

#[test]
fn every_model_keeps_probabilities_bounded_and_factors_capped() {
    let records = import(ROLL);
    for variant in ModelVariant::ordered() {
        let pipeline = ScoringPipeline::new(PipelineConfig::for_model(variant));
        let batch = pipeline.run(&records, &context());

        let mut previous = f64::INFINITY;
        for tiered in batch.records() {
            let outcome = &tiered.record().outcome;
            assert!(!outcome.probability.is_nan());
            assert!(
                pipeline.model().bounds().contains(outcome.probability),
                "{} produced {}",
                variant.label(),
                outcome.probability
            );
            assert!(outcome.probability <= previous, "batch is sorted descending");
            previous = outcome.probability;

            for contribution in outcome.contributions.iter() {
                assert!(contribution.value.abs() <= contribution.cap + 1e-12);
            }
        }
    }
}

#[test]
fn identical_records_share_a_single_tier() {
    let mut text = String::from("SSL,OWNERNAME,ASSESSMENT,TOTBALAMT,SALEDATE\n");
    for index in 0..10 {
        text.push_str(&format!("{index:04},DOE JANE,300000,1500,2010-05-01\n"));
    }
    let records = PropertyImporter::new(Delimiter::Comma)
        .from_reader(text.as_bytes())
        .expect("extract parses");

    let batch = ScoringPipeline::new(PipelineConfig::default()).run(&records, &context());
    let thresholds = batch.thresholds().expect("thresholds for non-empty batch");
    assert_eq!(thresholds.high, thresholds.medium);
    assert!(batch.records().iter().all(|tiered| tiered.tier() == Tier::High));

    let ssls: Vec<&str> = batch
        .records()
        .iter()
        .map(|tiered| tiered.record().identity.ssl.as_str())
        .collect();
    let expected: Vec<String> = (0..10).map(|index| format!("{index:04}")).collect();
    assert_eq!(ssls, expected);
}

#[test]
fn summary_and_csv_export_agree_with_batch() {
    let batch = ScoringPipeline::new(PipelineConfig::for_model(ModelVariant::Dashboard))
        .run(&import(ROLL), &context());
    let summary = BatchSummary::from_batch(&batch);
    assert_eq!(summary.total, 4);
    assert_eq!(
        Tier::ordered()
            .into_iter()
            .map(|tier| summary.tier_count(tier))
            .sum::<usize>(),
        4
    );

    let rows = export_rows(&batch);
    let mut buffer = Vec::new();
    write_csv(&mut buffer, batch.factor_kinds(), &rows).expect("csv renders");
    let text = String::from_utf8(buffer).expect("utf8 output");

    let mut lines = text.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("rank,ssl,"));
    assert!(header.contains("lead_score"));
    assert_eq!(lines.count(), 4);
}

#[test]
fn missing_extract_reports_source_unavailable() {
    let error = PropertyImporter::default()
        .from_path("does/not/exist/roll.tsv")
        .expect_err("missing file");

    match error {
        IngestError::SourceUnavailable { path, .. } => {
            assert!(path.ends_with("roll.tsv"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn dashboard_tolerates_absurd_year_built_and_undated_parcels() {
    let text = "SSL,OWNERNAME,ASSESSMENT,SALEDATE,AYB\n\
0001,DOE JANE,300000,,2147483648\n\
0002,ROE RICHARD,300000,1990-01-01,1950\n";
    let records = PropertyImporter::new(Delimiter::Comma)
        .from_reader(text.as_bytes())
        .expect("extract parses");

    let batch = ScoringPipeline::new(PipelineConfig::for_model(ModelVariant::Dashboard))
        .run(&records, &context());
    assert_eq!(batch.len(), 2);

    let undated = batch
        .records()
        .iter()
        .find(|tiered| tiered.record().identity.ssl == "0001")
        .expect("undated parcel scored");
    assert_eq!(undated.record().features.building_age, None);
    assert_eq!(
        undated
            .record()
            .outcome
            .contributions
            .value(FactorKind::LongTermOwnership),
        0.0
    );
    assert_eq!(batch.records()[0].record().identity.ssl, "0002");
}
