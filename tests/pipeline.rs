//! End-to-end runs over small carrier files

use std::fs::File;

use approx::assert_relative_eq;
use experience_engine::export::{export_to_path, read_processed_csv, ExportFormat};
use experience_engine::ingest::TextEncoding;
use experience_engine::{
    Configuration, EngineError, EngineReport, ExperienceEngine, SchemaType, ValidationOptions,
};

fn engine() -> ExperienceEngine {
    ExperienceEngine::new(Configuration::default()).unwrap()
}

fn claims_report(report: &EngineReport) -> &experience_engine::pipeline::ClaimsReport {
    report.as_claims().expect("expected a claims report")
}

#[test]
fn medical_plus_rx_becomes_total() {
    let input = b"Claim Date,Claimant ID,Medical,Rx\n01/15/2024,C-1,\"$1,200.00\",$300\n";
    let report = engine().process(input).unwrap();
    let r = claims_report(&report);

    assert_eq!(r.claims.len(), 1);
    let claim = &r.claims[0].claim;
    assert_eq!(claim.total_amount, 1500.0);
    assert_eq!(claim.month_key, "2024-01");
    assert!(r.validation.is_valid);
}

#[test]
fn large_claim_hits_stop_loss_with_defaults() {
    let input = b"Claim Date,Claimant ID,Total Paid\n03/01/2024,C-1,\"$150,000\"\n03/09/2024,C-2,900\n";
    let report = engine().process(input).unwrap();
    let r = claims_report(&report);

    let big = &r.claims[0];
    assert!(big.stop_loss_triggered);
    assert_relative_eq!(big.stop_loss_excess, 50_000.0);
    assert_relative_eq!(big.stop_loss_reimbursement, 45_000.0);
    assert_relative_eq!(big.net_paid, 105_000.0);

    assert_eq!(r.metrics.claims_over_threshold, 1);
    assert_relative_eq!(r.metrics.total_net_paid, 105_900.0);
}

#[test]
fn blank_date_row_is_excluded_but_processing_continues() {
    let input = b"Claim Date,Claimant ID,Medical\n01/15/2024,A,100\n,B,200\n02/03/2024,C,300\n";
    let report = engine().process(input).unwrap();
    let r = claims_report(&report);

    assert_eq!(r.claims.len(), 2);
    assert_eq!(r.validation.total_rows, 3);
    assert_eq!(r.validation.valid_rows, 2);
    assert_eq!(r.validation.invalid_rows, 1);
    assert_eq!(r.validation.errors[0].row, 2);
    assert_eq!(r.validation.completeness.missing_required, 1);
    assert!(!r.validation.is_valid);
    assert_eq!(r.metrics.month_sequence.len(), 2);
}

#[test]
fn issue_rows_count_data_records_not_blank_lines() {
    let input = b"Claim Date,Claimant ID,Medical\n01/15/2024,A,100\n\n,,\n,B,200\n";
    let report = engine().process(input).unwrap();
    let r = claims_report(&report);

    assert_eq!(r.validation.total_rows, 2);
    assert_eq!(r.validation.errors.len(), 1);
    assert_eq!(r.validation.errors[0].row, 2);
    assert_eq!(r.validation.errors[0].value, "");
}

#[test]
fn zero_premium_month_has_no_loss_ratio() {
    let input = b"Month,Category,Amount,Claims,Premium\n2024-01,Medical,500,500,0\n";
    let report = engine().process(input).unwrap();
    let r = report.as_experience().unwrap();

    assert_eq!(report.schema_type(), SchemaType::CostCategory);
    assert_eq!(r.summaries[0].claims, 500.0);
    assert_eq!(r.summaries[0].loss_ratio, None);
}

#[test]
fn premium_column_does_not_hide_claims_labels() {
    let input = b"Month,Category,Amount,Premium\n2024-01,Medical Claims,500,\n2024-01,Rx Claims,100,1000\n";
    let report = engine().process(input).unwrap();
    let s = &report.as_experience().unwrap().summaries[0];

    assert_eq!(s.claims, 600.0);
    assert_eq!(s.premium, 1000.0);
    assert_relative_eq!(s.loss_ratio.unwrap(), 0.6);
}

#[test]
fn rolling_loss_ratio_defined_from_twelfth_month() {
    let mut input = String::from("Month,Category,Amount\n");
    for m in 1..=13 {
        let month = if m <= 12 { format!("{:02}/2023", m) } else { "Jan 2024".to_string() };
        input.push_str(&format!("{},Medical Claims,900\n{},Premium,1000\n", month, month));
    }
    let report = engine().process(input.as_bytes()).unwrap();
    let summaries = &report.as_experience().unwrap().summaries;

    assert_eq!(summaries.len(), 13);
    assert!(summaries[..11].iter().all(|s| s.rolling_12_loss_ratio.is_none()));
    assert_relative_eq!(summaries[11].rolling_12_loss_ratio.unwrap(), 0.9);
    assert_eq!(summaries[12].month, "2024-01");
}

#[test]
fn missing_required_column_blocks_until_overridden() {
    let input = b"Month,Category,Notes\n2024-01,Rx Claims,x\n2024-02,Rx Claims,y\n";

    let blocked = engine().process(input).unwrap();
    let r = blocked.as_experience().unwrap();
    assert!(r.rows.is_empty());
    assert_eq!(r.validation.errors.len(), 1);
    assert_eq!(r.validation.errors[0].row, 0);
    assert_eq!(r.validation.errors[0].field, "amount");

    let lenient = engine()
        .with_validation_options(ValidationOptions {
            allow_missing_required: true,
        })
        .process(input)
        .unwrap();
    let r = lenient.as_experience().unwrap();
    assert_eq!(r.rows.len(), 2);
    assert!(r.rows.iter().all(|row| row.amount == 0.0));
    assert!(!r.validation.is_valid);
}

#[test]
fn unknown_headers_are_a_structural_error() {
    let err = engine().process(b"alpha,beta\n1,2\n").unwrap_err();
    assert!(matches!(err, EngineError::UnknownSchema { .. }));

    assert!(matches!(engine().process(b""), Err(EngineError::EmptyInput)));
    assert!(matches!(
        engine().process(b"Claim Date,Claimant ID\n"),
        Err(EngineError::NoDataRows)
    ));
}

#[test]
fn semicolon_windows_1252_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("carrier.csv");
    let mut bytes = b"Claim Date;Claimant ID;Provider;Medical\r\n".to_vec();
    bytes.extend_from_slice(b"01/15/2024;A;Caf\xe9 Clinic;100\r\n");
    std::fs::write(&path, &bytes).unwrap();

    let report = engine().with_chunk_size(8).process_file(&path).unwrap();
    let r = claims_report(&report);
    assert_eq!(r.source.delimiter, ';');
    assert_eq!(r.source.encoding, TextEncoding::Windows1252);
    assert_eq!(r.claims[0].claim.provider.as_deref(), Some("Caf\u{e9} Clinic"));
}

#[test]
fn configuration_drives_stop_loss_and_line_items() {
    let config = Configuration::from_json_str(
        r#"{
            "stop_loss_threshold": 1000,
            "stop_loss_reimbursement_rate": 0.5,
            "member_count": 10,
            "line_items": [
                {"id": "aso", "label": "ASO Fee", "source": "fixed", "amount": 1200, "basis": "annual"},
                {"id": "net", "label": "Net Claims", "source": "claims", "field": "net_paid"}
            ]
        }"#,
    )
    .unwrap();
    let input = b"Claim Date,Claimant ID,Medical\n01/10/2024,A,3000\n02/10/2024,B,500\n03/10/2024,A,100\n";
    let report = ExperienceEngine::new(config).unwrap().process(input).unwrap();
    let r = claims_report(&report);

    assert_relative_eq!(r.claims[0].net_paid, 2000.0);
    assert_eq!(r.metrics.claimant_count, 2);

    let aso = &r.line_items[0];
    assert_eq!(aso.monthly.len(), 3);
    assert_relative_eq!(aso.annual_total, 1200.0, epsilon = 1e-9);

    let net = &r.line_items[1];
    let monthly: Vec<f64> = net.monthly.iter().map(|m| m.amount).collect();
    assert_eq!(monthly, vec![2000.0, 500.0, 100.0]);
}

#[test]
fn exported_claims_read_back_unchanged() {
    let input = b"Claim ID,Claim Date,Claimant ID,Provider,Total Paid\nX1,01/15/2024,A,\"Smith, \"\"Doc\"\"\",250000\n";
    let report = engine().process(input).unwrap();
    let claims = &claims_report(&report).claims;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claims.csv");
    export_to_path(&path, claims, ExportFormat::Csv).unwrap();
    let back = read_processed_csv(File::open(&path).unwrap()).unwrap();
    assert_eq!(&back, claims);
    assert_eq!(back[0].claim.provider.as_deref(), Some("Smith, \"Doc\""));
}
