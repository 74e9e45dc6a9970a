//! Estimate a small universe and export it end to end.

use chrono::{Months, NaiveDate};
use loadings_data::{FundSeries, FundUniverse, Observation};
use loadings_output::{ExportFormat, Exporter, LoadingsTable, UniverseSummary};
use loadings_regression::{EstimationConfig, Estimator, UniverseRun};

fn names() -> Vec<String> {
    vec!["Mkt-RF".to_string(), "SMB".to_string()]
}

fn series(fund: &str, n: usize) -> FundSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
    let obs = (0..n)
        .map(|i| {
            let t = i as f64;
            let mkt = (t * 0.7).sin() * 0.04;
            let smb = (t * 1.3).cos() * 0.02;
            let noise = if i % 3 == 0 { 0.002 } else { -0.001 };
            Observation::new(
                start + Months::new(i as u32),
                0.001 + 1.1 * mkt - 0.3 * smb + noise,
                vec![mkt, smb],
            )
        })
        .collect();
    FundSeries::new(fund.into(), 2, obs).unwrap()
}

fn run() -> UniverseRun {
    let universe = FundUniverse::new(
        names(),
        vec![series("Alpha", 14), series("Beta", 12), series("Gamma", 4)],
    )
    .unwrap();
    Estimator::new(EstimationConfig::new(10, names()))
        .unwrap()
        .estimate_universe(&universe)
        .unwrap()
}

#[test]
fn test_csv_export_of_universe_run() {
    let table = LoadingsTable::from_run(&run());
    let csv = table.export_to_string(ExportFormat::Csv).unwrap();

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "Date", "Fund", "const", "Mkt-RF", "SMB", "const_se", "Mkt-RF_se", "SMB_se",
            "r_squared"
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    // Alpha: 14 - 10 + 1 windows, Beta: 3, Gamma: none.
    assert_eq!(rows.len(), 8);
    assert!(rows[..5].iter().all(|r| &r[1] == "Alpha"));
    assert!(rows[5..].iter().all(|r| &r[1] == "Beta"));
    assert_eq!(&rows[0][0], "2020-10-31");
    assert_eq!(&rows[4][0], "2021-02-28");

    for row in &rows {
        let beta: f64 = row[3].parse().unwrap();
        assert!((beta - 1.1).abs() < 0.2);
        let se: f64 = row[6].parse().unwrap();
        assert!(se >= 0.0);
    }
}

#[test]
fn test_json_export_to_file() {
    let table = LoadingsTable::from_run(&run());
    let path = std::env::temp_dir().join(format!("loadings-export-{}.json", std::process::id()));
    table.export_to_file(&path, ExportFormat::Json).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["records"].as_array().unwrap().len(), 8);
    assert_eq!(value["factor_names"][1], "SMB");
}

#[test]
fn test_summary_reports_funds_without_output() {
    let summary = UniverseSummary::from_run(&run());
    assert_eq!(summary.funds.len(), 3);
    assert_eq!(summary.total_records(), 8);
    assert_eq!(summary.funds_without_output(), 1);

    let text = summary.to_ascii_table();
    assert!(text.contains("Gamma"));
    assert!(text.contains("short (4 obs)"));
}
