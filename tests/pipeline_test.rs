use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use sales_insights::config::Settings;
use sales_insights::dashboard::{DashboardReport, SummaryFilters};
use sales_insights::data::aggregate::{conversion, count_by, sum_by_ranked};
use sales_insights::data::filter::{filter, filtered_indices, PredicateSet};
use sales_insights::data::loader::{load_file, load_file_with_warnings};
use sales_insights::data::{Category, DataLoadError, Measure, Opportunity, Table, YearField};

const CSV: &str = "\
Account,Opportunity Owner,Stage,Type,Amount,Created Date,Close Date,Region
Acme,Ana,Closed Won,New Business,1200.50,2022-03-01,2022-04-15,EU
Globex,Ben,Closed Lost,Renewal,800,2023-01-10,2023-02-01,US
Initech,Ana,Negotiate,New Business,450,2023-05-20,,US
Acme,Cy,Closed Won,Upsell,300,2021-11-30,2022-01-04,EU
Hooli,Ben,Cancelled,Renewal,50,not recorded,2023-07-07,APAC
Globex,Dee,Proposal,Upsell,975.25,2023-08-08,,EU
";

fn write_csv(dir: &Path) -> PathBuf {
    let path = dir.join("opportunities.csv");
    let mut file = File::create(&path).unwrap();
    file.write_all(CSV.as_bytes()).unwrap();
    path
}

fn amounts(table: &Table) -> Vec<f64> {
    table.iter().map(Opportunity::amount).collect()
}

#[test]
fn load_derives_fields_and_keeps_bad_dates() {
    let dir = tempfile::tempdir().unwrap();
    let (table, warnings) = load_file_with_warnings(&write_csv(dir.path())).unwrap();

    assert_eq!(table.len(), 6);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].row, 4);

    let first = &table.rows()[0];
    assert_eq!(first.sales_cycle_duration(), Some(45));
    assert_eq!(first.year_created(), Some(2022));
    assert!(first.won());

    let open = &table.rows()[2];
    assert_eq!(open.close_date(), None);
    assert_eq!(open.sales_cycle_duration(), None);
    assert_eq!(open.year_closed(), None);

    let hooli = &table.rows()[4];
    assert_eq!(hooli.created_date(), None);
    assert_eq!(hooli.year_closed(), Some(2023));
    assert_eq!(hooli.sales_cycle_duration(), None);
}

#[test]
fn filter_is_an_ordered_subset_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write_csv(dir.path())).unwrap();

    let preds = PredicateSet::new()
        .with_membership(Category::Type, ["New Business", "Upsell"])
        .with_range(Measure::Amount, 300.0, 1000.0);
    let filtered = filter(&table, &preds);

    let indices = filtered_indices(&table, &preds);
    assert_eq!(indices, vec![2, 3, 5]);
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
    for (row, &i) in filtered.iter().zip(&indices) {
        assert_eq!(row, &table.rows()[i]);
    }

    assert_eq!(filter(&table, &preds), filtered);
    assert_eq!(table.len(), 6, "source table is untouched");
}

#[test]
fn empty_stage_selection_yields_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write_csv(dir.path())).unwrap();

    let preds = PredicateSet::new().with_membership(Category::Stage, Vec::<String>::new());
    let filtered = filter(&table, &preds);
    assert!(filtered.is_empty());

    let summary = conversion(&filtered);
    assert_eq!((summary.row_count, summary.matched, summary.ratio), (0, 0, None));
    assert!(count_by(&filtered, Category::Stage).is_empty());
}

#[test]
fn full_observed_range_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write_csv(dir.path())).unwrap();

    let (lo, hi) = table.measure_bounds(Measure::Amount).unwrap();
    let preds = PredicateSet::new()
        .with_membership(Category::Stage, table.unique(Category::Stage))
        .with_membership(Category::Account, table.unique(Category::Account))
        .with_range(Measure::Amount, lo, hi);
    assert_eq!(filter(&table, &preds), table);
}

#[test]
fn closed_year_filter_excludes_open_opportunities() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write_csv(dir.path())).unwrap();

    let (lo, hi) = table.year_bounds(YearField::Closed).unwrap();
    let preds = PredicateSet::new().with_year_range(YearField::Closed, lo, hi);
    assert_eq!(amounts(&filter(&table, &preds)), vec![1200.5, 800.0, 300.0, 50.0]);
}

#[test]
fn ranked_sums_conserve_the_total() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write_csv(dir.path())).unwrap();
    let filtered = filter(&table, &SummaryFilters::defaults(&table).predicates());

    let by_account = sum_by_ranked(&filtered, Category::Account, Measure::Amount, None);
    let grouped: f64 = by_account.iter().map(|c| c.value).sum();
    let total: f64 = filtered.iter().map(Opportunity::amount).sum();
    assert!((grouped - total).abs() < 1e-9);
    assert_eq!(by_account[0].category, "Acme");
    assert_eq!(by_account[0].value, 1500.5);
}

#[test]
fn report_serializes_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let table = load_file(&write_csv(dir.path())).unwrap();
    let report = DashboardReport::with_defaults(&table, &Settings::default());

    // Proposal is not one of the default summary stages.
    assert_eq!(report.general_summary.filtered_rows, 5);
    // Hooli has no created year.
    assert_eq!(report.insights.filtered_rows, 5);
    assert_eq!(report.insights.indicators.row_count, 6);
    assert_eq!(report.insights.indicators.matched, 2);
    assert_eq!(report.performance.owner_ranking[0].category, "Ana");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["total_rows"], 6);
    assert_eq!(json["insights"]["indicators"]["ratio"], 2.0 / 6.0);
    assert_eq!(json["general_summary"]["stage_counts"][0]["category"], "Closed Won");
}

#[test]
fn parquet_with_typed_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opportunities.parquet");

    let text = |values: &[&str]| -> ArrayRef { Arc::new(StringArray::from(values.to_vec())) };
    let schema = Arc::new(Schema::new(vec![
        Field::new("Account", DataType::Utf8, false),
        Field::new("Opportunity Owner", DataType::Utf8, false),
        Field::new("Stage", DataType::Utf8, false),
        Field::new("Type", DataType::Utf8, true),
        Field::new("Amount", DataType::Int64, false),
        Field::new("Created Date", DataType::Date32, true),
        Field::new("Close Date", DataType::Utf8, true),
    ]));
    // 19_358 days after the epoch is 2023-01-01.
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(&["Acme", "Globex"]),
            text(&["Ana", "Ben"]),
            text(&["Closed Won", "Open"]),
            Arc::new(StringArray::from(vec![Some("Renewal"), None])),
            Arc::new(Int64Array::from(vec![250, 40])),
            Arc::new(Date32Array::from(vec![Some(19_358), None])),
            Arc::new(StringArray::from(vec![Some("2023-01-31"), Some("soon")])),
        ],
    )
    .unwrap();

    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let (table, warnings) = load_file_with_warnings(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(warnings.len(), 1);

    let first = &table.rows()[0];
    assert_eq!(first.amount(), 250.0);
    assert_eq!(first.year_created(), Some(2023));
    assert_eq!(first.sales_cycle_duration(), Some(30));

    let second = &table.rows()[1];
    assert_eq!(second.kind(), None);
    assert_eq!(second.created_date(), None);
    assert_eq!(second.close_date(), None);
}

#[test]
fn parquet_missing_columns_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("Account", DataType::Utf8, false),
        Field::new("Amount", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["Acme"])),
            Arc::new(Float64Array::from(vec![1.0])),
        ],
    )
    .unwrap();
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    match load_file(&path) {
        Err(DataLoadError::MissingColumns { missing }) => assert_eq!(missing.len(), 5),
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}
