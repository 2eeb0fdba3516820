use std::io::Write;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tide_tales::data::loader::{LoadOptions, load_file};
use tide_tales::data::model::MappingOrigin;
use tide_tales::{Error, YearRange, build_series, classify, compute_fact_pack};

const GISTEMP_LIKE: &str = "\
Land-Ocean: Global Means
Year,Jan,Feb,J-D,D-N
1880,-.18,-.24,-.17,***
1881,-.19,-.14,-.09,-.12
1882,.16,.13,-.11,-.09
Year,Jan,Feb,J-D,D-N
1883,-.29,-.37,-.17,-.19
1884,-.13,-.08,***,-.28
";

fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn csv_file_to_fact_pack() {
    let (_dir, path) = write_temp("GLB.Ts+dSST.csv", GISTEMP_LIKE);
    let table = load_file(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.len(), 6);

    let classification = classify(&table).unwrap();
    assert_eq!(classification.origin, MappingOrigin::Heuristic);
    assert_eq!(classification.mapping.time_column, "Year");
    assert_eq!(classification.mapping.value_column, "J-D");

    let series = build_series(&table, &classification.mapping).unwrap();
    // Repeated header and the `***` row are gone.
    assert_eq!(series.len(), 4);
    assert_eq!(series.span(), Some(YearRange::new(1880, 1883)));

    let fp = compute_fact_pack(&series, series.span().unwrap()).unwrap();
    assert_eq!(fp.count(), 4);
    assert!((fp.start_value() - -0.17).abs() < 1e-12);
    assert!((fp.end_value() - -0.17).abs() < 1e-12);
    assert!((fp.peak() - -0.09).abs() < 1e-12);
    assert!((fp.trough() - -0.17).abs() < 1e-12);
}

#[test]
fn trailing_comma_rows_keep_year_and_temp() {
    let (_dir, path) = write_temp(
        "trailing.csv",
        "Year,Temp\n2000,0.40,\n2010,0.70,\n2020,1.00,\n",
    );
    let table = load_file(&path, &LoadOptions::default()).unwrap();
    let c = classify(&table).unwrap();
    assert_eq!(c.mapping.time_column, "Year");
    assert_eq!(c.mapping.value_column, "Temp");
    assert_eq!(build_series(&table, &c.mapping).unwrap().len(), 3);
}

#[test]
fn year_and_temp_reference_case() {
    let (_dir, path) = write_temp(
        "series.csv",
        "Notes,Year,Temp\nbaseline,2000,0.40\n,2010,0.70\nlatest,2020,1.00\n",
    );
    let table = load_file(&path, &LoadOptions::default()).unwrap();
    let c = classify(&table).unwrap();
    assert_eq!(c.mapping.time_column, "Year");
    assert_eq!(c.mapping.value_column, "Temp");

    let series = build_series(&table, &c.mapping).unwrap();
    let fp = compute_fact_pack(&series, YearRange::new(2000, 2020)).unwrap();
    assert_eq!(fp.count(), 3);
    assert!((fp.net_change() - 0.60).abs() < 1e-9);
    assert!((fp.slope() - 0.03).abs() < 1e-9);
    assert!((fp.intercept() - -59.6).abs() < 1e-9);

    assert!(matches!(
        compute_fact_pack(&series, YearRange::new(2001, 2009)),
        Err(Error::EmptyRange { .. })
    ));
    assert!(matches!(
        compute_fact_pack(&series, YearRange::new(2010, 2010)),
        Err(Error::DegenerateFit { .. })
    ));
}

#[test]
fn single_column_csv_is_rejected() {
    let (_dir, path) = write_temp("one.csv", "Year\n2000\n2001\n");
    let table = load_file(&path, &LoadOptions::default()).unwrap();
    assert_eq!(
        classify(&table).unwrap_err(),
        Error::InsufficientColumns { found: 1 }
    );
}

#[test]
fn parquet_file_loads_as_raw_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("co2.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("site", DataType::Utf8, false),
        Field::new("decade", DataType::Int64, false),
        Field::new("ppm", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["MLO", "MLO", "MLO"])),
            Arc::new(Int64Array::from(vec![1980, 1990, 2000])),
            Arc::new(Float64Array::from(vec![Some(338.8), None, Some(369.7)])),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = load_file(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.column_names(), vec!["site", "decade", "ppm"]);

    let c = classify(&table).unwrap();
    // No time keyword: the year-range fallback finds `decade`.
    assert_eq!(c.mapping.time_column, "decade");
    assert_eq!(c.mapping.value_column, "ppm");
    assert_eq!(c.labels.unit, "ppm");

    let series = build_series(&table, &c.mapping).unwrap();
    assert_eq!(series.len(), 2);
}
