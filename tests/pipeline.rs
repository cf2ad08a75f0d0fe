use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

use hl_freq::Error;
use hl_freq::config::PipelineConfig;
use hl_freq::data::loader::load_table;
use hl_freq::data::model::TargetGrid;
use hl_freq::data::table::CellValue;
use hl_freq::data::writer::OutputFormat;
use hl_freq::pipeline::naming::OutputNamer;
use hl_freq::pipeline::{RunContext, stages};

fn context(root: &Path, format: OutputFormat) -> RunContext {
    let mut config = PipelineConfig::default();
    config.io.output_format = format;
    config.extract.targets = TargetGrid::range(50.0, 300.0, 50.0);
    RunContext {
        root: root.to_path_buf(),
        namer: OutputNamer::new("EXP1", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
        config,
    }
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

/// HL1: good csv, corrupt json, good csv. HL2: one parquet file.
fn experiment_tree(root: &Path) {
    let hl1 = root.join("HL1");
    let hl2 = root.join("HL2");
    std::fs::create_dir_all(&hl1).unwrap();
    std::fs::create_dir_all(&hl2).unwrap();
    std::fs::create_dir_all(root.join("Notes")).unwrap();

    write(
        &hl1.join("a_subject.csv"),
        "Frequency (Hz),dBSPL\n48,60\n52,62\n99,70\n151,71\n204,72\n298,80\n",
    );
    write(&hl1.join("b_subject.json"), "{ this is not a workbook");
    write(
        &hl1.join("c_subject.csv"),
        "X,Y\n50,10\n100,20\n150,30\n200,40\n250,50\n300,60\n",
    );

    let schema = Arc::new(Schema::new(vec![
        Field::new("Freq", DataType::Float64, false),
        Field::new("Magnitude", DataType::Float64, false),
        Field::new("Sample", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(vec![45.0, 105.0, 160.0, 240.0, 310.0])),
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
            Arc::new(Int64Array::from(vec![0, 1, 2, 3, 4])),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(hl2.join("d_subject.parquet")).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn classify_continues_past_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    experiment_tree(dir.path());
    let ctx = context(dir.path(), OutputFormat::Csv);

    let report = stages::classify_raw(&ctx);

    assert_eq!(report.attempted(), 4);
    let ok: Vec<PathBuf> = report.succeeded.iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(
        ok,
        vec![
            dir.path().join("HL1").join("a_subject.csv"),
            dir.path().join("HL1").join("c_subject.csv"),
            dir.path().join("HL2").join("d_subject.parquet"),
        ]
    );
    assert_eq!(report.failed.len(), 1);
    let (failed_path, err) = &report.failed[0];
    assert_eq!(failed_path, &dir.path().join("HL1").join("b_subject.json"));
    assert!(matches!(err, Error::Io { .. }));

    let (_, first) = &report.succeeded[0];
    assert_eq!(
        names(&first.outputs),
        vec![
            "EXP1_20240601_HL1_a_subject_freq50_Detailed_Results.csv",
            "EXP1_20240601_HL1_a_subject_freq50_Grouped_Results.csv",
        ]
    );
    let stats = first.groups.get(50).unwrap();
    assert_eq!((stats.mean_magnitude, stats.count), (61.0, 2));

    // Corrupt input left nothing behind.
    let written = std::fs::read_dir(dir.path().join("classified_frequencies"))
        .unwrap()
        .count();
    assert_eq!(written, 6);
}

#[test]
fn extract_then_reclassify_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    experiment_tree(dir.path());
    let mut ctx = context(dir.path(), OutputFormat::Json);
    ctx.config.reclassify.base = 100;

    let extracted = stages::extract_grid(&ctx);
    assert_eq!(extracted.succeeded.len(), 3);
    assert_eq!(extracted.failed.len(), 1);

    let (_, parquet) = &extracted.succeeded[2];
    let actual: Vec<f64> = parquet.rows.iter().map(|r| r.actual_frequency).collect();
    assert_eq!(actual, vec![45.0, 105.0, 160.0, 160.0, 240.0, 310.0]);
    assert_eq!(
        names(&parquet.outputs),
        vec!["EXP1_20240601_HL2_d_subject_magnitude.json"]
    );

    let table = load_table(&parquet.outputs[0]).unwrap();
    assert_eq!(table.headers, vec!["Freq", "Magnitude", "Target_Frequency"]);
    assert_eq!(table.cell(0, 2), &CellValue::Float(50.0));

    let reclassified = stages::reclassify_extracted(&ctx);
    assert_eq!(reclassified.failed.len(), 0);
    assert_eq!(reclassified.succeeded.len(), 3);

    let (path, outcome) = reclassified
        .succeeded
        .iter()
        .find(|(p, _)| p.to_string_lossy().contains("d_subject"))
        .unwrap();
    assert!(path.starts_with(dir.path().join("extracted_frequencies")));
    // 45 → 0, 105 → 100, 160 → 200 (x2), 240 → 200, 310 → 300
    let keys: Vec<i64> = outcome.groups.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![0, 100, 200, 300]);
    assert_eq!(outcome.groups.get(100).unwrap().count, 1);
    let bucket = outcome.groups.get(200).unwrap();
    assert_eq!(bucket.count, 3);
    assert_eq!(bucket.mean_magnitude, 10.0 / 3.0);
    assert_eq!(
        names(&outcome.outputs),
        vec!["EXP1_20240601_HL2_EXP1_20240601_HL2_d_subject_magnitude_reclass100.json"]
    );
}

#[test]
fn missing_condition_folders_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), OutputFormat::Csv);
    let report = stages::classify_raw(&ctx);
    assert_eq!(report.attempted(), 0);
}

#[test]
fn missing_extracted_folder_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), OutputFormat::Csv);
    let report = stages::reclassify_extracted(&ctx);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed[0].1, Error::Io { .. }));
}
