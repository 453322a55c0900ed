#![cfg(feature = "cli")]

use sheetstat::{AnalysisEngine, AnalysisKind, AnalysisRequest, AppConfig, ExportFormat, LocalStorage, Report};
use std::io::Read;
use tempfile::TempDir;

#[tokio::test]
async fn test_end_to_end_xlsx_export() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    std::fs::write(
        input_dir.path().join("inventory.csv"),
        "item,qty,price\nbolt,100,0.25\nnut,,0.1\n\"washer, steel\",40,\n",
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.export.label = "inventory".to_string();
    config.export.sheet_name = "Sheet1".to_string();
    config.export.output_path = output_path.clone();

    let source = LocalStorage::new(input_dir.path().to_str().unwrap().to_string());
    let sink = LocalStorage::new(output_path.clone());
    let mut engine = AnalysisEngine::new(source, sink, &config);

    let outcome = engine
        .run(&AnalysisRequest {
            input: "inventory.csv".to_string(),
            analysis: Some(AnalysisKind::Descriptive),
            export: Some(ExportFormat::Xlsx),
        })
        .await
        .unwrap();

    assert_eq!(outcome.profile.row_count, 3);
    assert_eq!(outcome.preview.rows.len(), 3);
    match outcome.report {
        Some(Report::Descriptive(summary)) => {
            let stats = summary.stats().unwrap();
            assert_eq!(stats.columns.len(), 2);
            assert_eq!(stats.column("qty").unwrap().mean, Some(70.0));
        }
        other => panic!("unexpected report {:?}", other),
    }

    // Verify output file exists
    let exported = outcome.exported.unwrap();
    assert!(exported.filename.starts_with("inventory_"));
    assert!(exported.filename.ends_with(".xlsx"));
    let full_path = std::path::Path::new(&output_path).join(&exported.filename);
    assert!(full_path.exists());

    // Verify workbook content
    let zip_data = std::fs::read(&full_path).unwrap();
    let cursor = std::io::Cursor::new(zip_data);
    let mut archive = zip::ZipArchive::new(cursor).unwrap();

    let mut workbook = String::new();
    archive
        .by_name("xl/workbook.xml")
        .unwrap()
        .read_to_string(&mut workbook)
        .unwrap();
    assert!(workbook.contains("name=\"Sheet1\""));

    let mut shared = String::new();
    archive
        .by_name("xl/sharedStrings.xml")
        .unwrap()
        .read_to_string(&mut shared)
        .unwrap();
    assert!(shared.contains("washer, steel"));
}

#[tokio::test]
async fn test_missing_input_is_io_error() {
    let dir = TempDir::new().unwrap();
    let storage = || LocalStorage::new(dir.path().to_str().unwrap().to_string());

    let mut engine = AnalysisEngine::new(storage(), storage(), &AppConfig::default());
    let err = engine
        .run(&AnalysisRequest {
            input: "absent.csv".to_string(),
            analysis: None,
            export: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, sheetstat::PipelineError::IoError(_)));
    assert_eq!(err.severity(), sheetstat::utils::error::ErrorSeverity::Critical);
}
