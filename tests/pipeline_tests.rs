use sheetstat::core::ingest::read_xlsx;
use sheetstat::core::{describe, profile};
use sheetstat::domain::ports::Clock;
use sheetstat::{
    AnalysisKind, AppConfig, Column, ColumnType, ExportFormat, Exporter, IngestionError,
    PipelineError, Report, Session, Summary, Table, Value,
};
use std::io::Read;

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> chrono::NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(15, 9, 26)
            .unwrap()
    }
}

fn session() -> Session<FixedClock> {
    Session::new(&AppConfig::default()).with_clock(FixedClock)
}

const CUSTOMERS: &str = "\u{feff}الاسم,المدينة,العمر,الرصيد,نشط\n\
أحمد,الرياض,34,1500.5,true\n\
سارة,جدة,,200.25,false\n\
Omar,NA,41,,TRUE\n\
ليلى,الدمام,29,0,false\n";

#[test]
fn test_profile_of_mixed_upload() {
    let mut session = session();
    let table = session.upload("customers.csv", CUSTOMERS.as_bytes()).unwrap();

    assert_eq!(table.shape(), (4, 5));
    assert_eq!(table.column_names(), vec!["الاسم", "المدينة", "العمر", "الرصيد", "نشط"]);
    assert_eq!(table.column("العمر").unwrap().dtype, ColumnType::Integer);
    assert_eq!(table.column("الرصيد").unwrap().dtype, ColumnType::Float);
    assert_eq!(table.column("نشط").unwrap().dtype, ColumnType::Boolean);

    let profile = session.profile().unwrap();
    assert_eq!(profile.numeric_column_count, 2);
    assert_eq!(profile.total_missing_count, 3);
    assert_eq!(
        profile.total_missing_count,
        profile
            .per_column_missing_count
            .iter()
            .map(|(_, n)| n)
            .sum::<usize>()
    );
    assert_eq!(profile.unique_count("المدينة"), Some(4));
    assert_eq!(profile.unique_count("نشط"), Some(2));
}

#[test]
fn test_one_to_five_statistics() {
    let mut session = session();
    session.upload("x.csv", b"x\n1\n2\n3\n4\n5\n").unwrap();

    let summary = session.summarize().unwrap();
    let stats = summary.stats().unwrap().column("x").unwrap();
    assert_eq!(stats.count, 5);
    assert_eq!(stats.mean, Some(3.0));
    assert!((stats.std.unwrap() - 1.5811388300841898).abs() < 1e-12);
    assert_eq!(stats.min, Some(1.0));
    assert_eq!(stats.q25, Some(2.0));
    assert_eq!(stats.q50, Some(3.0));
    assert_eq!(stats.q75, Some(4.0));
    assert_eq!(stats.max, Some(5.0));
}

#[test]
fn test_text_only_upload_has_no_statistics() {
    let mut session = session();
    session
        .upload("names.csv", "name,city\nA,الرياض\nB,جدة\n".as_bytes())
        .unwrap();

    assert_eq!(session.summarize().unwrap(), Summary::NoNumericColumns);
    let report = session.analyze(AnalysisKind::Descriptive).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"kind": "descriptive", "status": "no_numeric_columns"})
    );
    assert_eq!(session.profile().unwrap().numeric_column_count, 0);
}

#[test]
fn test_header_only_upload_is_zero_rows() {
    let mut session = session();
    let table = session.upload("empty.csv", b"a,b,c\n").unwrap();
    assert_eq!(table.shape(), (0, 3));

    let profile = session.profile().unwrap();
    assert_eq!((profile.row_count, profile.column_count), (0, 3));
    assert_eq!(profile.total_missing_count, 0);

    match session.analyze(AnalysisKind::MissingValues).unwrap() {
        Report::MissingValues(report) => assert!(report.is_clean()),
        other => panic!("unexpected report {:?}", other),
    }
}

#[test]
fn test_txt_upload_is_rejected() {
    let mut session = session();
    let err = session.upload("notes.txt", b"a,b\n1,2\n").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Ingestion(IngestionError::UnsupportedExtension { .. })
    ));
    assert!(matches!(
        session.analyze(AnalysisKind::Quick),
        Err(PipelineError::NoTable)
    ));
}

#[test]
fn test_csv_export_round_trip() {
    let mut session = session();
    let original = session.upload("customers.csv", CUSTOMERS.as_bytes()).unwrap();

    let payload = session.export(ExportFormat::Csv).unwrap();
    assert_eq!(payload.filename, "data_analysis_20250314_150926.csv");
    assert!(payload.bytes.starts_with(&[0xEF, 0xBB, 0xBF]));

    let mut reread = sheetstat::Session::new(&AppConfig::default());
    let table = reread.upload(&payload.filename, &payload.bytes).unwrap();

    assert_eq!(table.shape(), original.shape());
    assert_eq!(table.column_names(), original.column_names());
    for (a, b) in table.columns().iter().zip(original.columns()) {
        assert_eq!(a.dtype, b.dtype, "dtype of {}", a.name);
        assert_eq!(a.values, b.values, "values of {}", a.name);
    }
}

#[test]
fn test_json_export_round_trip() {
    let mut session = session();
    let original = session.upload("customers.csv", CUSTOMERS.as_bytes()).unwrap();

    let payload = session.export(ExportFormat::Json).unwrap();
    assert_eq!(payload.content_type, "application/json");
    let text = String::from_utf8(payload.bytes.clone()).unwrap();
    assert!(text.contains("\"المدينة\":null"));
    assert!(text.contains("أحمد"));

    let table = Table::from_json_records(&payload.bytes).unwrap();
    assert_eq!(table.shape(), original.shape());
    assert_eq!(table.column_names(), original.column_names());
    for (a, b) in table.columns().iter().zip(original.columns()) {
        assert_eq!(a.dtype, b.dtype, "dtype of {}", a.name);
        assert_eq!(a.values, b.values, "values of {}", a.name);
    }
}

#[test]
fn test_xlsx_export_round_trip() {
    let mut session = session();
    let original = session.upload("customers.csv", CUSTOMERS.as_bytes()).unwrap();

    let payload = session.export(ExportFormat::Xlsx).unwrap();
    assert_eq!(payload.filename, "data_analysis_20250314_150926.xlsx");

    let table = read_xlsx(&payload.bytes).unwrap();
    assert_eq!(table.shape(), original.shape());
    assert_eq!(table.column_names(), original.column_names());
    assert_eq!(table.column("العمر").unwrap().dtype, ColumnType::Integer);
    assert_eq!(
        table.column("الرصيد").unwrap().values,
        vec![
            Value::Float(1500.5),
            Value::Float(200.25),
            Value::Missing,
            Value::Float(0.0)
        ]
    );
    assert_eq!(
        table.column("المدينة").unwrap().values[0],
        Value::Text("الرياض".to_string())
    );

    assert_eq!(profile::profile(&table), profile::profile(&original));
    assert_eq!(describe::summarize(&table), describe::summarize(&original));
}

#[test]
fn test_quick_analysis_reports_mean_unique_count() {
    let mut session = session();
    session.upload("q.csv", b"a,b\n1,x\n2,x\n3,y\n4,\n").unwrap();

    match session.analyze(AnalysisKind::Quick).unwrap() {
        Report::Quick(quick) => {
            // a has 4 distinct values, b has x and y; the missing cell is not counted
            assert_eq!(quick.mean_unique_count, 3);
            assert_eq!((quick.row_count, quick.column_count), (4, 2));
        }
        other => panic!("unexpected report {:?}", other),
    }
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut text = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
    text
}

#[test]
fn test_datetime_column_in_every_export() {
    let stamp = chrono::NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap();
    let table = Table::new(vec![
        Column::new(
            "placed_at",
            ColumnType::DateTime,
            vec![Value::DateTime(stamp), Value::DateTime(stamp)],
        ),
        Column::new("qty", ColumnType::Integer, vec![Value::Int(3), Value::Int(5)]),
    ])
    .unwrap();
    let exporter = Exporter::new().with_clock(FixedClock);

    let csv = exporter.export(&table, ExportFormat::Csv).unwrap();
    let csv = String::from_utf8(csv.bytes).unwrap();
    assert!(csv.contains("2024-05-06 07:08:09,3"));

    let json = exporter.export(&table, ExportFormat::Json).unwrap();
    let json = String::from_utf8(json.bytes).unwrap();
    assert!(json.contains(r#""placed_at":"2024-05-06T07:08:09""#));

    let xlsx = exporter.export(&table, ExportFormat::Xlsx).unwrap();
    assert!(read_part(&xlsx.bytes, "xl/styles.xml").contains(r#"numFmtId="22""#));
    assert!(read_part(&xlsx.bytes, "xl/worksheets/sheet1.xml").contains(r#"<c r="A2" s="1">"#));

    let back = read_xlsx(&xlsx.bytes).unwrap();
    let placed_at = back.column("placed_at").unwrap();
    assert_eq!(placed_at.dtype, ColumnType::DateTime);
    assert_eq!(placed_at.values, vec![Value::DateTime(stamp), Value::DateTime(stamp)]);
}

#[test]
fn test_legacy_xls_upload() {
    let mut session = session();
    let table = session
        .upload("inventory.xls", include_bytes!("fixtures/inventory.xls"))
        .unwrap();

    assert_eq!(table.shape(), (3, 4));
    assert_eq!(table.column_names(), vec!["item", "qty", "price", "note"]);
    assert_eq!(
        table.column("item").unwrap().values[2],
        Value::Text("مسمار".to_string())
    );

    let qty = table.column("qty").unwrap();
    assert_eq!(qty.dtype, ColumnType::Integer);
    assert_eq!(qty.values, vec![Value::Int(100), Value::Missing, Value::Int(40)]);

    let price = table.column("price").unwrap();
    assert_eq!(price.dtype, ColumnType::Float);
    assert_eq!(price.values[2], Value::Missing);

    let note = table.column("note").unwrap();
    assert_eq!(
        note.values,
        vec![Value::Missing, Value::Text("ok".to_string()), Value::Missing]
    );

    let profile = session.profile().unwrap();
    assert_eq!(profile.total_missing_count, 4);
    assert_eq!(profile.numeric_column_count, 2);
}
