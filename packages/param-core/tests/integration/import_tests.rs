//! File import through the database facade.

use std::collections::HashSet;
use std::io::{self, Read};

use ntest::timeout;

use param_core::reconcile::MatchKind;
use param_core::record::Value;
use param_core::schema::{Column, ColumnType};
use param_core::{ErrorKind, ParamError};

use super::helpers::{admin, memory_db, parts_page};

struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated upload"))
    }
}

#[timeout(1000)]
#[test]
fn test_csv_import_end_to_end() {
    let db = memory_db();
    let session = admin(&db);
    let page = db.create_page(&session, "Simple").unwrap();
    db.update_columns(
        &session,
        &page.id,
        vec![
            Column::new("name", "", ColumnType::Text),
            Column::new("qty", "", ColumnType::Number),
        ],
    )
    .unwrap();

    let report = db
        .import_file(&session, &page.id, "items.csv", "name,qty\nWidget,5\nGadget,abc".as_bytes())
        .unwrap();
    assert_eq!(report.imported, 2);

    let records = db.records(&page.id).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("name"), Some(&Value::from("Widget")));
    assert_eq!(records[0].get("qty"), Some(&Value::Number(5.0)));
    assert_eq!(records[1].get("name"), Some(&Value::from("Gadget")));
    assert_eq!(records[1].get("qty"), Some(&Value::Null));
}

#[timeout(1000)]
#[test]
fn test_import_appends_with_unique_ids() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    let csv = "Name,Quantity\nBolt,1\nBolt,1\nBolt,1";

    db.import_file(&session, &page.id, "a.csv", csv.as_bytes()).unwrap();
    let first = db.records(&page.id).unwrap();
    db.import_file(&session, &page.id, "b.csv", csv.as_bytes()).unwrap();
    let second = db.records(&page.id).unwrap();

    assert_eq!(second.len(), 6);
    assert_eq!(&second[..3], &first[..]);
    let ids: HashSet<&str> = second.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 6);
}

#[timeout(1000)]
#[test]
fn test_json_import_fuzzy_headers() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    let json = r#"[
        {"id": "legacy-1", "part name": "Washer", "QTY": "12", "grade": "B", "unused": 1},
        {"part name": "Spacer", "QTY": 3.5}
    ]"#;

    let report = db
        .import_file(&session, &page.id, "legacy.json", json.as_bytes())
        .unwrap();
    assert_eq!(report.imported, 2);
    let kinds: Vec<(&str, MatchKind)> = report
        .mapping
        .iter()
        .map(|m| (m.column_key.as_str(), m.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("name", MatchKind::Fuzzy),
            ("qty", MatchKind::Fuzzy),
            ("grade", MatchKind::Exact)
        ]
    );

    let records = db.records(&page.id).unwrap();
    assert_ne!(records[0].id, "legacy-1");
    assert_eq!(records[0].get("name"), Some(&Value::from("Washer")));
    assert_eq!(records[0].get("qty"), Some(&Value::Number(12.0)));
    assert_eq!(records[1].get("qty"), Some(&Value::Number(3.5)));
    assert_eq!(records[1].get("grade"), Some(&Value::from("")));
    assert_eq!(records[1].get("photo"), Some(&Value::from("")));
    assert!(records[0].get("unused").is_none());
}

#[timeout(1000)]
#[test]
fn test_failures_leave_records_unchanged() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    db.import_file(&session, &page.id, "seed.csv", "Name\nBolt".as_bytes())
        .unwrap();
    let before = db.records(&page.id).unwrap();

    let cases: Vec<(&str, &[u8], ErrorKind)> = vec![
        ("data.xlsx", &b"Name\nNut"[..], ErrorKind::UnsupportedFormat),
        ("data.json", &br#"{"a":1}"#[..], ErrorKind::ParseFailure),
        ("data.json", &b"[{\"a\":"[..], ErrorKind::ParseFailure),
        ("data.csv", &b"Name\n\"Nut"[..], ErrorKind::ParseFailure),
        ("data.csv", &b"\n \n"[..], ErrorKind::ParseFailure),
        ("data.csv", &[0xffu8, 0x00, 0xfe][..], ErrorKind::ReadFailure),
    ];
    for (name, bytes, kind) in cases {
        let err = db.import_file(&session, &page.id, name, bytes).unwrap_err();
        assert_eq!(err.kind(), kind, "{}: {}", name, err);
        assert!(err.is_import_failure());
        assert_eq!(db.records(&page.id).unwrap(), before);
    }

    let err = db
        .import_file(&session, &page.id, "data.csv", BrokenReader)
        .unwrap_err();
    assert!(matches!(err, ParamError::ReadFailure(_)));
    assert_eq!(db.records(&page.id).unwrap(), before);
}

#[timeout(1000)]
#[test]
fn test_mismatched_rows_skipped_not_failed() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    let report = db
        .import_file(
            &session,
            &page.id,
            "ragged.csv",
            "Name,Quantity\nBolt,1\nNut\nPin,2,extra\nWasher,3".as_bytes(),
        )
        .unwrap();
    assert_eq!(report.imported, 2);
}

#[timeout(1000)]
#[test]
fn test_import_into_missing_page() {
    let db = memory_db();
    let session = admin(&db);
    assert!(matches!(
        db.import_file(&session, "nope", "a.csv", "x\n1".as_bytes()),
        Err(ParamError::PageNotFound { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_id_header_never_replaces_record_ids() {
    let db = memory_db();
    let session = admin(&db);
    let page = db.create_page(&session, "Lots").unwrap();

    let reserved = vec![
        Column::new("id", "ID", ColumnType::Text),
        Column::new("qty", "Quantity", ColumnType::Number),
    ];
    assert!(matches!(
        db.update_columns(&session, &page.id, reserved),
        Err(ParamError::InvalidSchema(_))
    ));
    assert!(db.page(&page.id).unwrap().columns.is_empty());

    db.update_columns(
        &session,
        &page.id,
        vec![
            Column::new("item_id", "Item ID", ColumnType::Number),
            Column::new("qty", "Quantity", ColumnType::Number),
        ],
    )
    .unwrap();
    for _ in 0..2 {
        db.import_file(&session, &page.id, "lots.csv", "id,qty\n7,1\n,2".as_bytes())
            .unwrap();
    }

    let records = db.records(&page.id).unwrap();
    assert_eq!(records.len(), 4);
    let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 4);
    assert!(records.iter().all(|r| r.id.contains("_import_")));
    assert_eq!(records[0].get("item_id"), Some(&Value::Number(7.0)));
    assert_eq!(records[1].get("item_id"), Some(&Value::Null));
}
