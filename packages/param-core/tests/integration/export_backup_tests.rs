//! Export and backup/restore through the database facade.

use ntest::timeout;

use param_core::auth::Role;
use param_core::backup::decode_snapshot;
use param_core::config::AppConfig;
use param_core::record::Record;
use param_core::tabular::FileFormat;
use param_core::ParamError;

use super::helpers::{admin, memory_db, parts_page, viewer};

#[timeout(1000)]
#[test]
fn test_export_csv_and_selected_json() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    db.import_file(
        &session,
        &page.id,
        "in.json",
        r#"[{"Name":"Bolt, M6","Quantity":2,"Photo":"data:image/png;base64,AA"},{"Name":"Nut"}]"#
            .as_bytes(),
    )
    .unwrap();

    let csv = db.export_page(&page.id, FileFormat::Csv, None).unwrap();
    let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').split('\n').collect();
    assert_eq!(lines[0], "Name,Quantity,Grade,Photo");
    assert_eq!(lines[1], "\"Bolt, M6\",2,,[图片]");
    assert_eq!(lines[2], "Nut,,,");

    let records = db.records(&page.id).unwrap();
    let selected = vec![records[1].id.clone()];
    let json = db
        .export_page(&page.id, FileFormat::Json, Some(&selected))
        .unwrap();
    let parsed: Vec<Record> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, vec![records[1].clone()]);
}

#[timeout(1000)]
#[test]
fn test_backup_restore_replaces_state() {
    let source = memory_db();
    let session = admin(&source);
    let page = parts_page(&source, &session);
    source
        .import_file(&session, &page.id, "in.csv", "Name,Quantity\nBolt,2".as_bytes())
        .unwrap();
    source.create_user("clerk", "pw", Role::User).unwrap();
    let snapshot = source.export_backup(&AppConfig::default()).unwrap();
    assert_eq!(snapshot.current_user.as_ref().unwrap().username, "admin");
    let text = snapshot.to_json().unwrap();

    let target = memory_db();
    let target_admin = admin(&target);
    let other = target.create_page(&target_admin, "Scratch").unwrap();

    let info = target.restore_backup(&target_admin, &text).unwrap();
    assert_eq!(info.version, "1.0.0");
    assert_eq!(info.page_count, 1);
    assert_eq!(info.user_count, 2);

    assert!(target.current_session().unwrap().is_none());
    assert_eq!(target.pages().unwrap(), source.pages().unwrap());
    assert_eq!(target.users().unwrap(), source.users().unwrap());
    assert_eq!(target.all_page_data().unwrap(), source.all_page_data().unwrap());
    assert!(matches!(
        target.page(&other.id),
        Err(ParamError::PageNotFound { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_invalid_backup_changes_nothing() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    let pages_before = db.pages().unwrap();

    let err = db
        .restore_backup(&session, r#"{"users": [], "pageConfigs": []}"#)
        .unwrap_err();
    assert!(matches!(err, ParamError::InvalidBackupFormat(_)));
    assert_eq!(db.pages().unwrap(), pages_before);
    assert!(db.page(&page.id).is_ok());
    assert!(db.current_session().unwrap().is_some());
}

#[timeout(1000)]
#[test]
fn test_malformed_users_section_kept() {
    let db = memory_db();
    let session = admin(&db);
    let text = r#"{"version":"1.0.0","users":"broken","pageConfigs":[],"pageData":{}}"#;
    let info = db.restore_backup(&session, text).unwrap();
    assert_eq!(info.user_count, 0);
    assert_eq!(db.users().unwrap().len(), 1);
    assert!(db.pages().unwrap().is_empty());
}

#[timeout(1000)]
#[test]
fn test_restore_requires_admin() {
    let db = memory_db();
    let snapshot = db.export_backup(&AppConfig::default()).unwrap();
    let viewer = viewer(&db);
    assert!(matches!(
        db.restore_backup(&viewer, &snapshot.to_json().unwrap()),
        Err(ParamError::PermissionDenied { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_backup_round_trip_through_codec() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    db.import_file(&session, &page.id, "in.csv", "Name\nBolt\nNut".as_bytes())
        .unwrap();
    let snapshot = db.export_backup(&AppConfig::default()).unwrap();
    let restored = decode_snapshot(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(restored.users, Some(snapshot.users));
    assert_eq!(restored.pages, Some(snapshot.page_configs));
    assert_eq!(restored.page_data, snapshot.page_data);
}
