//! Page, column, user and record CRUD.

use ntest::timeout;

use param_core::auth::Role;
use param_core::record::{filter_records, RecordFilter, Value};
use param_core::schema::{Column, ColumnType};
use param_core::ParamError;

use super::helpers::{admin, memory_db, parts_page, viewer};

#[timeout(1000)]
#[test]
fn test_default_admin_seeded_once() {
    let db = memory_db();
    assert_eq!(db.users().unwrap().len(), 1);
    assert!(!db
        .ensure_default_admin(&param_core::config::AppConfig::default())
        .unwrap());
    assert_eq!(db.users().unwrap()[0].role, Role::Admin);
}

#[timeout(1000)]
#[test]
fn test_login_logout_session() {
    let db = memory_db();
    assert_eq!(
        db.login("admin", "wrong").unwrap_err(),
        ParamError::InvalidCredentials
    );
    let session = admin(&db);
    assert_eq!(
        db.current_session().unwrap().unwrap().user().username,
        session.user().username
    );
    db.logout().unwrap();
    assert!(db.current_session().unwrap().is_none());
}

#[timeout(1000)]
#[test]
fn test_duplicate_user_rejected() {
    let db = memory_db();
    assert!(matches!(
        db.create_user("admin", "x", Role::User),
        Err(ParamError::UserAlreadyExists(_))
    ));
}

#[timeout(1000)]
#[test]
fn test_page_lifecycle() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    assert_eq!(db.pages().unwrap().len(), 1);
    assert_eq!(db.page(&page.id).unwrap().columns.len(), 4);

    let renamed = db.rename_page(&session, &page.id, " Bolts ").unwrap();
    assert_eq!(renamed.name, "Bolts");
    assert_eq!(
        db.create_page(&session, "  ").unwrap_err(),
        ParamError::EmptyPageName
    );

    let record = db.new_record(&page.id).unwrap();
    db.save_record(&session, &page.id, record).unwrap();
    db.delete_page(&session, &page.id).unwrap();
    assert!(db.pages().unwrap().is_empty());
    assert!(db.all_page_data().unwrap().is_empty());
    assert!(matches!(
        db.records(&page.id),
        Err(ParamError::PageNotFound { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_invalid_columns_leave_page_unchanged() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    let bad = vec![
        Column::new("a", "A", ColumnType::Text),
        Column::new("a", "B", ColumnType::Number),
    ];
    assert!(matches!(
        db.update_columns(&session, &page.id, bad),
        Err(ParamError::InvalidSchema(_))
    ));
    assert_eq!(db.page(&page.id).unwrap().columns.len(), 4);
}

#[timeout(1000)]
#[test]
fn test_record_upsert_and_delete() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);

    let mut record = db.new_record(&page.id).unwrap();
    assert_eq!(record.get("qty"), Some(&Value::Null));
    assert_eq!(record.get("name"), Some(&Value::from("")));
    record.set("name", Value::from("Bolt"));
    db.save_record(&session, &page.id, record.clone()).unwrap();

    record.set("qty", Value::Number(4.0));
    db.save_record(&session, &page.id, record.clone()).unwrap();
    let records = db.records(&page.id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("qty"), Some(&Value::Number(4.0)));

    db.delete_record(&session, &page.id, &record.id).unwrap();
    assert!(db.records(&page.id).unwrap().is_empty());
    assert!(matches!(
        db.delete_record(&session, &page.id, &record.id),
        Err(ParamError::RecordNotFound { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_records_backfilled_after_column_added() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    let record = db.new_record(&page.id).unwrap();
    db.save_record(&session, &page.id, record).unwrap();

    let mut columns = db.page(&page.id).unwrap().columns;
    columns.push(Column::new("weight", "Weight", ColumnType::Number));
    db.update_columns(&session, &page.id, columns).unwrap();

    let records = db.records(&page.id).unwrap();
    assert_eq!(records[0].get("weight"), Some(&Value::Null));
}

#[timeout(1000)]
#[test]
fn test_non_admin_cannot_mutate() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    let viewer = viewer(&db);

    assert!(matches!(
        db.create_page(&viewer, "Mine"),
        Err(ParamError::PermissionDenied { .. })
    ));
    let record = db.new_record(&page.id).unwrap();
    assert!(matches!(
        db.save_record(&viewer, &page.id, record),
        Err(ParamError::PermissionDenied { .. })
    ));
    assert!(matches!(
        db.import_file(&viewer, &page.id, "a.csv", "name\nx".as_bytes()),
        Err(ParamError::PermissionDenied { .. })
    ));
    assert!(db.records(&page.id).unwrap().is_empty());
}

#[timeout(1000)]
#[test]
fn test_filter_over_stored_records() {
    let db = memory_db();
    let session = admin(&db);
    let page = parts_page(&db, &session);
    db.import_file(
        &session,
        &page.id,
        "parts.csv",
        "Name,Quantity\nSteel Bolt,4\nBrass Nut,9\nsteel pin,1".as_bytes(),
    )
    .unwrap();

    let records = db.records(&page.id).unwrap();
    let hits = filter_records(&records, &RecordFilter::default().contains("name", "steel"));
    assert_eq!(hits.len(), 2);
}
