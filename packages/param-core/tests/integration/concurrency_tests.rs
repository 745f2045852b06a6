//! Concurrent imports into the same and different pages.

use std::sync::Arc;
use std::thread;

use ntest::timeout;

use super::helpers::{admin, memory_db, parts_page};

#[timeout(5000)]
#[test]
fn test_concurrent_imports_lose_nothing() {
    let db = Arc::new(memory_db());
    let session = admin(&db);
    let first = parts_page(&db, &session);
    let second = parts_page(&db, &session);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db = Arc::clone(&db);
            let session = session.clone();
            let page_id = if i % 2 == 0 {
                first.id.clone()
            } else {
                second.id.clone()
            };
            thread::spawn(move || {
                let csv = format!("Name,Quantity\nPart{},1\nPart{},2\nPart{},3", i, i, i);
                db.import_file(&session, &page_id, "batch.csv", csv.as_bytes())
                    .unwrap()
                    .imported
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 24);
    assert_eq!(db.records(&first.id).unwrap().len(), 12);
    assert_eq!(db.records(&second.id).unwrap().len(), 12);

    let mut ids: Vec<String> = db
        .records(&first.id)
        .unwrap()
        .into_iter()
        .chain(db.records(&second.id).unwrap())
        .map(|r| r.id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 24);
}
