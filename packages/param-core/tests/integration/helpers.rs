//! Shared fixtures for integration tests.

use std::sync::Arc;

use param_core::auth::{Role, Session};
use param_core::config::AppConfig;
use param_core::schema::{Column, ColumnType, Page};
use param_core::storage::MemoryStore;
use param_core::Database;

/// Database over a fresh in-memory store with the default admin seeded.
pub fn memory_db() -> Database {
    let db = Database::new(Arc::new(MemoryStore::new()));
    db.ensure_default_admin(&AppConfig::default()).unwrap();
    db
}

/// Session of the seeded administrator.
pub fn admin(db: &Database) -> Session {
    db.login("admin", "admin123").unwrap()
}

/// Session of a freshly created non-admin user.
pub fn viewer(db: &Database) -> Session {
    db.create_user("viewer", "pw", Role::User).unwrap();
    db.login("viewer", "pw").unwrap()
}

/// Columns of the "Parts" test page.
pub fn part_columns() -> Vec<Column> {
    vec![
        Column::new("name", "Name", ColumnType::Text),
        Column::new("qty", "Quantity", ColumnType::Number),
        Column::new("grade", "Grade", ColumnType::Select).with_options("A,B,C"),
        Column::new("photo", "Photo", ColumnType::Image),
    ]
}

/// Creates the "Parts" page with [`part_columns`].
pub fn parts_page(db: &Database, session: &Session) -> Page {
    let page = db.create_page(session, "Parts").unwrap();
    db.update_columns(session, &page.id, part_columns()).unwrap()
}
