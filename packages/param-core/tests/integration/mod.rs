//! Integration test suite.
//!
//! 1. Page and record CRUD through the database facade
//! 2. File import: format checks, reconciliation, all-or-nothing commits
//! 3. Export and backup/restore
//! 4. Concurrent imports into one page

pub mod concurrency_tests;
pub mod crud_tests;
pub mod export_backup_tests;
pub mod helpers;
pub mod import_tests;
