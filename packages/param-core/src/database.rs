//! Database facade over a key-value store: users, pages, records, import,
//! export and backup.
//!
//! Every save replaces a whole collection. Read-modify-write of one page's
//! records runs under that page's lock, and the shared `pageData` value is
//! rewritten under a separate data lock.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::auth::{authenticate, validate_new_user, Role, Session, User};
use crate::backup::{decode_snapshot, encode_snapshot, BackupInfo, BackupSnapshot, PageData};
use crate::config::AppConfig;
use crate::error::{ParamError, Result};
use crate::export::export;
use crate::ids::IdGenerator;
use crate::import::import_records;
use crate::reconcile::HeaderMatch;
use crate::record::{select_records, Record};
use crate::schema::{Column, Page};
use crate::storage::{
    KeyValueStore, CURRENT_USER_KEY, PAGE_CONFIGS_KEY, PAGE_DATA_KEY, USERS_KEY,
};
use crate::tabular::{decode, read_source, FileFormat, TabularData};

/// Outcome of a committed import.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Number of records appended
    pub imported: usize,
    /// Header assignments that were used
    pub mapping: Vec<HeaderMatch>,
}

/// Application state stored in a [`KeyValueStore`].
pub struct Database {
    /// Backing store
    store: Arc<dyn KeyValueStore>,
    /// Id source for pages, records and import batches
    ids: IdGenerator,
    /// Page id to its record-list lock
    page_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Guards read-modify-write of the shared `pageData` value
    data_lock: Mutex<()>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("ids", &self.ids).finish()
    }
}

impl Database {
    /// Creates a database over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_ids(store, IdGenerator::new())
    }

    /// Creates a database with an explicit id generator.
    pub fn with_ids(store: Arc<dyn KeyValueStore>, ids: IdGenerator) -> Self {
        Self {
            store,
            ids,
            page_locks: Mutex::new(HashMap::new()),
            data_lock: Mutex::new(()),
        }
    }

    /// Id generator used by this database.
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get(key)? {
            None | Some(Json::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                ParamError::DataCorruption(format!("Stored '{}' is malformed: {}", key, e))
            }),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.store.put(key, serde_json::to_value(value)?)
    }

    fn page_lock(&self, page_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.page_locks.lock().map_err(|_| ParamError::LockPoisoned)?;
        Ok(locks
            .entry(page_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    // Users and sessions

    /// Stored users.
    pub fn users(&self) -> Result<Vec<User>> {
        self.load(USERS_KEY)
    }

    /// Replaces the user list.
    pub fn save_users(&self, users: &[User]) -> Result<()> {
        self.save(USERS_KEY, &users)
    }

    /// Seeds the default administrator when no users exist.
    ///
    /// # Returns
    /// `true` if an account was created.
    pub fn ensure_default_admin(&self, config: &AppConfig) -> Result<bool> {
        if !self.users()?.is_empty() {
            return Ok(false);
        }
        let admin = User {
            id: "1".to_string(),
            username: config.default_admin_username.clone(),
            password: config.default_admin_password.clone(),
            role: Role::Admin,
        };
        self.save_users(&[admin])?;
        tracing::info!(username = %config.default_admin_username, "Seeded default administrator");
        Ok(true)
    }

    /// Checks credentials, records the current user and opens a session.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let users = self.users()?;
        let user = authenticate(&users, username, password)?.clone();
        self.set_current_user(&user)?;
        tracing::info!(username, "User logged in");
        Ok(Session::new(user))
    }

    /// The stored current user, if any.
    pub fn current_user(&self) -> Result<Option<User>> {
        self.load(CURRENT_USER_KEY)
    }

    /// Stores `user` as the current user.
    pub fn set_current_user(&self, user: &User) -> Result<()> {
        self.save(CURRENT_USER_KEY, user)
    }

    /// Session of the stored current user, if any.
    pub fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.current_user()?.map(Session::new))
    }

    /// Clears the current user.
    pub fn logout(&self) -> Result<()> {
        self.store.remove(CURRENT_USER_KEY)
    }

    /// Creates an account.
    pub fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let mut users = self.users()?;
        validate_new_user(&users, username, password)?;
        let user = User {
            id: self.ids.next_id(),
            username: username.to_string(),
            password: password.to_string(),
            role,
        };
        users.push(user.clone());
        self.save_users(&users)?;
        Ok(user)
    }

    // Pages

    /// Stored page configs.
    pub fn pages(&self) -> Result<Vec<Page>> {
        self.load(PAGE_CONFIGS_KEY)
    }

    /// Replaces the page config list.
    pub fn save_pages(&self, pages: &[Page]) -> Result<()> {
        self.save(PAGE_CONFIGS_KEY, &pages)
    }

    /// Looks up one page.
    pub fn page(&self, page_id: &str) -> Result<Page> {
        self.pages()?
            .into_iter()
            .find(|p| p.id == page_id)
            .ok_or_else(|| ParamError::PageNotFound {
                page: page_id.to_string(),
            })
    }

    /// Creates an empty page.
    pub fn create_page(&self, session: &Session, name: &str) -> Result<Page> {
        session.require_admin("create page")?;
        let mut pages = self.pages()?;
        let mut id = self.ids.next_id();
        while pages.iter().any(|p| p.id == id) {
            id = self.ids.next_id();
        }
        let page = Page::new(id, name)?;
        pages.push(page.clone());
        self.save_pages(&pages)?;
        tracing::info!(page = %page.id, name = %page.name, "Page created");
        Ok(page)
    }

    /// Renames a page.
    pub fn rename_page(&self, session: &Session, page_id: &str, name: &str) -> Result<Page> {
        session.require_admin("rename page")?;
        self.modify_page(page_id, |page| page.rename(name))
    }

    /// Replaces a page's column list.
    pub fn update_columns(
        &self,
        session: &Session,
        page_id: &str,
        columns: Vec<Column>,
    ) -> Result<Page> {
        session.require_admin("edit columns")?;
        self.modify_page(page_id, |page| page.replace_columns(columns))
    }

    fn modify_page<F>(&self, page_id: &str, f: F) -> Result<Page>
    where
        F: FnOnce(&mut Page) -> Result<()>,
    {
        let mut pages = self.pages()?;
        let page = pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| ParamError::PageNotFound {
                page: page_id.to_string(),
            })?;
        f(page)?;
        let updated = page.clone();
        self.save_pages(&pages)?;
        Ok(updated)
    }

    /// Deletes a page together with all its records.
    pub fn delete_page(&self, session: &Session, page_id: &str) -> Result<()> {
        session.require_admin("delete page")?;
        let lock = self.page_lock(page_id)?;
        let _page_guard = lock.lock().map_err(|_| ParamError::LockPoisoned)?;

        let mut pages = self.pages()?;
        let before = pages.len();
        pages.retain(|p| p.id != page_id);
        if pages.len() == before {
            return Err(ParamError::PageNotFound {
                page: page_id.to_string(),
            });
        }
        self.save_pages(&pages)?;

        let _data_guard = self.data_lock.lock().map_err(|_| ParamError::LockPoisoned)?;
        let mut all = self.raw_page_data()?;
        all.remove(page_id);
        self.store.put(PAGE_DATA_KEY, Json::Object(all))?;
        tracing::info!(page = page_id, "Page deleted");
        Ok(())
    }

    // Records

    fn raw_page_data(&self) -> Result<Map<String, Json>> {
        match self.store.get(PAGE_DATA_KEY)? {
            None | Some(Json::Null) => Ok(Map::new()),
            Some(Json::Object(map)) => Ok(map),
            Some(_) => Err(ParamError::DataCorruption(
                "Stored 'pageData' is not an object".to_string(),
            )),
        }
    }

    fn stored_records(&self, page_id: &str) -> Result<Vec<Record>> {
        match self.raw_page_data()?.remove(page_id) {
            None | Some(Json::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                ParamError::DataCorruption(format!("Records of page '{}' are malformed: {}", page_id, e))
            }),
        }
    }

    fn write_records(&self, page_id: &str, records: &[Record]) -> Result<()> {
        let _data_guard = self.data_lock.lock().map_err(|_| ParamError::LockPoisoned)?;
        let mut all = self.raw_page_data()?;
        all.insert(page_id.to_string(), serde_json::to_value(records)?);
        self.store.put(PAGE_DATA_KEY, Json::Object(all))
    }

    /// Records of a page, each back-filled with defaults for current columns.
    pub fn records(&self, page_id: &str) -> Result<Vec<Record>> {
        let page = self.page(page_id)?;
        let mut records = self.stored_records(page_id)?;
        for record in &mut records {
            record.backfill(&page.columns);
        }
        Ok(records)
    }

    /// All stored records keyed by page id, as persisted.
    pub fn all_page_data(&self) -> Result<PageData> {
        serde_json::from_value(Json::Object(self.raw_page_data()?)).map_err(|e| {
            ParamError::DataCorruption(format!("Stored 'pageData' is malformed: {}", e))
        })
    }

    /// Replaces a page's whole record list.
    pub fn replace_all(&self, page_id: &str, records: &[Record]) -> Result<()> {
        let lock = self.page_lock(page_id)?;
        let _page_guard = lock.lock().map_err(|_| ParamError::LockPoisoned)?;
        self.write_records(page_id, records)
    }

    /// A new, unsaved record with every column at its default.
    pub fn new_record(&self, page_id: &str) -> Result<Record> {
        let page = self.page(page_id)?;
        Ok(Record::with_defaults(self.ids.next_id(), &page.columns))
    }

    /// Saves a record: replaces the one with the same id, or appends.
    pub fn save_record(&self, session: &Session, page_id: &str, record: Record) -> Result<()> {
        session.require_admin("save record")?;
        self.page(page_id)?;
        let lock = self.page_lock(page_id)?;
        let _page_guard = lock.lock().map_err(|_| ParamError::LockPoisoned)?;

        let mut records = self.stored_records(page_id)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
        self.write_records(page_id, &records)
    }

    /// Deletes one record.
    pub fn delete_record(&self, session: &Session, page_id: &str, record_id: &str) -> Result<()> {
        session.require_admin("delete record")?;
        let lock = self.page_lock(page_id)?;
        let _page_guard = lock.lock().map_err(|_| ParamError::LockPoisoned)?;

        let mut records = self.stored_records(page_id)?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(ParamError::RecordNotFound {
                page: page_id.to_string(),
                record: record_id.to_string(),
            });
        }
        self.write_records(page_id, &records)
    }

    // Import

    /// Merges decoded rows into a page and persists the result.
    pub fn import_rows(
        &self,
        session: &Session,
        page_id: &str,
        data: &TabularData,
    ) -> Result<ImportReport> {
        session.require_admin("import")?;
        let page = self.page(page_id)?;
        let lock = self.page_lock(page_id)?;
        let _page_guard = lock.lock().map_err(|_| ParamError::LockPoisoned)?;

        let existing = self.stored_records(page_id)?;
        let outcome = import_records(&data.rows, &data.headers, &page.columns, &existing, &self.ids);
        self.write_records(page_id, &outcome.records)?;

        tracing::info!(
            page = page_id,
            imported = outcome.imported,
            mapped_headers = outcome.mapping.len(),
            total = outcome.records.len(),
            "Import committed"
        );
        Ok(ImportReport {
            imported: outcome.imported,
            mapping: outcome.mapping.matches().to_vec(),
        })
    }

    /// Reads, decodes and imports a CSV or JSON file into a page.
    ///
    /// Nothing is written unless the whole file decodes.
    ///
    /// # Errors
    /// `UnsupportedFormat`, `ReadFailure` or `ParseFailure` before any change;
    /// `PermissionDenied` / `PageNotFound` for the target.
    pub fn import_file<R: Read>(
        &self,
        session: &Session,
        page_id: &str,
        file_name: &str,
        reader: R,
    ) -> Result<ImportReport> {
        session.require_admin("import")?;
        let format = FileFormat::from_filename(file_name)?;
        let text = read_source(reader)?;
        let data = decode(format, &text, self.ids.next_seed())?;
        tracing::debug!(
            file_name,
            headers = data.headers.len(),
            rows = data.rows.len(),
            "Import file decoded"
        );
        self.import_rows(session, page_id, &data)
    }

    // Export

    /// Renders a page's records, optionally only the selected ids.
    pub fn export_page(
        &self,
        page_id: &str,
        format: FileFormat,
        selected: Option<&[String]>,
    ) -> Result<String> {
        let page = self.page(page_id)?;
        let records = self.records(page_id)?;
        match selected {
            Some(ids) => export(format, select_records(&records, ids), &page.columns),
            None => export(format, &records, &page.columns),
        }
    }

    // Backup

    /// Snapshot of the whole stored state.
    pub fn export_backup(&self, config: &AppConfig) -> Result<BackupSnapshot> {
        Ok(encode_snapshot(
            self.users()?,
            self.pages()?,
            self.all_page_data()?,
            self.current_user()?,
            &config.backup_version,
            chrono::Utc::now(),
        ))
    }

    /// Replaces users, pages and page data from a backup document and
    /// clears the current user.
    ///
    /// Malformed optional sections are left as they were. Nothing changes
    /// when the document fails validation.
    pub fn restore_backup(&self, session: &Session, text: &str) -> Result<BackupInfo> {
        session.require_admin("restore backup")?;
        let restored = decode_snapshot(text)?;

        // Page locks first, in sorted order, then the data lock.
        let mut affected: Vec<String> = self.raw_page_data()?.keys().cloned().collect();
        affected.extend(self.pages()?.into_iter().map(|p| p.id));
        affected.extend(restored.page_data.keys().cloned());
        if let Some(pages) = &restored.pages {
            affected.extend(pages.iter().map(|p| p.id.clone()));
        }
        affected.sort();
        affected.dedup();
        let locks = affected
            .iter()
            .map(|id| self.page_lock(id))
            .collect::<Result<Vec<_>>>()?;
        let _page_guards = locks
            .iter()
            .map(|lock| lock.lock().map_err(|_| ParamError::LockPoisoned))
            .collect::<Result<Vec<_>>>()?;

        let _data_guard = self.data_lock.lock().map_err(|_| ParamError::LockPoisoned)?;
        if let Some(users) = &restored.users {
            self.save_users(users)?;
        }
        if let Some(pages) = &restored.pages {
            self.save_pages(pages)?;
        }
        self.save(PAGE_DATA_KEY, &restored.page_data)?;
        self.store.remove(CURRENT_USER_KEY)?;

        tracing::info!(
            version = %restored.info.version,
            pages = restored.info.page_count,
            users = restored.info.user_count,
            "Backup restored"
        );
        Ok(restored.info)
    }
}
