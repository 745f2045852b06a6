//! Key-value storage backends.
//!
//! The application persists four keys, each holding one whole JSON
//! collection that is replaced on every save.

mod file;
pub(crate) mod io_utils;
mod memory;

use serde_json::Value as Json;

use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the user list.
pub const USERS_KEY: &str = "users";
/// Key holding the logged-in user.
pub const CURRENT_USER_KEY: &str = "currentUser";
/// Key holding the page config list.
pub const PAGE_CONFIGS_KEY: &str = "pageConfigs";
/// Key holding the page id to record list object.
pub const PAGE_DATA_KEY: &str = "pageData";

/// Whole-value key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Json>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Json) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
