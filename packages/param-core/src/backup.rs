//! Backup snapshot: the whole application state as one JSON document.
//!
//! Restoring replaces users, page configs and page data wholesale. The
//! `currentUser` section is written for information only and is never read
//! back, so a restore always ends with a fresh login.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::auth::User;
use crate::error::{ParamError, Result};
use crate::record::Record;
use crate::schema::{validate_pages, Page};

/// Record lists keyed by page id.
pub type PageData = BTreeMap<String, Vec<Record>>;

/// Serialized backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub version: String,
    /// ISO-8601 UTC timestamp
    pub export_time: String,
    pub users: Vec<User>,
    pub page_configs: Vec<Page>,
    pub page_data: PageData,
    pub current_user: Option<User>,
}

impl BackupSnapshot {
    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// State recovered from a backup document.
///
/// `None` marks an optional section that was absent or malformed and must
/// be left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub users: Option<Vec<User>>,
    pub pages: Option<Vec<Page>>,
    pub page_data: PageData,
    pub info: BackupInfo,
}

/// Summary reported after a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub version: String,
    pub export_time: String,
    pub page_count: usize,
    pub user_count: usize,
}

/// Builds a snapshot document.
pub fn encode_snapshot(
    users: Vec<User>,
    pages: Vec<Page>,
    page_data: PageData,
    current_user: Option<User>,
    version: &str,
    export_time: DateTime<Utc>,
) -> BackupSnapshot {
    BackupSnapshot {
        version: version.to_string(),
        export_time: export_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        users,
        page_configs: pages,
        page_data,
        current_user,
    }
}

/// Decodes a backup document.
///
/// # Errors
/// * `ParseFailure` when the text is not JSON.
/// * `InvalidBackupFormat` when the top level is not an object,
///   `pageConfigs` or `pageData` is missing or null, or `pageData` cannot
///   be read as page id to record list.
///
/// Unknown top-level keys are ignored. A malformed `users` or
/// `pageConfigs` section is skipped.
pub fn decode_snapshot(text: &str) -> Result<RestoredState> {
    let document: Json = serde_json::from_str(text)
        .map_err(|e| ParamError::ParseFailure(format!("backup is not valid JSON: {}", e)))?;
    let Json::Object(mut root) = document else {
        return Err(ParamError::InvalidBackupFormat(
            "top level must be an object".to_string(),
        ));
    };

    let page_configs = take_required(&mut root, "pageConfigs")?;
    let page_data_raw = take_required(&mut root, "pageData")?;

    let page_data: PageData = serde_json::from_value(page_data_raw).map_err(|e| {
        ParamError::InvalidBackupFormat(format!("pageData must map page ids to records: {}", e))
    })?;

    let page_count = page_configs.as_array().map_or(0, Vec::len);
    let pages = decode_section::<Page>("pageConfigs", Some(page_configs)).filter(|pages| {
        match validate_pages(pages) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid pageConfigs section");
                false
            }
        }
    });

    let users_raw = root.remove("users");
    let user_count = users_raw.as_ref().and_then(Json::as_array).map_or(0, Vec::len);
    let users = decode_section::<User>("users", users_raw);

    let info = BackupInfo {
        version: text_or_unknown(root.get("version")),
        export_time: text_or_unknown(root.get("exportTime")),
        page_count,
        user_count,
    };

    Ok(RestoredState {
        users,
        pages,
        page_data,
        info,
    })
}

fn take_required(root: &mut serde_json::Map<String, Json>, key: &str) -> Result<Json> {
    match root.remove(key) {
        None | Some(Json::Null) => Err(ParamError::InvalidBackupFormat(format!(
            "missing required section '{}'",
            key
        ))),
        Some(value) => Ok(value),
    }
}

fn decode_section<T: serde::de::DeserializeOwned>(name: &str, raw: Option<Json>) -> Option<Vec<T>> {
    match raw? {
        value @ Json::Array(_) => match serde_json::from_value(value) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!(section = name, error = %e, "Skipping malformed backup section");
                None
            }
        },
        _ => {
            tracing::warn!(section = name, "Skipping backup section that is not an array");
            None
        }
    }
}

fn text_or_unknown(value: Option<&Json>) -> String {
    match value {
        Some(Json::String(s)) if !s.is_empty() => s.clone(),
        _ => "unknown".to_string(),
    }
}

/// File name for a backup taken at `time`, e.g.
/// `product_management_backup_2024-05-01T08-30-00.json`.
pub fn backup_file_name(time: DateTime<Utc>) -> String {
    format!(
        "product_management_backup_{}.json",
        time.format("%Y-%m-%dT%H-%M-%S")
    )
}
