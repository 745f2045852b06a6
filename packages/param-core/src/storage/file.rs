//! File-backed store: one checksummed JSON file per key.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crc32fast::Hasher;
use serde_json::Value as Json;

use super::io_utils::{classify_io_error, retry_io_operation};
use super::KeyValueStore;
use crate::config::AppConfig;
use crate::error::{ParamError, Result};

/// Prefix of the first line of every value file.
const CHECKSUM_PREFIX: &str = "crc32:";

/// Key-value store persisting each key to `<data_dir>/<key>.json`.
///
/// A value file is a `crc32:<hex>` line followed by the JSON body the
/// checksum covers. Every write goes to a temporary file, is synced, then
/// renamed over the previous file, so body and checksum change together.
#[derive(Debug)]
pub struct FileStore {
    /// Data directory path
    data_dir: PathBuf,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retries in milliseconds
    retry_delay_ms: u64,
    /// Serializes writers of the same temp files
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (creating if needed) a store under `config.data_dir`.
    pub fn open(config: &AppConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;
        Ok(Self {
            data_dir: config.data_dir.clone(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
            write_lock: Mutex::new(()),
        })
    }

    /// Data directory of this store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn value_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ParamError::IoError(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }

    fn write_atomic(&self, final_path: &Path, bytes: &[u8]) -> Result<()> {
        let temp_path = final_path.with_extension("json.tmp");
        retry_io_operation(
            || {
                let mut file = File::create(&temp_path)
                    .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
                file.write_all(bytes)
                    .map_err(|e| classify_io_error(e, "Failed to write temp file"))?;
                file.sync_all()
                    .map_err(|e| classify_io_error(e, "Failed to sync temp file"))?;
                fs::rename(&temp_path, final_path)
                    .map_err(|e| classify_io_error(e, "Failed to rename temp file"))
            },
            self.max_retries,
            self.retry_delay_ms,
            "atomic write",
        )
    }
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Prepends the checksum line to a JSON body.
fn encode_file(body: &[u8]) -> Vec<u8> {
    let mut bytes = format!("{}{:08x}\n", CHECKSUM_PREFIX, checksum(body)).into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Splits a value file and verifies its body against the checksum line.
fn decode_file<'a>(key: &str, bytes: &'a [u8]) -> Result<&'a [u8]> {
    let corrupt = |detail: String| {
        ParamError::DataCorruption(format!("Value file for '{}' {}", key, detail))
    };

    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| corrupt("has no checksum line".to_string()))?;
    let (header, body) = (&bytes[..newline], &bytes[newline + 1..]);

    let expected = std::str::from_utf8(header)
        .ok()
        .and_then(|line| line.strip_prefix(CHECKSUM_PREFIX))
        .and_then(|hex| u32::from_str_radix(hex.trim(), 16).ok())
        .ok_or_else(|| corrupt("has a malformed checksum line".to_string()))?;

    let actual = checksum(body);
    if actual != expected {
        return Err(corrupt(format!(
            "failed its checksum: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }
    Ok(body)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Json>> {
        let path = self.value_path(key)?;
        let read = retry_io_operation(
            || match fs::read(&path) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(classify_io_error(e, "Failed to read value file")),
            },
            self.max_retries,
            self.retry_delay_ms,
            "read",
        )?;
        let Some(bytes) = read else {
            return Ok(None);
        };

        let body = decode_file(key, &bytes)?;
        let value = serde_json::from_slice(body).map_err(|e| {
            ParamError::DataCorruption(format!("Value for '{}' is not valid JSON: {}", key, e))
        })?;
        Ok(Some(value))
    }

    fn put(&self, key: &str, value: Json) -> Result<()> {
        let path = self.value_path(key)?;
        let body = serde_json::to_vec_pretty(&value)?;

        let _guard = self.write_lock.lock().map_err(|_| ParamError::LockPoisoned)?;
        self.write_atomic(&path, &encode_file(&body))?;

        tracing::debug!(key, bytes = body.len(), "Value persisted");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;

        let _guard = self.write_lock.lock().map_err(|_| ParamError::LockPoisoned)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(classify_io_error(e, "Failed to remove value file")),
        }
    }
}
