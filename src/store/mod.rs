//! Whole-collection JSON persistence.
//!
//! Every record family lives in its own JSON array on disk. A collection is
//! loaded once, held in memory behind a `RwLock`, and rewritten in full on
//! every mutation. The write lock is held across clone, mutate and save, so
//! concurrent writers cannot interleave their read-modify-write cycles.

pub mod path;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

pub use path::StorageLayout;

pub struct JsonCollection<T> {
    path: PathBuf,
    records: RwLock<Vec<T>>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Opens the collection at `path`, loading existing records if the file exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = read_records(&path)?;
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` against the current records under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.read_guard())
    }

    /// Runs a read-modify-write cycle under the write lock.
    ///
    /// `f` mutates a working copy; the copy is written to disk and only then
    /// replaces the in-memory records. If `f` or the write fails, nothing changes.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        let mut guard = self.write_guard();
        let mut working = guard.clone();
        let out = f(&mut working)?;
        write_records_atomic(&self.path, &working)?;
        *guard = working;
        Ok(out)
    }

    /// Discards the in-memory copy and reads the file again.
    pub fn reload(&self) -> Result<()> {
        let mut guard = self.write_guard();
        *guard = read_records(&self.path)?;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }
}

/// Reads a JSON array from `path`. A missing or empty file is an empty collection.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_slice(&data)?)
}

/// Writes `records` to a sibling temp file, syncs it and renames it over `path`.
pub fn write_records_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let data = serde_json::to_vec_pretty(records)?;
    let tmp_path = temp_path_for(path);

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
    }

    #[cfg(unix)]
    set_restrictive_permissions(&tmp_path);

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}
