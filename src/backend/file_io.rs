//! JSON files on disk
//!
//! Tables, users and the saved session are plain JSON files. A write goes to
//! `<name>.json.tmp` next to the target, is synced, and is then renamed over
//! it, so readers see either the old or the new contents.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{LaplataError, LaplataResult};

fn storage_error<'a>(
    what: &str,
    path: &'a Path,
) -> impl FnOnce(std::io::Error) -> LaplataError + 'a {
    let what = what.to_string();
    move |e| LaplataError::Storage(format!("{} {}: {}", what, path.display(), e))
}

/// Load `path`, or `T::default()` when it has not been written yet
pub fn read_json<T, P>(path: P) -> LaplataResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(storage_error("Failed to open", path)(e)),
    };

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| LaplataError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Replace the contents of `path` with `data`
pub fn write_json_atomic<T, P>(path: P, data: &T) -> LaplataResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(storage_error("Failed to create directory", parent))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let result = write_synced(&temp_path, data).and_then(|()| {
        fs::rename(&temp_path, path).map_err(storage_error("Failed to replace", path))
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_synced<T: Serialize>(path: &Path, data: &T) -> LaplataResult<()> {
    let file = File::create(path).map_err(storage_error("Failed to create", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data).map_err(|e| {
        LaplataError::Storage(format!("Failed to serialize {}: {}", path.display(), e))
    })?;
    writer.flush().map_err(storage_error("Failed to flush", path))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(storage_error("Failed to sync", path))
}

/// Delete `path`; a missing file is not an error
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> LaplataResult<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(storage_error("Failed to remove", path)(e))
        }
        _ => Ok(()),
    }
}
