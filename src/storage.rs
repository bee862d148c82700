use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::{ser::PrettyFormatter, Map, Value};
use tempfile::NamedTempFile;

use crate::{PaError, Result};

/// Capability a record type offers to [`Storage`].
///
/// Storage only ever sees raw JSON; the record type decides which fields
/// must be present and how a raw object turns into a validated value.
pub trait Record: Clone {
    /// Human readable name used in log lines and errors
    const KIND: &'static str;

    /// Keys that must exist in every stored object
    const REQUIRED_FIELDS: &'static [&'static str];

    /// Returns whether all required keys exist in `raw`.
    fn is_valid_data(raw: &Map<String, Value>) -> bool {
        let missing: Vec<&str> = Self::REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !raw.contains_key(*field))
            .collect();

        if !missing.is_empty() {
            warn!(
                "Missing fields in {} data: {}",
                Self::KIND,
                missing.join(", ")
            );
            return false;
        }
        true
    }

    /// Constructs a validated instance from its stored form.
    fn from_raw(raw: Value) -> Result<Self>;

    /// Converts the record into its stored form.
    fn to_raw(&self) -> Result<Value>;
}

/// File-backed repository for one record type.
///
/// The backing file holds a JSON array of records. It is read once and
/// cached; every save rewrites the whole file.
#[derive(Debug)]
pub struct Storage<T: Record> {
    /// Path of the JSON array file
    file_path: PathBuf,

    /// Records as of the last successful load or save
    cache: Option<Vec<T>>,
}

impl<T: Record> Storage<T> {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            cache: None,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Returns the stored records, reading the file on first use only.
    ///
    /// A missing file yields an empty list. An unreadable file, malformed JSON
    /// or a top-level value other than an array is logged, preserved as a
    /// `.corrupt-<timestamp>` copy and also yields an empty list. Individual
    /// entries that fail validation are skipped.
    pub fn load(&mut self) -> Vec<T> {
        if let Some(cached) = &self.cache {
            trace!(
                "Returning {} cached {} records",
                cached.len(),
                T::KIND
            );
            return cached.clone();
        }

        let records = self.load_from_file();
        self.cache = Some(records.clone());
        records
    }

    /// Drops the cache and reads the file again.
    pub fn reload(&mut self) -> Vec<T> {
        debug!("Reloading {} records from {}", T::KIND, self.file_path.display());
        self.cache = None;
        self.load()
    }

    /// Writes all `records` to the backing file and refreshes the cache.
    ///
    /// The file is replaced as a whole. The cache only changes when the write
    /// succeeded, so a failed save leaves storage describing what is on disk.
    pub fn save(&mut self, records: &[T]) -> Result<()> {
        debug!(
            "Saving {} {} records to {}",
            records.len(),
            T::KIND,
            self.file_path.display()
        );

        let raw = records
            .iter()
            .map(Record::to_raw)
            .collect::<Result<Vec<Value>>>()
            .map_err(|e| {
                error!("Error serializing {} data to JSON: {}", T::KIND, e);
                e
            })?;

        let json = to_pretty_json(&Value::Array(raw))?;
        write_atomically(&self.file_path, json.as_bytes())?;

        self.cache = Some(records.to_vec());
        info!(
            "Saved {} {} records to {}",
            records.len(),
            T::KIND,
            self.file_path.display()
        );
        Ok(())
    }

    fn load_from_file(&self) -> Vec<T> {
        if !self.file_path.exists() {
            info!(
                "File '{}' does not exist, starting with no {} records",
                self.file_path.display(),
                T::KIND
            );
            return Vec::new();
        }

        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) => {
                error!("Error reading file '{}': {}", self.file_path.display(), e);
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            debug!("File '{}' is empty", self.file_path.display());
            return Vec::new();
        }

        let data: Value = match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    "Error decoding JSON data in '{}': {}",
                    self.file_path.display(),
                    e
                );
                self.preserve_unreadable();
                return Vec::new();
            }
        };

        let items = match data {
            Value::Array(items) => items,
            _ => {
                error!(
                    "Data in the file '{}' is not a valid list",
                    self.file_path.display()
                );
                self.preserve_unreadable();
                return Vec::new();
            }
        };

        let total = items.len();
        let mut records = Vec::with_capacity(total);

        for (index, item) in items.into_iter().enumerate() {
            let Value::Object(fields) = &item else {
                warn!("Skipping {} entry #{}: not an object", T::KIND, index);
                continue;
            };

            if !T::is_valid_data(fields) {
                warn!("Skipping {} entry #{}: missing fields", T::KIND, index);
                continue;
            }

            match T::from_raw(item) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping {} entry #{}: {}", T::KIND, index, e),
            }
        }

        if records.len() < total {
            warn!(
                "Loaded {} of {} {} records from {}",
                records.len(),
                total,
                T::KIND,
                self.file_path.display()
            );
        } else {
            info!(
                "Loaded {} {} records from {}",
                total,
                T::KIND,
                self.file_path.display()
            );
        }

        records
    }

    /// Copies an unreadable data file aside before anything can overwrite it.
    fn preserve_unreadable(&self) {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let mut file_name = self.file_path.as_os_str().to_owned();
        file_name.push(format!(".corrupt-{}", timestamp));
        let backup_path = PathBuf::from(file_name);

        match fs::copy(&self.file_path, &backup_path) {
            Ok(_) => warn!(
                "Unreadable {} data preserved at {}",
                T::KIND,
                backup_path.display()
            ),
            Err(e) => error!(
                "Failed to preserve unreadable file {}: {}",
                self.file_path.display(),
                e
            ),
        }
    }
}

/// Persisted counter handing out note ids.
///
/// Lives next to the notes file as `<stem>.seq.json`, so ids keep growing
/// across deletions and restarts.
#[derive(Debug)]
pub struct IdSequence {
    path: PathBuf,
    next_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SequenceFile {
    next_id: u64,
}

impl IdSequence {
    /// Location of the sequence file belonging to `data_file`.
    pub fn path_for(data_file: &Path) -> PathBuf {
        let stem = data_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records".to_string());
        data_file.with_file_name(format!("{}.seq.json", stem))
    }

    /// Opens the sequence at `path`, never handing out ids below `floor`.
    pub fn open(path: impl Into<PathBuf>, floor: u64) -> Self {
        let path = path.into();

        let stored = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(PaError::from)
                .and_then(|content| Ok(serde_json::from_str::<SequenceFile>(&content)?))
            {
                Ok(file) => file.next_id,
                Err(e) => {
                    warn!("Ignoring unreadable id sequence {}: {}", path.display(), e);
                    1
                }
            }
        } else {
            1
        };

        let next_id = stored.max(floor).max(1);
        debug!("Id sequence {} starts at {}", path.display(), next_id);
        Self { path, next_id }
    }

    /// The id the next call to [`IdSequence::next`] returns.
    pub fn peek(&self) -> u64 {
        self.next_id
    }

    /// Hands out an id and persists the advanced counter.
    pub fn next(&mut self) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;

        let json = to_pretty_json(&SequenceFile {
            next_id: self.next_id,
        })?;
        write_atomically(&self.path, json.as_bytes())?;

        trace!("Issued id {}", id);
        Ok(id)
    }
}

/// Serializes with four-space indentation.
pub(crate) fn to_pretty_json<S: Serialize>(value: &S) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer)
        .map_err(|e| PaError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Replaces `file_path` with `bytes` through a temporary file in the same directory.
pub(crate) fn write_atomically(file_path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        debug!("Creating parent directory: {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory {}: {}", dir.display(), e);
            PaError::DirectoryError {
                path: dir.to_path_buf(),
            }
        })?;
    }

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        PaError::Io(e)
    })?;

    temp_file.write_all(bytes).map_err(|e| {
        error!("Failed to write to temporary file: {}", e);
        PaError::Io(e)
    })?;

    temp_file.flush().map_err(|e| {
        error!("Failed to flush temporary file: {}", e);
        PaError::Io(e)
    })?;

    temp_file.persist(file_path).map_err(|e| {
        error!(
            "Error writing to file '{}': {}",
            file_path.display(),
            e.error
        );
        PaError::Io(e.error)
    })?;

    Ok(())
}
