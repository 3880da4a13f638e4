//! Delimited session record format
//!
//! A session file is a header record followed by one record per tick, each
//! record a JSON object terminated by a single delimiter character:
//!
//! ```text
//! <header-json>|<tick1-json>|<tick2-json>|...|<tickN-json>|
//! ```
//!
//! The file as a whole is not JSON. Splitting on the delimiter yields
//! `N + 2` segments; the last one (after the trailing delimiter) is always
//! dropped, which also discards a record left half-written by a crash.
//!
//! Labels authored during playback live in a sibling file
//! `<base>_Labels<ext>` holding `{"list":[...]}` with one entry per tick.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::{DirectorError, Result};

use super::types::{EnvironmentData, LabelList, StateData};

/// Default record delimiter
pub const DEFAULT_DELIMITER: char = '|';

/// Default session file extension
pub const DEFAULT_EXTENSION: &str = "json";

/// Suffix appended to a session's base name for its label file
pub const LABEL_SUFFIX: &str = "_Labels";

/// Marker used to recognise label files by name
const LABEL_MARKER: &str = "Labels";

/// Directory holding data files relative to a label file's directory
const LEGACY_DATA_DIR: &str = "../Data";

/// Check whether a path names a label file rather than a data file
pub fn is_label_file(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.contains(LABEL_MARKER))
}

/// Label file path for a data file: `<dir>/<base>_Labels.<ext>`
pub fn label_path_for(data_path: &Path) -> PathBuf {
    let stem = data_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}{LABEL_SUFFIX}");
    if let Some(ext) = data_path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    data_path.with_file_name(name)
}

/// Candidate data file paths for a label file, in lookup order
///
/// The same directory is tried first, then the `../Data/` layout used by
/// older capture tools.
pub fn data_path_candidates(label_path: &Path) -> Vec<PathBuf> {
    let stem = label_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = match stem.find(LABEL_SUFFIX) {
        Some(pos) => &stem[..pos],
        None => stem.trim_end_matches(LABEL_MARKER),
    };
    let mut name = base.to_string();
    if let Some(ext) = label_path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }

    let dir = label_path.parent().unwrap_or_else(|| Path::new(""));
    vec![dir.join(&name), dir.join(LEGACY_DATA_DIR).join(&name)]
}

// ==================== Writing ====================

/// Append-only writer for a session file
///
/// Every record is flushed as soon as it is written, so a crash loses at
/// most the record in flight.
#[derive(Debug)]
pub struct SessionWriter {
    path: PathBuf,
    delimiter: char,
    writer: Option<BufWriter<File>>,
    header_written: bool,
    ticks_written: usize,
}

impl SessionWriter {
    /// Create (or truncate) a session file, creating parent directories
    pub fn create(path: impl Into<PathBuf>, delimiter: char) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        tracing::debug!("Opened session writer at {:?}", path);
        Ok(Self {
            path,
            delimiter,
            writer: Some(BufWriter::new(file)),
            header_written: false,
            ticks_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn ticks_written(&self) -> usize {
        self.ticks_written
    }

    /// Write the header record. Must be the first record, written once.
    pub fn write_header(&mut self, env: &EnvironmentData) -> Result<()> {
        if self.header_written {
            return Err(DirectorError::Serialization(
                "session header already written".to_string(),
            ));
        }
        let json =
            serde_json::to_string(env).map_err(|e| DirectorError::Serialization(e.to_string()))?;
        self.write_record(&json)?;
        self.header_written = true;
        Ok(())
    }

    /// Append one tick record
    pub fn append_tick(&mut self, state: &StateData) -> Result<()> {
        if !self.header_written {
            return Err(DirectorError::Serialization(
                "tick written before session header".to_string(),
            ));
        }
        let json = serde_json::to_string(state)
            .map_err(|e| DirectorError::Serialization(e.to_string()))?;
        self.write_record(&json)?;
        self.ticks_written += 1;
        Ok(())
    }

    fn write_record(&mut self, json: &str) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(DirectorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "session writer is closed",
            )));
        };
        let mut delim = [0u8; 4];
        writer.write_all(json.as_bytes())?;
        writer.write_all(self.delimiter.encode_utf8(&mut delim).as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Close the file. Closing an already closed writer is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            tracing::debug!(
                "Closed session writer at {:?} ({} ticks)",
                self.path,
                self.ticks_written
            );
        }
        Ok(())
    }
}

/// Writer for a label file, opened at label-authoring start and filled at stop
#[derive(Debug)]
pub struct LabelWriter {
    path: PathBuf,
    file: Option<File>,
}

impl LabelWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Write the label array and close the file
    pub fn finish(&mut self, labels: &LabelList) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        let json = serde_json::to_string(labels)
            .map_err(|e| DirectorError::Serialization(e.to_string()))?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Close without writing. Idempotent.
    pub fn close(&mut self) {
        self.file = None;
    }
}

// ==================== Reading ====================

/// A session file loaded for playback
///
/// The whole file is read once and split into record spans; tick records
/// are decoded only when visited.
#[derive(Debug)]
pub struct SessionFile {
    data_path: PathBuf,
    header: EnvironmentData,
    text: String,
    ticks: Vec<Range<usize>>,
    labels: Option<LabelList>,
}

impl SessionFile {
    /// Open a data file, or a label file together with its sibling data file
    pub fn open(path: &Path, delimiter: char) -> Result<Self> {
        if !path.is_file() {
            return Err(DirectorError::SessionNotFound(path.to_path_buf()));
        }

        let (data_path, labels) = if is_label_file(path) {
            let labels = read_labels(path)?;
            let candidates = data_path_candidates(path);
            let data_path = candidates
                .iter()
                .find(|p| p.is_file())
                .cloned()
                .ok_or_else(|| DirectorError::SessionNotFound(candidates[0].clone()))?;
            tracing::debug!("Label file {:?} pairs with data file {:?}", path, data_path);
            (data_path, Some(labels))
        } else {
            (path.to_path_buf(), None)
        };

        let text = std::fs::read_to_string(&data_path)?;
        let mut file = Self::parse(text, delimiter)?;
        file.data_path = data_path;

        if let Some(labels) = labels {
            if labels.len() < file.tick_count() {
                return Err(DirectorError::LabelMismatch {
                    labels: labels.len(),
                    ticks: file.tick_count(),
                });
            }
            file.labels = Some(labels);
        }

        tracing::info!(
            "Loaded session {:?}: {} ticks, {} cameras, {} avatars",
            file.data_path,
            file.tick_count(),
            file.header.num_cameras,
            file.header.num_avatars
        );
        Ok(file)
    }

    /// Split already-loaded text into records and decode the header
    pub fn parse(text: String, delimiter: char) -> Result<Self> {
        let mut spans = Vec::new();
        let mut start = 0;
        for (pos, _) in text.match_indices(delimiter) {
            spans.push(start..pos);
            start = pos + delimiter.len_utf8();
        }
        // The trailing segment after the last delimiter is never a record.

        let header_span = if spans.is_empty() { 0..0 } else { spans.remove(0) };
        let header: EnvironmentData =
            serde_json::from_str(&text[header_span]).map_err(DirectorError::Header)?;
        if header.checked_interval().is_none() {
            return Err(DirectorError::InvalidHeader(format!(
                "invokeInterval {} is not a usable tick interval",
                header.invoke_interval
            )));
        }

        Ok(Self {
            data_path: PathBuf::new(),
            header,
            text,
            ticks: spans,
            labels: None,
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn header(&self) -> &EnvironmentData {
        &self.header
    }

    /// Number of tick records
    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    /// Raw JSON text of tick `index` (1-based)
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or greater than [`Self::tick_count`].
    pub fn raw_tick(&self, index: usize) -> &str {
        &self.text[self.ticks[index - 1].clone()]
    }

    /// Decode tick `index` (1-based) and check it against the header
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or greater than [`Self::tick_count`].
    pub fn tick(&self, index: usize) -> Result<StateData> {
        let state: StateData = serde_json::from_str(self.raw_tick(index))
            .map_err(|source| DirectorError::Record { index, source })?;
        state
            .matches(&self.header)
            .map_err(|message| DirectorError::Inconsistent { index, message })?;
        Ok(state)
    }

    pub fn labels(&self) -> Option<&LabelList> {
        self.labels.as_ref()
    }

    /// Recorded label for tick `index` (1-based), if a label stream is loaded
    pub fn label(&self, index: usize) -> Option<i32> {
        self.labels
            .as_ref()
            .and_then(|l| l.list.get(index.checked_sub(1)?).copied())
    }
}

/// Read a label file
pub fn read_labels(path: &Path) -> Result<LabelList> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json)
        .map_err(|e| DirectorError::Serialization(format!("label file {}: {e}", path.display())))
}
