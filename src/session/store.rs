use super::message::Message;
use super::transcript::Transcript;
use crate::error::StorageError;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const HISTORY_FILE_PREFIX: &str = "conversation_history_";
const HISTORY_TIMESTAMP_FORMAT: &str = "%m%d%y_%H%M%S";

/// JSON file holding one session's transcript.
///
/// The file is a plain array of `{role, content}` objects in chronological
/// order; saving replaces the previous contents atomically.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the history file inside `dir`.
    ///
    /// A relative `file` is joined onto `dir`; an absolute one is used as-is.
    /// Without a file name, a timestamped one is generated from `now`.
    pub fn in_dir<Tz>(dir: &Path, file: Option<&str>, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let path = match file {
            Some(name) => dir.join(name),
            None => dir.join(default_file_name(now)),
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })
    }

    /// Read the stored transcript. `Ok(None)` means no file exists yet.
    pub fn load(&self) -> Result<Option<Transcript>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let messages: Vec<Message> =
            serde_json::from_str(&raw).map_err(|source| StorageError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        Transcript::from_messages(messages)
            .map(Some)
            .map_err(|reason| StorageError::Invalid {
                path: self.path.clone(),
                reason: reason.to_string(),
            })
    }

    pub fn save(&self, transcript: &Transcript) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(transcript).map_err(|source| {
            StorageError::Write {
                path: self.path.clone(),
                source: io::Error::other(source),
            }
        })?;
        write_atomic(&self.path, &json).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// `conversation_history_<MMDDYY_HHMMSS>.json` for the given instant.
pub fn default_file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{HISTORY_FILE_PREFIX}{}.json",
        now.format(HISTORY_TIMESTAMP_FORMAT)
    )
}

fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;

    if let Err(rename_error) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(rename_error);
    }

    Ok(())
}
