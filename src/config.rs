use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".student-records";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "records.sqlite";
/// Log file written next to the database; the terminal belongs to the UI.
const LOG_FILE_NAME: &str = "student-records.log";
/// Environment variable that relocates the whole data directory.
pub const HOME_ENV: &str = "STUDENT_RECORDS_HOME";

/// Where the application keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
}

impl AppConfig {
    /// Resolve the data directory from `STUDENT_RECORDS_HOME`, falling back to
    /// `~/.student-records`.
    pub fn load() -> Result<Self> {
        if let Some(dir) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::in_dir(dir));
        }

        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::in_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    /// Lay every file out beneath `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let data_dir = dir.as_ref().to_path_buf();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            data_dir,
        }
    }
}
