use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// Handle to the on-disk SQLite database. It keeps nothing but the file path:
/// every store operation opens its own connection through [`Database::connect`]
/// and drops it when the operation's scope ends, whichever way it exits.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Make sure the parent directory and schema exist and return a handle to
    /// the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }

        let db = Self { path };
        db.ensure_schema()?;
        debug!(path = %db.path.display(), "database ready");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection with foreign keys enforced. SQLite leaves them
    /// off by default and the pragma is per connection, so it runs every time.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).context("failed to open SQLite database")?;
        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("failed to enable foreign keys")?;
        Ok(conn)
    }

    /// Create the tables if they are missing. The checks and restrictive
    /// foreign keys repeat the rules the managers enforce, so a row that slips
    /// past a manager still cannot land.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS students (
                index_number    TEXT PRIMARY KEY,
                first_name      TEXT NOT NULL,
                last_name       TEXT NOT NULL,
                study_program   TEXT NOT NULL,
                enrollment_year INTEGER NOT NULL
                    CHECK (enrollment_year BETWEEN 2020 AND 2050)
            )",
            [],
        )
        .context("failed to create students table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS courses (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                ects INTEGER NOT NULL CHECK (ects BETWEEN 1 AND 15),
                term INTEGER NOT NULL CHECK (term BETWEEN 1 AND 10)
            )",
            [],
        )
        .context("failed to create courses table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS enrollments (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                student_index    TEXT NOT NULL,
                course_code      TEXT NOT NULL,
                academic_year    TEXT NOT NULL,
                grade            INTEGER
                    CHECK (grade IS NULL OR grade BETWEEN 5 AND 10),
                amendment_reason TEXT,
                FOREIGN KEY (student_index) REFERENCES students (index_number)
                    ON DELETE RESTRICT,
                FOREIGN KEY (course_code) REFERENCES courses (code)
                    ON DELETE RESTRICT,
                UNIQUE (student_index, course_code, academic_year)
            )",
            [],
        )
        .context("failed to create enrollments table")?;

        Ok(())
    }
}
