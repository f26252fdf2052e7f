//! Core library surface for the Student Records TUI application.
//!
//! The record managers in [`service`] hold every rule about students, courses
//! and enrollments. They talk to storage only through the ports in [`store`],
//! so the same managers run over SQLite in the binary and over an in-memory
//! store in tests.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod ui;

/// Persistence entry points used by `main.rs` to open the embedded database.
pub use db::{Database, SqliteStore};

/// Typed failure returned by every manager operation.
pub use error::{RecordsError, Result};

/// The domain types other layers manipulate.
pub use models::{
    Course, Enrollment, EnrollmentId, EnrollmentStatus, Grade, NewEnrollment, Student,
    Transcript, TranscriptLine,
};

pub use config::AppConfig;
pub use service::{CourseManager, EnrollmentManager, Records, StudentManager};
pub use store::MemoryStore;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
