//! Storage-agnostic ports the managers depend on. Each call is one
//! self-contained persistence operation; nothing here spans a transaction.
//!
//! Updates and deletes report whether a row was touched so callers can decide
//! whether a missing record is an error.

mod memory;

pub use memory::MemoryStore;

use anyhow::Result;

use crate::models::{Course, Enrollment, EnrollmentId, NewEnrollment, Student};

pub trait StudentStore {
    fn save(&self, student: &Student) -> Result<()>;
    fn update(&self, student: &Student) -> Result<bool>;
    fn delete(&self, index_number: &str) -> Result<bool>;
    fn find_by_index(&self, index_number: &str) -> Result<Option<Student>>;
    /// Every student ordered by last name, then first name.
    fn list_all(&self) -> Result<Vec<Student>>;
    /// Case-sensitive prefix match on the last name, same ordering as
    /// [`StudentStore::list_all`].
    fn find_by_last_name_prefix(&self, prefix: &str) -> Result<Vec<Student>>;
}

pub trait CourseStore {
    fn save(&self, course: &Course) -> Result<()>;
    fn update(&self, course: &Course) -> Result<bool>;
    fn delete(&self, code: &str) -> Result<bool>;
    fn find_by_code(&self, code: &str) -> Result<Option<Course>>;
    /// Every course ordered by code.
    fn list_all(&self) -> Result<Vec<Course>>;
    /// Prefix match on the course name, ordered by name.
    fn find_by_name_prefix(&self, prefix: &str) -> Result<Vec<Course>>;
}

pub trait EnrollmentStore {
    /// Insert an ungraded enrollment and return the id the store assigned.
    fn save(&self, enrollment: &NewEnrollment) -> Result<EnrollmentId>;
    fn update(&self, enrollment: &Enrollment) -> Result<bool>;
    fn delete(&self, id: EnrollmentId) -> Result<bool>;
    fn find_by_id(&self, id: EnrollmentId) -> Result<Option<Enrollment>>;
    /// Ordered by academic year, then course code.
    fn find_by_student(&self, index_number: &str) -> Result<Vec<Enrollment>>;
    /// Ordered by course code.
    fn find_by_student_and_year(
        &self,
        index_number: &str,
        academic_year: &str,
    ) -> Result<Vec<Enrollment>>;
    /// Ordered by academic year, then student index.
    fn find_by_course(&self, code: &str) -> Result<Vec<Enrollment>>;
    fn exists_triple(&self, index_number: &str, code: &str, academic_year: &str) -> Result<bool>;
    fn has_any_for_student(&self, index_number: &str) -> Result<bool>;
    fn has_any_for_course(&self, code: &str) -> Result<bool>;
}
