//! SQLite persistence split across one submodule per table. The query helpers
//! take a borrowed [`rusqlite::Connection`]; [`SqliteStore`] is the port
//! implementation that opens a connection per operation and hands it to them.

mod connection;
mod courses;
mod enrollments;
mod students;

pub use connection::Database;
pub use courses::{
    delete_course, fetch_course, fetch_courses, insert_course, search_courses_by_name,
    update_course,
};
pub use enrollments::{
    course_has_enrollments, delete_enrollment, enrollment_exists, fetch_enrollment,
    fetch_enrollments_for_course, fetch_enrollments_for_student,
    fetch_enrollments_for_student_in_year, insert_enrollment, student_has_enrollments,
    update_enrollment,
};
pub use students::{
    delete_student, fetch_student, fetch_students, insert_student, search_students_by_last_name,
    update_student,
};

use anyhow::Result;

use crate::models::{Course, Enrollment, EnrollmentId, NewEnrollment, Student};
use crate::store::{CourseStore, EnrollmentStore, StudentStore};

/// All three ports backed by one SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl StudentStore for SqliteStore {
    fn save(&self, student: &Student) -> Result<()> {
        insert_student(&self.db.connect()?, student)
    }

    fn update(&self, student: &Student) -> Result<bool> {
        update_student(&self.db.connect()?, student)
    }

    fn delete(&self, index_number: &str) -> Result<bool> {
        delete_student(&self.db.connect()?, index_number)
    }

    fn find_by_index(&self, index_number: &str) -> Result<Option<Student>> {
        fetch_student(&self.db.connect()?, index_number)
    }

    fn list_all(&self) -> Result<Vec<Student>> {
        fetch_students(&self.db.connect()?)
    }

    fn find_by_last_name_prefix(&self, prefix: &str) -> Result<Vec<Student>> {
        search_students_by_last_name(&self.db.connect()?, prefix)
    }
}

impl CourseStore for SqliteStore {
    fn save(&self, course: &Course) -> Result<()> {
        insert_course(&self.db.connect()?, course)
    }

    fn update(&self, course: &Course) -> Result<bool> {
        update_course(&self.db.connect()?, course)
    }

    fn delete(&self, code: &str) -> Result<bool> {
        delete_course(&self.db.connect()?, code)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Course>> {
        fetch_course(&self.db.connect()?, code)
    }

    fn list_all(&self) -> Result<Vec<Course>> {
        fetch_courses(&self.db.connect()?)
    }

    fn find_by_name_prefix(&self, prefix: &str) -> Result<Vec<Course>> {
        search_courses_by_name(&self.db.connect()?, prefix)
    }
}

impl EnrollmentStore for SqliteStore {
    fn save(&self, enrollment: &NewEnrollment) -> Result<EnrollmentId> {
        insert_enrollment(&self.db.connect()?, enrollment)
    }

    fn update(&self, enrollment: &Enrollment) -> Result<bool> {
        update_enrollment(&self.db.connect()?, enrollment)
    }

    fn delete(&self, id: EnrollmentId) -> Result<bool> {
        delete_enrollment(&self.db.connect()?, id)
    }

    fn find_by_id(&self, id: EnrollmentId) -> Result<Option<Enrollment>> {
        fetch_enrollment(&self.db.connect()?, id)
    }

    fn find_by_student(&self, index_number: &str) -> Result<Vec<Enrollment>> {
        fetch_enrollments_for_student(&self.db.connect()?, index_number)
    }

    fn find_by_student_and_year(
        &self,
        index_number: &str,
        academic_year: &str,
    ) -> Result<Vec<Enrollment>> {
        fetch_enrollments_for_student_in_year(&self.db.connect()?, index_number, academic_year)
    }

    fn find_by_course(&self, code: &str) -> Result<Vec<Enrollment>> {
        fetch_enrollments_for_course(&self.db.connect()?, code)
    }

    fn exists_triple(&self, index_number: &str, code: &str, academic_year: &str) -> Result<bool> {
        enrollment_exists(&self.db.connect()?, index_number, code, academic_year)
    }

    fn has_any_for_student(&self, index_number: &str) -> Result<bool> {
        student_has_enrollments(&self.db.connect()?, index_number)
    }

    fn has_any_for_course(&self, code: &str) -> Result<bool> {
        course_has_enrollments(&self.db.connect()?, code)
    }
}
