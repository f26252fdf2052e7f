use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::{RecordsError, Result};
use crate::models::{Course, ECTS_RANGE, TERM_RANGE};
use crate::store::{CourseStore, EnrollmentStore};

/// Validation and CRUD orchestration for courses.
pub struct CourseManager {
    courses: Rc<dyn CourseStore>,
    enrollments: Rc<dyn EnrollmentStore>,
}

/// Checks shared by create and update. The code is checked separately since
/// update never changes it.
fn check_course_fields(course: &Course) -> Result<()> {
    if course.name.trim().is_empty() {
        return Err(RecordsError::validation("Course name is required."));
    }
    if !ECTS_RANGE.contains(&course.ects) {
        return Err(RecordsError::validation(format!(
            "ECTS must be between {} and {}.",
            ECTS_RANGE.start(),
            ECTS_RANGE.end()
        )));
    }
    if !TERM_RANGE.contains(&course.term) {
        return Err(RecordsError::validation(format!(
            "Term must be between {} and {}.",
            TERM_RANGE.start(),
            TERM_RANGE.end()
        )));
    }
    Ok(())
}

impl CourseManager {
    pub fn new(courses: Rc<dyn CourseStore>, enrollments: Rc<dyn EnrollmentStore>) -> Self {
        Self {
            courses,
            enrollments,
        }
    }

    pub fn create(&self, course: &Course) -> Result<()> {
        if course.code.trim().is_empty() {
            return Err(RecordsError::validation("Course code is required."));
        }
        check_course_fields(course)?;
        if self.courses.find_by_code(&course.code)?.is_some() {
            warn!(code = %course.code, "duplicate course rejected");
            return Err(RecordsError::conflict(format!(
                "Course {} is already registered.",
                course.code
            )));
        }

        self.courses.save(course)?;
        info!(code = %course.code, "course created");
        Ok(())
    }

    pub fn update(&self, course: &Course) -> Result<()> {
        check_course_fields(course)?;
        if self.courses.find_by_code(&course.code)?.is_none() {
            return Err(course_not_found(&course.code));
        }

        self.courses.update(course)?;
        info!(code = %course.code, "course updated");
        Ok(())
    }

    /// Remove a course. Refused while any enrollment still points at it.
    pub fn delete(&self, code: &str) -> Result<()> {
        if self.enrollments.has_any_for_course(code)? {
            warn!(code, "delete blocked by enrollments");
            return Err(RecordsError::conflict(format!(
                "Course {code} has enrollments or grades and cannot be deleted."
            )));
        }
        if !self.courses.delete(code)? {
            return Err(course_not_found(code));
        }
        info!(code, "course deleted");
        Ok(())
    }

    pub fn find_by_code(&self, code: &str) -> Result<Course> {
        self.courses
            .find_by_code(code)?
            .ok_or_else(|| course_not_found(code))
    }

    pub fn list_all(&self) -> Result<Vec<Course>> {
        let courses = self.courses.list_all()?;
        debug!(count = courses.len(), "listed courses");
        Ok(courses)
    }

    /// Courses whose name starts with `prefix`. A blank prefix matches all.
    pub fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Course>> {
        let prefix = prefix.trim();
        let courses = self.courses.find_by_name_prefix(prefix)?;
        debug!(prefix, count = courses.len(), "searched courses");
        Ok(courses)
    }
}

pub(crate) fn course_not_found(code: &str) -> RecordsError {
    RecordsError::not_found(format!("Course {code} does not exist."))
}
