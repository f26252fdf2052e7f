use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::{RecordsError, Result};
use crate::models::{Student, ENROLLMENT_YEARS};
use crate::store::{EnrollmentStore, StudentStore};

/// Validation and CRUD orchestration for students.
pub struct StudentManager {
    students: Rc<dyn StudentStore>,
    enrollments: Rc<dyn EnrollmentStore>,
}

fn check_enrollment_year(year: i32) -> Result<()> {
    if !ENROLLMENT_YEARS.contains(&year) {
        return Err(RecordsError::validation(format!(
            "Enrollment year must be between {} and {}.",
            ENROLLMENT_YEARS.start(),
            ENROLLMENT_YEARS.end()
        )));
    }
    Ok(())
}

impl StudentManager {
    pub fn new(students: Rc<dyn StudentStore>, enrollments: Rc<dyn EnrollmentStore>) -> Self {
        Self {
            students,
            enrollments,
        }
    }

    pub fn create(&self, student: &Student) -> Result<()> {
        if student.index_number.trim().is_empty() {
            return Err(RecordsError::validation("Index number is required."));
        }
        check_enrollment_year(student.enrollment_year)?;
        if self.students.find_by_index(&student.index_number)?.is_some() {
            warn!(index = %student.index_number, "duplicate student rejected");
            return Err(RecordsError::conflict(format!(
                "Student with index {} already exists.",
                student.index_number
            )));
        }

        self.students.save(student)?;
        info!(index = %student.index_number, "student created");
        Ok(())
    }

    pub fn update(&self, student: &Student) -> Result<()> {
        check_enrollment_year(student.enrollment_year)?;
        if self.students.find_by_index(&student.index_number)?.is_none() {
            return Err(student_not_found(&student.index_number));
        }

        self.students.update(student)?;
        info!(index = %student.index_number, "student updated");
        Ok(())
    }

    /// Remove a student. Refused while any enrollment still points at them.
    pub fn delete(&self, index_number: &str) -> Result<()> {
        if self.enrollments.has_any_for_student(index_number)? {
            warn!(index = %index_number, "delete blocked by enrollments");
            return Err(RecordsError::conflict(format!(
                "Student {index_number} has recorded enrollments and cannot be deleted."
            )));
        }
        if !self.students.delete(index_number)? {
            return Err(student_not_found(index_number));
        }
        info!(index = %index_number, "student deleted");
        Ok(())
    }

    pub fn find_by_index(&self, index_number: &str) -> Result<Student> {
        self.students
            .find_by_index(index_number)?
            .ok_or_else(|| student_not_found(index_number))
    }

    pub fn list_all(&self) -> Result<Vec<Student>> {
        let students = self.students.list_all()?;
        debug!(count = students.len(), "listed students");
        Ok(students)
    }

    pub fn search_by_last_name_prefix(&self, prefix: &str) -> Result<Vec<Student>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(RecordsError::validation(
                "Last name prefix must not be blank.",
            ));
        }
        let students = self.students.find_by_last_name_prefix(prefix)?;
        debug!(prefix, count = students.len(), "searched students");
        Ok(students)
    }
}

pub(crate) fn student_not_found(index_number: &str) -> RecordsError {
    RecordsError::not_found(format!("Student {index_number} does not exist."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Records;

    fn student(index: &str, first: &str, last: &str) -> Student {
        Student::new(index, first, last, "Information Technology", 2020)
    }

    #[test]
    fn created_student_can_be_found_again() {
        let records = Records::in_memory();
        let created = student("100/IT-20", "Ana", "Anic");
        records.students.create(&created).unwrap();

        let found = records.students.find_by_index("100/IT-20").unwrap();
        assert_eq!(found, created);
        assert_eq!(found.first_name, "Ana");
        assert_eq!(found.enrollment_year, 2020);
    }

    #[test]
    fn second_create_with_same_index_conflicts() {
        let records = Records::in_memory();
        records
            .students
            .create(&student("100/IT-20", "Ana", "Anic"))
            .unwrap();
        let err = records
            .students
            .create(&student("100/IT-20", "Other", "Person"))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn blank_index_and_year_bounds_are_validated() {
        let records = Records::in_memory();
        assert!(records
            .students
            .create(&student("  ", "Ana", "Anic"))
            .unwrap_err()
            .is_validation());

        let mut early = student("1/IT", "Ana", "Anic");
        early.enrollment_year = 2019;
        assert!(records.students.create(&early).unwrap_err().is_validation());

        let mut late = student("2/IT", "Ana", "Anic");
        late.enrollment_year = 2051;
        assert!(records.students.create(&late).unwrap_err().is_validation());

        let mut last_year = student("3/IT", "Ana", "Anic");
        last_year.enrollment_year = 2050;
        assert!(records.students.create(&last_year).is_ok());
    }

    #[test]
    fn update_requires_existing_student() {
        let records = Records::in_memory();
        let err = records
            .students
            .update(&student("404/IT", "No", "Body"))
            .unwrap_err();
        assert!(err.is_not_found());

        records
            .students
            .create(&student("100/IT-20", "Ana", "Anic"))
            .unwrap();
        let mut changed = student("100/IT-20", "Ana", "Maric");
        changed.study_program = "Mathematics".into();
        records.students.update(&changed).unwrap();
        let found = records.students.find_by_index("100/IT-20").unwrap();
        assert_eq!(found.last_name, "Maric");
        assert_eq!(found.study_program, "Mathematics");
    }

    #[test]
    fn listing_orders_by_last_then_first_name() {
        let records = Records::in_memory();
        for s in [
            student("1", "Zlatan", "Begic"),
            student("2", "Amar", "Begic"),
            student("3", "Ivo", "Andric"),
        ] {
            records.students.create(&s).unwrap();
        }
        let order: Vec<_> = records
            .students
            .list_all()
            .unwrap()
            .into_iter()
            .map(|s| s.index_number)
            .collect();
        assert_eq!(order, ["3", "2", "1"]);
    }

    #[test]
    fn blank_prefix_is_rejected_even_with_students_present() {
        let records = Records::in_memory();
        assert!(records
            .students
            .search_by_last_name_prefix("")
            .unwrap_err()
            .is_validation());
        records
            .students
            .create(&student("1", "Ana", "Anic"))
            .unwrap();
        assert!(records
            .students
            .search_by_last_name_prefix("   ")
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn prefix_search_is_case_sensitive_and_trimmed() {
        let records = Records::in_memory();
        records
            .students
            .create(&student("1", "Ana", "Smajic"))
            .unwrap();
        records
            .students
            .create(&student("2", "Edo", "Selimovic"))
            .unwrap();
        records
            .students
            .create(&student("3", "Ivo", "smith"))
            .unwrap();

        let found = records.students.search_by_last_name_prefix(" S ").unwrap();
        let names: Vec<_> = found.iter().map(|s| s.last_name.as_str()).collect();
        assert_eq!(names, ["Selimovic", "Smajic"]);
    }

    #[test]
    fn delete_without_enrollments_succeeds() {
        let records = Records::in_memory();
        records
            .students
            .create(&student("1", "Ana", "Anic"))
            .unwrap();
        records.students.delete("1").unwrap();
        assert!(records.students.find_by_index("1").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_of_unknown_student_reports_not_found() {
        let records = Records::in_memory();
        assert!(records.students.delete("missing").unwrap_err().is_not_found());
    }
}
