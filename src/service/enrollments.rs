//! Enrollment and grading rules, plus transcript construction.
//!
//! An enrollment starts ungraded. `enter_grade` records the first grade and
//! refuses to run again; any later change goes through `amend_grade`, which
//! always stores a reason. `amend_grade` does not require a prior grade, so it
//! can also serve as the first entry when a reason is worth recording.

use std::rc::Rc;

use tracing::{debug, info, warn};

use super::courses::course_not_found;
use super::students::student_not_found;
use crate::error::{RecordsError, Result};
use crate::models::{
    Enrollment, EnrollmentId, Grade, NewEnrollment, Transcript, TranscriptLine,
};
use crate::store::{CourseStore, EnrollmentStore, StudentStore};

pub struct EnrollmentManager {
    enrollments: Rc<dyn EnrollmentStore>,
    students: Rc<dyn StudentStore>,
    courses: Rc<dyn CourseStore>,
}

impl EnrollmentManager {
    pub fn new(
        enrollments: Rc<dyn EnrollmentStore>,
        students: Rc<dyn StudentStore>,
        courses: Rc<dyn CourseStore>,
    ) -> Self {
        Self {
            enrollments,
            students,
            courses,
        }
    }

    /// Enroll a student in a course for one academic year and return the new
    /// enrollment id. Checks run student, course, duplicate, in that order.
    pub fn enroll(
        &self,
        student_index: &str,
        course_code: &str,
        academic_year: &str,
    ) -> Result<EnrollmentId> {
        self.require_student(student_index)?;
        if self.courses.find_by_code(course_code)?.is_none() {
            return Err(course_not_found(course_code));
        }
        if self
            .enrollments
            .exists_triple(student_index, course_code, academic_year)?
        {
            warn!(
                student = student_index,
                course = course_code,
                year = academic_year,
                "duplicate enrollment rejected"
            );
            return Err(RecordsError::conflict(format!(
                "Student {student_index} is already enrolled in {course_code} for {academic_year}."
            )));
        }

        let id = self.enrollments.save(&NewEnrollment {
            student_index: student_index.to_string(),
            course_code: course_code.to_string(),
            academic_year: academic_year.to_string(),
        })?;
        info!(
            id,
            student = student_index,
            course = course_code,
            year = academic_year,
            "student enrolled"
        );
        Ok(id)
    }

    /// Delete an enrollment in any state. A missing id is not an error.
    pub fn unenroll(&self, id: EnrollmentId) -> Result<()> {
        if self.enrollments.delete(id)? {
            info!(id, "enrollment removed");
        } else {
            debug!(id, "unenroll of unknown enrollment ignored");
        }
        Ok(())
    }

    /// Record the first grade of an enrollment.
    pub fn enter_grade(&self, id: EnrollmentId, grade: i64) -> Result<()> {
        let grade = Grade::new(grade)?;
        let mut enrollment = self.find_by_id(id)?;
        if enrollment.grade.is_some() {
            warn!(id, "grade entry rejected, grade already present");
            return Err(RecordsError::conflict(
                "Grade already exists; use amend to change it.",
            ));
        }

        enrollment.grade = Some(grade);
        self.enrollments.update(&enrollment)?;
        info!(id, grade = grade.value(), "grade entered");
        Ok(())
    }

    /// Overwrite the grade and record why it changed.
    pub fn amend_grade(&self, id: EnrollmentId, new_grade: i64, reason: &str) -> Result<()> {
        let grade = Grade::new(new_grade)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(RecordsError::validation(
                "A reason is required to amend a grade.",
            ));
        }
        let mut enrollment = self.find_by_id(id)?;

        let previous = enrollment.grade.map(Grade::value);
        enrollment.grade = Some(grade);
        enrollment.amendment_reason = Some(reason.to_string());
        self.enrollments.update(&enrollment)?;
        info!(id, ?previous, grade = grade.value(), "grade amended");
        Ok(())
    }

    pub fn find_by_id(&self, id: EnrollmentId) -> Result<Enrollment> {
        self.enrollments
            .find_by_id(id)?
            .ok_or_else(|| RecordsError::not_found(format!("Enrollment {id} does not exist.")))
    }

    /// A student's enrollments ordered by academic year, then course code.
    pub fn list_for_student(&self, student_index: &str) -> Result<Vec<Enrollment>> {
        self.require_student(student_index)?;
        Ok(self.enrollments.find_by_student(student_index)?)
    }

    pub fn list_for_student_in_year(
        &self,
        student_index: &str,
        academic_year: &str,
    ) -> Result<Vec<Enrollment>> {
        self.require_student(student_index)?;
        Ok(self
            .enrollments
            .find_by_student_and_year(student_index, academic_year)?)
    }

    /// A course roster ordered by academic year, then student index. An
    /// unknown course simply has no enrollments.
    pub fn list_for_course(&self, course_code: &str) -> Result<Vec<Enrollment>> {
        Ok(self.enrollments.find_by_course(course_code)?)
    }

    /// Join a student's enrollments with their courses and total the credits
    /// of passed courses. Enrollments pointing at a course that no longer
    /// exists are left out instead of failing the whole transcript.
    pub fn build_transcript(&self, student_index: &str) -> Result<Transcript> {
        let student = self
            .students
            .find_by_index(student_index)?
            .ok_or_else(|| student_not_found(student_index))?;

        let mut lines = Vec::new();
        for enrollment in self.enrollments.find_by_student(student_index)? {
            let Some(course) = self.courses.find_by_code(&enrollment.course_code)? else {
                debug!(
                    id = enrollment.id,
                    course = %enrollment.course_code,
                    "skipping enrollment with a dangling course"
                );
                continue;
            };
            lines.push(TranscriptLine {
                course_code: course.code,
                course_name: course.name,
                academic_year: enrollment.academic_year,
                grade: enrollment.grade,
                ects: course.ects,
            });
        }

        let total_earned_credits = lines
            .iter()
            .filter(|line| line.is_passed())
            .map(|line| line.ects)
            .sum();

        Ok(Transcript {
            student_index: student.index_number.clone(),
            full_name: student.full_name(),
            lines,
            total_earned_credits,
        })
    }

    /// Printable form of a transcript: header, one row per course, total.
    pub fn format_transcript(&self, transcript: &Transcript) -> String {
        transcript.to_string()
    }

    fn require_student(&self, student_index: &str) -> Result<()> {
        if self.students.find_by_index(student_index)?.is_none() {
            return Err(student_not_found(student_index));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::models::{Course, EnrollmentStatus, Student};
    use crate::service::Records;
    use crate::store::MemoryStore;

    const INDEX: &str = "100/IT-20";
    const YEAR: &str = "2024/25";

    fn seeded() -> (Rc<MemoryStore>, Records) {
        let store = Rc::new(MemoryStore::new());
        let records = Records::new(store.clone(), store.clone(), store.clone());
        records
            .students
            .create(&Student::new(INDEX, "Ana", "Anic", "IT", 2020))
            .unwrap();
        for (code, name, ects) in [
            ("MAT1", "Mathematics 1", 6),
            ("MAT2", "Mathematics 2", 5),
            ("MAT3", "Mathematics 3", 4),
        ] {
            records
                .courses
                .create(&Course::new(code, name, ects, 1))
                .unwrap();
        }
        (store, records)
    }

    #[test]
    fn enroll_returns_an_ungraded_enrollment() {
        let (_, records) = seeded();
        let id = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        let enrollment = records.enrollments.find_by_id(id).unwrap();
        assert_eq!(enrollment.status(), EnrollmentStatus::Ungraded);
        assert_eq!(enrollment.course_code, "MAT1");
        assert_eq!(enrollment.academic_year, YEAR);
    }

    #[test]
    fn repeated_enrollment_conflicts() {
        let (_, records) = seeded();
        records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        let err = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap_err();
        assert!(err.is_conflict());
        // Another year is a different enrollment.
        assert!(records.enrollments.enroll(INDEX, "MAT1", "2025/26").is_ok());
    }

    #[test]
    fn unknown_references_fail_before_any_write() {
        let (store, records) = seeded();
        let writes = store.write_count();

        let err = records.enrollments.enroll("999/XX", "MAT1", YEAR).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Student"));

        let err = records.enrollments.enroll(INDEX, "NOPE", YEAR).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Course"));

        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn student_is_checked_before_course() {
        let (_, records) = seeded();
        let err = records.enrollments.enroll("999/XX", "NOPE", YEAR).unwrap_err();
        assert_eq!(err.to_string(), "Student 999/XX does not exist.");
    }

    #[test]
    fn second_grade_entry_conflicts_and_amend_overwrites() {
        let (_, records) = seeded();
        let id = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        records.enrollments.enter_grade(id, 7).unwrap();
        assert!(records.enrollments.enter_grade(id, 8).unwrap_err().is_conflict());

        records
            .enrollments
            .amend_grade(id, 9, "exam review")
            .unwrap();
        let enrollment = records.enrollments.find_by_id(id).unwrap();
        assert_eq!(enrollment.grade.map(Grade::value), Some(9));
        assert_eq!(enrollment.amendment_reason.as_deref(), Some("exam review"));

        records
            .enrollments
            .amend_grade(id, 6, "second review")
            .unwrap();
        let enrollment = records.enrollments.find_by_id(id).unwrap();
        assert_eq!(enrollment.grade.map(Grade::value), Some(6));
        assert_eq!(enrollment.amendment_reason.as_deref(), Some("second review"));
        assert_eq!(enrollment.status(), EnrollmentStatus::Amended);
    }

    #[test]
    fn grade_bounds_apply_to_entry_and_amendment() {
        let (_, records) = seeded();
        let low = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        let high = records.enrollments.enroll(INDEX, "MAT2", YEAR).unwrap();

        for bad in [4, 11] {
            assert!(records.enrollments.enter_grade(low, bad).unwrap_err().is_validation());
            assert!(records
                .enrollments
                .amend_grade(low, bad, "typo")
                .unwrap_err()
                .is_validation());
        }
        records.enrollments.enter_grade(low, 5).unwrap();
        records.enrollments.enter_grade(high, 10).unwrap();
        records.enrollments.amend_grade(low, 5, "rechecked").unwrap();
        records.enrollments.amend_grade(high, 10, "rechecked").unwrap();
    }

    #[test]
    fn grade_is_validated_before_lookup() {
        let (_, records) = seeded();
        assert!(records.enrollments.enter_grade(42, 3).unwrap_err().is_validation());
        assert!(records.enrollments.enter_grade(42, 7).unwrap_err().is_not_found());
        assert!(records
            .enrollments
            .amend_grade(42, 7, "   ")
            .unwrap_err()
            .is_validation());
        assert!(records
            .enrollments
            .amend_grade(42, 7, "reason")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn amend_works_on_an_ungraded_enrollment() {
        let (_, records) = seeded();
        let id = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        records
            .enrollments
            .amend_grade(id, 8, "late entry")
            .unwrap();
        let enrollment = records.enrollments.find_by_id(id).unwrap();
        assert_eq!(enrollment.grade.map(Grade::value), Some(8));
        assert!(records.enrollments.enter_grade(id, 9).unwrap_err().is_conflict());
    }

    #[test]
    fn unenroll_of_unknown_id_is_a_no_op() {
        let (store, records) = seeded();
        let writes = store.write_count();
        records.enrollments.unenroll(12345).unwrap();
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn unenroll_removes_graded_enrollments_too() {
        let (_, records) = seeded();
        let id = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        records.enrollments.enter_grade(id, 7).unwrap();
        records.enrollments.unenroll(id).unwrap();
        assert!(records.enrollments.find_by_id(id).unwrap_err().is_not_found());
    }

    #[test]
    fn listings_are_ordered_and_checked() {
        let (_, records) = seeded();
        records.enrollments.enroll(INDEX, "MAT2", "2025/26").unwrap();
        records.enrollments.enroll(INDEX, "MAT3", YEAR).unwrap();
        records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();

        let order: Vec<_> = records
            .enrollments
            .list_for_student(INDEX)
            .unwrap()
            .into_iter()
            .map(|e| (e.academic_year, e.course_code))
            .collect();
        assert_eq!(
            order,
            [
                (YEAR.to_string(), "MAT1".to_string()),
                (YEAR.to_string(), "MAT3".to_string()),
                ("2025/26".to_string(), "MAT2".to_string()),
            ]
        );

        let this_year = records
            .enrollments
            .list_for_student_in_year(INDEX, YEAR)
            .unwrap();
        assert_eq!(this_year.len(), 2);

        assert!(records
            .enrollments
            .list_for_student("999/XX")
            .unwrap_err()
            .is_not_found());
        assert!(records.enrollments.list_for_course("NOPE").unwrap().is_empty());
    }

    #[test]
    fn course_roster_orders_by_year_then_student() {
        let (_, records) = seeded();
        records
            .students
            .create(&Student::new("050/IT-21", "Edo", "Begic", "IT", 2021))
            .unwrap();
        records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        records.enrollments.enroll("050/IT-21", "MAT1", YEAR).unwrap();
        records.enrollments.enroll(INDEX, "MAT1", "2023/24").unwrap();

        let roster: Vec<_> = records
            .enrollments
            .list_for_course("MAT1")
            .unwrap()
            .into_iter()
            .map(|e| (e.academic_year, e.student_index))
            .collect();
        assert_eq!(
            roster,
            [
                ("2023/24".to_string(), INDEX.to_string()),
                (YEAR.to_string(), "050/IT-21".to_string()),
                (YEAR.to_string(), INDEX.to_string()),
            ]
        );
    }

    #[test]
    fn transcript_counts_only_passed_courses() {
        let (_, records) = seeded();
        let mat1 = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        let mat2 = records.enrollments.enroll(INDEX, "MAT2", YEAR).unwrap();
        records.enrollments.enroll(INDEX, "MAT3", YEAR).unwrap();
        records.enrollments.enter_grade(mat1, 7).unwrap();
        records.enrollments.enter_grade(mat2, 5).unwrap();

        let transcript = records.enrollments.build_transcript(INDEX).unwrap();
        assert_eq!(transcript.total_earned_credits, 6);
        assert_eq!(transcript.full_name, "Ana Anic");
        assert_eq!(transcript.lines.len(), 3);
        assert_eq!(transcript.lines[2].grade, None);

        let report = records.enrollments.format_transcript(&transcript);
        assert!(report.starts_with("Transcript of Ana Anic (100/IT-20)"));
        assert!(report.contains("MAT1 - Mathematics 1 (2024/25), grade: 7, ECTS: 6"));
        assert!(report.contains("MAT3 - Mathematics 3 (2024/25), grade: /, ECTS: 4"));
        assert!(report.ends_with("Total earned ECTS: 6"));
    }

    #[test]
    fn transcript_skips_dangling_courses() {
        let store = Rc::new(MemoryStore::new());
        let records = Records::new(store.clone(), store.clone(), store.clone());
        records
            .students
            .create(&Student::new(INDEX, "Ana", "Anic", "IT", 2020))
            .unwrap();
        records
            .courses
            .create(&Course::new("MAT1", "Mathematics 1", 6, 1))
            .unwrap();
        let id = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
        records.enrollments.enter_grade(id, 8).unwrap();

        // A course store that has lost the row the enrollment points at.
        let empty_courses = Rc::new(MemoryStore::new());
        let detached = EnrollmentManager::new(store.clone(), store.clone(), empty_courses);
        let transcript = detached.build_transcript(INDEX).unwrap();
        assert!(transcript.lines.is_empty());
        assert_eq!(transcript.total_earned_credits, 0);
    }

    #[test]
    fn transcript_for_unknown_student_is_not_found() {
        let (_, records) = seeded();
        assert!(records
            .enrollments
            .build_transcript("999/XX")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn deletes_are_blocked_while_enrollments_exist() {
        let (_, records) = seeded();
        let id = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();

        assert!(records.students.delete(INDEX).unwrap_err().is_conflict());
        assert!(records.courses.delete("MAT1").unwrap_err().is_conflict());
        assert!(records.students.find_by_index(INDEX).is_ok());
        assert!(records.courses.find_by_code("MAT1").is_ok());
        assert!(records.enrollments.find_by_id(id).is_ok());

        records.enrollments.unenroll(id).unwrap();
        records.students.delete(INDEX).unwrap();
        records.courses.delete("MAT1").unwrap();
    }
}
