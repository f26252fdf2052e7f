use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use super::{CourseStore, EnrollmentStore, StudentStore};
use crate::models::{
    Course, Enrollment, EnrollmentId, NewEnrollment, Student, ECTS_RANGE, ENROLLMENT_YEARS,
    TERM_RANGE,
};

/// Process-local store implementing every port. It upholds the same keys,
/// checks and restrictive foreign keys as the SQLite schema, so managers
/// behave identically on top of it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    students: RefCell<BTreeMap<String, Student>>,
    courses: RefCell<BTreeMap<String, Course>>,
    enrollments: RefCell<BTreeMap<EnrollmentId, Enrollment>>,
    last_id: Cell<EnrollmentId>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts, updates and deletes so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn record_write(&self) {
        self.writes.set(self.writes.get() + 1);
    }

    fn enrollments_where(&self, keep: impl Fn(&Enrollment) -> bool) -> Vec<Enrollment> {
        self.enrollments
            .borrow()
            .values()
            .filter(|enrollment| keep(enrollment))
            .cloned()
            .collect()
    }
}

fn check_student(student: &Student) -> Result<()> {
    if !ENROLLMENT_YEARS.contains(&student.enrollment_year) {
        return Err(anyhow!("CHECK constraint failed: enrollment_year"));
    }
    Ok(())
}

fn check_course(course: &Course) -> Result<()> {
    if !ECTS_RANGE.contains(&course.ects) {
        return Err(anyhow!("CHECK constraint failed: ects"));
    }
    if !TERM_RANGE.contains(&course.term) {
        return Err(anyhow!("CHECK constraint failed: term"));
    }
    Ok(())
}

impl StudentStore for MemoryStore {
    fn save(&self, student: &Student) -> Result<()> {
        check_student(student)?;
        let mut students = self.students.borrow_mut();
        if students.contains_key(&student.index_number) {
            return Err(anyhow!(
                "UNIQUE constraint failed: students.index_number"
            ));
        }
        students.insert(student.index_number.clone(), student.clone());
        self.record_write();
        Ok(())
    }

    fn update(&self, student: &Student) -> Result<bool> {
        check_student(student)?;
        let mut students = self.students.borrow_mut();
        match students.get_mut(&student.index_number) {
            Some(existing) => {
                *existing = student.clone();
                self.record_write();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, index_number: &str) -> Result<bool> {
        if self.has_any_for_student(index_number)? {
            return Err(anyhow!("FOREIGN KEY constraint failed"));
        }
        let removed = self.students.borrow_mut().remove(index_number).is_some();
        if removed {
            self.record_write();
        }
        Ok(removed)
    }

    fn find_by_index(&self, index_number: &str) -> Result<Option<Student>> {
        Ok(self.students.borrow().get(index_number).cloned())
    }

    fn list_all(&self) -> Result<Vec<Student>> {
        self.find_by_last_name_prefix("")
    }

    fn find_by_last_name_prefix(&self, prefix: &str) -> Result<Vec<Student>> {
        let mut students: Vec<Student> = self
            .students
            .borrow()
            .values()
            .filter(|student| student.last_name.starts_with(prefix))
            .cloned()
            .collect();
        students.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        Ok(students)
    }
}

impl CourseStore for MemoryStore {
    fn save(&self, course: &Course) -> Result<()> {
        check_course(course)?;
        let mut courses = self.courses.borrow_mut();
        if courses.contains_key(&course.code) {
            return Err(anyhow!("UNIQUE constraint failed: courses.code"));
        }
        courses.insert(course.code.clone(), course.clone());
        self.record_write();
        Ok(())
    }

    fn update(&self, course: &Course) -> Result<bool> {
        check_course(course)?;
        let mut courses = self.courses.borrow_mut();
        match courses.get_mut(&course.code) {
            Some(existing) => {
                *existing = course.clone();
                self.record_write();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, code: &str) -> Result<bool> {
        if self.has_any_for_course(code)? {
            return Err(anyhow!("FOREIGN KEY constraint failed"));
        }
        let removed = self.courses.borrow_mut().remove(code).is_some();
        if removed {
            self.record_write();
        }
        Ok(removed)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Course>> {
        Ok(self.courses.borrow().get(code).cloned())
    }

    fn list_all(&self) -> Result<Vec<Course>> {
        // BTreeMap iteration is already ordered by code.
        Ok(self.courses.borrow().values().cloned().collect())
    }

    fn find_by_name_prefix(&self, prefix: &str) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = self
            .courses
            .borrow()
            .values()
            .filter(|course| course.name.starts_with(prefix))
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(courses)
    }
}

impl EnrollmentStore for MemoryStore {
    fn save(&self, enrollment: &NewEnrollment) -> Result<EnrollmentId> {
        if !self.students.borrow().contains_key(&enrollment.student_index)
            || !self.courses.borrow().contains_key(&enrollment.course_code)
        {
            return Err(anyhow!("FOREIGN KEY constraint failed"));
        }
        if self.exists_triple(
            &enrollment.student_index,
            &enrollment.course_code,
            &enrollment.academic_year,
        )? {
            return Err(anyhow!(
                "UNIQUE constraint failed: enrollments.student_index, enrollments.course_code, enrollments.academic_year"
            ));
        }

        let id = self.last_id.get() + 1;
        self.last_id.set(id);
        self.enrollments.borrow_mut().insert(
            id,
            Enrollment {
                id,
                student_index: enrollment.student_index.clone(),
                course_code: enrollment.course_code.clone(),
                academic_year: enrollment.academic_year.clone(),
                grade: None,
                amendment_reason: None,
            },
        );
        self.record_write();
        Ok(id)
    }

    fn update(&self, enrollment: &Enrollment) -> Result<bool> {
        let mut enrollments = self.enrollments.borrow_mut();
        match enrollments.get_mut(&enrollment.id) {
            Some(existing) => {
                *existing = enrollment.clone();
                self.record_write();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: EnrollmentId) -> Result<bool> {
        let removed = self.enrollments.borrow_mut().remove(&id).is_some();
        if removed {
            self.record_write();
        }
        Ok(removed)
    }

    fn find_by_id(&self, id: EnrollmentId) -> Result<Option<Enrollment>> {
        Ok(self.enrollments.borrow().get(&id).cloned())
    }

    fn find_by_student(&self, index_number: &str) -> Result<Vec<Enrollment>> {
        let mut enrollments = self.enrollments_where(|e| e.student_index == index_number);
        enrollments.sort_by(|a, b| {
            (&a.academic_year, &a.course_code).cmp(&(&b.academic_year, &b.course_code))
        });
        Ok(enrollments)
    }

    fn find_by_student_and_year(
        &self,
        index_number: &str,
        academic_year: &str,
    ) -> Result<Vec<Enrollment>> {
        let mut enrollments = self.enrollments_where(|e| {
            e.student_index == index_number && e.academic_year == academic_year
        });
        enrollments.sort_by(|a, b| a.course_code.cmp(&b.course_code));
        Ok(enrollments)
    }

    fn find_by_course(&self, code: &str) -> Result<Vec<Enrollment>> {
        let mut enrollments = self.enrollments_where(|e| e.course_code == code);
        enrollments.sort_by(|a, b| {
            (&a.academic_year, &a.student_index).cmp(&(&b.academic_year, &b.student_index))
        });
        Ok(enrollments)
    }

    fn exists_triple(&self, index_number: &str, code: &str, academic_year: &str) -> Result<bool> {
        Ok(self.enrollments.borrow().values().any(|e| {
            e.student_index == index_number
                && e.course_code == code
                && e.academic_year == academic_year
        }))
    }

    fn has_any_for_student(&self, index_number: &str) -> Result<bool> {
        Ok(self
            .enrollments
            .borrow()
            .values()
            .any(|e| e.student_index == index_number))
    }

    fn has_any_for_course(&self, code: &str) -> Result<bool> {
        Ok(self
            .enrollments
            .borrow()
            .values()
            .any(|e| e.course_code == code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        StudentStore::save(&store, &Student::new("1/IT-20", "Ana", "Anic", "IT", 2020)).unwrap();
        CourseStore::save(&store, &Course::new("MAT1", "Mathematics 1", 6, 1)).unwrap();
        store
    }

    #[test]
    fn duplicate_triple_is_rejected_by_the_store() {
        let store = seeded();
        let new = NewEnrollment {
            student_index: "1/IT-20".into(),
            course_code: "MAT1".into(),
            academic_year: "2024/25".into(),
        };
        assert_eq!(EnrollmentStore::save(&store, &new).unwrap(), 1);
        assert!(EnrollmentStore::save(&store, &new).is_err());
    }

    #[test]
    fn referenced_rows_cannot_be_deleted() {
        let store = seeded();
        let new = NewEnrollment {
            student_index: "1/IT-20".into(),
            course_code: "MAT1".into(),
            academic_year: "2024/25".into(),
        };
        EnrollmentStore::save(&store, &new).unwrap();
        assert!(StudentStore::delete(&store, "1/IT-20").is_err());
        assert!(CourseStore::delete(&store, "MAT1").is_err());
        assert!(StudentStore::find_by_index(&store, "1/IT-20")
            .unwrap()
            .is_some());
    }

    #[test]
    fn enrollment_requires_existing_parents() {
        let store = seeded();
        let new = NewEnrollment {
            student_index: "missing".into(),
            course_code: "MAT1".into(),
            academic_year: "2024/25".into(),
        };
        assert!(EnrollmentStore::save(&store, &new).is_err());
        assert_eq!(store.write_count(), 2);
    }
}
