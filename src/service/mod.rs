//! Business rules for students, courses and enrollments. The managers are
//! stateless: every call validates its input, consults the stores and either
//! performs one write or fails without touching anything.

mod courses;
mod enrollments;
mod students;

pub use courses::CourseManager;
pub use enrollments::EnrollmentManager;
pub use students::StudentManager;

use std::rc::Rc;

use crate::db::{Database, SqliteStore};
use crate::store::{CourseStore, EnrollmentStore, MemoryStore, StudentStore};

/// The three managers wired over one backend. This is the whole surface a
/// front end needs.
pub struct Records {
    pub students: StudentManager,
    pub courses: CourseManager,
    pub enrollments: EnrollmentManager,
}

impl Records {
    pub fn new(
        students: Rc<dyn StudentStore>,
        courses: Rc<dyn CourseStore>,
        enrollments: Rc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            students: StudentManager::new(students.clone(), enrollments.clone()),
            courses: CourseManager::new(courses.clone(), enrollments.clone()),
            enrollments: EnrollmentManager::new(enrollments, students, courses),
        }
    }

    pub fn sqlite(db: Database) -> Self {
        let store = Rc::new(SqliteStore::new(db));
        Self::new(store.clone(), store.clone(), store)
    }

    pub fn in_memory() -> Self {
        let store = Rc::new(MemoryStore::new());
        Self::new(store.clone(), store.clone(), store)
    }
}
