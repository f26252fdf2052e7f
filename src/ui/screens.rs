//! Per-screen state. Each screen owns the rows it shows plus its cursor; the
//! app reloads the rows through the managers after every change.

use anyhow::Result;

use super::helpers::{clamp_selection, offset_selection};
use crate::models::{Course, Enrollment, Student, Transcript};
use crate::service::Records;

/// The student list, optionally narrowed to a last-name prefix.
#[derive(Default)]
pub(crate) struct StudentsScreen {
    pub(crate) students: Vec<Student>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl StudentsScreen {
    pub(crate) fn reload(&mut self, records: &Records) -> Result<()> {
        self.students = match &self.filter {
            Some(prefix) => records.students.search_by_last_name_prefix(prefix)?,
            None => records.students.list_all()?,
        };
        self.selected = clamp_selection(self.selected, self.students.len());
        Ok(())
    }

    /// Put the cursor on a given student if they are in the list.
    pub(crate) fn focus(&mut self, index_number: &str) {
        if let Some(position) = self
            .students
            .iter()
            .position(|student| student.index_number == index_number)
        {
            self.selected = position;
        }
    }

    pub(crate) fn current(&self) -> Option<&Student> {
        self.students.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, self.students.len(), offset);
    }
}

/// The course list, optionally narrowed to a name prefix.
#[derive(Default)]
pub(crate) struct CoursesScreen {
    pub(crate) courses: Vec<Course>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl CoursesScreen {
    pub(crate) fn reload(&mut self, records: &Records) -> Result<()> {
        self.courses = match &self.filter {
            Some(prefix) => records.courses.search_by_name_prefix(prefix)?,
            None => records.courses.list_all()?,
        };
        self.selected = clamp_selection(self.selected, self.courses.len());
        Ok(())
    }

    pub(crate) fn focus(&mut self, code: &str) {
        if let Some(position) = self.courses.iter().position(|course| course.code == code) {
            self.selected = position;
        }
    }

    pub(crate) fn current(&self) -> Option<&Course> {
        self.courses.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, self.courses.len(), offset);
    }
}

/// An enrollment row with the course name resolved for display. The name is
/// `None` when the course row is gone.
pub(crate) struct EnrollmentRow {
    pub(crate) enrollment: Enrollment,
    pub(crate) course_name: Option<String>,
}

/// One student's enrollments, optionally limited to an academic year.
pub(crate) struct EnrollmentScreen {
    pub(crate) student: Student,
    pub(crate) rows: Vec<EnrollmentRow>,
    pub(crate) year_filter: Option<String>,
    pub(crate) earned_credits: i32,
    pub(crate) selected: usize,
}

impl EnrollmentScreen {
    pub(crate) fn load(records: &Records, student: Student) -> Result<Self> {
        let mut screen = Self {
            student,
            rows: Vec::new(),
            year_filter: None,
            earned_credits: 0,
            selected: 0,
        };
        screen.reload(records)?;
        Ok(screen)
    }

    pub(crate) fn reload(&mut self, records: &Records) -> Result<()> {
        let index = self.student.index_number.as_str();
        let enrollments = match &self.year_filter {
            Some(year) => records.enrollments.list_for_student_in_year(index, year)?,
            None => records.enrollments.list_for_student(index)?,
        };

        let mut rows = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let course_name = records
                .courses
                .find_by_code(&enrollment.course_code)
                .ok()
                .map(|course| course.name);
            rows.push(EnrollmentRow {
                enrollment,
                course_name,
            });
        }

        self.rows = rows;
        self.earned_credits = records
            .enrollments
            .build_transcript(index)?
            .total_earned_credits;
        self.selected = clamp_selection(self.selected, self.rows.len());
        Ok(())
    }

    pub(crate) fn current(&self) -> Option<&Enrollment> {
        self.rows.get(self.selected).map(|row| &row.enrollment)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, self.rows.len(), offset);
    }
}

/// A roster row with the student's name resolved for display.
pub(crate) struct RosterRow {
    pub(crate) enrollment: Enrollment,
    pub(crate) student_name: Option<String>,
}

/// Everyone enrolled in one course.
pub(crate) struct RosterScreen {
    pub(crate) course: Course,
    pub(crate) rows: Vec<RosterRow>,
    pub(crate) selected: usize,
}

impl RosterScreen {
    pub(crate) fn load(records: &Records, course: Course) -> Result<Self> {
        let mut screen = Self {
            course,
            rows: Vec::new(),
            selected: 0,
        };
        screen.reload(records)?;
        Ok(screen)
    }

    pub(crate) fn reload(&mut self, records: &Records) -> Result<()> {
        let enrollments = records.enrollments.list_for_course(&self.course.code)?;
        self.rows = enrollments
            .into_iter()
            .map(|enrollment| {
                let student_name = records
                    .students
                    .find_by_index(&enrollment.student_index)
                    .ok()
                    .map(|student| student.full_name());
                RosterRow {
                    enrollment,
                    student_name,
                }
            })
            .collect();
        self.selected = clamp_selection(self.selected, self.rows.len());
        Ok(())
    }

    pub(crate) fn current(&self) -> Option<&Enrollment> {
        self.rows.get(self.selected).map(|row| &row.enrollment)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, self.rows.len(), offset);
    }
}

/// A rendered transcript with a scroll offset.
pub(crate) struct TranscriptScreen {
    pub(crate) student_index: String,
    pub(crate) lines: Vec<String>,
    pub(crate) scroll: u16,
}

impl TranscriptScreen {
    pub(crate) fn new(records: &Records, transcript: &Transcript) -> Self {
        let report = records.enrollments.format_transcript(transcript);
        Self {
            student_index: transcript.student_index.clone(),
            lines: report.lines().map(str::to_string).collect(),
            scroll: 0,
        }
    }

    pub(crate) fn max_scroll(&self) -> u16 {
        self.lines.len().saturating_sub(1).min(u16::MAX as usize) as u16
    }

    pub(crate) fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll as i32 + delta).clamp(0, self.max_scroll() as i32);
        self.scroll = next as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Course;

    fn records() -> Records {
        let records = Records::in_memory();
        records
            .students
            .create(&Student::new("1/IT", "Ana", "Anic", "IT", 2020))
            .unwrap();
        records
            .students
            .create(&Student::new("2/IT", "Edo", "Begic", "IT", 2021))
            .unwrap();
        records
            .courses
            .create(&Course::new("MAT1", "Mathematics 1", 6, 1))
            .unwrap();
        records
    }

    #[test]
    fn student_filter_narrows_the_list() {
        let records = records();
        let mut screen = StudentsScreen::default();
        screen.reload(&records).unwrap();
        assert_eq!(screen.students.len(), 2);

        screen.selected = 1;
        screen.filter = Some("Ani".into());
        screen.reload(&records).unwrap();
        assert_eq!(screen.students.len(), 1);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn enrollment_screen_tracks_earned_credits() {
        let records = records();
        let id = records.enrollments.enroll("1/IT", "MAT1", "2024/25").unwrap();
        let student = records.students.find_by_index("1/IT").unwrap();
        let mut screen = EnrollmentScreen::load(&records, student).unwrap();
        assert_eq!(screen.earned_credits, 0);
        assert_eq!(screen.rows[0].course_name.as_deref(), Some("Mathematics 1"));

        records.enrollments.enter_grade(id, 9).unwrap();
        screen.reload(&records).unwrap();
        assert_eq!(screen.earned_credits, 6);

        screen.year_filter = Some("2023/24".into());
        screen.reload(&records).unwrap();
        assert!(screen.rows.is_empty());
    }

    #[test]
    fn transcript_scroll_is_clamped() {
        let records = records();
        let transcript = records.enrollments.build_transcript("1/IT").unwrap();
        let mut screen = TranscriptScreen::new(&records, &transcript);
        assert_eq!(screen.lines.len(), 4);
        screen.scroll_by(-3);
        assert_eq!(screen.scroll, 0);
        screen.scroll_by(10);
        assert_eq!(screen.scroll, 3);
    }
}
