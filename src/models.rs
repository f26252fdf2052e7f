//! Domain records that mirror the SQLite schema and get passed between the
//! stores, the managers and the terminal UI. These types stay light-weight
//! data holders: validation lives in the managers, persistence in the stores.
//! Equality is identity based, matching how the rows are keyed on disk.

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{RecordsError, Result};

/// Years a student may have enrolled in.
pub const ENROLLMENT_YEARS: RangeInclusive<i32> = 2020..=2050;
/// Credit values a course may carry.
pub const ECTS_RANGE: RangeInclusive<i32> = 1..=15;
/// Terms a course may be scheduled in.
pub const TERM_RANGE: RangeInclusive<i32> = 1..=10;
/// Grades that may be recorded. The lowest one is a failing grade.
pub const GRADE_RANGE: RangeInclusive<i64> = 5..=10;
/// Lowest grade that earns the course credits.
pub const PASSING_GRADE: u8 = 6;

/// Numeric key assigned to an enrollment by the store.
pub type EnrollmentId = i64;

#[derive(Debug, Clone)]
/// A student, keyed by the index number printed on their student card.
pub struct Student {
    /// Primary key, e.g. `100/IT-20`. Never changes once the record exists.
    pub index_number: String,
    pub first_name: String,
    pub last_name: String,
    pub study_program: String,
    /// Calendar year the student first enrolled. Kept within
    /// [`ENROLLMENT_YEARS`].
    pub enrollment_year: i32,
}

impl Student {
    pub fn new(
        index_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        study_program: impl Into<String>,
        enrollment_year: i32,
    ) -> Self {
        Self {
            index_number: index_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            study_program: study_program.into(),
            enrollment_year,
        }
    }

    /// `First Last`, the way transcripts and list rows print a student.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl PartialEq for Student {
    fn eq(&self, other: &Self) -> bool {
        self.index_number == other.index_number
    }
}

impl Eq for Student {}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.index_number, self.full_name())
    }
}

#[derive(Debug, Clone)]
/// A course ("predmet") students can enroll in.
pub struct Course {
    /// Primary key, e.g. `MAT1`.
    pub code: String,
    pub name: String,
    /// Credit value, summed into the transcript once the course is passed.
    pub ects: i32,
    pub term: i32,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>, ects: i32, term: i32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ects,
            term,
        }
    }
}

impl PartialEq for Course {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Course {}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

/// A recorded grade. Construction is the only place the 5..=10 range is
/// checked, so holding a `Grade` means holding a valid one; an ungraded
/// enrollment is `None`, never a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Grade(u8);

impl Grade {
    pub fn new(value: i64) -> Result<Self> {
        if !GRADE_RANGE.contains(&value) {
            return Err(RecordsError::validation(format!(
                "Grade must be between {} and {}.",
                GRADE_RANGE.start(),
                GRADE_RANGE.end()
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_passing(self) -> bool {
        self.0 >= PASSING_GRADE
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an enrollment sits in its grading lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Ungraded,
    Graded,
    /// The grade was changed with a recorded reason.
    Amended,
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnrollmentStatus::Ungraded => "ungraded",
            EnrollmentStatus::Graded => "graded",
            EnrollmentStatus::Amended => "amended",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
/// A student's enrollment in a course for one academic year, together with
/// the grade once it is recorded.
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_index: String,
    pub course_code: String,
    /// Free-form label such as `2024/25`.
    pub academic_year: String,
    pub grade: Option<Grade>,
    /// Set only when the grade was changed through an amendment.
    pub amendment_reason: Option<String>,
}

impl Enrollment {
    pub fn status(&self) -> EnrollmentStatus {
        match (&self.grade, &self.amendment_reason) {
            (_, Some(_)) => EnrollmentStatus::Amended,
            (Some(_), None) => EnrollmentStatus::Graded,
            (None, None) => EnrollmentStatus::Ungraded,
        }
    }
}

impl PartialEq for Enrollment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Enrollment {}

/// Insert payload for a fresh, ungraded enrollment. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnrollment {
    pub student_index: String,
    pub course_code: String,
    pub academic_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One row of a transcript: the enrollment joined with its course.
pub struct TranscriptLine {
    pub course_code: String,
    pub course_name: String,
    pub academic_year: String,
    pub grade: Option<Grade>,
    pub ects: i32,
}

impl TranscriptLine {
    pub fn is_passed(&self) -> bool {
        self.grade.is_some_and(Grade::is_passing)
    }
}

impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grade = self
            .grade
            .map(|grade| grade.to_string())
            .unwrap_or_else(|| "/".to_string());
        write!(
            f,
            "{} - {} ({}), grade: {}, ECTS: {}",
            self.course_code, self.course_name, self.academic_year, grade, self.ects
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A student's full enrollment history ("karton") with earned credits.
pub struct Transcript {
    pub student_index: String,
    pub full_name: String,
    pub lines: Vec<TranscriptLine>,
    pub total_earned_credits: i32,
}

const TRANSCRIPT_RULE: &str = "--------------------------------------------------";

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transcript of {} ({})", self.full_name, self.student_index)?;
        writeln!(f, "{TRANSCRIPT_RULE}")?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "{TRANSCRIPT_RULE}")?;
        write!(f, "Total earned ECTS: {}", self.total_earned_credits)
    }
}
