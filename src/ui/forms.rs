//! Modal form and confirmation state. Forms only turn keystrokes into typed
//! values; every rule about what a valid record is lives in the managers.

use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Course, EnrollmentId, Student};

/// Which characters a field accepts.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    Number,
}

#[derive(Clone)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    pub(crate) kind: FieldKind,
    /// Keys cannot be edited once a record exists.
    pub(crate) locked: bool,
}

impl FormField {
    fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            kind: FieldKind::Text,
            locked: false,
        }
    }

    fn number(label: &'static str, value: Option<i64>) -> Self {
        Self {
            label,
            value: value.map(|v| v.to_string()).unwrap_or_default(),
            kind: FieldKind::Number,
            locked: false,
        }
    }

    fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// What submitting a form does.
#[derive(Clone)]
pub(crate) enum FormPurpose {
    NewStudent,
    EditStudent,
    NewCourse,
    EditCourse,
    Enroll { student_index: String },
    EnterGrade { enrollment_id: EnrollmentId },
    AmendGrade { enrollment_id: EnrollmentId },
}

/// A titled set of input fields with one focused at a time.
#[derive(Clone)]
pub(crate) struct RecordForm {
    pub(crate) title: String,
    pub(crate) purpose: FormPurpose,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

// Field positions per form kind.
const STUDENT_INDEX: usize = 0;
const STUDENT_FIRST: usize = 1;
const STUDENT_LAST: usize = 2;
const STUDENT_PROGRAM: usize = 3;
const STUDENT_YEAR: usize = 4;
const COURSE_CODE: usize = 0;
const COURSE_NAME: usize = 1;
const COURSE_ECTS: usize = 2;
const COURSE_TERM: usize = 3;
const ENROLL_COURSE: usize = 0;
const ENROLL_YEAR: usize = 1;
const GRADE_VALUE: usize = 0;
const AMEND_REASON: usize = 1;

impl RecordForm {
    fn new(title: impl Into<String>, purpose: FormPurpose, fields: Vec<FormField>) -> Self {
        let mut form = Self {
            title: title.into(),
            purpose,
            fields,
            active: 0,
            error: None,
        };
        if form.fields.first().is_some_and(|field| field.locked) {
            form.next_field();
        }
        form
    }

    pub(crate) fn new_student() -> Self {
        Self::new(
            "Add Student",
            FormPurpose::NewStudent,
            vec![
                FormField::text("Index", ""),
                FormField::text("First name", ""),
                FormField::text("Last name", ""),
                FormField::text("Program", ""),
                FormField::number("Enrolled", None),
            ],
        )
    }

    pub(crate) fn edit_student(student: &Student) -> Self {
        Self::new(
            format!("Edit Student {}", student.index_number),
            FormPurpose::EditStudent,
            vec![
                FormField::text("Index", student.index_number.clone()).locked(),
                FormField::text("First name", student.first_name.clone()),
                FormField::text("Last name", student.last_name.clone()),
                FormField::text("Program", student.study_program.clone()),
                FormField::number("Enrolled", Some(student.enrollment_year.into())),
            ],
        )
    }

    pub(crate) fn new_course() -> Self {
        Self::new(
            "Add Course",
            FormPurpose::NewCourse,
            vec![
                FormField::text("Code", ""),
                FormField::text("Name", ""),
                FormField::number("ECTS", None),
                FormField::number("Term", None),
            ],
        )
    }

    pub(crate) fn edit_course(course: &Course) -> Self {
        Self::new(
            format!("Edit Course {}", course.code),
            FormPurpose::EditCourse,
            vec![
                FormField::text("Code", course.code.clone()).locked(),
                FormField::text("Name", course.name.clone()),
                FormField::number("ECTS", Some(course.ects.into())),
                FormField::number("Term", Some(course.term.into())),
            ],
        )
    }

    pub(crate) fn enroll(student_index: &str) -> Self {
        Self::new(
            format!("Enroll {student_index}"),
            FormPurpose::Enroll {
                student_index: student_index.to_string(),
            },
            vec![
                FormField::text("Course", ""),
                FormField::text("Year", ""),
            ],
        )
    }

    pub(crate) fn enter_grade(enrollment_id: EnrollmentId, course_code: &str) -> Self {
        Self::new(
            format!("Grade {course_code}"),
            FormPurpose::EnterGrade { enrollment_id },
            vec![FormField::number("Grade", None)],
        )
    }

    pub(crate) fn amend_grade(
        enrollment_id: EnrollmentId,
        course_code: &str,
        current: Option<i64>,
    ) -> Self {
        Self::new(
            format!("Amend Grade {course_code}"),
            FormPurpose::AmendGrade { enrollment_id },
            vec![
                FormField::number("Grade", current),
                FormField::text("Reason", ""),
            ],
        )
    }

    /// Move focus forward, skipping locked fields.
    pub(crate) fn next_field(&mut self) {
        self.step_focus(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.step_focus(self.fields.len().saturating_sub(1));
    }

    fn step_focus(&mut self, step: usize) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        for _ in 0..len {
            self.active = (self.active + step) % len;
            if !self.fields[self.active].locked {
                return;
            }
        }
    }

    /// Append a character to the focused field. Returns whether it was
    /// accepted.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let Some(field) = self.fields.get_mut(self.active) else {
            return false;
        };
        if field.locked {
            return false;
        }
        let accepted = match field.kind {
            FieldKind::Number => ch.is_ascii_digit(),
            FieldKind::Text => !ch.is_control(),
        };
        if accepted {
            field.value.push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            if !field.locked {
                field.value.pop();
            }
        }
    }

    fn text(&self, index: usize) -> String {
        self.fields
            .get(index)
            .map(|field| field.value.trim().to_string())
            .unwrap_or_default()
    }

    fn number(&self, index: usize) -> Result<i64> {
        let field = self
            .fields
            .get(index)
            .ok_or_else(|| anyhow!("form has no field {index}"))?;
        let raw = field.value.trim();
        if raw.is_empty() {
            return Err(anyhow!("{} is required.", field.label));
        }
        raw.parse::<i64>()
            .with_context(|| format!("{} must be a whole number.", field.label))
    }

    fn small_number(&self, index: usize) -> Result<i32> {
        let value = self.number(index)?;
        i32::try_from(value).map_err(|_| anyhow!("{} is out of range.", self.fields[index].label))
    }

    pub(crate) fn to_student(&self) -> Result<Student> {
        Ok(Student::new(
            self.text(STUDENT_INDEX),
            self.text(STUDENT_FIRST),
            self.text(STUDENT_LAST),
            self.text(STUDENT_PROGRAM),
            self.small_number(STUDENT_YEAR)?,
        ))
    }

    pub(crate) fn to_course(&self) -> Result<Course> {
        Ok(Course::new(
            self.text(COURSE_CODE),
            self.text(COURSE_NAME),
            self.small_number(COURSE_ECTS)?,
            self.small_number(COURSE_TERM)?,
        ))
    }

    /// `(course code, academic year)` for an enrollment.
    pub(crate) fn to_enrollment(&self) -> (String, String) {
        (self.text(ENROLL_COURSE), self.text(ENROLL_YEAR))
    }

    pub(crate) fn to_grade(&self) -> Result<i64> {
        self.number(GRADE_VALUE)
    }

    /// `(grade, reason)` for an amendment. The reason is passed on raw so the
    /// manager decides what counts as blank.
    pub(crate) fn to_amendment(&self) -> Result<(i64, String)> {
        let reason = self
            .fields
            .get(AMEND_REASON)
            .map(|field| field.value.clone())
            .unwrap_or_default();
        Ok((self.number(GRADE_VALUE)?, reason))
    }

    /// Width of the widest label, used to align the inputs.
    pub(crate) fn label_width(&self) -> usize {
        self.fields
            .iter()
            .map(|field| field.label.len())
            .max()
            .unwrap_or(0)
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let field = &self.fields[index];
        let is_active = index == self.active;
        let width = self.label_width();

        let display = if field.value.is_empty() && !field.locked {
            "<required>".to_string()
        } else {
            field.value.clone()
        };

        let label_style = if is_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let value_style = if field.locked || field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::styled(format!("{:<width$}: ", field.label), label_style),
            Span::styled(display, value_style),
        ])
    }

    /// Cursor column relative to the form's inner area.
    pub(crate) fn cursor_offset(&self) -> usize {
        let value_len = self
            .fields
            .get(self.active)
            .map(|field| field.value.chars().count())
            .unwrap_or(0);
        self.label_width() + 2 + value_len
    }
}

/// Record a delete confirmation is pending for.
#[derive(Clone)]
pub(crate) enum DeleteTarget {
    Student { index_number: String, name: String },
    Course { code: String, name: String },
    Enrollment { id: EnrollmentId, label: String },
}

impl DeleteTarget {
    pub(crate) fn prompt(&self) -> String {
        match self {
            DeleteTarget::Student { index_number, name } => {
                format!("Delete student {index_number} ({name})?")
            }
            DeleteTarget::Course { code, name } => format!("Delete course {code} ({name})?"),
            DeleteTarget::Enrollment { label, .. } => format!("Remove enrollment {label}?"),
        }
    }

    pub(crate) fn warning(&self) -> &'static str {
        match self {
            DeleteTarget::Student { .. } => "Students with enrollments cannot be deleted.",
            DeleteTarget::Course { .. } => "Courses with enrollments cannot be deleted.",
            DeleteTarget::Enrollment { .. } => "The grade recorded for it is removed as well.",
        }
    }
}
