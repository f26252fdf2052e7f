use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::models::Grade;
use crate::service::Records;

use super::forms::{DeleteTarget, FormPurpose, RecordForm};
use super::helpers::{centered_rect, enrollment_label, grade_label, surface_error};
use super::screens::{
    CoursesScreen, EnrollmentScreen, RosterScreen, StudentsScreen, TranscriptScreen,
};

/// Height of the tab bar at the top of every screen.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown in the transcript view.
const TRANSCRIPT_PAGE: i32 = 10;

/// High-level navigation states. The two top-level lists live on [`App`] so
/// they survive drilling into a detail view and back.
enum Screen {
    Students,
    Courses,
    Enrollments(EnrollmentScreen),
    Roster(RosterScreen),
    Transcript {
        view: TranscriptScreen,
        back: Box<Screen>,
    },
}

impl Screen {
    /// Which tab is highlighted while this screen is showing.
    fn tab_index(&self) -> usize {
        match self {
            Screen::Students | Screen::Enrollments(_) => 0,
            Screen::Courses | Screen::Roster(_) => 1,
            Screen::Transcript { back, .. } => back.tab_index(),
        }
    }
}

/// Fine-grained modes layered over the current screen.
enum Mode {
    Normal,
    Form(RecordForm),
    ConfirmDelete(DeleteTarget),
    Searching(SearchState),
}

/// What an inline search narrows.
#[derive(Clone, Copy)]
enum SearchTarget {
    Students,
    Courses,
    AcademicYear,
}

impl SearchTarget {
    fn prompt(self) -> &'static str {
        match self {
            SearchTarget::Students => "Last name: ",
            SearchTarget::Courses => "Course name: ",
            SearchTarget::AcademicYear => "Academic year: ",
        }
    }
}

/// State for an active inline search.
struct SearchState {
    target: SearchTarget,
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    records: Records,
    students: StudentsScreen,
    courses: CoursesScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(records: Records) -> Result<Self> {
        let mut students = StudentsScreen::default();
        students.reload(&records)?;
        let mut courses = CoursesScreen::default();
        courses.reload(&records)?;

        Ok(Self {
            records,
            students,
            courses,
            screen: Screen::Students,
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Route a key press to the active mode. Returns `true` once the user asked
    /// to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Form(form) => self.handle_form(code, form),
            Mode::ConfirmDelete(target) => self.handle_confirm_delete(code, target),
            Mode::Searching(state) => self.handle_search(code, state),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match &mut self.screen {
            Screen::Students => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc => {
                    if self.students.filter.take().is_some() {
                        self.students.reload(&self.records)?;
                        self.set_status("Showing all students.", StatusKind::Info);
                    } else {
                        *exit = true;
                    }
                }
                KeyCode::Tab | KeyCode::BackTab => self.screen = Screen::Courses,
                KeyCode::Up => self.students.move_selection(-1),
                KeyCode::Down => self.students.move_selection(1),
                KeyCode::Home => self.students.selected = 0,
                KeyCode::End => self.students.move_selection(isize::MAX),
                KeyCode::Char('a') | KeyCode::Char('+') => {
                    return Ok(Mode::Form(RecordForm::new_student()));
                }
                KeyCode::Char('e') => {
                    if let Some(student) = self.students.current() {
                        return Ok(Mode::Form(RecordForm::edit_student(student)));
                    }
                    self.set_status("No student selected to edit.", StatusKind::Error);
                }
                KeyCode::Char('d') => {
                    if let Some(student) = self.students.current() {
                        return Ok(Mode::ConfirmDelete(DeleteTarget::Student {
                            index_number: student.index_number.clone(),
                            name: student.full_name(),
                        }));
                    }
                    self.set_status("No student selected.", StatusKind::Error);
                }
                KeyCode::Char('/') => {
                    return Ok(Mode::Searching(SearchState {
                        target: SearchTarget::Students,
                        query: self.students.filter.clone().unwrap_or_default(),
                    }));
                }
                KeyCode::Char('r') => self.refresh_lists(),
                KeyCode::Enter => self.open_enrollments(),
                KeyCode::Char('t') => {
                    if let Some(index) = self.students.current().map(|s| s.index_number.clone()) {
                        self.open_transcript(&index);
                    } else {
                        self.set_status("No student selected.", StatusKind::Error);
                    }
                }
                _ => {}
            },
            Screen::Courses => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc => {
                    if self.courses.filter.take().is_some() {
                        self.courses.reload(&self.records)?;
                        self.set_status("Showing all courses.", StatusKind::Info);
                    } else {
                        *exit = true;
                    }
                }
                KeyCode::Tab | KeyCode::BackTab => self.screen = Screen::Students,
                KeyCode::Up => self.courses.move_selection(-1),
                KeyCode::Down => self.courses.move_selection(1),
                KeyCode::Home => self.courses.selected = 0,
                KeyCode::End => self.courses.move_selection(isize::MAX),
                KeyCode::Char('a') | KeyCode::Char('+') => {
                    return Ok(Mode::Form(RecordForm::new_course()));
                }
                KeyCode::Char('e') => {
                    if let Some(course) = self.courses.current() {
                        return Ok(Mode::Form(RecordForm::edit_course(course)));
                    }
                    self.set_status("No course selected to edit.", StatusKind::Error);
                }
                KeyCode::Char('d') => {
                    if let Some(course) = self.courses.current() {
                        return Ok(Mode::ConfirmDelete(DeleteTarget::Course {
                            code: course.code.clone(),
                            name: course.name.clone(),
                        }));
                    }
                    self.set_status("No course selected.", StatusKind::Error);
                }
                KeyCode::Char('/') => {
                    return Ok(Mode::Searching(SearchState {
                        target: SearchTarget::Courses,
                        query: self.courses.filter.clone().unwrap_or_default(),
                    }));
                }
                KeyCode::Char('r') => self.refresh_lists(),
                KeyCode::Enter => self.open_roster(),
                _ => {}
            },
            Screen::Enrollments(screen) => match code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    let index = screen.student.index_number.clone();
                    self.screen = Screen::Students;
                    self.students.focus(&index);
                }
                KeyCode::Up => screen.move_selection(-1),
                KeyCode::Down => screen.move_selection(1),
                KeyCode::Home => screen.selected = 0,
                KeyCode::End => screen.move_selection(isize::MAX),
                KeyCode::Char('a') | KeyCode::Char('+') => {
                    return Ok(Mode::Form(RecordForm::enroll(
                        &screen.student.index_number,
                    )));
                }
                KeyCode::Char('/') => {
                    return Ok(Mode::Searching(SearchState {
                        target: SearchTarget::AcademicYear,
                        query: screen.year_filter.clone().unwrap_or_default(),
                    }));
                }
                KeyCode::Char('t') => {
                    let index = screen.student.index_number.clone();
                    self.open_transcript(&index);
                }
                KeyCode::Char('g') | KeyCode::Char('m') | KeyCode::Char('d') => {
                    return Ok(self.enrollment_action(code));
                }
                _ => {}
            },
            Screen::Roster(screen) => match code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    let code = screen.course.code.clone();
                    self.screen = Screen::Courses;
                    self.courses.focus(&code);
                }
                KeyCode::Up => screen.move_selection(-1),
                KeyCode::Down => screen.move_selection(1),
                KeyCode::Home => screen.selected = 0,
                KeyCode::End => screen.move_selection(isize::MAX),
                KeyCode::Char('g') | KeyCode::Char('m') | KeyCode::Char('d') => {
                    return Ok(self.enrollment_action(code));
                }
                _ => {}
            },
            Screen::Transcript { view, .. } => match code {
                KeyCode::Esc | KeyCode::Char('q') => self.close_transcript(),
                KeyCode::Up => view.scroll_by(-1),
                KeyCode::Down => view.scroll_by(1),
                KeyCode::PageUp => view.scroll_by(-TRANSCRIPT_PAGE),
                KeyCode::PageDown => view.scroll_by(TRANSCRIPT_PAGE),
                KeyCode::Home => view.scroll = 0,
                KeyCode::End => view.scroll = view.max_scroll(),
                _ => {}
            },
        }
        Ok(Mode::Normal)
    }

    /// Grade, amend or remove the enrollment under the cursor of whichever
    /// detail view is open.
    fn enrollment_action(&mut self, code: KeyCode) -> Mode {
        let enrollment = match &self.screen {
            Screen::Enrollments(screen) => screen.current().cloned(),
            Screen::Roster(screen) => screen.current().cloned(),
            _ => None,
        };
        let Some(enrollment) = enrollment else {
            self.set_status("No enrollment selected.", StatusKind::Error);
            return Mode::Normal;
        };

        match code {
            KeyCode::Char('g') => {
                Mode::Form(RecordForm::enter_grade(enrollment.id, &enrollment.course_code))
            }
            KeyCode::Char('m') => Mode::Form(RecordForm::amend_grade(
                enrollment.id,
                &enrollment.course_code,
                enrollment.grade.map(|grade| i64::from(grade.value())),
            )),
            _ => Mode::ConfirmDelete(DeleteTarget::Enrollment {
                id: enrollment.id,
                label: enrollment_label(&enrollment),
            }),
        }
    }

    fn handle_form(&mut self, code: KeyCode, mut form: RecordForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.submit_form(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Form(form)
    }

    fn submit_form(&mut self, form: &RecordForm) -> Result<()> {
        match &form.purpose {
            FormPurpose::NewStudent => {
                let student = form.to_student()?;
                self.records.students.create(&student)?;
                self.students.reload(&self.records)?;
                self.students.focus(&student.index_number);
                self.set_status(
                    format!("Added student {}.", student.index_number),
                    StatusKind::Info,
                );
            }
            FormPurpose::EditStudent => {
                let student = form.to_student()?;
                self.records.students.update(&student)?;
                self.students.reload(&self.records)?;
                self.students.focus(&student.index_number);
                self.set_status(
                    format!("Updated student {}.", student.index_number),
                    StatusKind::Info,
                );
            }
            FormPurpose::NewCourse => {
                let course = form.to_course()?;
                self.records.courses.create(&course)?;
                self.courses.reload(&self.records)?;
                self.courses.focus(&course.code);
                self.set_status(format!("Added course {}.", course.code), StatusKind::Info);
            }
            FormPurpose::EditCourse => {
                let course = form.to_course()?;
                self.records.courses.update(&course)?;
                self.courses.reload(&self.records)?;
                self.courses.focus(&course.code);
                self.set_status(format!("Updated course {}.", course.code), StatusKind::Info);
            }
            FormPurpose::Enroll { student_index } => {
                let (course_code, academic_year) = form.to_enrollment();
                let id = self
                    .records
                    .enrollments
                    .enroll(student_index, &course_code, &academic_year)?;
                self.reload_detail()?;
                self.set_status(
                    format!("Enrolled in {course_code} for {academic_year} (#{id})."),
                    StatusKind::Info,
                );
            }
            FormPurpose::EnterGrade { enrollment_id } => {
                let grade = form.to_grade()?;
                self.records.enrollments.enter_grade(*enrollment_id, grade)?;
                self.reload_detail()?;
                self.set_status(
                    format!("Recorded grade {grade} for #{enrollment_id}."),
                    StatusKind::Info,
                );
            }
            FormPurpose::AmendGrade { enrollment_id } => {
                let (grade, reason) = form.to_amendment()?;
                self.records
                    .enrollments
                    .amend_grade(*enrollment_id, grade, &reason)?;
                self.reload_detail()?;
                self.set_status(
                    format!("Amended grade of #{enrollment_id} to {grade}."),
                    StatusKind::Info,
                );
            }
        }
        Ok(())
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, target: DeleteTarget) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Err(err) = self.perform_delete(&target) {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(target),
        }
    }

    fn perform_delete(&mut self, target: &DeleteTarget) -> Result<()> {
        match target {
            DeleteTarget::Student { index_number, .. } => {
                self.records.students.delete(index_number)?;
                self.students.reload(&self.records)?;
                self.set_status(format!("Deleted student {index_number}."), StatusKind::Info);
            }
            DeleteTarget::Course { code, .. } => {
                self.records.courses.delete(code)?;
                self.courses.reload(&self.records)?;
                self.set_status(format!("Deleted course {code}."), StatusKind::Info);
            }
            DeleteTarget::Enrollment { id, label } => {
                self.records.enrollments.unenroll(*id)?;
                self.reload_detail()?;
                self.set_status(format!("Removed enrollment {label}."), StatusKind::Info);
            }
        }
        Ok(())
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                Mode::Normal
            }
            KeyCode::Enter => match self.apply_search(&state) {
                Ok(()) => Mode::Normal,
                Err(err) => {
                    self.set_status(surface_error(&err), StatusKind::Error);
                    Mode::Searching(state)
                }
            },
            KeyCode::Backspace => {
                state.query.pop();
                Mode::Searching(state)
            }
            KeyCode::Char(ch) => {
                state.query.push(ch);
                Mode::Searching(state)
            }
            _ => Mode::Searching(state),
        }
    }

    /// Apply a submitted search. An empty query clears the filter instead of
    /// searching for it.
    fn apply_search(&mut self, state: &SearchState) -> Result<()> {
        let query = state.query.trim();
        let filter = (!query.is_empty()).then(|| query.to_string());
        debug!(?filter, "applying search");

        match state.target {
            SearchTarget::Students => {
                let previous = mem::replace(&mut self.students.filter, filter);
                if let Err(err) = self.students.reload(&self.records) {
                    self.students.filter = previous;
                    return Err(err);
                }
                self.set_status(
                    format!("{} student(s) shown.", self.students.students.len()),
                    StatusKind::Info,
                );
            }
            SearchTarget::Courses => {
                let previous = mem::replace(&mut self.courses.filter, filter);
                if let Err(err) = self.courses.reload(&self.records) {
                    self.courses.filter = previous;
                    return Err(err);
                }
                self.set_status(
                    format!("{} course(s) shown.", self.courses.courses.len()),
                    StatusKind::Info,
                );
            }
            SearchTarget::AcademicYear => {
                if let Screen::Enrollments(screen) = &mut self.screen {
                    let previous = mem::replace(&mut screen.year_filter, filter);
                    if let Err(err) = screen.reload(&self.records) {
                        screen.year_filter = previous;
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);

        match &self.screen {
            Screen::Students => self.draw_students(frame, chunks[1]),
            Screen::Courses => self.draw_courses(frame, chunks[1]),
            Screen::Enrollments(screen) => self.draw_enrollments(frame, chunks[1], screen),
            Screen::Roster(screen) => self.draw_roster(frame, chunks[1], screen),
            Screen::Transcript { view, .. } => self.draw_transcript(frame, chunks[1], view),
        }

        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Form(form) => self.draw_form(frame, area, form),
            Mode::ConfirmDelete(target) => self.draw_confirm_delete(frame, area, target),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(vec!["Students", "Courses"])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Student Records"),
            )
            .select(self.screen.tab_index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_students(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.students.filter {
            Some(prefix) => format!("Students (last name starts with \"{prefix}\")"),
            None => "Students".to_string(),
        };
        if self.students.students.is_empty() {
            self.draw_empty(frame, area, &title, "No students yet. Press 'a' to add one.");
            return;
        }

        let items = self
            .students
            .students
            .iter()
            .map(|student| {
                ListItem::new(format!(
                    "{:<14} {:<28} {:<24} {}",
                    student.index_number,
                    student.full_name(),
                    student.study_program,
                    student.enrollment_year
                ))
            })
            .collect();
        self.render_list(frame, area, title, items, self.students.selected);
    }

    fn draw_courses(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.courses.filter {
            Some(prefix) => format!("Courses (name starts with \"{prefix}\")"),
            None => "Courses".to_string(),
        };
        if self.courses.courses.is_empty() {
            self.draw_empty(frame, area, &title, "No courses yet. Press 'a' to add one.");
            return;
        }

        let items = self
            .courses
            .courses
            .iter()
            .map(|course| {
                ListItem::new(format!(
                    "{:<10} {:<36} ECTS {:>2}   term {:>2}",
                    course.code, course.name, course.ects, course.term
                ))
            })
            .collect();
        self.render_list(frame, area, title, items, self.courses.selected);
    }

    fn draw_enrollments(&self, frame: &mut Frame, area: Rect, screen: &EnrollmentScreen) {
        let mut title = format!(
            "Enrollments of {} ({}) - earned ECTS: {}",
            screen.student.full_name(),
            screen.student.index_number,
            screen.earned_credits
        );
        if let Some(year) = &screen.year_filter {
            title.push_str(&format!(" - year {year}"));
        }
        if screen.rows.is_empty() {
            self.draw_empty(frame, area, &title, "No enrollments. Press 'a' to enroll.");
            return;
        }

        let items = screen
            .rows
            .iter()
            .map(|row| {
                let enrollment = &row.enrollment;
                let name = row.course_name.as_deref().unwrap_or("<missing course>");
                let mut spans = vec![
                    Span::raw(format!(
                        "#{:<5} {:<9} {:<10} {:<32} ",
                        enrollment.id, enrollment.academic_year, enrollment.course_code, name
                    )),
                    grade_span(enrollment.grade),
                    Span::styled(
                        format!("  {}", enrollment.status()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ];
                if let Some(reason) = &enrollment.amendment_reason {
                    spans.push(Span::styled(
                        format!("  ({reason})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        self.render_list(frame, area, title, items, screen.selected);
    }

    fn draw_roster(&self, frame: &mut Frame, area: Rect, screen: &RosterScreen) {
        let title = format!(
            "Roster of {} - {} ({} ECTS)",
            screen.course.code, screen.course.name, screen.course.ects
        );
        if screen.rows.is_empty() {
            self.draw_empty(frame, area, &title, "Nobody is enrolled in this course.");
            return;
        }

        let items = screen
            .rows
            .iter()
            .map(|row| {
                let enrollment = &row.enrollment;
                let name = row.student_name.as_deref().unwrap_or("<missing student>");
                ListItem::new(Line::from(vec![
                    Span::raw(format!(
                        "#{:<5} {:<9} {:<14} {:<28} ",
                        enrollment.id, enrollment.academic_year, enrollment.student_index, name
                    )),
                    grade_span(enrollment.grade),
                ]))
            })
            .collect();
        self.render_list(frame, area, title, items, screen.selected);
    }

    fn draw_transcript(&self, frame: &mut Frame, area: Rect, view: &TranscriptScreen) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Transcript - {}", view.student_index));
        let lines: Vec<Line> = view
            .lines
            .iter()
            .map(|line| Line::from(line.clone()))
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((view.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_empty(&self, frame: &mut Frame, area: Rect, title: &str, message: &str) {
        let paragraph = Paragraph::new(message.to_string())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(paragraph, area);
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: String,
        items: Vec<ListItem<'static>>,
        selected: usize,
    ) {
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let prompt = state.target.prompt();
        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("{prompt}{}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + prompt.len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn footer_instructions(&self) -> Line<'static> {
        let hints: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Form(_)) => &[
                ("[Enter]", "Save"),
                ("[Tab/↑↓]", "Switch field"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::ConfirmDelete(_)) => &[("[Y]", "Confirm"), ("[N/Esc]", "Cancel")],
            (_, Mode::Searching(_)) => &[("[Enter]", "Apply (empty clears)"), ("[Esc]", "Cancel")],
            (Screen::Students, Mode::Normal) => &[
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Enrollments"),
                ("[t]", "Transcript"),
                ("[a]", "Add"),
                ("[e]", "Edit"),
                ("[d]", "Delete"),
                ("[/]", "Search"),
                ("[Tab]", "Courses"),
                ("[q]", "Quit"),
            ],
            (Screen::Courses, Mode::Normal) => &[
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Roster"),
                ("[a]", "Add"),
                ("[e]", "Edit"),
                ("[d]", "Delete"),
                ("[/]", "Search"),
                ("[Tab]", "Students"),
                ("[q]", "Quit"),
            ],
            (Screen::Enrollments(_), Mode::Normal) => &[
                ("[↑↓]", "Navigate"),
                ("[a]", "Enroll"),
                ("[g]", "Grade"),
                ("[m]", "Amend"),
                ("[d]", "Unenroll"),
                ("[/]", "Year"),
                ("[t]", "Transcript"),
                ("[Esc]", "Back"),
            ],
            (Screen::Roster(_), Mode::Normal) => &[
                ("[↑↓]", "Navigate"),
                ("[g]", "Grade"),
                ("[m]", "Amend"),
                ("[d]", "Unenroll"),
                ("[Esc]", "Back"),
            ],
            (Screen::Transcript { .. }, Mode::Normal) => &[
                ("[↑↓/PgUp/PgDn]", "Scroll"),
                ("[Esc]", "Back"),
            ],
        };

        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (key, action) in hints {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {action}   ")));
        }
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &RecordForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(form.title.clone())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, target: &DeleteTarget) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Deletion")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(target.prompt()),
            Line::from(target.warning()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn refresh_lists(&mut self) {
        let result = self
            .students
            .reload(&self.records)
            .and_then(|_| self.courses.reload(&self.records));
        match result {
            Ok(()) => self.set_status("Reloaded.", StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    /// Reload whichever detail view is open after one of its rows changed.
    fn reload_detail(&mut self) -> Result<()> {
        match &mut self.screen {
            Screen::Enrollments(screen) => screen.reload(&self.records),
            Screen::Roster(screen) => screen.reload(&self.records),
            _ => Ok(()),
        }
    }

    fn open_enrollments(&mut self) {
        let Some(student) = self.students.current().cloned() else {
            self.set_status("No student selected.", StatusKind::Error);
            return;
        };
        match EnrollmentScreen::load(&self.records, student) {
            Ok(screen) => {
                self.clear_status();
                self.screen = Screen::Enrollments(screen);
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_roster(&mut self) {
        let Some(course) = self.courses.current().cloned() else {
            self.set_status("No course selected.", StatusKind::Error);
            return;
        };
        match RosterScreen::load(&self.records, course) {
            Ok(screen) => {
                self.clear_status();
                self.screen = Screen::Roster(screen);
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_transcript(&mut self, student_index: &str) {
        match self.records.enrollments.build_transcript(student_index) {
            Ok(transcript) => {
                let view = TranscriptScreen::new(&self.records, &transcript);
                let back = mem::replace(&mut self.screen, Screen::Students);
                self.screen = Screen::Transcript {
                    view,
                    back: Box::new(back),
                };
                self.clear_status();
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn close_transcript(&mut self) {
        let screen = mem::replace(&mut self.screen, Screen::Students);
        self.screen = match screen {
            Screen::Transcript { back, .. } => *back,
            other => other,
        };
    }
}

/// Grades render green when passing and red when failing.
fn grade_span(grade: Option<Grade>) -> Span<'static> {
    let style = match grade {
        Some(grade) if grade.is_passing() => Style::default().fg(Color::Green),
        Some(_) => Style::default().fg(Color::Red),
        None => Style::default().fg(Color::DarkGray),
    };
    Span::styled(format!("grade {:>2}", grade_label(grade)), style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Student};

    fn app() -> App {
        let records = Records::in_memory();
        records
            .students
            .create(&Student::new("100/IT-20", "Ana", "Anic", "IT", 2020))
            .unwrap();
        records
            .courses
            .create(&Course::new("MAT1", "Mathematics 1", 6, 1))
            .unwrap();
        App::new(records).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn enroll_and_grade_through_the_keyboard() {
        let mut app = app();
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.screen, Screen::Enrollments(_)));

        app.handle_key(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "MAT1");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "2024/25");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));

        app.handle_key(KeyCode::Char('g')).unwrap();
        type_text(&mut app, "8");
        app.handle_key(KeyCode::Enter).unwrap();

        let Screen::Enrollments(screen) = &app.screen else {
            panic!("expected the enrollment screen");
        };
        assert_eq!(screen.earned_credits, 6);
    }

    #[test]
    fn rejected_form_stays_open_with_the_error() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a')).unwrap();
        for value in ["100/IT-20", "Edo", "Begic", "IT", "2021"] {
            type_text(&mut app, value);
            app.handle_key(KeyCode::Tab).unwrap();
        }
        app.handle_key(KeyCode::Enter).unwrap();

        let Mode::Form(form) = &app.mode else {
            panic!("form should stay open");
        };
        assert_eq!(
            form.error.as_deref(),
            Some("Student with index 100/IT-20 already exists.")
        );
    }

    #[test]
    fn blocked_delete_reports_the_conflict() {
        let mut app = app();
        app.records
            .enrollments
            .enroll("100/IT-20", "MAT1", "2024/25")
            .unwrap();
        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();

        let status = app.status.as_ref().expect("status should be set");
        assert!(matches!(status.kind, StatusKind::Error));
        assert!(status.text.contains("cannot be deleted"));
        assert_eq!(app.students.students.len(), 1);
    }

    #[test]
    fn transcript_returns_to_the_previous_screen() {
        let mut app = app();
        app.handle_key(KeyCode::Char('t')).unwrap();
        assert!(matches!(app.screen, Screen::Transcript { .. }));
        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.screen, Screen::Students));
    }
}
