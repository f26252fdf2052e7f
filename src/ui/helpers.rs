use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::{Enrollment, Grade};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

pub(crate) fn grade_label(grade: Option<Grade>) -> String {
    grade
        .map(|grade| grade.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One-line summary of an enrollment, shared by list rows and prompts.
pub(crate) fn enrollment_label(enrollment: &Enrollment) -> String {
    format!(
        "#{} {} {} ({})",
        enrollment.id, enrollment.student_index, enrollment.course_code, enrollment.academic_year
    )
}

/// Clamp a cursor into `0..len` after the list under it changed.
pub(crate) fn clamp_selection(selected: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        selected.min(len - 1)
    }
}

/// Move a cursor by `offset` rows, stopping at either end.
pub(crate) fn offset_selection(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = (selected as isize).saturating_add(offset);
    target.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_stays_in_bounds() {
        assert_eq!(offset_selection(0, 3, -1), 0);
        assert_eq!(offset_selection(1, 3, 5), 2);
        assert_eq!(offset_selection(0, 0, 1), 0);
        assert_eq!(clamp_selection(4, 2), 1);
        assert_eq!(clamp_selection(4, 0), 0);
    }

    #[test]
    fn surfaces_the_innermost_cause() {
        let err = anyhow::anyhow!("UNIQUE constraint failed").context("failed to insert");
        assert_eq!(surface_error(&err), "UNIQUE constraint failed");
    }
}
