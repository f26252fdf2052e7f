use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::Student;

const STUDENT_COLUMNS: &str =
    "index_number, first_name, last_name, study_program, enrollment_year";

fn map_student(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        index_number: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        study_program: row.get(3)?,
        enrollment_year: row.get(4)?,
    })
}

pub fn insert_student(conn: &Connection, student: &Student) -> Result<()> {
    conn.execute(
        "INSERT INTO students (index_number, first_name, last_name, study_program, enrollment_year)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            student.index_number,
            student.first_name,
            student.last_name,
            student.study_program,
            student.enrollment_year
        ],
    )
    .context("failed to insert student")?;
    Ok(())
}

/// Overwrite every mutable field. Returns whether a row matched the index.
pub fn update_student(conn: &Connection, student: &Student) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE students
             SET first_name = ?1, last_name = ?2, study_program = ?3, enrollment_year = ?4
             WHERE index_number = ?5",
            params![
                student.first_name,
                student.last_name,
                student.study_program,
                student.enrollment_year,
                student.index_number
            ],
        )
        .context("failed to update student")?;
    Ok(updated > 0)
}

pub fn delete_student(conn: &Connection, index_number: &str) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM students WHERE index_number = ?1",
            params![index_number],
        )
        .context("failed to delete student")?;
    Ok(deleted > 0)
}

pub fn fetch_student(conn: &Connection, index_number: &str) -> Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE index_number = ?1"),
        params![index_number],
        map_student,
    )
    .optional()
    .context("failed to load student")
}

/// Every student, ordered the way the lists show them.
pub fn fetch_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY last_name, first_name"
        ))
        .context("failed to prepare student query")?;

    let students = stmt
        .query_map([], map_student)
        .context("failed to load students")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect students")?;

    Ok(students)
}

/// Prefix search on the last name. `LIKE` folds ASCII case in SQLite, so the
/// comparison is done on the leading substring instead, which also keeps `%`
/// and `_` in the prefix literal.
pub fn search_students_by_last_name(conn: &Connection, prefix: &str) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE substr(last_name, 1, length(?1)) = ?1
             ORDER BY last_name, first_name"
        ))
        .context("failed to prepare student search")?;

    let students = stmt
        .query_map(params![prefix], map_student)
        .context("failed to search students")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect student search results")?;

    Ok(students)
}
