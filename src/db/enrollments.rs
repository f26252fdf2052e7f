use anyhow::{Context, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Enrollment, EnrollmentId, Grade, NewEnrollment};

const ENROLLMENT_COLUMNS: &str =
    "id, student_index, course_code, academic_year, grade, amendment_reason";

impl ToSql for Grade {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.value())))
    }
}

impl FromSql for Grade {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        Grade::new(raw).map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

fn map_enrollment(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: row.get(0)?,
        student_index: row.get(1)?,
        course_code: row.get(2)?,
        academic_year: row.get(3)?,
        grade: row.get(4)?,
        amendment_reason: row.get(5)?,
    })
}

/// Insert an ungraded enrollment and hand back the generated id.
pub fn insert_enrollment(conn: &Connection, enrollment: &NewEnrollment) -> Result<EnrollmentId> {
    conn.execute(
        "INSERT INTO enrollments (student_index, course_code, academic_year)
         VALUES (?1, ?2, ?3)",
        params![
            enrollment.student_index,
            enrollment.course_code,
            enrollment.academic_year
        ],
    )
    .context("failed to insert enrollment")?;

    Ok(conn.last_insert_rowid())
}

pub fn update_enrollment(conn: &Connection, enrollment: &Enrollment) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE enrollments
             SET student_index = ?1, course_code = ?2, academic_year = ?3,
                 grade = ?4, amendment_reason = ?5
             WHERE id = ?6",
            params![
                enrollment.student_index,
                enrollment.course_code,
                enrollment.academic_year,
                enrollment.grade,
                enrollment.amendment_reason,
                enrollment.id
            ],
        )
        .context("failed to update enrollment")?;
    Ok(updated > 0)
}

pub fn delete_enrollment(conn: &Connection, id: EnrollmentId) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM enrollments WHERE id = ?1", params![id])
        .context("failed to delete enrollment")?;
    Ok(deleted > 0)
}

pub fn fetch_enrollment(conn: &Connection, id: EnrollmentId) -> Result<Option<Enrollment>> {
    conn.query_row(
        &format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = ?1"),
        params![id],
        map_enrollment,
    )
    .optional()
    .context("failed to load enrollment")
}

/// Run an enrollment listing. `filter` is the WHERE/ORDER BY tail of the
/// query; every listing shares the column set and the row mapping.
fn fetch_enrollments_where(
    conn: &Connection,
    filter: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<Enrollment>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments {filter}"
        ))
        .context("failed to prepare enrollment query")?;

    let enrollments = stmt
        .query_map(params, map_enrollment)
        .context("failed to load enrollments")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect enrollments")?;

    Ok(enrollments)
}

pub fn fetch_enrollments_for_student(
    conn: &Connection,
    index_number: &str,
) -> Result<Vec<Enrollment>> {
    fetch_enrollments_where(
        conn,
        "WHERE student_index = ?1 ORDER BY academic_year, course_code",
        params![index_number],
    )
}

pub fn fetch_enrollments_for_student_in_year(
    conn: &Connection,
    index_number: &str,
    academic_year: &str,
) -> Result<Vec<Enrollment>> {
    fetch_enrollments_where(
        conn,
        "WHERE student_index = ?1 AND academic_year = ?2 ORDER BY course_code",
        params![index_number, academic_year],
    )
}

pub fn fetch_enrollments_for_course(conn: &Connection, code: &str) -> Result<Vec<Enrollment>> {
    fetch_enrollments_where(
        conn,
        "WHERE course_code = ?1 ORDER BY academic_year, student_index",
        params![code],
    )
}

pub fn enrollment_exists(
    conn: &Connection,
    index_number: &str,
    code: &str,
    academic_year: &str,
) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM enrollments
             WHERE student_index = ?1 AND course_code = ?2 AND academic_year = ?3
         )",
        params![index_number, code, academic_year],
        |row| row.get(0),
    )
    .context("failed to check for an existing enrollment")
}

pub fn student_has_enrollments(conn: &Connection, index_number: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM enrollments WHERE student_index = ?1)",
        params![index_number],
        |row| row.get(0),
    )
    .context("failed to check student enrollments")
}

pub fn course_has_enrollments(conn: &Connection, code: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM enrollments WHERE course_code = ?1)",
        params![code],
        |row| row.get(0),
    )
    .context("failed to check course enrollments")
}
