use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::Course;

fn map_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        code: row.get(0)?,
        name: row.get(1)?,
        ects: row.get(2)?,
        term: row.get(3)?,
    })
}

pub fn insert_course(conn: &Connection, course: &Course) -> Result<()> {
    conn.execute(
        "INSERT INTO courses (code, name, ects, term) VALUES (?1, ?2, ?3, ?4)",
        params![course.code, course.name, course.ects, course.term],
    )
    .context("failed to insert course")?;
    Ok(())
}

pub fn update_course(conn: &Connection, course: &Course) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE courses SET name = ?1, ects = ?2, term = ?3 WHERE code = ?4",
            params![course.name, course.ects, course.term, course.code],
        )
        .context("failed to update course")?;
    Ok(updated > 0)
}

pub fn delete_course(conn: &Connection, code: &str) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM courses WHERE code = ?1", params![code])
        .context("failed to delete course")?;
    Ok(deleted > 0)
}

pub fn fetch_course(conn: &Connection, code: &str) -> Result<Option<Course>> {
    conn.query_row(
        "SELECT code, name, ects, term FROM courses WHERE code = ?1",
        params![code],
        map_course,
    )
    .optional()
    .context("failed to load course")
}

pub fn fetch_courses(conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt = conn
        .prepare("SELECT code, name, ects, term FROM courses ORDER BY code")
        .context("failed to prepare course query")?;

    let courses = stmt
        .query_map([], map_course)
        .context("failed to load courses")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect courses")?;

    Ok(courses)
}

pub fn search_courses_by_name(conn: &Connection, prefix: &str) -> Result<Vec<Course>> {
    let mut stmt = conn
        .prepare(
            "SELECT code, name, ects, term FROM courses
             WHERE substr(name, 1, length(?1)) = ?1
             ORDER BY name",
        )
        .context("failed to prepare course search")?;

    let courses = stmt
        .query_map(params![prefix], map_course)
        .context("failed to search courses")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect course search results")?;

    Ok(courses)
}
