use student_records::db::{self, Database};
use student_records::{Course, EnrollmentStatus, NewEnrollment, Records, Student};
use tempfile::TempDir;

const INDEX: &str = "100/IT-20";
const YEAR: &str = "2024/25";

fn open_records(dir: &TempDir) -> (Database, Records) {
    let db = Database::open(dir.path().join("data").join("records.sqlite")).unwrap();
    let records = Records::sqlite(db.clone());
    (db, records)
}

fn seed(records: &Records) {
    records
        .students
        .create(&Student::new(INDEX, "Ana", "Anic", "IT", 2020))
        .unwrap();
    for (code, name, ects) in [
        ("MAT1", "Mathematics 1", 6),
        ("MAT2", "Mathematics 2", 5),
        ("MAT3", "Mathematics 3", 4),
    ] {
        records
            .courses
            .create(&Course::new(code, name, ects, 1))
            .unwrap();
    }
}

#[test]
fn open_creates_the_directory_and_schema() {
    let dir = TempDir::new().unwrap();
    let (db, records) = open_records(&dir);
    assert!(db.path().exists());
    assert!(records.students.list_all().unwrap().is_empty());

    // Opening again keeps existing rows.
    seed(&records);
    let reopened = Records::sqlite(Database::open(db.path()).unwrap());
    assert_eq!(reopened.courses.list_all().unwrap().len(), 3);
}

#[test]
fn transcript_totals_only_passed_courses() {
    let dir = TempDir::new().unwrap();
    let (_, records) = open_records(&dir);
    seed(&records);

    let mat1 = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
    let mat2 = records.enrollments.enroll(INDEX, "MAT2", YEAR).unwrap();
    records.enrollments.enroll(INDEX, "MAT3", YEAR).unwrap();
    records.enrollments.enter_grade(mat1, 8).unwrap();
    records.enrollments.enter_grade(mat2, 5).unwrap();

    let transcript = records.enrollments.build_transcript(INDEX).unwrap();
    assert_eq!(transcript.lines.len(), 3);
    assert_eq!(transcript.total_earned_credits, 6);

    let report = records.enrollments.format_transcript(&transcript);
    assert!(report.starts_with("Transcript of Ana Anic (100/IT-20)"));
    assert!(report.contains("MAT1 - Mathematics 1 (2024/25), grade: 8, ECTS: 6"));
    assert!(report.contains("MAT3 - Mathematics 3 (2024/25), grade: /, ECTS: 4"));
    assert!(report.ends_with("Total earned ECTS: 6"));
}

#[test]
fn amendment_is_persisted_with_its_reason() {
    let dir = TempDir::new().unwrap();
    let (_, records) = open_records(&dir);
    seed(&records);

    let id = records.enrollments.enroll(INDEX, "MAT2", YEAR).unwrap();
    records.enrollments.enter_grade(id, 5).unwrap();
    assert!(records.enrollments.enter_grade(id, 7).unwrap_err().is_conflict());

    records
        .enrollments
        .amend_grade(id, 7, "  exam re-marked  ")
        .unwrap();
    let enrollment = records.enrollments.find_by_id(id).unwrap();
    assert_eq!(enrollment.grade.map(|grade| grade.value()), Some(7));
    assert_eq!(enrollment.amendment_reason.as_deref(), Some("exam re-marked"));
    assert_eq!(enrollment.status(), EnrollmentStatus::Amended);
}

#[test]
fn deletes_are_refused_while_enrollments_exist() {
    let dir = TempDir::new().unwrap();
    let (_, records) = open_records(&dir);
    seed(&records);

    let id = records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();
    assert!(records.students.delete(INDEX).unwrap_err().is_conflict());
    assert!(records.courses.delete("MAT1").unwrap_err().is_conflict());

    records.enrollments.unenroll(id).unwrap();
    records.students.delete(INDEX).unwrap();
    records.courses.delete("MAT1").unwrap();
    assert!(records.students.find_by_index(INDEX).unwrap_err().is_not_found());
    assert!(records.courses.delete("MAT1").unwrap_err().is_not_found());
}

#[test]
fn prefix_searches_are_case_sensitive() {
    let dir = TempDir::new().unwrap();
    let (_, records) = open_records(&dir);
    seed(&records);
    records
        .students
        .create(&Student::new("7/IT-21", "Edo", "anicic", "IT", 2021))
        .unwrap();

    let found = records.students.search_by_last_name_prefix("Ani").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].index_number, INDEX);

    let courses = records.courses.search_by_name_prefix("Math").unwrap();
    assert_eq!(courses.len(), 3);
    assert!(records.courses.search_by_name_prefix("math").unwrap().is_empty());
}

#[test]
fn schema_rejects_rows_that_bypass_the_managers() {
    let dir = TempDir::new().unwrap();
    let (db, records) = open_records(&dir);
    seed(&records);
    let conn = db.connect().unwrap();

    let enrollment = NewEnrollment {
        student_index: INDEX.to_string(),
        course_code: "MAT1".to_string(),
        academic_year: YEAR.to_string(),
    };
    db::insert_enrollment(&conn, &enrollment).unwrap();
    assert!(db::insert_enrollment(&conn, &enrollment).is_err());

    let orphan = NewEnrollment {
        student_index: "missing".to_string(),
        ..enrollment
    };
    assert!(db::insert_enrollment(&conn, &orphan).is_err());

    let bad_course = Course::new("BAD", "Bad", 40, 1);
    assert!(db::insert_course(&conn, &bad_course).is_err());
    assert!(!db::course_has_enrollments(&conn, "MAT2").unwrap());
    assert!(db::student_has_enrollments(&conn, INDEX).unwrap());
}

#[test]
fn year_listing_only_returns_that_year() {
    let dir = TempDir::new().unwrap();
    let (_, records) = open_records(&dir);
    seed(&records);

    records.enrollments.enroll(INDEX, "MAT1", "2023/24").unwrap();
    records.enrollments.enroll(INDEX, "MAT2", YEAR).unwrap();
    records.enrollments.enroll(INDEX, "MAT1", YEAR).unwrap();

    let in_year = records
        .enrollments
        .list_for_student_in_year(INDEX, YEAR)
        .unwrap();
    let codes: Vec<_> = in_year.iter().map(|e| e.course_code.as_str()).collect();
    assert_eq!(codes, ["MAT1", "MAT2"]);
    assert_eq!(records.enrollments.list_for_student(INDEX).unwrap().len(), 3);
    assert_eq!(records.enrollments.list_for_course("MAT1").unwrap().len(), 2);
}
