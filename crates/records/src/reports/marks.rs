//! Marks join-integrity checks.

use std::fmt;

use sqlx::FromRow;
use time::Date;

use crate::database::Database;
use crate::errors::AppError;
use crate::reports::or_dash;

/// A mark row with whatever its student and course foreign keys resolve to.
#[derive(Debug, Clone, FromRow)]
pub struct MarkJoin {
    pub id: i64,
    pub student_fk: i64,
    pub course_fk: i64,
    pub exam_type: String,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub student_db_id: Option<i64>,
    pub student_code: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub course_db_id: Option<i64>,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
}

impl MarkJoin {
    /// Number of foreign keys on this row that resolve to nothing.
    pub fn issues(&self) -> usize {
        usize::from(self.student_db_id.is_none()) + usize::from(self.course_db_id.is_none())
    }
}

#[derive(Debug, Clone)]
pub struct MarksOverview {
    pub marks: Vec<MarkJoin>,
    pub orphaned_student_marks: i64,
    pub orphaned_course_marks: i64,
}

impl MarksOverview {
    pub fn issues_found(&self) -> usize {
        self.marks.iter().map(MarkJoin::issues).sum()
    }
}

pub async fn collect_overview(db: &Database) -> Result<MarksOverview, AppError> {
    let marks = sqlx::query_as::<_, MarkJoin>(
        r#"
        SELECT m.id, m.student_id AS student_fk, m.course_id AS course_fk,
               m.exam_type::text AS exam_type, m.marks_obtained, m.max_marks,
               s.id AS student_db_id, s.student_id::text AS student_code,
               s.first_name::text AS first_name, s.last_name::text AS last_name,
               c.id AS course_db_id, c.course_code::text AS course_code,
               c.course_name::text AS course_name
        FROM marks m
        LEFT JOIN students s ON m.student_id = s.id
        LEFT JOIN courses c ON m.course_id = c.id
        ORDER BY m.id
        LIMIT 10
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    let orphaned_student_marks: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM marks m LEFT JOIN students s ON m.student_id = s.id WHERE s.id IS NULL",
    )
    .fetch_one(db.pool())
    .await?;

    let orphaned_course_marks: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM marks m LEFT JOIN courses c ON m.course_id = c.id WHERE c.id IS NULL",
    )
    .fetch_one(db.pool())
    .await?;

    Ok(MarksOverview {
        marks,
        orphaned_student_marks,
        orphaned_course_marks,
    })
}

impl fmt::Display for MarksOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checking marks data and student relationships")?;
        writeln!(f, "{}", "=".repeat(super::WIDTH))?;

        if self.marks.is_empty() {
            return writeln!(f, "No marks data found!");
        }

        writeln!(f, "Found {} marks records:", self.marks.len())?;
        writeln!(f)?;

        for (i, m) in self.marks.iter().enumerate() {
            writeln!(f, "Record {}:", i + 1)?;
            writeln!(f, "  Marks ID: {}", m.id)?;
            writeln!(f, "  Exam Type: {}", m.exam_type)?;
            writeln!(f, "  Marks: {}/{}", m.marks_obtained, m.max_marks)?;
            match m.student_db_id {
                Some(id) => writeln!(
                    f,
                    "  Student: {} {} ({}) [DB ID: {id}]",
                    or_dash(m.first_name.as_deref()),
                    or_dash(m.last_name.as_deref()),
                    or_dash(m.student_code.as_deref())
                )?,
                None => writeln!(
                    f,
                    "  ISSUE: Student not found for student_id FK: {}",
                    m.student_fk
                )?,
            }
            match m.course_db_id {
                Some(id) => writeln!(
                    f,
                    "  Course: {} - {} [DB ID: {id}]",
                    or_dash(m.course_code.as_deref()),
                    or_dash(m.course_name.as_deref())
                )?,
                None => writeln!(
                    f,
                    "  ISSUE: Course not found for course_id FK: {}",
                    m.course_fk
                )?,
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", "=".repeat(super::WIDTH))?;
        match self.issues_found() {
            0 => writeln!(
                f,
                "All marks records have valid student and course relationships!"
            )?,
            n => writeln!(f, "Found {n} issues with marks data relationships")?,
        }

        writeln!(f)?;
        writeln!(f, "Orphaned records:")?;
        writeln!(
            f,
            "  - Marks with missing students: {}",
            self.orphaned_student_marks
        )?;
        writeln!(
            f,
            "  - Marks with missing courses: {}",
            self.orphaned_course_marks
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StudentMark {
    pub id: i64,
    pub exam_type: String,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub exam_date: Option<Date>,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl StudentMark {
    /// Zero when `max_marks` is not positive.
    pub fn percentage(&self) -> f64 {
        if self.max_marks > 0.0 {
            self.marks_obtained / self.max_marks * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct CourseMarks {
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    /// Ordered by student code, then exam date.
    pub marks: Vec<StudentMark>,
}

/// Returns `None` when no course has the given id.
pub async fn collect_course(db: &Database, course_id: i64) -> Result<Option<CourseMarks>, AppError> {
    let course: Option<(String, String)> = sqlx::query_as(
        "SELECT course_code::text, course_name::text FROM courses WHERE id = $1",
    )
    .bind(course_id)
    .fetch_optional(db.pool())
    .await?;

    let Some((course_code, course_name)) = course else {
        return Ok(None);
    };

    let marks = sqlx::query_as::<_, StudentMark>(
        r#"
        SELECT m.id, m.exam_type::text AS exam_type, m.marks_obtained, m.max_marks, m.exam_date,
               s.student_id::text AS student_code, s.first_name::text AS first_name,
               s.last_name::text AS last_name, u.email::text AS email
        FROM marks m
        JOIN students s ON m.student_id = s.id
        JOIN users u ON s.user_id = u.id
        WHERE m.course_id = $1
        ORDER BY s.student_id, m.exam_date
        "#,
    )
    .bind(course_id)
    .fetch_all(db.pool())
    .await?;

    Ok(Some(CourseMarks {
        course_id,
        course_code,
        course_name,
        marks,
    }))
}

impl fmt::Display for CourseMarks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Detailed analysis for course ID: {}", self.course_id)?;
        writeln!(f, "{}", "=".repeat(super::WIDTH))?;
        writeln!(f, "Course: {} - {}", self.course_code, self.course_name)?;
        writeln!(f)?;

        if self.marks.is_empty() {
            return writeln!(f, "No marks found for this course.");
        }

        writeln!(
            f,
            "Found {} marks records for this course:",
            self.marks.len()
        )?;
        writeln!(f)?;

        let mut current: Option<&str> = None;
        for m in &self.marks {
            if current != Some(m.student_code.as_str()) {
                current = Some(m.student_code.as_str());
                writeln!(
                    f,
                    "Student: {} {} ({}) - {}",
                    m.first_name, m.last_name, m.student_code, m.email
                )?;
            }
            let date = m.exam_date.map(|d| d.to_string());
            writeln!(
                f,
                "  - {}: {}/{} ({:.1}%) on {}",
                m.exam_type,
                m.marks_obtained,
                m.max_marks,
                m.percentage(),
                or_dash(date.as_deref())
            )?;
        }
        Ok(())
    }
}
