//! Pre-deletion reports for students and teachers.
//!
//! Nothing here writes. The "simulated" deletion order only counts the rows
//! each step would remove, in the order the backend deletes them.

use std::fmt;

use sqlx::FromRow;
use time::Date;
use tracing::warn;

use crate::database::Database;
use crate::errors::AppError;
use crate::reports::constraints::{self, ForeignKeyRef};
use crate::reports::or_dash;

/// A foreign key into the inspected table, with the number of rows that
/// point at the inspected entity.
#[derive(Debug, Clone)]
pub struct Reference {
    pub foreign_key: ForeignKeyRef,
    pub count: Result<i64, String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OwnerRow {
    pub id: i64,
    pub email: String,
    pub role: String,
}

async fn references_to(db: &Database, table: &str, id: i64) -> Result<Vec<Reference>, AppError> {
    let fks = constraints::foreign_keys_referencing(db, table).await?;
    let mut refs = Vec::with_capacity(fks.len());
    for fk in fks {
        let count = match db.count_where(&fk.table_name, &fk.column_name, id).await {
            Ok(n) => Ok(n),
            Err(e) => {
                warn!("Could not check {}: {e}", fk.table_name);
                Err(e.to_string())
            }
        };
        refs.push(Reference {
            foreign_key: fk,
            count,
        });
    }
    Ok(refs)
}

async fn owner_of(db: &Database, user_id: i64) -> Result<Option<OwnerRow>, AppError> {
    let owner = sqlx::query_as::<_, OwnerRow>(
        "SELECT id, email::text AS email, role::text AS role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;
    Ok(owner)
}

fn write_references(
    f: &mut fmt::Formatter<'_>,
    table: &str,
    entity: &str,
    refs: &[Reference],
) -> fmt::Result {
    writeln!(f, "Foreign key constraints referencing {table} table:")?;
    for r in refs {
        writeln!(f, "  - {}", r.foreign_key)?;
        match &r.count {
            Ok(0) => {}
            Ok(n) => writeln!(
                f,
                "    WARNING: {n} records in {} reference this {entity}!",
                r.foreign_key.table_name
            )?,
            Err(e) => writeln!(f, "    Error checking {}: {e}", r.foreign_key.table_name)?,
        }
    }
    Ok(())
}

fn write_owner(f: &mut fmt::Formatter<'_>, owner: Option<&OwnerRow>) -> fmt::Result {
    match owner {
        Some(u) => writeln!(f, "Associated user: {} (Role: {})", u.email, u.role),
        None => writeln!(f, "Associated user: not found"),
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StudentProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub student_code: String,
    pub class_name: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecentMark {
    pub course_code: String,
    pub course_name: String,
    pub exam_type: String,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub exam_date: Option<Date>,
}

#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentLine {
    pub course_code: String,
    pub course_name: String,
    pub status: String,
    pub semester: i32,
    pub academic_year: i32,
}

#[derive(Debug, Clone)]
pub struct StudentDeletionReport {
    pub student: StudentProfile,
    pub marks_count: i64,
    pub recent_marks: Vec<RecentMark>,
    pub attendance_count: i64,
    /// `(status, count)` pairs.
    pub attendance_by_status: Vec<(String, i64)>,
    pub enrollments: Vec<EnrollmentLine>,
    pub owner: Option<OwnerRow>,
    pub references: Vec<Reference>,
}

impl StudentDeletionReport {
    /// Foreign keys into `students` that would block a delete.
    pub fn non_cascading(&self) -> impl Iterator<Item = &ForeignKeyRef> {
        self.references
            .iter()
            .map(|r| &r.foreign_key)
            .filter(|fk| !fk.cascades())
    }
}

/// Returns `None` when no student has the given id.
pub async fn collect_student(
    db: &Database,
    student_id: i64,
) -> Result<Option<StudentDeletionReport>, AppError> {
    let student = sqlx::query_as::<_, StudentProfile>(
        r#"
        SELECT id, first_name::text AS first_name, last_name::text AS last_name,
               student_id::text AS student_code, class_name::text AS class_name, user_id
        FROM students
        WHERE id = $1
        "#,
    )
    .bind(student_id)
    .fetch_optional(db.pool())
    .await?;

    let Some(student) = student else {
        return Ok(None);
    };

    let marks_count = db.count_where("marks", "student_id", student_id).await?;
    let recent_marks = if marks_count > 0 {
        sqlx::query_as::<_, RecentMark>(
            r#"
            SELECT c.course_code::text AS course_code, c.course_name::text AS course_name,
                   m.exam_type::text AS exam_type, m.marks_obtained, m.max_marks, m.exam_date
            FROM marks m
            JOIN courses c ON m.course_id = c.id
            WHERE m.student_id = $1
            ORDER BY m.exam_date DESC
            LIMIT 5
            "#,
        )
        .bind(student_id)
        .fetch_all(db.pool())
        .await?
    } else {
        Vec::new()
    };

    let attendance_count = db.count_where("attendance", "student_id", student_id).await?;
    let attendance_by_status = if attendance_count > 0 {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status::text, COUNT(*)
            FROM attendance
            WHERE student_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(student_id)
        .fetch_all(db.pool())
        .await?
    } else {
        Vec::new()
    };

    let enrollments = sqlx::query_as::<_, EnrollmentLine>(
        r#"
        SELECT c.course_code::text AS course_code, c.course_name::text AS course_name,
               e.status::text AS status, e.semester, e.academic_year
        FROM enrollments e
        JOIN courses c ON e.course_id = c.id
        WHERE e.student_id = $1
        ORDER BY e.academic_year DESC, e.semester DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(db.pool())
    .await?;

    let owner = owner_of(db, student.user_id).await?;
    let references = references_to(db, "students", student_id).await?;

    Ok(Some(StudentDeletionReport {
        student,
        marks_count,
        recent_marks,
        attendance_count,
        attendance_by_status,
        enrollments,
        owner,
        references,
    }))
}

impl fmt::Display for StudentDeletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.student;
        writeln!(f, "Checking references for student ID: {}", s.id)?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "Student: {} {} ({}) - Class: {}",
            s.first_name, s.last_name, s.student_code, s.class_name
        )?;
        writeln!(f)?;

        writeln!(f, "Marks records: {}", self.marks_count)?;
        if !self.recent_marks.is_empty() {
            writeln!(f, "  Recent marks:")?;
            for m in &self.recent_marks {
                let date = m.exam_date.map(|d| d.to_string());
                writeln!(
                    f,
                    "    - {} ({}): {} - {}/{} on {}",
                    m.course_code,
                    m.course_name,
                    m.exam_type,
                    m.marks_obtained,
                    m.max_marks,
                    or_dash(date.as_deref())
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Attendance records: {}", self.attendance_count)?;
        if !self.attendance_by_status.is_empty() {
            writeln!(f, "  Attendance breakdown:")?;
            for (status, n) in &self.attendance_by_status {
                writeln!(f, "    - {status}: {n} records")?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Enrollment records: {}", self.enrollments.len())?;
        if !self.enrollments.is_empty() {
            writeln!(f, "  Enrollments:")?;
            for e in &self.enrollments {
                writeln!(
                    f,
                    "    - {} ({}): {} - Sem {}, Year {}",
                    e.course_code, e.course_name, e.status, e.semester, e.academic_year
                )?;
            }
        }
        writeln!(f)?;

        write_owner(f, self.owner.as_ref())?;
        writeln!(f)?;
        write_references(f, "students", "student", &self.references)?;

        writeln!(f)?;
        writeln!(f, "Simulating deletion order for student ID: {}", s.id)?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "Step 1: Would delete {} marks records", self.marks_count)?;
        writeln!(
            f,
            "Step 2: Would delete {} attendance records",
            self.attendance_count
        )?;
        writeln!(
            f,
            "Step 3: Would delete {} enrollment records",
            self.enrollments.len()
        )?;
        writeln!(
            f,
            "Step 4: Would delete student (associated user ID: {})",
            s.user_id
        )?;
        writeln!(f, "Step 5: Would delete user ID: {}", s.user_id)?;

        writeln!(f)?;
        writeln!(f, "Checking CASCADE DELETE settings:")?;
        writeln!(f, "{}", "=".repeat(50))?;
        for r in &self.references {
            writeln!(f, "  - {}", r.foreign_key)?;
            writeln!(f, "    Delete Rule: {}", r.foreign_key.delete_rule)?;
            if !r.foreign_key.cascades() {
                writeln!(f, "    WARNING: Not set to CASCADE DELETE!")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TeacherProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub teacher_code: String,
    pub email: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ScheduleLine {
    pub id: i64,
    pub title: Option<String>,
    pub starts_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TeacherDeletionReport {
    pub teacher: TeacherProfile,
    /// `(course_code, course_name)` of every assigned course.
    pub courses: Vec<(String, String)>,
    pub schedules: Vec<ScheduleLine>,
    pub owner: Option<OwnerRow>,
    pub references: Vec<Reference>,
}

/// Returns `None` when no teacher has the given id.
pub async fn collect_teacher(
    db: &Database,
    teacher_id: i64,
) -> Result<Option<TeacherDeletionReport>, AppError> {
    let teacher = sqlx::query_as::<_, TeacherProfile>(
        r#"
        SELECT id, first_name::text AS first_name, last_name::text AS last_name,
               teacher_id::text AS teacher_code, email::text AS email, user_id
        FROM teachers
        WHERE id = $1
        "#,
    )
    .bind(teacher_id)
    .fetch_optional(db.pool())
    .await?;

    let Some(teacher) = teacher else {
        return Ok(None);
    };

    let courses = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT c.course_code::text, c.course_name::text
        FROM course_teachers ct
        JOIN courses c ON c.id = ct.course_id
        WHERE ct.teacher_id = $1
        ORDER BY c.course_code
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db.pool())
    .await?;

    let schedules = sqlx::query_as::<_, ScheduleLine>(
        r#"
        SELECT id, title::text AS title, start_date_time::text AS starts_at
        FROM schedules
        WHERE teacher_id = $1
        ORDER BY start_date_time
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db.pool())
    .await?;

    let owner = owner_of(db, teacher.user_id).await?;
    let references = references_to(db, "teachers", teacher_id).await?;

    Ok(Some(TeacherDeletionReport {
        teacher,
        courses,
        schedules,
        owner,
        references,
    }))
}

impl fmt::Display for TeacherDeletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.teacher;
        writeln!(f, "Checking references for teacher ID: {}", t.id)?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(
            f,
            "Teacher: {} {} ({}) - {}",
            t.first_name, t.last_name, t.teacher_code, t.email
        )?;
        writeln!(f)?;

        writeln!(f, "Course assignments: {}", self.courses.len())?;
        for (code, name) in &self.courses {
            writeln!(f, "  - Course: {code} - {name}")?;
        }
        writeln!(f)?;

        writeln!(f, "Schedules: {}", self.schedules.len())?;
        for s in &self.schedules {
            writeln!(
                f,
                "  - Schedule: {} at {}",
                or_dash(s.title.as_deref()),
                or_dash(s.starts_at.as_deref())
            )?;
        }
        writeln!(f)?;

        write_owner(f, self.owner.as_ref())?;
        writeln!(f)?;
        write_references(f, "teachers", "teacher", &self.references)?;

        writeln!(f)?;
        writeln!(f, "Simulating deletion order for teacher ID: {}", t.id)?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "Step 1: Would delete {} schedules", self.schedules.len())?;
        writeln!(
            f,
            "Step 2: Would remove {} course assignments",
            self.courses.len()
        )?;
        writeln!(
            f,
            "Step 3: Would delete teacher (associated user ID: {})",
            t.user_id
        )?;
        writeln!(f, "Step 4: Would delete user ID: {}", t.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn fk(table: &str, column: &str, target: &str, rule: &str) -> ForeignKeyRef {
        ForeignKeyRef {
            table_name: table.to_string(),
            column_name: column.to_string(),
            foreign_table: target.to_string(),
            foreign_column: "id".to_string(),
            delete_rule: rule.to_string(),
        }
    }

    fn student_report() -> StudentDeletionReport {
        StudentDeletionReport {
            student: StudentProfile {
                id: 7,
                first_name: "Lukas".to_string(),
                last_name: "Schmidt".to_string(),
                student_code: "EU001".to_string(),
                class_name: "AS-2024".to_string(),
                user_id: 12,
            },
            marks_count: 1,
            recent_marks: vec![RecentMark {
                course_code: "AS101".to_string(),
                course_name: "Mathematics".to_string(),
                exam_type: "MIDTERM".to_string(),
                marks_obtained: 42.0,
                max_marks: 50.0,
                exam_date: Some(date!(2025 - 03 - 14)),
            }],
            attendance_count: 3,
            attendance_by_status: vec![("ABSENT".to_string(), 1), ("PRESENT".to_string(), 2)],
            enrollments: Vec::new(),
            owner: Some(OwnerRow {
                id: 12,
                email: "lukas.schmidt@eadms.com".to_string(),
                role: "STUDENT".to_string(),
            }),
            references: vec![
                Reference {
                    foreign_key: fk("marks", "student_id", "students", "CASCADE"),
                    count: Ok(1),
                },
                Reference {
                    foreign_key: fk("attendance", "student_id", "students", "NO ACTION"),
                    count: Ok(3),
                },
            ],
        }
    }

    #[test]
    fn test_student_report_sections() {
        let rendered = student_report().to_string();
        assert!(rendered.contains("Student: Lukas Schmidt (EU001) - Class: AS-2024"));
        assert!(rendered.contains("AS101 (Mathematics): MIDTERM - 42/50 on 2025-03-14"));
        assert!(rendered.contains("- PRESENT: 2 records"));
        assert!(rendered.contains("Enrollment records: 0"));
        assert!(rendered.contains("Associated user: lukas.schmidt@eadms.com (Role: STUDENT)"));
        assert!(rendered.contains("WARNING: 3 records in attendance reference this student!"));
        assert!(rendered.contains("Step 5: Would delete user ID: 12"));
    }

    #[test]
    fn test_non_cascading_keys_are_flagged() {
        let report = student_report();
        let blocking: Vec<_> = report.non_cascading().collect();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].table_name, "attendance");
        let rendered = report.to_string();
        assert_eq!(rendered.matches("Not set to CASCADE DELETE").count(), 1);
    }

    #[test]
    fn test_teacher_report_deletion_steps() {
        let report = TeacherDeletionReport {
            teacher: TeacherProfile {
                id: 3,
                first_name: "Maria".to_string(),
                last_name: "Garcia".to_string(),
                teacher_code: "TCH103".to_string(),
                email: "maria.garcia@eadms.com".to_string(),
                user_id: 4,
            },
            courses: vec![("AS201".to_string(), "Data Structures".to_string())],
            schedules: Vec::new(),
            owner: None,
            references: vec![Reference {
                foreign_key: fk("schedules", "teacher_id", "teachers", "CASCADE"),
                count: Err("permission denied".to_string()),
            }],
        };
        let rendered = report.to_string();
        assert!(rendered.contains("Course assignments: 1"));
        assert!(rendered.contains("  - Course: AS201 - Data Structures"));
        assert!(rendered.contains("Associated user: not found"));
        assert!(rendered.contains("Error checking schedules: permission denied"));
        assert!(rendered.contains("Step 1: Would delete 0 schedules"));
        assert!(rendered.contains("Step 4: Would delete user ID: 4"));
    }
}
