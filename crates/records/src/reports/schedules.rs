//! Schedule table schema and content checks.

use std::fmt;

use sqlx::FromRow;

use crate::database::Database;
use crate::errors::AppError;
use crate::reports::{banner, constraints, or_dash, rule};

/// Columns the schedule feature depends on, with their expected types.
pub const REQUIRED_COLUMNS: [(&str, &str); 4] = [
    ("teacher_id", "bigint"),
    ("title", "character varying"),
    ("start_date_time", "timestamp without time zone"),
    ("end_date_time", "timestamp without time zone"),
];

#[derive(Debug, Clone, FromRow)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: String,
    pub default: Option<String>,
}

impl ColumnInfo {
    pub fn nullable(&self) -> bool {
        self.is_nullable == "YES"
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ScheduleSummary {
    pub id: i64,
    pub title: Option<String>,
    pub teacher_id: Option<i64>,
    pub course_id: Option<i64>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

/// Column listing of `table` in the current schema.
pub async fn columns_of(db: &Database, table: &str) -> Result<Vec<ColumnInfo>, AppError> {
    let rows = sqlx::query_as::<_, ColumnInfo>(
        r#"
        SELECT column_name::text AS name,
               data_type::text AS data_type,
               is_nullable::text AS is_nullable,
               column_default::text AS "default"
        FROM information_schema.columns
        WHERE table_name = $1 AND table_schema = current_schema()
        ORDER BY ordinal_position
        "#,
    )
    .bind(table)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}

#[derive(Debug, Clone)]
pub struct ScheduleSchemaReport {
    pub columns: Vec<ColumnInfo>,
    /// `None` when the table does not exist.
    pub total: Option<i64>,
    pub samples: Vec<ScheduleSummary>,
}

impl ScheduleSchemaReport {
    pub fn table_exists(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|(name, _)| !self.columns.iter().any(|c| c.name == *name))
            .map(|(name, _)| *name)
            .collect()
    }

    fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub async fn collect_schema(db: &Database) -> Result<ScheduleSchemaReport, AppError> {
    let columns = columns_of(db, "schedules").await?;
    if columns.is_empty() {
        return Ok(ScheduleSchemaReport {
            columns,
            total: None,
            samples: Vec::new(),
        });
    }

    let has_required = REQUIRED_COLUMNS
        .iter()
        .all(|(name, _)| columns.iter().any(|c| c.name == *name));

    let total = db.count_rows("schedules").await?;
    // Samples select the required columns, so skip them on a legacy layout.
    let samples = if total > 0 && has_required {
        sqlx::query_as::<_, ScheduleSummary>(
            r#"
            SELECT id::bigint AS id, title::text AS title,
                   teacher_id::bigint AS teacher_id, course_id::bigint AS course_id,
                   start_date_time::text AS starts_at, end_date_time::text AS ends_at
            FROM schedules
            ORDER BY start_date_time
            LIMIT 5
            "#,
        )
        .fetch_all(db.pool())
        .await?
    } else {
        Vec::new()
    };

    Ok(ScheduleSchemaReport {
        columns,
        total: Some(total),
        samples,
    })
}

impl fmt::Display for ScheduleSchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "Schedule Table Schema Check")?;

        if !self.table_exists() {
            writeln!(f, "Table 'schedules' does not exist!")?;
            return writeln!(f, "{}", "=".repeat(super::WIDTH));
        }

        writeln!(f, "Found {} columns:", self.columns.len())?;
        writeln!(f)?;
        for col in &self.columns {
            let nullable = if col.nullable() { "NULL" } else { "NOT NULL" };
            let default = col
                .default
                .as_deref()
                .map(|d| format!(" DEFAULT {d}"))
                .unwrap_or_default();
            writeln!(
                f,
                "  * {:<20} {:<28} {nullable}{default}",
                col.name, col.data_type
            )?;
        }
        writeln!(f)?;

        rule(f)?;
        writeln!(f, "Required Columns Check:")?;
        rule(f)?;
        for (name, expected) in REQUIRED_COLUMNS {
            match self.column(name) {
                Some(col) if col.data_type == expected => {
                    writeln!(f, "  ok      {name:<20} EXISTS ({})", col.data_type)?
                }
                Some(col) => writeln!(
                    f,
                    "  ok      {name:<20} EXISTS ({}, expected {expected})",
                    col.data_type
                )?,
                None => writeln!(f, "  MISSING {name:<20}")?,
            }
        }
        writeln!(f)?;

        match self.total {
            Some(0) | None => writeln!(f, "No schedules found")?,
            Some(n) => {
                writeln!(f, "Total schedules: {n}")?;
                writeln!(f)?;
                writeln!(f, "Sample schedules:")?;
                for s in &self.samples {
                    writeln!(
                        f,
                        "  ID: {}, Title: {}, Teacher: {}, Start: {}",
                        s.id,
                        or_dash(s.title.as_deref()),
                        s.teacher_id.map(|t| t.to_string()).unwrap_or_default(),
                        or_dash(s.starts_at.as_deref())
                    )?;
                }
            }
        }
        writeln!(f)?;

        writeln!(f, "{}", "=".repeat(super::WIDTH))?;
        if self.missing_required().is_empty() {
            writeln!(f, "Schema is correct!")?;
        } else {
            writeln!(f, "Schema needs to be fixed! Run: fix-schedule-schema")?;
        }
        writeln!(f, "{}", "=".repeat(super::WIDTH))
    }
}

/// Result of a teacher or course lookup by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRow {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleDebugReport {
    pub total: i64,
    pub for_teacher: Option<(i64, i64)>,
    pub recent: Vec<ScheduleSummary>,
    pub unique_constraints: Vec<constraints::ConstraintInfo>,
    pub teacher: Option<(i64, Option<NamedRow>)>,
    pub course: Option<(i64, Option<NamedRow>)>,
}

/// Newest first by `created_at`; legacy tables without it fall back to `id`.
fn recent_order_column(has_created_at: bool) -> &'static str {
    if has_created_at { "created_at" } else { "id" }
}

/// Gathers schedule counts, the latest ten schedules, unique constraints and
/// optional teacher/course lookups.
pub async fn collect_debug(
    db: &Database,
    teacher_id: Option<i64>,
    course_id: Option<i64>,
) -> Result<ScheduleDebugReport, AppError> {
    let for_teacher = match teacher_id {
        Some(id) => Some((id, db.count_where("schedules", "teacher_id", id).await?)),
        None => None,
    };

    let total = db.count_rows("schedules").await?;
    let recent = if total > 0 {
        let order_by = recent_order_column(db.column_exists("schedules", "created_at").await?);
        let sql = format!(
            r#"
            SELECT id::bigint AS id, title::text AS title,
                   teacher_id::bigint AS teacher_id, course_id::bigint AS course_id,
                   start_date_time::text AS starts_at, end_date_time::text AS ends_at
            FROM schedules
            ORDER BY {order_by} DESC, id DESC
            LIMIT 10
            "#
        );
        sqlx::query_as::<_, ScheduleSummary>(&sql)
            .fetch_all(db.pool())
            .await?
    } else {
        Vec::new()
    };

    let unique_constraints = constraints::constraints_of(db, "schedules")
        .await?
        .into_iter()
        .filter(|c| c.kind == "u")
        .collect();

    let teacher = match teacher_id {
        Some(id) => {
            let row: Option<(String, String)> =
                sqlx::query_as("SELECT first_name::text, last_name::text FROM teachers WHERE id = $1")
                    .bind(id)
                    .fetch_optional(db.pool())
                    .await?;
            Some((
                id,
                row.map(|(first, last)| NamedRow {
                    id,
                    label: format!("{first} {last}"),
                }),
            ))
        }
        None => None,
    };

    let course = match course_id {
        Some(id) => {
            let row: Option<(String, String)> = sqlx::query_as(
                "SELECT course_name::text, course_code::text FROM courses WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(db.pool())
            .await?;
            Some((
                id,
                row.map(|(name, code)| NamedRow {
                    id,
                    label: format!("{name} ({code})"),
                }),
            ))
        }
        None => None,
    };

    Ok(ScheduleDebugReport {
        total,
        for_teacher,
        recent,
        unique_constraints,
        teacher,
        course,
    })
}

impl fmt::Display for ScheduleDebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "SCHEDULE DEBUG")?;

        if let Some((id, n)) = self.for_teacher {
            writeln!(f, "Schedules for teacher_id={id}: {n}")?;
        }
        writeln!(f, "Total schedules: {}", self.total)?;

        if !self.recent.is_empty() {
            writeln!(f)?;
            writeln!(f, "Recent schedules:")?;
            for s in &self.recent {
                writeln!(
                    f,
                    "  ID: {}, Title: {}, Teacher: {}, Course: {}",
                    s.id,
                    or_dash(s.title.as_deref()),
                    s.teacher_id.map(|t| t.to_string()).unwrap_or_default(),
                    s.course_id.map(|c| c.to_string()).unwrap_or_default()
                )?;
                writeln!(
                    f,
                    "      Start: {}, End: {}",
                    or_dash(s.starts_at.as_deref()),
                    or_dash(s.ends_at.as_deref())
                )?;
            }
        }

        writeln!(f)?;
        if self.unique_constraints.is_empty() {
            writeln!(f, "No unique constraints found")?;
        } else {
            writeln!(f, "Unique constraints:")?;
            for c in &self.unique_constraints {
                writeln!(f, "  {}: {}", c.name, c.definition)?;
            }
        }

        if let Some((id, found)) = &self.teacher {
            writeln!(f)?;
            match found {
                Some(t) => writeln!(f, "Teacher ID {id}: {}", t.label)?,
                None => writeln!(f, "No teacher with ID {id} found!")?,
            }
        }
        if let Some((id, found)) = &self.course {
            match found {
                Some(c) => writeln!(f, "Course ID {id}: {}", c.label)?,
                None => writeln!(f, "No course with ID {id} found!")?,
            }
        }
        Ok(())
    }
}
