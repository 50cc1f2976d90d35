//! One-shot schema patches for the `schedules` table.
//!
//! These alter a live schema and are run by hand. Each patch is idempotent:
//! columns are added with `IF NOT EXISTS` and `DROP NOT NULL` is a no-op on a
//! nullable column.

use std::fmt;

use time::PrimitiveDateTime;
use time::macros::datetime;
use tracing::{info, warn};

use crate::database::{Database, quote_ident};
use crate::errors::AppError;

/// Columns the schedule API writes, with the type used when adding them.
pub const SCHEDULE_COLUMNS: [(&str, &str); 7] = [
    ("teacher_id", "BIGINT"),
    ("title", "VARCHAR(200)"),
    ("description", "VARCHAR(1000)"),
    ("start_date_time", "TIMESTAMP"),
    ("end_date_time", "TIMESTAMP"),
    ("recurrence", "VARCHAR(20) DEFAULT 'NONE'"),
    ("location", "VARCHAR(100)"),
];

/// Legacy weekly-timetable columns that must accept NULL.
pub const RELAXED_COLUMNS: [&str; 3] = ["day_of_week", "start_time", "end_time"];

/// Presence of each schedule column, in [`SCHEDULE_COLUMNS`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCheck {
    pub columns: Vec<(&'static str, bool)>,
}

impl ColumnCheck {
    pub fn missing(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }
}

impl fmt::Display for ColumnCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, present) in &self.columns {
            let status = if *present { "EXISTS" } else { "MISSING" };
            writeln!(f, "  {name}: {status}")?;
        }
        Ok(())
    }
}

pub async fn check_schedule_columns(db: &Database) -> Result<ColumnCheck, AppError> {
    let mut columns = Vec::with_capacity(SCHEDULE_COLUMNS.len());
    for (name, _) in SCHEDULE_COLUMNS {
        columns.push((name, db.column_exists("schedules", name).await?));
    }
    Ok(ColumnCheck { columns })
}

/// Adds every missing schedule column in one transaction.
///
/// Returns the names that were added; an empty list means nothing changed.
pub async fn add_missing_schedule_columns(db: &Database) -> Result<Vec<&'static str>, AppError> {
    let missing = check_schedule_columns(db).await?.missing();
    if missing.is_empty() {
        info!("All schedule columns present");
        return Ok(missing);
    }

    let mut tx = db.pool().begin().await?;
    for name in &missing {
        let Some((_, ty)) = SCHEDULE_COLUMNS.iter().find(|(n, _)| n == name) else {
            continue;
        };
        let sql = format!(
            "ALTER TABLE schedules ADD COLUMN IF NOT EXISTS {} {ty}",
            quote_ident(name)
        );
        sqlx::query(&sql).execute(&mut *tx).await?;
        info!("Added schedules.{name}");
    }
    tx.commit().await?;

    Ok(missing)
}

/// Drops NOT NULL from the legacy columns that exist.
///
/// Returns the columns that were altered.
pub async fn relax_legacy_schedule_columns(db: &Database) -> Result<Vec<&'static str>, AppError> {
    let mut present = Vec::new();
    for name in RELAXED_COLUMNS {
        if db.column_exists("schedules", name).await? {
            present.push(name);
        } else {
            warn!("schedules.{name} does not exist, skipping");
        }
    }

    let mut tx = db.pool().begin().await?;
    for name in &present {
        let sql = format!(
            "ALTER TABLE schedules ALTER COLUMN {} DROP NOT NULL",
            quote_ident(name)
        );
        sqlx::query(&sql).execute(&mut *tx).await?;
        info!("Made schedules.{name} nullable");
    }
    tx.commit().await?;

    Ok(present)
}

/// A marker schedule used to probe whether inserts succeed.
#[derive(Debug, Clone)]
pub struct TrialSchedule {
    pub course_id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
}

impl TrialSchedule {
    pub fn new(course_id: i64, teacher_id: i64) -> Self {
        Self {
            course_id,
            teacher_id,
            title: "Test Schedule".to_string(),
            starts_at: datetime!(2026-01-10 09:00:00),
            ends_at: datetime!(2026-01-10 10:00:00),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// The row was inserted, then removed again.
    Succeeded { inserted_id: i64 },
    /// The insert was rejected and the transaction rolled back.
    Failed { reason: String },
}

impl TrialOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, TrialOutcome::Succeeded { .. })
    }
}

impl fmt::Display for TrialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialOutcome::Succeeded { inserted_id } => write!(
                f,
                "Schedule insert successful (ID {inserted_id}), test schedule deleted"
            ),
            TrialOutcome::Failed { reason } => write!(f, "Schedule insert failed: {reason}"),
        }
    }
}

/// Inserts `trial` and deletes it again inside one transaction.
///
/// A rejected insert is reported as [`TrialOutcome::Failed`], not as an error;
/// only failures to open or finish the transaction propagate.
pub async fn trial_schedule_insert(
    db: &Database,
    trial: &TrialSchedule,
) -> Result<TrialOutcome, AppError> {
    let mut tx = db.pool().begin().await?;

    let inserted = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO schedules (
            course_id, teacher_id, title, description,
            start_date_time, end_date_time, recurrence,
            location, class_type, created_at, updated_at
        ) VALUES ($1, $2, $3, 'Test Description', $4, $5, 'NONE', 'Room 101', 'LECTURE', NOW(), NOW())
        RETURNING id
        "#,
    )
    .bind(trial.course_id)
    .bind(trial.teacher_id)
    .bind(&trial.title)
    .bind(trial.starts_at)
    .bind(trial.ends_at)
    .fetch_one(&mut *tx)
    .await;

    let inserted_id = match inserted {
        Ok(id) => id,
        Err(e) => {
            warn!("Trial insert rejected: {e}");
            tx.rollback().await?;
            return Ok(TrialOutcome::Failed {
                reason: e.to_string(),
            });
        }
    };

    sqlx::query("DELETE FROM schedules WHERE id = $1")
        .bind(inserted_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Trial schedule {inserted_id} inserted and removed");
    Ok(TrialOutcome::Succeeded { inserted_id })
}
