//! Connection check and row counts for the core tables.

use std::fmt;

use tracing::warn;

use crate::database::{CORE_TABLES, Database};
use crate::errors::AppError;
use crate::reports::banner;

/// Row count of one table, or the error that prevented counting it.
#[derive(Debug, Clone)]
pub struct TableCount {
    pub table: String,
    pub count: Result<i64, String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseOverview {
    pub location: String,
    pub server_version: String,
    pub tables: Vec<String>,
    pub counts: Vec<TableCount>,
}

impl DatabaseOverview {
    pub fn count_of(&self, table: &str) -> Option<i64> {
        self.counts
            .iter()
            .find(|c| c.table == table)
            .and_then(|c| c.count.as_ref().ok().copied())
    }

    /// True when no teachers, students or courses were found.
    pub fn is_unseeded(&self) -> bool {
        ["teachers", "students", "courses"]
            .iter()
            .all(|t| self.count_of(t).unwrap_or(0) == 0)
    }
}

/// Gathers version, table list and core counts.
///
/// A failing count (for example a missing table) is recorded and the
/// remaining tables are still counted.
pub async fn collect(db: &Database, location: &str) -> Result<DatabaseOverview, AppError> {
    let server_version = db.server_version().await?;
    let tables = db.list_tables().await?;

    let mut counts = Vec::with_capacity(CORE_TABLES.len());
    for table in CORE_TABLES {
        let count = match db.count_rows(table).await {
            Ok(n) => Ok(n),
            Err(e) => {
                warn!("Could not count {table}: {e}");
                Err(e.to_string())
            }
        };
        counts.push(TableCount {
            table: table.to_string(),
            count,
        });
    }

    Ok(DatabaseOverview {
        location: location.to_string(),
        server_version,
        tables,
        counts,
    })
}

impl fmt::Display for DatabaseOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connected to {}", self.location)?;
        let version: String = self.server_version.chars().take(50).collect();
        writeln!(f, "PostgreSQL version: {version}")?;
        writeln!(f)?;

        writeln!(f, "Found {} tables:", self.tables.len())?;
        for table in &self.tables {
            writeln!(f, "  - {table}")?;
        }
        writeln!(f)?;

        banner(f, "DATABASE CONTENT CHECK")?;
        for count in &self.counts {
            match &count.count {
                Ok(n) => writeln!(f, "{:<12} {n}", format!("{}:", count.table))?,
                Err(e) => writeln!(f, "{:<12} error: {e}", format!("{}:", count.table))?,
            }
        }
        writeln!(f, "{}", "=".repeat(super::WIDTH))?;

        if self.is_unseeded() {
            writeln!(f, "NO DATA FOUND. Seed the database with:")?;
            writeln!(f, "  seed --database-url <DATABASE_URL>")
        } else {
            writeln!(f, "Data exists in database.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview(counts: &[(&str, Result<i64, String>)]) -> DatabaseOverview {
        DatabaseOverview {
            location: "localhost:5432/records".to_string(),
            server_version: "PostgreSQL 16.2 on x86_64-pc-linux-gnu".to_string(),
            tables: vec!["courses".to_string(), "users".to_string()],
            counts: counts
                .iter()
                .map(|(t, c)| TableCount {
                    table: t.to_string(),
                    count: c.clone(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_database_is_unseeded() {
        let report = overview(&[
            ("users", Ok(1)),
            ("teachers", Ok(0)),
            ("students", Ok(0)),
            ("courses", Ok(0)),
            ("enrollments", Ok(0)),
        ]);
        assert!(report.is_unseeded());
        assert!(report.to_string().contains("NO DATA FOUND"));
    }

    #[test]
    fn test_seeded_database() {
        let report = overview(&[
            ("users", Ok(28)),
            ("teachers", Ok(10)),
            ("students", Ok(17)),
            ("courses", Ok(10)),
            ("enrollments", Ok(28)),
        ]);
        assert!(!report.is_unseeded());
        assert_eq!(report.count_of("students"), Some(17));
        let rendered = report.to_string();
        assert!(rendered.contains("Data exists in database."));
        assert!(rendered.contains("students:    17"));
    }

    #[test]
    fn test_count_errors_are_reported_inline() {
        let report = overview(&[
            ("users", Ok(3)),
            ("teachers", Err("relation \"teachers\" does not exist".to_string())),
        ]);
        assert_eq!(report.count_of("teachers"), None);
        assert!(report.to_string().contains("teachers:    error: relation"));
    }
}
