//! Scoped database handle shared by every tool.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::AppError;

/// Schema bundled with the workspace, applied by the full-migration tool.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// The five tables every deployment is expected to carry.
pub const CORE_TABLES: [&str; 5] = ["users", "teachers", "students", "courses", "enrollments"];

/// One connection held for the lifetime of a tool invocation.
///
/// The underlying pool never grows past a single connection, so statements
/// run strictly in order. Call [`Database::close`] when the tool is done.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the single connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(config.connect_options()?)
            .await?;

        info!("Connected to {}", config.params());
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Releases the connection.
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connection closed");
    }

    /// Applies the bundled migrations.
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub async fn server_version(&self) -> Result<String, AppError> {
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    /// Tables in the current schema, alphabetically.
    pub async fn list_tables(&self) -> Result<Vec<String>, AppError> {
        let tables: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema()
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    /// Whether `table.column` exists in the current schema.
    pub async fn column_exists(&self, table: &str, column: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_name = $1 AND column_name = $2 AND table_schema = current_schema()
            )
            "#,
        )
        .bind(table)
        .bind(column)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// `SELECT COUNT(*)` on a table whose name comes from code or the catalog.
    pub async fn count_rows(&self, table: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts rows of `table` whose `column` equals `id`.
    pub async fn count_where(&self, table: &str, column: &str, id: i64) -> Result<i64, AppError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            quote_ident(table),
            quote_ident(column)
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Quotes an SQL identifier so it can be spliced into a statement.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
