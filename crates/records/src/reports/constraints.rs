//! Constraint, index and foreign-key introspection.

use std::fmt;

use sqlx::FromRow;

use crate::database::Database;
use crate::errors::AppError;
use crate::reports::{banner, rule};

#[derive(Debug, Clone, FromRow)]
pub struct ConstraintInfo {
    pub name: String,
    /// Raw `pg_constraint.contype` code.
    pub kind: String,
    pub definition: String,
}

impl ConstraintInfo {
    pub fn kind_description(&self) -> &str {
        describe_constraint_type(&self.kind)
    }
}

/// Maps a `contype` code to a readable name.
pub fn describe_constraint_type(code: &str) -> &str {
    match code {
        "p" => "PRIMARY KEY",
        "u" => "UNIQUE",
        "c" => "CHECK",
        "f" => "FOREIGN KEY",
        "x" => "EXCLUSION",
        other => other,
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct IndexInfo {
    pub name: String,
    pub definition: String,
}

/// A foreign key from `table_name.column_name` to `foreign_table.foreign_column`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ForeignKeyRef {
    pub table_name: String,
    pub column_name: String,
    pub foreign_table: String,
    pub foreign_column: String,
    pub delete_rule: String,
}

impl ForeignKeyRef {
    pub fn cascades(&self) -> bool {
        self.delete_rule == "CASCADE"
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.table_name, self.column_name, self.foreign_table, self.foreign_column
        )
    }
}

#[derive(Debug, Clone)]
pub struct TableConstraints {
    pub table: String,
    pub constraints: Vec<ConstraintInfo>,
    pub indexes: Vec<IndexInfo>,
}

pub async fn constraints_of(db: &Database, table: &str) -> Result<Vec<ConstraintInfo>, AppError> {
    let rows = sqlx::query_as::<_, ConstraintInfo>(
        r#"
        SELECT con.conname::text AS name,
               con.contype::text AS kind,
               pg_get_constraintdef(con.oid) AS definition
        FROM pg_constraint con
        JOIN pg_class rel ON rel.oid = con.conrelid
        JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
        WHERE rel.relname = $1 AND nsp.nspname = current_schema()
        ORDER BY con.contype, con.conname
        "#,
    )
    .bind(table)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}

pub async fn indexes_of(db: &Database, table: &str) -> Result<Vec<IndexInfo>, AppError> {
    let rows = sqlx::query_as::<_, IndexInfo>(
        r#"
        SELECT indexname::text AS name, indexdef AS definition
        FROM pg_indexes
        WHERE tablename = $1 AND schemaname = current_schema()
        ORDER BY indexname
        "#,
    )
    .bind(table)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}

/// Foreign keys in other tables that point at `table`, with their delete rule.
pub async fn foreign_keys_referencing(
    db: &Database,
    table: &str,
) -> Result<Vec<ForeignKeyRef>, AppError> {
    let rows = sqlx::query_as::<_, ForeignKeyRef>(
        r#"
        SELECT tc.table_name::text AS table_name,
               kcu.column_name::text AS column_name,
               ccu.table_name::text AS foreign_table,
               ccu.column_name::text AS foreign_column,
               rc.delete_rule::text AS delete_rule
        FROM information_schema.table_constraints AS tc
        JOIN information_schema.key_column_usage AS kcu
          ON tc.constraint_name = kcu.constraint_name
         AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage AS ccu
          ON ccu.constraint_name = tc.constraint_name
         AND ccu.table_schema = tc.table_schema
        JOIN information_schema.referential_constraints AS rc
          ON tc.constraint_name = rc.constraint_name
         AND tc.table_schema = rc.constraint_schema
        WHERE tc.constraint_type = 'FOREIGN KEY'
          AND ccu.table_name = $1
          AND tc.table_schema = current_schema()
        ORDER BY tc.table_name, kcu.column_name
        "#,
    )
    .bind(table)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}

pub async fn collect(db: &Database, table: &str) -> Result<TableConstraints, AppError> {
    Ok(TableConstraints {
        table: table.to_string(),
        constraints: constraints_of(db, table).await?,
        indexes: indexes_of(db, table).await?,
    })
}

impl fmt::Display for TableConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, &format!("Constraints on '{}' table", self.table))?;
        if self.constraints.is_empty() {
            writeln!(f, "No constraints found")?;
        } else {
            writeln!(f, "Found {} constraints:", self.constraints.len())?;
            writeln!(f)?;
            for c in &self.constraints {
                writeln!(f, "Name: {}", c.name)?;
                writeln!(f, "Type: {}", c.kind_description())?;
                writeln!(f, "Definition: {}", c.definition)?;
                rule(f)?;
            }
        }
        writeln!(f)?;

        banner(f, &format!("Indexes on '{}' table", self.table))?;
        if self.indexes.is_empty() {
            writeln!(f, "No indexes found")?;
        } else {
            writeln!(f, "Found {} indexes:", self.indexes.len())?;
            writeln!(f)?;
            for idx in &self.indexes {
                writeln!(f, "* {}", idx.name)?;
                writeln!(f, "  {}", idx.definition)?;
            }
        }
        writeln!(f, "{}", "=".repeat(super::WIDTH))
    }
}
