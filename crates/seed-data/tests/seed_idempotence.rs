//! Integration tests for the seeder.
//!
//! Each test builds a throwaway schema, either from the bundled migration or
//! shaped like the web backend's tables, and drops it afterwards.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test -p seed-data --test seed_idempotence`

use std::env;

use seed_data::prelude::*;
use sqlx::{PgPool, postgres::PgPoolOptions};

struct Scratch {
    admin: PgPool,
    schema: String,
    db: Database,
}

impl Scratch {
    async fn teardown(self) {
        self.db.close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
        self.admin.close().await;
    }
}

/// Tables as the web backend's ORM creates them. Unlike the bundled
/// migration, `course_teachers` has no key on the pair.
const BACKEND_SCHEMA: &str = r#"
CREATE TABLE users (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    created_at TIMESTAMP(6),
    updated_at TIMESTAMP(6),
    email VARCHAR(255) NOT NULL UNIQUE,
    is_active BOOLEAN NOT NULL,
    password VARCHAR(255) NOT NULL,
    role VARCHAR(255) NOT NULL CHECK (role IN ('ADMIN', 'TEACHER', 'STUDENT'))
);

CREATE TABLE teachers (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    created_at TIMESTAMP(6),
    updated_at TIMESTAMP(6),
    contact_number VARCHAR(255),
    department VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    first_name VARCHAR(255) NOT NULL,
    last_name VARCHAR(255) NOT NULL,
    teacher_id VARCHAR(255) NOT NULL UNIQUE,
    user_id BIGINT NOT NULL UNIQUE REFERENCES users(id)
);

CREATE TABLE students (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    created_at TIMESTAMP(6),
    updated_at TIMESTAMP(6),
    class_name VARCHAR(255) NOT NULL,
    contact_number VARCHAR(255),
    date_of_birth DATE,
    first_name VARCHAR(255) NOT NULL,
    gender VARCHAR(255) NOT NULL CHECK (gender IN ('MALE', 'FEMALE', 'OTHER')),
    last_name VARCHAR(255) NOT NULL,
    student_id VARCHAR(255) NOT NULL UNIQUE,
    user_id BIGINT NOT NULL UNIQUE REFERENCES users(id)
);

CREATE TABLE courses (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    created_at TIMESTAMP(6),
    updated_at TIMESTAMP(6),
    course_code VARCHAR(255) NOT NULL UNIQUE,
    course_name VARCHAR(255) NOT NULL,
    credits INTEGER NOT NULL,
    description VARCHAR(500),
    semester INTEGER NOT NULL
);

CREATE TABLE course_teachers (
    course_id BIGINT NOT NULL REFERENCES courses(id),
    teacher_id BIGINT NOT NULL REFERENCES teachers(id)
);

CREATE TABLE enrollments (
    id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    created_at TIMESTAMP(6),
    updated_at TIMESTAMP(6),
    academic_year INTEGER NOT NULL,
    completion_date DATE,
    enrollment_date DATE NOT NULL,
    final_grade FLOAT(53),
    grade_points FLOAT(53),
    letter_grade VARCHAR(255),
    remarks VARCHAR(255),
    semester INTEGER NOT NULL,
    status VARCHAR(255) NOT NULL,
    course_id BIGINT NOT NULL REFERENCES courses(id),
    student_id BIGINT NOT NULL REFERENCES students(id),
    UNIQUE (student_id, course_id, semester, academic_year)
);
"#;

/// Set up a migrated scratch schema, skipping tests if DATABASE_URL is not set.
async fn scratch() -> Option<Scratch> {
    let scratch = empty_scratch().await?;
    scratch
        .db
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    Some(scratch)
}

/// Set up a scratch schema holding the backend's tables.
async fn backend_scratch() -> Option<Scratch> {
    let scratch = empty_scratch().await?;
    sqlx::raw_sql(BACKEND_SCHEMA)
        .execute(scratch.db.pool())
        .await
        .expect("Failed to create backend tables");
    Some(scratch)
}

/// Set up an empty scratch schema, skipping tests if DATABASE_URL is not set.
async fn empty_scratch() -> Option<Scratch> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    let admin = match PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            return None;
        }
    };

    let schema = format!("seed_test_{}", rand::random::<u32>());
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .expect("Failed to create scratch schema");

    let config = DatabaseConfig::from_url(&database_url)
        .expect("DATABASE_URL is not a valid postgres URL")
        .with_search_path(schema.clone());
    let db = Database::connect(&config)
        .await
        .expect("Failed to connect to scratch schema");

    Some(Scratch { admin, schema, db })
}

async fn table_counts(db: &Database) -> Vec<i64> {
    let mut counts = Vec::new();
    for table in [
        "users",
        "teachers",
        "students",
        "courses",
        "course_teachers",
        "enrollments",
    ] {
        counts.push(db.count_rows(table).await.unwrap());
    }
    counts
}

#[tokio::test]
async fn test_seeding_twice_creates_nothing_new() {
    let Some(scratch) = scratch().await else {
        return;
    };
    let db = &scratch.db;
    let seeder = Seeder::new(db.pool().clone());
    let dataset = Dataset::builtin();

    let first = seeder.seed_dataset(&dataset, 2025).await.unwrap();
    assert_eq!(first.users.created, 28);
    assert_eq!(first.teachers.created, 10);
    assert_eq!(first.students.created, 17);
    assert_eq!(first.courses.created, 10);
    assert_eq!(first.assignments.created, 10);
    assert_eq!(first.enrollments.created, 28);
    assert_eq!(table_counts(db).await, vec![28, 10, 17, 10, 10, 28]);

    let second = seeder.seed_dataset(&dataset, 2025).await.unwrap();
    assert_eq!(second.created(), 0);
    assert_eq!(second.users.skipped, 28);
    assert_eq!(second.enrollments.skipped, 28);
    assert_eq!(table_counts(db).await, vec![28, 10, 17, 10, 10, 28]);

    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(admins, 1);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_seeded_rows_reference_existing_parents() {
    let Some(scratch) = scratch().await else {
        return;
    };
    let db = &scratch.db;
    Seeder::new(db.pool().clone())
        .seed_dataset(&Dataset::builtin(), 2025)
        .await
        .unwrap();

    let orphaned_assignments: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM course_teachers ct
        LEFT JOIN courses c ON c.id = ct.course_id
        LEFT JOIN teachers t ON t.id = ct.teacher_id
        WHERE c.id IS NULL OR t.id IS NULL
        "#,
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(orphaned_assignments, 0);

    let orphaned_enrollments: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM enrollments e
        LEFT JOIN students s ON s.id = e.student_id
        LEFT JOIN courses c ON c.id = e.course_id
        WHERE s.id IS NULL OR c.id IS NULL
        "#,
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(orphaned_enrollments, 0);

    let statuses: Vec<String> = sqlx::query_scalar("SELECT DISTINCT status FROM enrollments")
        .fetch_all(db.pool())
        .await
        .unwrap();
    assert_eq!(statuses, vec!["ACTIVE".to_string()]);

    let years: Vec<i32> = sqlx::query_scalar("SELECT DISTINCT academic_year FROM enrollments")
        .fetch_all(db.pool())
        .await
        .unwrap();
    assert_eq!(years, vec![2025]);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_ensure_course_returns_existing_id() {
    let Some(scratch) = scratch().await else {
        return;
    };
    let seeder = Seeder::new(scratch.db.pool().clone());
    let course = Dataset::builtin().courses[0].clone();

    let created = seeder.ensure_course(&course).await.unwrap();
    assert_eq!(created.outcome, Outcome::Created);

    let again = seeder.ensure_course(&course).await.unwrap();
    assert_eq!(again.outcome, Outcome::Skipped);
    assert_eq!(again.id, created.id);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_existing_user_password_is_kept() {
    let Some(scratch) = scratch().await else {
        return;
    };
    let seeder = Seeder::new(scratch.db.pool().clone());
    let mut admin = Dataset::builtin().admin;

    let created = seeder.ensure_user(&admin).await.unwrap();
    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(created.id)
        .fetch_one(scratch.db.pool())
        .await
        .unwrap();

    admin.password = "Changed@456".to_string();
    let again = seeder.ensure_user(&admin).await.unwrap();
    assert_eq!(again, Ensured { id: created.id, outcome: Outcome::Skipped });

    let unchanged: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(created.id)
        .fetch_one(scratch.db.pool())
        .await
        .unwrap();
    assert_eq!(stored, unchanged);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_any_key_policy_matches_on_email_or_user() {
    let Some(scratch) = scratch().await else {
        return;
    };
    let dataset = Dataset::builtin();
    let natural = Seeder::new(scratch.db.pool().clone());
    let any_key = Seeder::new(scratch.db.pool().clone()).with_policy(MatchPolicy::AnyKey);

    let teacher = dataset.teachers[0].clone();
    let account = AccountSeed {
        email: teacher.account_email.clone(),
        password: teacher.password.clone(),
        role: Role::Teacher,
    };
    let user = natural.ensure_user(&account).await.unwrap();
    let original = natural.ensure_teacher(user.id, &teacher).await.unwrap();
    assert!(original.was_created());

    // Same profile email under a different code is the same teacher.
    let mut renamed = teacher.clone();
    renamed.code = "TCH999".to_string();
    let matched = any_key.ensure_teacher(user.id, &renamed).await.unwrap();
    assert_eq!(matched, Ensured { id: original.id, outcome: Outcome::Skipped });

    // The natural key alone does not recognise it, and the unique email rejects the insert.
    assert!(natural.ensure_teacher(user.id, &renamed).await.is_err());
    assert_eq!(scratch.db.count_rows("teachers").await.unwrap(), 1);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_invalid_dataset_writes_nothing() {
    let Some(scratch) = scratch().await else {
        return;
    };
    let mut dataset = Dataset::builtin();
    dataset.enrollments[0].course = 99;

    let result = Seeder::new(scratch.db.pool().clone())
        .seed_dataset(&dataset, 2025)
        .await;
    assert!(matches!(result, Err(SeedError::InvalidDataset(_))));
    assert_eq!(scratch.db.count_rows("users").await.unwrap(), 0);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_seeding_backend_schema_twice() {
    let Some(scratch) = backend_scratch().await else {
        return;
    };
    let db = &scratch.db;

    let keys: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM pg_constraint con
        JOIN pg_class rel ON rel.oid = con.conrelid
        JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
        WHERE rel.relname = 'course_teachers' AND nsp.nspname = current_schema()
          AND con.contype IN ('p', 'u')
        "#,
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(keys, 0);

    let seeder = Seeder::new(db.pool().clone());
    let dataset = Dataset::builtin();

    let first = seeder.seed_dataset(&dataset, 2025).await.unwrap();
    assert_eq!(first.assignments.created, 10);
    assert_eq!(table_counts(db).await, vec![28, 10, 17, 10, 10, 28]);

    let second = seeder.seed_dataset(&dataset, 2025).await.unwrap();
    assert_eq!(second.created(), 0);
    assert_eq!(second.assignments.skipped, 10);
    assert_eq!(table_counts(db).await, vec![28, 10, 17, 10, 10, 28]);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_bundled_migration_over_backend_schema() {
    let Some(scratch) = backend_scratch().await else {
        return;
    };
    let db = &scratch.db;

    db.run_migrations().await.unwrap();
    let report = Seeder::new(db.pool().clone())
        .seed_dataset(&Dataset::builtin(), 2025)
        .await
        .unwrap();
    assert_eq!(report.created(), 28 + 10 + 17 + 10 + 10 + 28);
    assert_eq!(db.count_rows("schedules").await.unwrap(), 0);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_assignment_without_pair_key_is_not_duplicated() {
    let Some(scratch) = backend_scratch().await else {
        return;
    };
    let seeder = Seeder::new(scratch.db.pool().clone());
    let dataset = Dataset::builtin();
    let teacher = dataset.teachers[0].clone();

    let user = seeder
        .ensure_user(&AccountSeed {
            email: teacher.account_email.clone(),
            password: teacher.password.clone(),
            role: Role::Teacher,
        })
        .await
        .unwrap();
    let teacher_id = seeder.ensure_teacher(user.id, &teacher).await.unwrap().id;
    let course_id = seeder.ensure_course(&dataset.courses[0]).await.unwrap().id;

    assert_eq!(
        seeder.ensure_course_teacher(teacher_id, course_id).await.unwrap(),
        Outcome::Created
    );
    assert_eq!(
        seeder.ensure_course_teacher(teacher_id, course_id).await.unwrap(),
        Outcome::Skipped
    );
    assert_eq!(scratch.db.count_rows("course_teachers").await.unwrap(), 1);

    scratch.teardown().await;
}

#[tokio::test]
async fn test_seeded_accounts_use_backend_password_format() {
    let Some(scratch) = backend_scratch().await else {
        return;
    };
    let dataset = Dataset::builtin();
    let seeder = Seeder::new(scratch.db.pool().clone());
    let admin = seeder.ensure_user(&dataset.admin).await.unwrap();

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(admin.id)
        .fetch_one(scratch.db.pool())
        .await
        .unwrap();
    assert!(stored.starts_with("$2a$10$"));
    assert!(bcrypt::verify(&dataset.admin.password, &stored).unwrap());

    scratch.teardown().await;
}
