//! Idempotent lookup-or-create for every seeded entity.

use std::fmt;

use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{debug, info};

use records::auth::hash_password;
use records::errors::AppError;

use crate::dataset::{AccountSeed, CourseSeed, Dataset, StudentSeed, TeacherSeed};
use crate::{EnrollmentStatus, Role};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Records(#[from] AppError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid dataset file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("{0} conflicts with an existing row on another unique column")]
    Conflict(String),
}

/// How an existing row is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// One natural key per entity, written with `ON CONFLICT (key) DO NOTHING`.
    /// Teacher assignments are matched by an explicit lookup on the pair.
    #[default]
    NaturalKey,
    /// A teacher or student matches when ANY of its unique columns matches.
    ///
    /// A partial overlap (same email, different code) is treated as the same
    /// row. Kept for databases seeded by older tooling.
    AnyKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Skipped,
}

/// Id of an ensured row and whether this call created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ensured {
    pub id: i64,
    pub outcome: Outcome,
}

impl Ensured {
    fn created(id: i64) -> Self {
        Self {
            id,
            outcome: Outcome::Created,
        }
    }

    fn skipped(id: i64) -> Self {
        Self {
            id,
            outcome: Outcome::Skipped,
        }
    }

    pub fn was_created(&self) -> bool {
        self.outcome == Outcome::Created
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub created: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.skipped
    }
}

/// Per-entity tallies of one seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: Tally,
    pub teachers: Tally,
    pub students: Tally,
    pub courses: Tally,
    pub assignments: Tally,
    pub enrollments: Tally,
}

impl SeedReport {
    pub fn created(&self) -> usize {
        self.tallies().iter().map(|(_, t)| t.created).sum()
    }

    fn tallies(&self) -> [(&'static str, Tally); 6] {
        [
            ("Users", self.users),
            ("Teachers", self.teachers),
            ("Students", self.students),
            ("Courses", self.courses),
            ("Assignments", self.assignments),
            ("Enrollments", self.enrollments),
        ]
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:>8} {:>8}", "", "created", "skipped")?;
        for (name, tally) in self.tallies() {
            writeln!(f, "{name:<12} {:>8} {:>8}", tally.created, tally.skipped)?;
        }
        Ok(())
    }
}

/// Database seeder writing the sample dataset.
pub struct Seeder {
    pool: PgPool,
    policy: MatchPolicy,
}

impl Seeder {
    /// Creates a seeder using the natural-key policy.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Ensures a user with `account.email` exists.
    ///
    /// The password is only hashed when the user is actually created.
    pub async fn ensure_user(&self, account: &AccountSeed) -> Result<Ensured, SeedError> {
        let mut tx = self.pool.begin().await?;

        if let Some(id) = user_id_by_email(&mut tx, &account.email).await? {
            tx.commit().await?;
            info!("User {} already exists, skipping", account.email);
            return Ok(Ensured::skipped(id));
        }

        let password = hash_password(&account.password)?;
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password, role, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, TRUE, NOW(), NOW())
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&account.email)
        .bind(&password)
        .bind(account.role.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let ensured = match inserted {
            Some(id) => Ensured::created(id),
            None => match user_id_by_email(&mut tx, &account.email).await? {
                Some(id) => Ensured::skipped(id),
                None => return Err(SeedError::Conflict(format!("user {}", account.email))),
            },
        };
        tx.commit().await?;

        if ensured.was_created() {
            info!("Created user {} (ID: {})", account.email, ensured.id);
        }
        Ok(ensured)
    }

    /// Ensures the teacher profile owned by `user_id` exists.
    pub async fn ensure_teacher(
        &self,
        user_id: i64,
        teacher: &TeacherSeed,
    ) -> Result<Ensured, SeedError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = match self.policy {
            MatchPolicy::NaturalKey => {
                sqlx::query_scalar("SELECT id FROM teachers WHERE teacher_id = $1")
                    .bind(&teacher.code)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            MatchPolicy::AnyKey => {
                sqlx::query_scalar(
                    "SELECT id FROM teachers WHERE user_id = $1 OR teacher_id = $2 OR email = $3 LIMIT 1",
                )
                .bind(user_id)
                .bind(&teacher.code)
                .bind(&teacher.email)
                .fetch_optional(&mut *tx)
                .await?
            }
        };
        if let Some(id) = existing {
            tx.commit().await?;
            info!("Teacher {} already exists, skipping", teacher.code);
            return Ok(Ensured::skipped(id));
        }

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO teachers (user_id, first_name, last_name, teacher_id, department, email,
                                  contact_number, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            ON CONFLICT (teacher_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&teacher.first_name)
        .bind(&teacher.last_name)
        .bind(&teacher.code)
        .bind(&teacher.department)
        .bind(&teacher.email)
        .bind(&teacher.contact_number)
        .fetch_optional(&mut *tx)
        .await?;

        let ensured = match inserted {
            Some(id) => Ensured::created(id),
            None => {
                let id: i64 = sqlx::query_scalar("SELECT id FROM teachers WHERE teacher_id = $1")
                    .bind(&teacher.code)
                    .fetch_one(&mut *tx)
                    .await?;
                Ensured::skipped(id)
            }
        };
        tx.commit().await?;

        if ensured.was_created() {
            info!(
                "Created teacher {} {} - {} (ID: {})",
                teacher.first_name, teacher.last_name, teacher.code, ensured.id
            );
        }
        Ok(ensured)
    }

    /// Ensures the student profile owned by `user_id` exists.
    pub async fn ensure_student(
        &self,
        user_id: i64,
        student: &StudentSeed,
    ) -> Result<Ensured, SeedError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = match self.policy {
            MatchPolicy::NaturalKey => {
                sqlx::query_scalar("SELECT id FROM students WHERE student_id = $1")
                    .bind(&student.code)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            MatchPolicy::AnyKey => {
                sqlx::query_scalar(
                    "SELECT id FROM students WHERE user_id = $1 OR student_id = $2 LIMIT 1",
                )
                .bind(user_id)
                .bind(&student.code)
                .fetch_optional(&mut *tx)
                .await?
            }
        };
        if let Some(id) = existing {
            tx.commit().await?;
            info!("Student {} already exists, skipping", student.code);
            return Ok(Ensured::skipped(id));
        }

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO students (user_id, first_name, last_name, student_id, class_name, gender,
                                  contact_number, date_of_birth, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (student_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.code)
        .bind(&student.class_name)
        .bind(student.gender.as_str())
        .bind(&student.contact_number)
        .bind(student.date_of_birth)
        .fetch_optional(&mut *tx)
        .await?;

        let ensured = match inserted {
            Some(id) => Ensured::created(id),
            None => {
                let id: i64 = sqlx::query_scalar("SELECT id FROM students WHERE student_id = $1")
                    .bind(&student.code)
                    .fetch_one(&mut *tx)
                    .await?;
                Ensured::skipped(id)
            }
        };
        tx.commit().await?;

        if ensured.was_created() {
            info!(
                "Created student {} {} - {} (ID: {})",
                student.first_name, student.last_name, student.code, ensured.id
            );
        }
        Ok(ensured)
    }

    /// Ensures a course with `course.code` exists.
    pub async fn ensure_course(&self, course: &CourseSeed) -> Result<Ensured, SeedError> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO courses (course_code, course_name, semester, credits, description,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (course_code) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&course.code)
        .bind(&course.name)
        .bind(course.semester)
        .bind(course.credits)
        .bind(&course.description)
        .fetch_optional(&mut *tx)
        .await?;

        let ensured = match inserted {
            Some(id) => Ensured::created(id),
            None => {
                let id: i64 = sqlx::query_scalar("SELECT id FROM courses WHERE course_code = $1")
                    .bind(&course.code)
                    .fetch_one(&mut *tx)
                    .await?;
                Ensured::skipped(id)
            }
        };
        tx.commit().await?;

        match ensured.outcome {
            Outcome::Created => info!(
                "Created course {} - {} (ID: {})",
                course.code, course.name, ensured.id
            ),
            Outcome::Skipped => info!("Course {} already exists, skipping", course.code),
        }
        Ok(ensured)
    }

    /// Ensures `teacher_id` is assigned to `course_id`.
    ///
    /// The join table may carry no key on the pair, so the existing row is
    /// looked up instead of relying on `ON CONFLICT`.
    pub async fn ensure_course_teacher(
        &self,
        teacher_id: i64,
        course_id: i64,
    ) -> Result<Outcome, SeedError> {
        let mut tx = self.pool.begin().await?;

        let assigned: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM course_teachers WHERE course_id = $1 AND teacher_id = $2)",
        )
        .bind(course_id)
        .bind(teacher_id)
        .fetch_one(&mut *tx)
        .await?;

        if assigned {
            tx.commit().await?;
            debug!("Teacher {teacher_id} already assigned to course {course_id}");
            return Ok(Outcome::Skipped);
        }

        sqlx::query("INSERT INTO course_teachers (course_id, teacher_id) VALUES ($1, $2)")
            .bind(course_id)
            .bind(teacher_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Assigned teacher {teacher_id} to course {course_id}");
        Ok(Outcome::Created)
    }

    /// Ensures the enrollment of `student_id` in `course_id` for one term.
    ///
    /// New enrollments are `ACTIVE` and dated today.
    pub async fn ensure_enrollment(
        &self,
        student_id: i64,
        course_id: i64,
        semester: i32,
        academic_year: i32,
    ) -> Result<Ensured, SeedError> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO enrollments (student_id, course_id, semester, academic_year, status,
                                     enrollment_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, CURRENT_DATE, NOW(), NOW())
            ON CONFLICT (student_id, course_id, semester, academic_year) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(semester)
        .bind(academic_year)
        .bind(EnrollmentStatus::Active.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let ensured = match inserted {
            Some(id) => Ensured::created(id),
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    SELECT id FROM enrollments
                    WHERE student_id = $1 AND course_id = $2 AND semester = $3 AND academic_year = $4
                    "#,
                )
                .bind(student_id)
                .bind(course_id)
                .bind(semester)
                .bind(academic_year)
                .fetch_one(&mut *tx)
                .await?;
                Ensured::skipped(id)
            }
        };
        tx.commit().await?;

        match ensured.outcome {
            Outcome::Created => info!(
                "Created enrollment: student {student_id} -> course {course_id} (S{semester}, {academic_year}) (ID: {})",
                ensured.id
            ),
            Outcome::Skipped => debug!(
                "Enrollment for student {student_id} in course {course_id} (S{semester}, {academic_year}) already exists"
            ),
        }
        Ok(ensured)
    }

    /// Writes the whole dataset in dependency order.
    ///
    /// Users come before their profiles, courses before assignments, and
    /// students and courses before enrollments. Indices are checked up front,
    /// so a bad dataset fails before anything is written.
    pub async fn seed_dataset(
        &self,
        dataset: &Dataset,
        academic_year: i32,
    ) -> Result<SeedReport, SeedError> {
        dataset.validate()?;
        let mut report = SeedReport::default();

        info!("Creating admin user...");
        let admin = self.ensure_user(&dataset.admin).await?;
        report.users.record(admin.outcome);

        info!("Seeding {} teachers...", dataset.teachers.len());
        let mut teacher_ids = Vec::with_capacity(dataset.teachers.len());
        for teacher in &dataset.teachers {
            let account = AccountSeed {
                email: teacher.account_email.clone(),
                password: teacher.password.clone(),
                role: Role::Teacher,
            };
            let user = self.ensure_user(&account).await?;
            report.users.record(user.outcome);

            let profile = self.ensure_teacher(user.id, teacher).await?;
            report.teachers.record(profile.outcome);
            teacher_ids.push(profile.id);
        }

        info!("Seeding {} students...", dataset.students.len());
        let mut student_ids = Vec::with_capacity(dataset.students.len());
        for student in &dataset.students {
            let account = AccountSeed {
                email: student.email.clone(),
                password: student.password.clone(),
                role: Role::Student,
            };
            let user = self.ensure_user(&account).await?;
            report.users.record(user.outcome);

            let profile = self.ensure_student(user.id, student).await?;
            report.students.record(profile.outcome);
            student_ids.push(profile.id);
        }

        info!("Seeding {} courses...", dataset.courses.len());
        let mut course_ids = Vec::with_capacity(dataset.courses.len());
        for course in &dataset.courses {
            let ensured = self.ensure_course(course).await?;
            report.courses.record(ensured.outcome);
            course_ids.push(ensured.id);
        }

        info!("Assigning teachers to {} courses...", dataset.assignments.len());
        for a in &dataset.assignments {
            let outcome = self
                .ensure_course_teacher(teacher_ids[a.teacher], course_ids[a.course])
                .await?;
            report.assignments.record(outcome);
        }

        info!(
            "Seeding {} enrollments for {academic_year}...",
            dataset.enrollments.len()
        );
        for e in &dataset.enrollments {
            let ensured = self
                .ensure_enrollment(
                    student_ids[e.student],
                    course_ids[e.course],
                    e.semester,
                    academic_year,
                )
                .await?;
            report.enrollments.record(ensured.outcome);
        }

        info!(
            "Seed completed: {} rows created, {} already present",
            report.created(),
            report.tallies().iter().map(|(_, t)| t.skipped).sum::<usize>()
        );
        Ok(report)
    }
}

async fn user_id_by_email(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<Option<i64>, SeedError> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_records_outcomes() {
        let mut tally = Tally::default();
        tally.record(Outcome::Created);
        tally.record(Outcome::Skipped);
        tally.record(Outcome::Skipped);
        assert_eq!(tally.created, 1);
        assert_eq!(tally.skipped, 2);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_report_totals() {
        let report = SeedReport {
            users: Tally {
                created: 28,
                skipped: 0,
            },
            enrollments: Tally {
                created: 0,
                skipped: 28,
            },
            ..Default::default()
        };
        assert_eq!(report.created(), 28);

        let rendered = report.to_string();
        assert!(rendered.contains("created"));
        assert!(rendered.lines().any(|l| l.starts_with("Users") && l.contains("28")));
    }

    #[test]
    fn test_default_policy_is_natural_key() {
        assert_eq!(MatchPolicy::default(), MatchPolicy::NaturalKey);
    }

    #[test]
    fn test_ensured_flags() {
        assert!(Ensured::created(1).was_created());
        assert!(!Ensured::skipped(1).was_created());
    }
}
