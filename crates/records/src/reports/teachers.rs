use std::fmt;

use sqlx::FromRow;

use crate::database::Database;
use crate::errors::AppError;
use crate::models::Role;

#[derive(Debug, Clone, FromRow)]
pub struct TeacherRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub role: String,
}

/// The user looked up by email and the id of its teacher record, if any.
#[derive(Debug, Clone)]
pub struct EmailLookup {
    pub email: String,
    pub user: Option<UserRow>,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TeacherReport {
    pub teachers: Vec<TeacherRow>,
    pub teacher_users: Vec<UserRow>,
    pub lookup: Option<EmailLookup>,
}

pub async fn user_by_email(db: &Database, email: &str) -> Result<Option<UserRow>, AppError> {
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, email::text AS email, role::text AS role FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(db.pool())
    .await?;
    Ok(user)
}

pub async fn collect(db: &Database, email: Option<&str>) -> Result<TeacherReport, AppError> {
    let teachers = sqlx::query_as::<_, TeacherRow>(
        r#"
        SELECT id, first_name::text AS first_name, last_name::text AS last_name, user_id
        FROM teachers
        ORDER BY id
        "#,
    )
    .fetch_all(db.pool())
    .await?;

    let teacher_users = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, email::text AS email, role::text AS role
        FROM users
        WHERE role = $1
        ORDER BY id
        "#,
    )
    .bind(Role::Teacher.as_str())
    .fetch_all(db.pool())
    .await?;

    let lookup = match email {
        Some(email) => {
            let user = user_by_email(db, email).await?;
            let teacher_id = match &user {
                Some(u) => {
                    sqlx::query_scalar::<_, i64>("SELECT id FROM teachers WHERE user_id = $1")
                        .bind(u.id)
                        .fetch_optional(db.pool())
                        .await?
                }
                None => None,
            };
            Some(EmailLookup {
                email: email.to_string(),
                user,
                teacher_id,
            })
        }
        None => None,
    };

    Ok(TeacherReport {
        teachers,
        teacher_users,
        lookup,
    })
}

impl fmt::Display for TeacherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== TEACHERS ===")?;
        if self.teachers.is_empty() {
            writeln!(f, "No teachers found!")?;
        }
        for t in &self.teachers {
            writeln!(
                f,
                "ID: {}, Name: {} {}, User ID: {}",
                t.id, t.first_name, t.last_name, t.user_id
            )?;
        }

        writeln!(f)?;
        writeln!(f, "=== TEACHER USERS ===")?;
        if self.teacher_users.is_empty() {
            writeln!(f, "No teacher users found!")?;
        }
        for u in &self.teacher_users {
            writeln!(f, "User ID: {}, Email: {}, Role: {}", u.id, u.email, u.role)?;
        }

        if let Some(lookup) = &self.lookup {
            writeln!(f)?;
            writeln!(f, "=== USER {} ===", lookup.email)?;
            match &lookup.user {
                Some(u) => {
                    writeln!(f, "User ID: {}, Email: {}, Role: {}", u.id, u.email, u.role)?;
                    match lookup.teacher_id {
                        Some(id) => writeln!(f, "Teacher record ID: {id}")?,
                        None => writeln!(f, "No teacher record found for this user!")?,
                    }
                }
                None => writeln!(f, "{} user not found!", lookup.email)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = TeacherReport {
            teachers: Vec::new(),
            teacher_users: Vec::new(),
            lookup: None,
        };
        let rendered = report.to_string();
        assert!(rendered.contains("No teachers found!"));
        assert!(rendered.contains("No teacher users found!"));
        assert!(!rendered.contains("=== USER"));
    }

    #[test]
    fn test_user_without_teacher_record() {
        let report = TeacherReport {
            teachers: vec![TeacherRow {
                id: 1,
                first_name: "Thomas".to_string(),
                last_name: "Anderson".to_string(),
                user_id: 2,
            }],
            teacher_users: vec![UserRow {
                id: 2,
                email: "thomas.anderson@eadms.com".to_string(),
                role: "TEACHER".to_string(),
            }],
            lookup: Some(EmailLookup {
                email: "john.smith@eadms.eu".to_string(),
                user: Some(UserRow {
                    id: 40,
                    email: "john.smith@eadms.eu".to_string(),
                    role: "TEACHER".to_string(),
                }),
                teacher_id: None,
            }),
        };
        let rendered = report.to_string();
        assert!(rendered.contains("ID: 1, Name: Thomas Anderson, User ID: 2"));
        assert!(rendered.contains("No teacher record found for this user!"));
    }

    #[test]
    fn test_unknown_email() {
        let report = TeacherReport {
            teachers: Vec::new(),
            teacher_users: Vec::new(),
            lookup: Some(EmailLookup {
                email: "nobody@eadms.com".to_string(),
                user: None,
                teacher_id: None,
            }),
        };
        assert!(report.to_string().contains("nobody@eadms.com user not found!"));
    }
}
