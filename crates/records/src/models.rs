use serde::{Deserialize, Serialize};

/// Account role stored in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }
}

/// Student gender stored in `students.gender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

/// Enrollment state stored in `enrollments.status`. Seeded enrollments are always active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
}

impl EnrollmentStatus {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "ACTIVE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names_match_db_strings() {
        for role in [Role::Admin, Role::Teacher, Role::Student] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        for gender in [Gender::Male, Gender::Female, Gender::Other] {
            let json = serde_json::to_string(&gender).unwrap();
            assert_eq!(json, format!("\"{}\"", gender.as_str()));
        }
    }

    #[test]
    fn test_new_enrollments_are_active() {
        assert_eq!(EnrollmentStatus::default().as_str(), "ACTIVE");
        let parsed: EnrollmentStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(parsed, EnrollmentStatus::Active);
    }
}
