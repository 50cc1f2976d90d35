//! The sample dataset written by the seeder.
//!
//! Teacher assignments and enrollments refer to teachers, students and courses
//! by their position in the dataset, since database ids only exist once the
//! rows are written.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::db::SeedError;
use crate::{Gender, Role};

/// A login account without a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSeed {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSeed {
    /// Login email of the owning user.
    pub account_email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Staff code, e.g. `TCH101`.
    pub code: String,
    pub department: String,
    /// Profile email, which may differ from the login email.
    pub email: String,
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSeed {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Student code, e.g. `EU001`.
    pub code: String,
    pub class_name: String,
    pub gender: Gender,
    pub contact_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSeed {
    pub code: String,
    pub name: String,
    pub semester: i32,
    pub credits: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSeed {
    /// Index into [`Dataset::teachers`].
    pub teacher: usize,
    /// Index into [`Dataset::courses`].
    pub course: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentSeed {
    /// Index into [`Dataset::students`].
    pub student: usize,
    /// Index into [`Dataset::courses`].
    pub course: usize,
    pub semester: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub admin: AccountSeed,
    pub teachers: Vec<TeacherSeed>,
    pub students: Vec<StudentSeed>,
    pub courses: Vec<CourseSeed>,
    pub assignments: Vec<AssignmentSeed>,
    pub enrollments: Vec<EnrollmentSeed>,
}

/// Academic year new enrollments are filed under.
pub fn current_academic_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

const TEACHER_PASSWORD: &str = "Teacher@123";
const STUDENT_PASSWORD: &str = "Student@123";

fn teacher(
    account_email: &str,
    first_name: &str,
    last_name: &str,
    code: &str,
    department: &str,
    email: &str,
    contact_number: &str,
) -> TeacherSeed {
    TeacherSeed {
        account_email: account_email.to_string(),
        password: TEACHER_PASSWORD.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        code: code.to_string(),
        department: department.to_string(),
        email: email.to_string(),
        contact_number: Some(contact_number.to_string()),
    }
}

fn student(
    email: &str,
    first_name: &str,
    last_name: &str,
    code: &str,
    class_name: &str,
    gender: Gender,
    contact_number: &str,
) -> StudentSeed {
    StudentSeed {
        email: email.to_string(),
        password: STUDENT_PASSWORD.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        code: code.to_string(),
        class_name: class_name.to_string(),
        gender,
        contact_number: Some(contact_number.to_string()),
        date_of_birth: None,
    }
}

fn course(code: &str, name: &str, semester: i32, credits: i32, description: &str) -> CourseSeed {
    CourseSeed {
        code: code.to_string(),
        name: name.to_string(),
        semester,
        credits,
        description: Some(description.to_string()),
    }
}

impl Dataset {
    /// The built-in sample university.
    pub fn builtin() -> Self {
        use crate::Gender::{Female, Male};

        let teachers = vec![
            teacher("luca.bernardi@eadms.eu", "Luca", "Bernardi", "TCH101", "Computer Engineering", "luca.bernardi@eadms.eu", "+39-347-552-9812"),
            teacher("anna.kowalska@eadms.eu", "Anna", "Kowalska", "TCH102", "Applied Mathematics", "anna.kowalska@eadms.eu", "+48-602-445-198"),
            teacher("marc.dubois@eadms.eu", "Marc", "Dubois", "TCH103", "Data Science", "marc.dubois@eadms.eu", "+33-651-992-184"),
            teacher("sofia.papadopoulos@eadms.eu", "Sofia", "Papadopoulos", "TCH104", "Physics Engineering", "sofia.p@eadms.eu", "+30-694-881-220"),
            teacher("johan.lindstrom@eadms.eu", "Johan", "Lindström", "TCH105", "Embedded Systems", "johan.l@eadms.eu", "+46-708-112-909"),
            teacher("carlos.mendez@eadms.eu", "Carlos", "Méndez", "TCH106", "Robotics", "carlos.m@eadms.eu", "+34-612-883-771"),
            teacher("fatima.elhassan@eadms.eu", "Fatima", "El Hassan", "TCH107", "Environmental Engineering", "fatima.e@eadms.eu", "+212-661-908-332"),
            teacher("nikola.petrovic@eadms.eu", "Nikola", "Petrović", "TCH108", "Control Systems", "nikola.p@eadms.eu", "+381-64-551-3302"),
            teacher("wei.zhang@eadms.eu", "Wei", "Zhang", "TCH109", "AI & Machine Learning", "wei.z@eadms.eu", "+86-138-7712-9921"),
            teacher("amina.khan@eadms.eu", "Amina", "Khan", "TCH110", "Cyber-Physical Systems", "amina.k@eadms.eu", "+44-7700-900812"),
        ];

        let students = vec![
            student("mateo.rossi@student.eu", "Mateo", "Rossi", "EU001", "BSc-AS-1", Male, "+39-320-771-8812"),
            student("elena.garcia@student.eu", "Elena", "García", "EU002", "BSc-AS-1", Female, "+34-611-229-880"),
            student("noah.muller@student.eu", "Noah", "Müller", "EU003", "BSc-AS-1", Male, "+49-176-445-8819"),
            student("anna.nowak@student.eu", "Anna", "Nowak", "EU004", "BSc-AS-2", Female, "+48-789-440-998"),
            student("louis.moreau@student.eu", "Louis", "Moreau", "EU005", "BSc-AS-2", Male, "+33-689-774-221"),
            student("arjun.patel@student.eu", "Arjun", "Patel", "AS006", "BSc-AS-1", Male, "+91-9823345567"),
            student("mei.lin@student.eu", "Mei", "Lin", "AS007", "BSc-AS-2", Female, "+86-139-8812-7744"),
            student("hiro.tanaka@student.eu", "Hiro", "Tanaka", "AS008", "BSc-AS-3", Male, "+81-90-5544-8821"),
            student("siti.aminah@student.eu", "Siti", "Aminah", "AS009", "BSc-AS-1", Female, "+60-12-778-3321"),
            student("minh.nguyen@student.eu", "Minh", "Nguyen", "AS010", "BSc-AS-3", Male, "+84-91-223-8821"),
            student("omar.hassan@student.eu", "Omar", "Hassan", "ME011", "BSc-AS-2", Male, "+20-109-882-991"),
            student("layla.nasser@student.eu", "Layla", "Nasser", "ME012", "BSc-AS-1", Female, "+971-50-881-9921"),
            student("youssef.benali@student.eu", "Youssef", "Ben Ali", "AF013", "BSc-AS-3", Male, "+216-22-881-009"),
            student("amina.diop@student.eu", "Amina", "Diop", "AF014", "BSc-AS-2", Female, "+221-77-889-221"),
            student("lucas.silva@student.eu", "Lucas", "Silva", "AM015", "BSc-AS-1", Male, "+55-11-99881-221"),
            student("camila.rojas@student.eu", "Camila", "Rojas", "AM016", "BSc-AS-2", Female, "+56-9-8811-229"),
            student("daniel.martinez@student.eu", "Daniel", "Martínez", "AM017", "BSc-AS-3", Male, "+52-55-8899-2231"),
        ];

        let courses = vec![
            course("AS101", "Applied Mathematics for Engineers", 1, 6, "Mathematical modeling and numerical methods"),
            course("AS102", "Programming for Applied Sciences", 1, 6, "Python and C for scientific computing"),
            course("AS201", "Data Science & Statistical Analysis", 2, 6, "Data-driven decision making"),
            course("AS202", "Embedded Systems Engineering", 2, 6, "Microcontrollers and real-time systems"),
            course("AS301", "Artificial Intelligence Systems", 3, 6, "Machine learning and intelligent systems"),
            course("AS302", "Robotics & Automation", 3, 6, "Industrial robotics and control"),
            course("AS303", "Cyber-Physical Systems", 3, 6, "Integration of computation and physical processes"),
            course("AS304", "Renewable Energy Technologies", 3, 6, "Solar, wind, and sustainable systems"),
            course("AS401", "Applied Research Project", 4, 12, "Capstone industry-oriented project"),
            course("AS402", "Engineering Ethics & EU Regulations", 4, 3, "Professional ethics and EU standards"),
        ];

        // (teacher, course)
        let assignments = [
            (1, 0),
            (0, 1),
            (2, 2),
            (4, 3),
            (8, 4),
            (5, 5),
            (9, 6),
            (6, 7),
            (3, 8),
            (7, 9),
        ]
        .into_iter()
        .map(|(teacher, course)| AssignmentSeed { teacher, course })
        .collect();

        // (student, course, semester)
        let enrollments = [
            // Year 1, semester 1 courses
            (0, 0, 1),
            (0, 1, 1),
            (1, 0, 1),
            (1, 1, 1),
            (2, 0, 1),
            (2, 1, 1),
            (5, 0, 1),
            (5, 1, 1),
            (8, 0, 1),
            (8, 1, 1),
            (11, 0, 1),
            (14, 1, 1),
            // Year 2, semester 2 courses
            (3, 2, 2),
            (3, 3, 2),
            (4, 2, 2),
            (4, 3, 2),
            (6, 2, 2),
            (10, 3, 2),
            (13, 2, 2),
            (15, 3, 2),
            // Year 3, semester 3 courses
            (7, 4, 3),
            (7, 5, 3),
            (7, 6, 3),
            (9, 4, 3),
            (9, 7, 3),
            (12, 5, 3),
            (12, 6, 3),
            (16, 7, 3),
        ]
        .into_iter()
        .map(|(student, course, semester)| EnrollmentSeed {
            student,
            course,
            semester,
        })
        .collect();

        Self {
            admin: AccountSeed {
                email: "admin@eadms.com".to_string(),
                password: "Admin@123".to_string(),
                role: Role::Admin,
            },
            teachers,
            students,
            courses,
            assignments,
            enrollments,
        }
    }

    /// Reads and validates a dataset from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&raw)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Writes the dataset as pretty-printed JSON.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), SeedError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Checks that every index resolves and no natural key repeats.
    pub fn validate(&self) -> Result<(), SeedError> {
        for (i, a) in self.assignments.iter().enumerate() {
            if a.teacher >= self.teachers.len() {
                return Err(invalid(format!(
                    "assignment {i} refers to teacher {} of {}",
                    a.teacher,
                    self.teachers.len()
                )));
            }
            if a.course >= self.courses.len() {
                return Err(invalid(format!(
                    "assignment {i} refers to course {} of {}",
                    a.course,
                    self.courses.len()
                )));
            }
        }

        for (i, e) in self.enrollments.iter().enumerate() {
            if e.student >= self.students.len() {
                return Err(invalid(format!(
                    "enrollment {i} refers to student {} of {}",
                    e.student,
                    self.students.len()
                )));
            }
            if e.course >= self.courses.len() {
                return Err(invalid(format!(
                    "enrollment {i} refers to course {} of {}",
                    e.course,
                    self.courses.len()
                )));
            }
        }

        let emails = std::iter::once(self.admin.email.as_str())
            .chain(self.teachers.iter().map(|t| t.account_email.as_str()))
            .chain(self.students.iter().map(|s| s.email.as_str()));
        unique("account email", emails)?;
        unique("teacher code", self.teachers.iter().map(|t| t.code.as_str()))?;
        unique("teacher email", self.teachers.iter().map(|t| t.email.as_str()))?;
        unique("student code", self.students.iter().map(|s| s.code.as_str()))?;
        unique("course code", self.courses.iter().map(|c| c.code.as_str()))?;

        Ok(())
    }
}

fn invalid(msg: String) -> SeedError {
    SeedError::InvalidDataset(msg)
}

fn unique<'a>(what: &str, keys: impl Iterator<Item = &'a str>) -> Result<(), SeedError> {
    let mut seen = HashSet::new();
    for key in keys {
        if key.trim().is_empty() {
            return Err(invalid(format!("empty {what}")));
        }
        if !seen.insert(key) {
            return Err(invalid(format!("duplicate {what} '{key}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_counts() {
        let dataset = Dataset::builtin();
        assert_eq!(dataset.admin.role, Role::Admin);
        assert_eq!(dataset.teachers.len(), 10);
        assert_eq!(dataset.students.len(), 17);
        assert_eq!(dataset.courses.len(), 10);
        assert_eq!(dataset.assignments.len(), 10);
        assert_eq!(dataset.enrollments.len(), 28);
    }

    #[test]
    fn test_builtin_is_valid() {
        Dataset::builtin().validate().unwrap();
    }

    #[test]
    fn test_builtin_codes() {
        let dataset = Dataset::builtin();
        assert_eq!(dataset.teachers[0].code, "TCH101");
        assert_eq!(dataset.teachers[9].code, "TCH110");
        assert_eq!(dataset.students[0].code, "EU001");
        assert_eq!(dataset.students[16].code, "AM017");
        assert_eq!(dataset.courses[0].code, "AS101");
        assert_eq!(dataset.courses[9].code, "AS402");
    }

    #[test]
    fn test_every_course_has_a_teacher() {
        let dataset = Dataset::builtin();
        let mut taught: Vec<_> = dataset.assignments.iter().map(|a| a.course).collect();
        taught.sort_unstable();
        assert_eq!(taught, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_enrollments_are_unique() {
        let dataset = Dataset::builtin();
        let keys: HashSet<_> = dataset
            .enrollments
            .iter()
            .map(|e| (e.student, e.course, e.semester))
            .collect();
        assert_eq!(keys.len(), dataset.enrollments.len());
    }

    #[test]
    fn test_rejects_dangling_index() {
        let mut dataset = Dataset::builtin();
        dataset.enrollments.push(EnrollmentSeed {
            student: 17,
            course: 0,
            semester: 1,
        });
        let err = dataset.validate().unwrap_err();
        assert!(err.to_string().contains("enrollment 28 refers to student 17 of 17"));
    }

    #[test]
    fn test_rejects_duplicate_course_code() {
        let mut dataset = Dataset::builtin();
        dataset.courses[1].code = "AS101".to_string();
        let err = dataset.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate course code 'AS101'"));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");

        let dataset = Dataset::builtin();
        dataset.to_json_file(&path).unwrap();
        let loaded = Dataset::from_json_file(&path).unwrap();
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_json_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");

        let mut dataset = Dataset::builtin();
        dataset.assignments[0].teacher = 99;
        dataset.to_json_file(&path).unwrap();

        assert!(matches!(
            Dataset::from_json_file(&path),
            Err(SeedError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Dataset::from_json_file(dir.path().join("nope.json")),
            Err(SeedError::Io(_))
        ));
    }
}
