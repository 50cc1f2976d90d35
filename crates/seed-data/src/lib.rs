//! Sample data for the academic-records database.
//!
//! This crate carries the built-in sample dataset (one administrator, ten
//! teachers, seventeen students, ten courses with their teacher assignments
//! and enrollments) and a [`Seeder`](db::Seeder) that writes it idempotently:
//! running it twice leaves the database exactly as running it once.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seed_data::prelude::*;
//!
//! let database_url = std::env::var("DATABASE_URL")?;
//! let db = Database::connect(&DatabaseConfig::from_url(&database_url)?).await?;
//! let report = Seeder::new(db.pool().clone())
//!     .seed_dataset(&Dataset::builtin(), current_academic_year())
//!     .await?;
//! println!("{report}");
//! ```

pub mod dataset;
pub mod db;

// Re-export the record types shared with the diagnostic tools
pub use records::models::{EnrollmentStatus, Gender, Role};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::dataset::{
        AccountSeed, AssignmentSeed, CourseSeed, Dataset, EnrollmentSeed, StudentSeed, TeacherSeed,
        current_academic_year,
    };
    pub use crate::db::{Ensured, MatchPolicy, Outcome, SeedError, SeedReport, Seeder, Tally};
    pub use crate::{EnrollmentStatus, Gender, Role};
    pub use records::{Database, DatabaseConfig};
}
