//! Database integration for seeding the sample dataset.
//!
//! The [`Seeder`] creates each entity only when its natural key is not
//! already present and reports what it created and what it skipped.

mod seeder;

pub use seeder::{Ensured, MatchPolicy, Outcome, SeedError, SeedReport, Seeder, Tally};
