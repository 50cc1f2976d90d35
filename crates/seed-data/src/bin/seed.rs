//! Writes the sample dataset. Safe to run repeatedly.
//!
//! Run with:
//! ```
//! cargo run -p seed-data --bin seed -- --database-url postgres://...
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_or_exit};
use records::logging::init_logging;
use seed_data::prelude::*;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Seed the academic-records database with sample data")]
struct Args {
    #[command(flatten)]
    db: DatabaseArgs,

    /// Show what would be created without connecting
    #[arg(long)]
    dry_run: bool,

    /// Load the dataset from a JSON file instead of the built-in one
    #[arg(long, value_name = "PATH")]
    dataset: Option<PathBuf>,

    /// Treat a teacher or student as existing when any of its unique columns matches
    #[arg(long)]
    match_any_key: bool,

    /// Academic year for new enrollments (defaults to the current year)
    #[arg(long)]
    academic_year: Option<i32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Args = parse_or_exit();

    let config = args.db.config()?;
    let dataset = match &args.dataset {
        Some(path) => Dataset::from_json_file(path)
            .with_context(|| format!("Failed to load dataset from {}", path.display()))?,
        None => Dataset::builtin(),
    };
    dataset.validate()?;
    let academic_year = args.academic_year.unwrap_or_else(current_academic_year);

    if args.dry_run {
        info!("DRY RUN MODE - no changes will be made");
        println!("Would connect to: {}", config.params());
        println!("Would create:");
        println!("  - 1 admin user ({})", dataset.admin.email);
        println!("  - {} teachers", dataset.teachers.len());
        println!("  - {} students", dataset.students.len());
        println!("  - {} courses", dataset.courses.len());
        println!("  - {} teacher assignments", dataset.assignments.len());
        println!(
            "  - {} enrollments for {academic_year}",
            dataset.enrollments.len()
        );
        return Ok(());
    }

    let policy = if args.match_any_key {
        MatchPolicy::AnyKey
    } else {
        MatchPolicy::NaturalKey
    };

    let db = Database::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.params()))?;

    let result = Seeder::new(db.pool().clone())
        .with_policy(policy)
        .seed_dataset(&dataset, academic_year)
        .await;
    db.close().await;

    let report = result.context("Seeding failed")?;
    print!("{report}");
    Ok(())
}
