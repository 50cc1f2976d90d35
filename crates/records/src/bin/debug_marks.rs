//! Marks join checks.
//!
//! Without an argument the first ten marks are checked against their student
//! and course; with a course id, that course's marks are listed per student.

use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_entity_id, parse_or_exit};
use records::logging::init_logging;
use records::reports::marks;

#[derive(Parser, Debug)]
#[command(version, about = "Check marks against their students and courses")]
struct Args {
    /// Show the marks of this course
    #[arg(value_parser = parse_entity_id)]
    course_id: Option<i64>,

    #[command(flatten)]
    db: DatabaseArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Args = parse_or_exit();

    let config = args.db.config()?;
    let db = Database::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.params()))?;

    let rendered = match args.course_id {
        Some(course_id) => marks::collect_course(&db, course_id).await.map(|report| {
            report
                .map(|r| r.to_string())
                .unwrap_or_else(|| format!("Course with ID {course_id} not found!\n"))
        }),
        None => marks::collect_overview(&db).await.map(|r| r.to_string()),
    };
    db.close().await;

    print!("{}", rendered?);
    Ok(())
}
