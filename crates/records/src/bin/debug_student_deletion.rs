//! Shows everything that references a student before it is deleted.

use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_entity_id, parse_or_exit};
use records::logging::init_logging;
use records::reports::deletion;

#[derive(Parser, Debug)]
#[command(version, about = "Report rows that reference a student and the deletion order")]
struct Args {
    /// Database id of the student
    #[arg(value_parser = parse_entity_id)]
    student_id: i64,

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

    let report = deletion::collect_student(&db, args.student_id).await;
    db.close().await;

    match report? {
        Some(report) => print!("{report}"),
        None => println!("Student with ID {} not found!", args.student_id),
    }
    Ok(())
}
