//! Makes the legacy weekly-timetable columns nullable, then probes an insert.

use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_entity_id, parse_or_exit};
use records::logging::init_logging;
use records::patches::{self, TrialSchedule};

#[derive(Parser, Debug)]
#[command(version, about = "Drop NOT NULL on day_of_week, start_time and end_time")]
struct Args {
    /// Course used for the trial insert; skipped unless both ids are given
    #[arg(long, value_parser = parse_entity_id, requires = "teacher_id")]
    course_id: Option<i64>,

    /// Teacher used for the trial insert
    #[arg(long, value_parser = parse_entity_id, requires = "course_id")]
    teacher_id: Option<i64>,

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

    let result = run(&db, &args).await;
    db.close().await;
    result
}

async fn run(db: &Database, args: &Args) -> anyhow::Result<()> {
    let relaxed = patches::relax_legacy_schedule_columns(db).await?;
    for column in &relaxed {
        println!("Made {column} nullable");
    }
    println!("All changes committed");

    if let (Some(course_id), Some(teacher_id)) = (args.course_id, args.teacher_id) {
        let outcome =
            patches::trial_schedule_insert(db, &TrialSchedule::new(course_id, teacher_id)).await?;
        println!("{outcome}");
    }
    Ok(())
}
