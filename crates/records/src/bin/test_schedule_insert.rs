//! Inserts and removes a marker schedule to see whether the backend's insert
//! would be accepted. A rejected insert is reported, not treated as failure.

use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_entity_id, parse_or_exit};
use records::logging::init_logging;
use records::patches::{self, TrialSchedule};

#[derive(Parser, Debug)]
#[command(version, about = "Try a schedule insert inside a rolled-back probe")]
struct Args {
    #[arg(long, value_parser = parse_entity_id)]
    course_id: i64,

    #[arg(long, value_parser = parse_entity_id)]
    teacher_id: i64,

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

    let trial = TrialSchedule::new(args.course_id, args.teacher_id);
    let outcome = patches::trial_schedule_insert(&db, &trial).await;
    db.close().await;

    println!("=== TESTING SCHEDULE INSERT ===");
    println!("{}", outcome?);
    Ok(())
}
