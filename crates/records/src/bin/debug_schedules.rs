use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_entity_id, parse_or_exit};
use records::logging::init_logging;
use records::reports::schedules;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect stored schedules and their constraints")]
struct Args {
    /// Count schedules of, and look up, this teacher
    #[arg(long, value_parser = parse_entity_id)]
    teacher_id: Option<i64>,

    /// Look up this course
    #[arg(long, value_parser = parse_entity_id)]
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

    let report = schedules::collect_debug(&db, args.teacher_id, args.course_id).await;
    db.close().await;

    print!("{}", report?);
    Ok(())
}
