//! Adds the schedule columns the API writes when they are missing.

use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_or_exit};
use records::logging::init_logging;
use records::patches;

#[derive(Parser, Debug)]
#[command(version, about = "Add missing columns to the schedules table")]
struct Args {
    #[command(flatten)]
    db: DatabaseArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Args = parse_or_exit();

    let config = args.db.config()?;
    println!("Connecting to database: {}", config.params());
    let db = Database::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.params()))?;

    let result = run(&db).await;
    db.close().await;
    result
}

async fn run(db: &Database) -> anyhow::Result<()> {
    println!("Checking current schema...");
    let before = patches::check_schedule_columns(db).await?;
    print!("{before}");

    if before.missing().is_empty() {
        println!("All required columns exist!");
        return Ok(());
    }
    println!("Found {} missing columns", before.missing().len());

    let added = patches::add_missing_schedule_columns(db)
        .await
        .context("Schema update failed and was rolled back")?;
    println!("Schema updated: added {}", added.join(", "));

    println!("Verifying changes...");
    let after = patches::check_schedule_columns(db).await?;
    print!("{after}");

    let total = db.count_rows("schedules").await?;
    println!("Total schedules in database: {total}");

    if after.missing().is_empty() {
        println!("Schema fix completed successfully!");
    } else {
        println!("Still missing: {}", after.missing().join(", "));
    }
    Ok(())
}
