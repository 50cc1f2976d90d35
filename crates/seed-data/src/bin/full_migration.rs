//! Applies the bundled schema, then seeds the sample dataset.

use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_or_exit};
use records::logging::init_logging;
use seed_data::prelude::*;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Create the schema and seed sample data")]
struct Args {
    #[command(flatten)]
    db: DatabaseArgs,

    /// Only apply the schema
    #[arg(long, conflicts_with = "data_only")]
    schema_only: bool,

    /// Only seed data
    #[arg(long)]
    data_only: bool,
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
    if !args.data_only {
        info!("Running schema migration...");
        db.run_migrations()
            .await
            .context("Schema migration failed")?;
        println!("Schema migration completed");
    }

    if !args.schema_only {
        info!("Running data migration...");
        let report = Seeder::new(db.pool().clone())
            .seed_dataset(&Dataset::builtin(), current_academic_year())
            .await
            .context("Data migration failed")?;
        print!("{report}");
        println!("Data migration completed");
    }

    Ok(())
}
