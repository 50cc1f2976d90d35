use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_or_exit};
use records::logging::init_logging;
use records::reports::constraints;

#[derive(Parser, Debug)]
#[command(version, about = "List constraints and indexes of a table")]
struct Args {
    /// Table to inspect
    #[arg(long, default_value = "schedules")]
    table: String,

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

    let report = constraints::collect(&db, &args.table).await;
    db.close().await;

    print!("{}", report?);
    Ok(())
}
