use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_or_exit};
use records::logging::init_logging;
use records::reports::schedules;

#[derive(Parser, Debug)]
#[command(version, about = "Check the schedules table against the columns the API writes")]
struct Args {
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

    let report = schedules::collect_schema(&db).await;
    db.close().await;

    print!("{}", report?);
    Ok(())
}
