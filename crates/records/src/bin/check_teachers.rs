use anyhow::Context;
use clap::Parser;
use records::Database;
use records::cli::{DatabaseArgs, parse_or_exit};
use records::logging::init_logging;
use records::reports::teachers;

#[derive(Parser, Debug)]
#[command(version, about = "List teachers and teacher accounts")]
struct Args {
    /// Also look up this user and its teacher record
    #[arg(long)]
    email: Option<String>,

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

    let report = teachers::collect(&db, args.email.as_deref()).await;
    db.close().await;

    print!("{}", report?);
    Ok(())
}
