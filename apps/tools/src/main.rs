use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server_api::ApiContext;
use shared::error::ApiException;
use storage::Storage;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/tracker.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the static catalogs as JSON.
    Catalog,
    CreateOwner {
        username: String,
    },
    ListInfants {
        #[arg(long)]
        username: String,
    },
    AddInfant {
        #[arg(long)]
        username: String,
        name: String,
    },
    /// Prints an owner's combined report as JSON.
    Report {
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    if let Command::Catalog = cli.command {
        println!("{}", serde_json::to_string_pretty(&server_api::catalog())?);
        return Ok(());
    }

    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open {}", cli.database_url))?;

    match cli.command {
        Command::Catalog => {}
        Command::CreateOwner { username } => {
            let owner_id = storage.create_owner(&username).await?;
            println!("owner_id={}", owner_id.0);
        }
        Command::ListInfants { username } => {
            let owner_id = storage.create_owner(&username).await?;
            for infant in storage.list_infants(owner_id).await? {
                println!("{}\t{}\t{}", infant.id.0, infant.name, infant.created_at.to_rfc3339());
            }
        }
        Command::AddInfant { username, name } => {
            let owner_id = storage.create_owner(&username).await?;
            let ctx = ApiContext::new(storage);
            let infant = server_api::add_infant(&ctx, owner_id, &name)
                .await
                .map_err(ApiException::from)?;
            info!(owner_id = owner_id.0, infant_id = infant.id.0, "infant added");
            println!("infant_id={}", infant.id.0);
        }
        Command::Report { username } => {
            let owner_id = storage.create_owner(&username).await?;
            let ctx = ApiContext::new(storage);
            let report = server_api::build_report(&ctx, owner_id)
                .await
                .map_err(ApiException::from)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
