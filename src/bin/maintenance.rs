use std::env;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

use consent_logger::{
    config::AppConfig,
    db,
    documents::{DocumentType, Language},
    store::{ConsentLogStore, PgStore, SnapshotStore},
};

const USAGE: &str = "Usage: maintenance <command>\n\
    \n\
    Commands:\n  \
    migrate                 apply pending database migrations\n  \
    stats [--since <RFC3339>]  print consent counts\n  \
    active-snapshots        list the active version of every document";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("migrate") => migrate().await?,
        Some("stats") => {
            let since = parse_since(args.collect())?;
            print_stats(since).await?;
        }
        Some("active-snapshots") => print_active_snapshots().await?,
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn parse_since(args: Vec<String>) -> Result<Option<DateTime<Utc>>> {
    match args.as_slice() {
        [] => Ok(None),
        [flag, value] if flag == "--since" => {
            let parsed = DateTime::parse_from_rfc3339(value)
                .with_context(|| format!("--since must be RFC3339, got {value}"))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        other => bail!("unexpected arguments: {}\n{USAGE}", other.join(" ")),
    }
}

fn connect() -> Result<PgStore> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        "loaded consent logger configuration"
    );
    let pool = db::init_pool_with(&config.database_url, 1, config.statement_timeout())?;
    Ok(PgStore::new(pool))
}

async fn migrate() -> Result<()> {
    let store = connect()?;
    let pool = store.pool().clone();
    tokio::task::spawn_blocking(move || db::run_migrations(&pool))
        .await
        .context("migration task panicked")??;
    println!("Migrations applied.");
    Ok(())
}

async fn print_stats(since: Option<DateTime<Utc>>) -> Result<()> {
    let store = connect()?;
    let stats = store
        .stats(since)
        .await
        .context("failed to load consent stats")?;

    match since {
        Some(since) => println!("Consents logged since {}", since.to_rfc3339()),
        None => println!("Consents logged (all time)"),
    }
    println!("  total:           {}", stats.total_consents);
    println!("  unique sessions: {}", stats.unique_sessions);
    for document_type in DocumentType::ALL {
        println!(
            "  {:<16} {}",
            format!("{document_type}:"),
            stats.by_document_type.get(document_type)
        );
    }
    Ok(())
}

async fn print_active_snapshots() -> Result<()> {
    let store = connect()?;
    for document_type in DocumentType::ALL {
        for language in Language::ALL {
            let active = store
                .find_active(document_type, language)
                .await
                .with_context(|| format!("failed to load {document_type}/{language}"))?;
            match active {
                Some(snapshot) => println!(
                    "{document_type}/{language}: {} {} ({})",
                    snapshot.version,
                    snapshot.content_hash,
                    snapshot.created_at.to_rfc3339()
                ),
                None => println!("{document_type}/{language}: none"),
            }
        }
    }
    Ok(())
}
