use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::DEFAULT_CONFIG_FILE, load_settings_from, CatalogBrowser, NoticeKind,
    PredictionService, ServiceClient,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Inspect and extend the guessing service's catalog")]
struct Cli {
    #[arg(long)]
    service_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every question and each known entity's attribute count.
    List,
    /// Add a yes/no question to the bank.
    Add { question: String },
    /// Print the service's diagnostic snapshot.
    Debug,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings_from(&cli.config);
    if let Some(url) = cli.service_url {
        settings.service_url = url;
    }
    let client = ServiceClient::from_settings(&settings).context("invalid service settings")?;

    match cli.command {
        Command::List => {
            let mut browser =
                CatalogBrowser::new(Arc::new(client)).with_notice_ttl(settings.notice_ttl());
            if !browser.refresh().await {
                bail!(notice_text(&mut browser));
            }
            print_catalog(&browser);
        }
        Command::Add { question } => {
            let mut browser =
                CatalogBrowser::new(Arc::new(client)).with_notice_ttl(settings.notice_ttl());
            let kind = browser.add_question(&question).await?;
            let message = notice_text(&mut browser);
            if kind == NoticeKind::Error {
                bail!(message);
            }
            println!("{message}");
            print_catalog(&browser);
        }
        Command::Debug => {
            let snapshot = client
                .debug_snapshot()
                .await
                .context("failed to fetch debug snapshot")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

fn notice_text(browser: &mut CatalogBrowser) -> String {
    browser
        .notice()
        .map(|notice| notice.message().to_string())
        .unwrap_or_default()
}

fn print_catalog(browser: &CatalogBrowser) {
    println!("Current Questions ({})", browser.questions().len());
    for question in browser.questions() {
        println!("  {question}");
    }

    let entities: Vec<_> = browser.entities().collect();
    println!("Known Entities ({})", entities.len());
    for entity in entities {
        println!("  {:<24} {} attributes", entity.name, entity.attribute_count);
    }
}
