use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config::DEFAULT_CONFIG_FILE, load_settings_from, GameController, ServiceClient, Step,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod display;
mod input;

use input::{parse_command, PlayerCommand};

#[derive(Parser, Debug)]
#[command(about = "Think of something and let the service guess it")]
struct Args {
    /// Base URL of the guessing service; overrides the config file and environment.
    #[arg(long)]
    service_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config);
    if let Some(url) = args.service_url {
        settings.service_url = url;
    }
    let client = ServiceClient::from_settings(&settings).context("invalid service settings")?;
    tracing::info!(service_url = client.base_url(), "player starting");

    let mut game = GameController::with_first_question(Arc::new(client), settings.first_question);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("\n{}", display::screen(game.session()));
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let Some(command) = parse_command(&line, game.phase()) else {
            println!("Sorry, I didn't get that.");
            continue;
        };
        if command == PlayerCommand::Quit {
            break;
        }
        run_command(&mut game, command).await;
    }

    println!("{}", display::footer(game.session()));
    Ok(())
}

async fn run_command(game: &mut GameController, command: PlayerCommand) {
    let outcome = match command {
        PlayerCommand::Start => game.start(),
        PlayerCommand::Answer(yes) => game.answer_current(yes).await.map(|step| {
            if let Step::Retry { .. } = step {
                println!("Something went wrong reaching the service; answer again to retry.");
            }
        }),
        PlayerCommand::Verdict(correct) => game.confirm(correct).await.map(|delivery| {
            if let Some(message) = delivery.as_ref().and_then(display::describe_delivery) {
                println!("{message}");
            }
        }),
        PlayerCommand::Teach(entity) => game.teach(&entity).await.map(|delivery| {
            if let Some(message) = display::describe_delivery(&delivery) {
                println!("{message}");
            }
        }),
        PlayerCommand::Reset => game.reset().map(|()| {
            println!("{}", display::footer(game.session()));
        }),
        PlayerCommand::Debug => {
            show_debug(game).await;
            Ok(())
        }
        PlayerCommand::Quit => Ok(()),
    };

    if let Err(err) = outcome {
        println!("{}", display::describe_failure(&err));
    }
}

async fn show_debug(game: &GameController) {
    match game.fetch_debug().await {
        Ok(snapshot) => print_json("Debug Info", &snapshot),
        Err(err) => {
            tracing::warn!(error = %err, "debug snapshot unavailable");
            println!("{}", display::describe_failure(&err));
        }
    }
    if let Some(last) = game.session().last_response() {
        print_json("Last reply", last);
    }
}

fn print_json(title: &str, value: &serde_json::Value) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    println!("--- {title} ---\n{rendered}");
}
