//! Chifoumi Client
//!
//! Command-line client for the match server: list, create and inspect
//! matches, follow one live, or play a move.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chifoumi::{
    game::{gate::StatusLine, state::{Match, Outcome}},
    network::AuthConfig,
    ClientConfig, EventStreamClient, HttpMatchRepository, IdentityResolver, MatchId, MatchRepository, MatchSync,
    MatchView, Move, VERSION,
};

#[derive(Parser)]
#[command(author, version, about = "Rock-paper-scissors match client", long_about = None)]
struct Cli {
    /// API base URL (defaults to CHIFOUMI_API_URL, then http://localhost:3000).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer credential.
    #[arg(long, env = "CHIFOUMI_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List matches visible to you", alias = "ls")]
    List,
    #[command(about = "Create a match and wait for an opponent")]
    Create,
    #[command(about = "Show one match")]
    Show {
        #[arg(required = true)]
        match_id: String,
    },
    #[command(about = "Follow a match live until it ends")]
    Watch {
        #[arg(required = true)]
        match_id: String,
    },
    #[command(about = "Play one move in the current turn")]
    Play {
        #[arg(required = true)]
        match_id: String,
        /// rock, paper or scissors
        #[arg(required = true)]
        mv: Move,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    info!("chifoumi v{} against {}", VERSION, config.api_url);

    let token = cli
        .token
        .clone()
        .context("no credential: pass --token or set CHIFOUMI_TOKEN")?;
    let resolver = IdentityResolver::with_claims(config.identity_claims.clone())
        .with_verification(AuthConfig::from_env());
    let repo = Arc::new(HttpMatchRepository::new(config.clone())?);

    match cli.command {
        Command::List => {
            let matches = repo.list_matches(&token).await?;
            if matches.is_empty() {
                println!("no matches");
            }
            for m in &matches {
                println!("{}", summary(m));
            }
        }
        Command::Create => {
            let m = repo.create_match(&token).await?;
            println!("created {}", m.id);
        }
        Command::Show { match_id } => {
            let m = repo.get_match(&MatchId::new(match_id), &token).await?;
            print_match(&m);
        }
        Command::Watch { match_id } => {
            let streams = EventStreamClient::new(config)?;
            let mut sync = MatchSync::start(repo, &streams, &resolver, MatchId::new(match_id), &token).await?;
            let mut last = render(&sync.view());
            println!("{}", last);

            loop {
                let view = tokio::select! {
                    view = sync.changed() => match view {
                        Ok(view) => view,
                        // Task ended; close() reports why.
                        Err(_) => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                };
                let line = render(&view);
                if line != last {
                    println!("{}", line);
                    last = line;
                }
                if view.phase.is_finished() {
                    if let Some(m) = &view.snapshot {
                        print_match(m);
                    }
                    break;
                }
            }
            sync.close().await?;
        }
        Command::Play { match_id, mv } => {
            let streams = EventStreamClient::new(config)?;
            let mut sync = MatchSync::start(repo, &streams, &resolver, MatchId::new(match_id), &token).await?;

            let mut view = sync.view();
            while !view.can_submit() {
                if view.phase.is_finished() || (view.snapshot.is_some() && view.role.is_none()) {
                    sync.close().await?;
                    bail!("cannot play: {}", view.status());
                }
                println!("{}", view.status());
                view = match sync.changed().await {
                    Ok(view) => view,
                    Err(e) => {
                        sync.close().await?;
                        return Err(e.into());
                    }
                };
            }

            let accepted = sync.submit_move(mv).await?;
            println!(
                "turn {}: played {} ({})",
                view.turn + 1,
                mv,
                if accepted { "accepted" } else { "not accepted" }
            );
            sync.close().await?;
        }
    }

    Ok(())
}

fn summary(m: &Match) -> String {
    let opponent = m
        .player2
        .as_ref()
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| "(open)".to_string());
    let state = match m.outcome() {
        Some(winner) => format!("finished, winner {}", winner),
        None => format!("{} turns", m.turns.len()),
    };
    format!("{}  {} vs {}  {}", m.id, m.player1.display_name(), opponent, state)
}

fn print_match(m: &Match) {
    println!("{}", summary(m));
    for turn in &m.turns {
        let slot = |mv: Option<Move>| mv.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());
        let result = match turn.winner {
            Some(Outcome::Won(role)) => m
                .player(role)
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|| role.to_string()),
            Some(Outcome::Draw) => "draw".to_string(),
            None => "pending".to_string(),
        };
        println!(
            "  turn {}: {} vs {} -> {}",
            turn.index + 1,
            slot(turn.move1),
            slot(turn.move2),
            result
        );
    }
}

fn render(view: &MatchView) -> String {
    match view.status() {
        StatusLine::MakeYourMove | StatusLine::WaitingForOpponentMove | StatusLine::TurnComplete => {
            format!("[turn {}] {}", view.turn + 1, view.status())
        }
        status => status.to_string(),
    }
}
