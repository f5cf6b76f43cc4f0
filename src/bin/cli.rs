use anyhow::{Context, Result};
use clap::Parser;
use fpl_league_dashboard::{
    client, fetch_league_overview, Config, FixedInterval, LeagueApiClient, SessionManager,
};
use std::time::Duration;

/// Fetch a classic league and print a per-manager season summary.
#[derive(Parser)]
#[command(name = "fpl-league")]
struct Args {
    /// League id (defaults to FPL_LEAGUE_ID from the environment)
    #[arg(long)]
    league: Option<u32>,

    /// Pause between upstream requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pace_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let league_id = args.league.unwrap_or(config.league_id);
    let pacer = FixedInterval::new(Duration::from_millis(args.pace_ms));

    println!("Fantasy League Season Summary\n");
    println!("Fetching league {league_id}...\n");

    let http = client::build_client();
    let auth = SessionManager::with_transport(
        http.clone(),
        config.email,
        config.password,
        pacer.clone(),
    );
    let league = LeagueApiClient::with_transport(http, pacer);

    let records = fetch_league_overview(&auth, &league, league_id)
        .await
        .context("Failed to aggregate league standings")?;

    if records.is_empty() {
        println!("No managers found in league {league_id}.");
        return Ok(());
    }

    let gameweeks_played = records
        .iter()
        .map(|record| record.gameweeks.len())
        .max()
        .unwrap_or(0);
    println!(
        "{} managers across {} gameweeks\n",
        records.len(),
        gameweeks_played
    );

    let mut ranked: Vec<_> = records.iter().collect();
    ranked.sort_by_key(|record| {
        record
            .latest()
            .map(|(_, score)| score.rank)
            .unwrap_or(u32::MAX)
    });

    for (i, record) in ranked.iter().enumerate() {
        println!("{}. {}", i + 1, record.format());
    }

    Ok(())
}
