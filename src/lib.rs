pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::league_api::LeagueApiClient;
pub use auth::{AuthOutcome, Session, SessionManager};
pub use config::Config;
pub use error::{FplError, Result};
pub use models::{GameweekData, GameweekScore, GameweekStanding, ManagerRecord};
pub use utils::process::process_gameweek_data;
pub use utils::throttle::FixedInterval;

/// Aggregate the full per-manager league view: make sure a session exists,
/// pull standings for every gameweek played so far, and reshape them into one
/// record per manager.
pub async fn fetch_league_overview(
    auth: &SessionManager,
    league: &LeagueApiClient,
    league_id: u32,
) -> Result<Vec<ManagerRecord>> {
    let raw = league.fetch_all_gameweeks(league_id, auth).await?;
    Ok(process_gameweek_data(&raw))
}
