use reqwest::header::COOKIE;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::auth::{Session, SessionManager};
use crate::client;
use crate::error::{FplError, Result};
use crate::models::{GameweekData, GameweekStanding};
use crate::utils::throttle::FixedInterval;

const API_BASE: &str = "https://fantasy.premierleague.com/api";

/// Response from the bootstrap metadata endpoint.
#[derive(Debug, Deserialize)]
struct Bootstrap {
    events: Vec<Event>,
}

/// One round in the fantasy calendar.
#[derive(Debug, Deserialize)]
struct Event {
    id: u32,
    is_current: bool,
}

/// Response from the classic-league standings endpoint.
#[derive(Debug, Deserialize)]
struct StandingsResponse {
    standings: StandingsPage,
}

#[derive(Debug, Deserialize)]
struct StandingsPage {
    results: Vec<GameweekStanding>,
}

pub struct LeagueApiClient {
    http: reqwest::Client,
    pacer: FixedInterval,
}

impl LeagueApiClient {
    pub fn new() -> Self {
        Self::with_transport(client::build_client(), FixedInterval::default())
    }

    /// Use an already-built transport (shared with the session manager) and
    /// an explicit pacing policy.
    pub fn with_transport(http: reqwest::Client, pacer: FixedInterval) -> Self {
        Self { http, pacer }
    }

    /// Number of the gameweek currently flagged as `is_current` upstream.
    pub async fn fetch_current_gameweek(&self, session: &Session) -> Result<u32> {
        let url = format!("{API_BASE}/bootstrap-static/");
        let response = self
            .http
            .get(&url)
            .header(COOKIE, session.cookies.as_str())
            .send()
            .await
            .map_err(|source| FplError::Http {
                url: url.clone(),
                source,
            })?;

        ensure_authorized(response.status(), &url)?;

        let bootstrap: Bootstrap = response
            .json()
            .await
            .map_err(|err| FplError::data(format!("malformed bootstrap payload: {err}")))?;

        current_event(&bootstrap.events)
    }

    /// Standings page for one gameweek of a classic league.
    pub async fn fetch_gameweek_standings(
        &self,
        league_id: u32,
        gameweek: u32,
        session: &Session,
    ) -> Result<Vec<GameweekStanding>> {
        let url = format!("{API_BASE}/leagues-classic/{league_id}/standings/");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("page_standings", "1".to_string()),
                ("phase", gameweek.to_string()),
            ])
            .header(COOKIE, session.cookies.as_str())
            .send()
            .await
            .map_err(|source| FplError::Http {
                url: url.clone(),
                source,
            })?;

        ensure_authorized(response.status(), &url)?;

        let page: StandingsResponse = response.json().await.map_err(|err| {
            FplError::data(format!(
                "malformed standings payload for gameweek {gameweek}: {err}"
            ))
        })?;

        Ok(page.standings.results)
    }

    /// Fetch standings for every gameweek from 1 up to the current one,
    /// sequentially, with a pause between requests.
    ///
    /// If the portal rejects the session mid-run, one forced re-login is
    /// attempted and the same gameweek retried; any other failure aborts the
    /// whole aggregation with no partial result.
    pub async fn fetch_all_gameweeks(
        &self,
        league_id: u32,
        auth: &SessionManager,
    ) -> Result<Vec<GameweekData>> {
        let mut session = auth.acquire().await?;
        let current = self.fetch_current_gameweek(&session).await?;
        tracing::info!(league_id, current, "aggregating league standings");

        let mut pages = Vec::with_capacity(current as usize);
        let mut relogged_in = false;
        let mut gameweek = 1;
        while gameweek <= current {
            match self
                .fetch_gameweek_standings(league_id, gameweek, &session)
                .await
            {
                Ok(standings) => {
                    tracing::debug!(gameweek, managers = standings.len(), "fetched standings");
                    pages.push(GameweekData {
                        gameweek,
                        standings,
                    });
                    gameweek += 1;
                    self.pacer.pause().await;
                }
                Err(FplError::SessionExpired { status }) if !relogged_in => {
                    tracing::warn!(%status, gameweek, "session rejected mid-aggregation, logging in again");
                    session = auth.refresh().await?;
                    relogged_in = true;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(pages)
    }
}

impl Default for LeagueApiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_authorized(status: StatusCode, url: &str) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FplError::SessionExpired { status });
    }
    if !status.is_success() {
        return Err(FplError::data(format!("{url} returned {status}")));
    }
    Ok(())
}

fn current_event(events: &[Event]) -> Result<u32> {
    events
        .iter()
        .find(|event| event.is_current)
        .map(|event| event.id)
        .ok_or_else(|| FplError::data("no event is flagged as current"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_event_picks_the_flagged_round() {
        let bootstrap: Bootstrap = serde_json::from_str(
            r#"{
                "events": [
                    {"id": 1, "is_current": false, "name": "Gameweek 1"},
                    {"id": 2, "is_current": false, "name": "Gameweek 2"},
                    {"id": 3, "is_current": false, "name": "Gameweek 3"},
                    {"id": 4, "is_current": false, "name": "Gameweek 4"},
                    {"id": 5, "is_current": true, "name": "Gameweek 5"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(current_event(&bootstrap.events).unwrap(), 5);
    }

    #[test]
    fn missing_current_flag_is_an_explicit_error() {
        let bootstrap: Bootstrap = serde_json::from_str(
            r#"{"events": [{"id": 1, "is_current": false}, {"id": 2, "is_current": false}]}"#,
        )
        .unwrap();

        let err = current_event(&bootstrap.events).unwrap_err();
        assert!(matches!(err, FplError::Data { .. }));
        assert!(err.to_string().contains("current"));
    }

    #[test]
    fn parses_a_standings_page() {
        let response: StandingsResponse = serde_json::from_str(
            r#"{
                "league": {"id": 98765, "name": "Office League"},
                "standings": {
                    "has_next": false,
                    "page": 1,
                    "results": [
                        {
                            "entry": 100,
                            "player_name": "Alice",
                            "entry_name": "Team A",
                            "event_total": 61,
                            "total": 61,
                            "rank": 1,
                            "last_rank": 2
                        },
                        {
                            "entry": 200,
                            "player_name": "Bob",
                            "entry_name": "Team B",
                            "event_total": 54,
                            "total": 54,
                            "rank": 2,
                            "last_rank": 1
                        }
                    ]
                }
            }"#,
        )
        .unwrap();

        let results = response.standings.results;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry, 100);
        assert_eq!(results[0].event_total, 61);
        assert_eq!(results[1].entry_name, "Team B");
    }

    #[test]
    fn auth_statuses_map_to_session_expired() {
        assert!(matches!(
            ensure_authorized(StatusCode::UNAUTHORIZED, "u").unwrap_err(),
            FplError::SessionExpired { .. }
        ));
        assert!(matches!(
            ensure_authorized(StatusCode::FORBIDDEN, "u").unwrap_err(),
            FplError::SessionExpired { .. }
        ));
        assert!(matches!(
            ensure_authorized(StatusCode::NOT_FOUND, "u").unwrap_err(),
            FplError::Data { .. }
        ));
        assert!(ensure_authorized(StatusCode::OK, "u").is_ok());
    }

    #[tokio::test]
    #[ignore] // Hits the real portal; needs FPL_EMAIL / FPL_PASSWORD / FPL_LEAGUE_ID.
    async fn test_fetch_all_gameweeks() {
        dotenv::dotenv().ok();
        let config = crate::config::Config::from_env().unwrap();

        let http = crate::client::build_client();
        let auth = crate::auth::SessionManager::with_transport(
            http.clone(),
            config.email,
            config.password,
            FixedInterval::default(),
        );
        let league = LeagueApiClient::with_transport(http, FixedInterval::default());

        let pages = league
            .fetch_all_gameweeks(config.league_id, &auth)
            .await
            .unwrap();
        assert!(!pages.is_empty());

        // Gameweeks come back 1..=N in order.
        let numbers: Vec<u32> = pages.iter().map(|page| page.gameweek).collect();
        assert_eq!(numbers, (1..=pages.len() as u32).collect::<Vec<_>>());
    }
}
