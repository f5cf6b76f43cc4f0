use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fpl_league_dashboard::{
    client, fetch_league_overview, Config, FixedInterval, LeagueApiClient, SessionManager,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self' data:; connect-src 'self'";

/// Uniform body for any failed aggregation.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    details: String,
}

struct AppState {
    auth: SessionManager,
    league: LeagueApiClient,
    league_id: u32,
}

type SharedState = Arc<AppState>;

async fn league(State(state): State<SharedState>) -> Response {
    match fetch_league_overview(&state.auth, &state.league, state.league_id).await {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "league aggregation failed");
            let body = ErrorBody {
                error: err.category().to_string(),
                details: err.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("incomplete configuration");
    let port = config.port;
    let league_id = config.league_id;

    // One transport shared by the login flow and the league fetches
    let http = client::build_client();
    let state = Arc::new(AppState {
        auth: SessionManager::with_transport(
            http.clone(),
            config.email,
            config.password,
            FixedInterval::default(),
        ),
        league: LeagueApiClient::with_transport(http, FixedInterval::default()),
        league_id,
    });

    let app = Router::new()
        .route("/api/league", get(league))
        // The front-end assets live under "static"; index.html is served at "/"
        .fallback_service(ServeDir::new("static"))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .with_state(state);

    println!("Tracking league {league_id}");
    println!("Starting web server at http://127.0.0.1:{port}");
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await.unwrap();

    axum::serve(listener, app).await.unwrap();
}
