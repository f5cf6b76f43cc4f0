use anyhow::{Context, Result};
use std::env;

const DEFAULT_LEAGUE_ID: u32 = 313;
const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration, read from the environment (optionally via `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub email: String,
    pub password: String,
    pub league_id: u32,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let email = env::var("FPL_EMAIL").context("FPL_EMAIL not set in environment or .env file")?;
        let password =
            env::var("FPL_PASSWORD").context("FPL_PASSWORD not set in environment or .env file")?;

        let league_id = match env::var("FPL_LEAGUE_ID") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("FPL_LEAGUE_ID must be a number, got {raw:?}"))?,
            Err(_) => DEFAULT_LEAGUE_ID,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            email,
            password,
            league_id,
            port,
        })
    }
}
