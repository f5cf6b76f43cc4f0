use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, COOKIE, LOCATION, SET_COOKIE};
use reqwest::{StatusCode, Url};
use scraper::{Html, Selector};
use tokio::sync::{Mutex, RwLock};

use crate::client;
use crate::error::{FplError, Result};
use crate::utils::throttle::FixedInterval;

const LOGIN_URL: &str = "https://users.premierleague.com/accounts/login/";
const LOGIN_APP: &str = "plfpl-web";
const LOGIN_REDIRECT: &str = "https://fantasy.premierleague.com/a/login";
const CSRF_INPUT_SELECTOR: &str = r#"input[name="csrfmiddlewaretoken"]"#;
// Cookie issued by the portal's blocking layer on 403 challenge responses.
const CHALLENGE_COOKIE: &str = "datadome";

/// An authenticated portal session: the CSRF token echoed at login plus the
/// joined cookie header value every data request must carry.
#[derive(Debug, Clone)]
pub struct Session {
    pub csrf_token: String,
    pub cookies: String,
    pub created_at: DateTime<Utc>,
}

/// Result of one authentication attempt. `acquire` escalates
/// `ChallengeDetected` into an error; other callers can decide differently.
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(Session),
    ChallengeDetected { status: StatusCode },
    Failed(FplError),
}

impl AuthOutcome {
    pub fn into_session(self) -> Result<Session> {
        match self {
            AuthOutcome::Authenticated(session) => Ok(session),
            AuthOutcome::ChallengeDetected { status } => Err(FplError::Challenge { status }),
            AuthOutcome::Failed(err) => Err(err),
        }
    }
}

/// CSRF token plus the cookies that must accompany the credential POST.
struct CsrfGrant {
    token: String,
    cookies: String,
}

/// Logs in to the portal and hands out the shared [`Session`].
///
/// The session lives behind an `RwLock`; a separate login gate serializes
/// concurrent callers so that two requests arriving before the first login
/// completes still trigger exactly one credential submission.
pub struct SessionManager {
    http: reqwest::Client,
    email: String,
    password: String,
    pacer: FixedInterval,
    session: RwLock<Option<Session>>,
    login_gate: Mutex<()>,
}

impl SessionManager {
    pub fn new(email: String, password: String) -> Self {
        Self::with_transport(client::build_client(), email, password, FixedInterval::default())
    }

    /// Use an already-built transport (shared with the league client) and an
    /// explicit pacing policy.
    pub fn with_transport(
        http: reqwest::Client,
        email: String,
        password: String,
        pacer: FixedInterval,
    ) -> Self {
        Self {
            http,
            email,
            password,
            pacer,
            session: RwLock::new(None),
            login_gate: Mutex::new(()),
        }
    }

    /// Return the current session, logging in first if none exists.
    ///
    /// Callers that race on a missing session serialize on the login gate and
    /// share the single login performed by whichever caller got there first.
    pub async fn acquire(&self) -> Result<Session> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let _gate = self.login_gate.lock().await;
        // Someone else may have logged in while we waited on the gate.
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        self.authenticate().await.into_session()
    }

    /// Discard any stored session and log in again.
    pub async fn refresh(&self) -> Result<Session> {
        let _gate = self.login_gate.lock().await;
        if let Some(previous) = self.session.write().await.take() {
            let age = Utc::now() - previous.created_at;
            tracing::info!(age_secs = age.num_seconds(), "discarding rejected session");
        }
        self.authenticate().await.into_session()
    }

    /// Run one login attempt and report the outcome, storing the session on
    /// success.
    pub async fn authenticate(&self) -> AuthOutcome {
        match self.login().await {
            Ok(session) => {
                *self.session.write().await = Some(session.clone());
                AuthOutcome::Authenticated(session)
            }
            Err(FplError::Challenge { status }) => AuthOutcome::ChallengeDetected { status },
            Err(err) => AuthOutcome::Failed(err),
        }
    }

    /// POST credentials to the login form and capture the session cookies
    /// from the redirect response.
    async fn login(&self) -> Result<Session> {
        let grant = self.fetch_csrf_grant().await?;
        self.pacer.pause().await;

        let form = [
            ("csrfmiddlewaretoken", grant.token.as_str()),
            ("login", self.email.as_str()),
            ("password", self.password.as_str()),
            ("app", LOGIN_APP),
            ("redirect_uri", LOGIN_REDIRECT),
        ];

        let response = self
            .http
            .post(LOGIN_URL)
            .header(COOKIE, grant.cookies.as_str())
            .form(&form)
            .send()
            .await
            .map_err(|source| FplError::Http {
                url: LOGIN_URL.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::FOUND {
            // A 200 here is the login form re-rendered with errors.
            tracing::error!(%status, headers = ?response.headers(), "login POST was not redirected");
            return Err(FplError::auth(format!(
                "login returned {status} instead of a redirect"
            )));
        }

        let fragments = cookie_fragments(response.headers());
        if fragments.is_empty() {
            return Err(FplError::auth("login redirect carried no session cookies"));
        }
        let cookies = fragments.join("; ");

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| FplError::auth("login redirect had no usable Location header"))?;

        let target = Url::parse(LOGIN_URL)
            .expect("static login URL")
            .join(&location)
            .map_err(|err| FplError::auth(format!("bad redirect target {location:?}: {err}")))?;

        let follow = self
            .http
            .get(target.clone())
            .header(COOKIE, cookies.as_str())
            .send()
            .await
            .map_err(|source| FplError::Http {
                url: target.to_string(),
                source,
            })?;

        // The landing route itself redirects into the app, so 3xx is fine.
        let follow_status = follow.status();
        if !follow_status.is_success() && !follow_status.is_redirection() {
            return Err(FplError::auth(format!(
                "post-login redirect to {target} returned {follow_status}"
            )));
        }

        tracing::info!("logged in to the fantasy portal");
        Ok(Session {
            csrf_token: grant.token,
            cookies,
            created_at: Utc::now(),
        })
    }

    /// GET the login page and pull out the CSRF token plus the cookies that
    /// must accompany the credential POST.
    ///
    /// A 403 means the blocking layer challenged us; the challenge cookie it
    /// sets is echoed back in a single retry.
    async fn fetch_csrf_grant(&self) -> Result<CsrfGrant> {
        self.pacer.pause().await;
        let mut response = self
            .http
            .get(LOGIN_URL)
            .send()
            .await
            .map_err(|source| FplError::Http {
                url: LOGIN_URL.to_string(),
                source,
            })?;

        let mut challenge_cookie = None;
        if response.status() == StatusCode::FORBIDDEN {
            let status = response.status();
            let fragments = cookie_fragments(response.headers());
            let Some(challenge) = find_cookie(&fragments, CHALLENGE_COOKIE).cloned() else {
                tracing::warn!(%status, "login page blocked without a challenge cookie");
                return Err(FplError::Challenge { status });
            };

            tracing::warn!(%status, "login page blocked, retrying once with challenge cookie");
            self.pacer.pause().await;
            let retry = self
                .http
                .get(LOGIN_URL)
                .header(COOKIE, challenge.as_str())
                .send()
                .await
                .map_err(|source| FplError::Http {
                    url: LOGIN_URL.to_string(),
                    source,
                })?;

            if !retry.status().is_success() {
                return Err(FplError::Challenge {
                    status: retry.status(),
                });
            }
            challenge_cookie = Some(challenge);
            response = retry;
        } else if !response.status().is_success() {
            return Err(FplError::auth(format!(
                "login page returned {}",
                response.status()
            )));
        }

        let mut fragments = cookie_fragments(response.headers());
        // Keep carrying the challenge cookie if the retry did not re-issue it.
        if let Some(challenge) = challenge_cookie {
            if find_cookie(&fragments, CHALLENGE_COOKIE).is_none() {
                fragments.push(challenge);
            }
        }
        let cookies = fragments.join("; ");

        let body = response.text().await.map_err(|source| FplError::Http {
            url: LOGIN_URL.to_string(),
            source,
        })?;
        let token = extract_csrf_token(&body)?;

        Ok(CsrfGrant { token, cookies })
    }
}

/// `name=value` parts of every `Set-Cookie` header, attributes stripped.
fn cookie_fragments(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .map(|fragment| fragment.trim().to_string())
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

fn find_cookie<'a>(fragments: &'a [String], name: &str) -> Option<&'a String> {
    fragments.iter().find(|fragment| {
        fragment
            .strip_prefix(name)
            .is_some_and(|rest| rest.starts_with('='))
    })
}

fn extract_csrf_token(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(CSRF_INPUT_SELECTOR)
        .map_err(|err| FplError::auth(format!("invalid CSRF selector: {err}")))?;

    match document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
    {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => {
            // Surface the raw markup for post-mortem debugging.
            tracing::error!(page = %html, "CSRF token not found in login page");
            Err(FplError::auth("CSRF token not found in login page"))
        }
    }
}
