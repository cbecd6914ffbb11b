pub(crate) mod normalize;

use crate::models::{CompletedGame, UserSummary};
use futures::future::{select, Either};
use gloo_timers::future::TimeoutFuture;
use strum::Display;

/// Fixed service origin; asset paths from the API are appended to this.
pub(crate) const RA_URL: &str = "https://retroachievements.org";

const API_ROOT: &str = "https://retroachievements.org/API";

/// Body the service returns (as plain text, not JSON) when the key is wrong.
const INVALID_KEY_ERROR: &str = "Invalid API Key";

/// Per-request deadline.
const REQUEST_TIMEOUT_MS: u32 = 30_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// The service rejected the configured API key.
    InvalidKey,
    Network,
    Timeout,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn invalid_key() -> Self {
        Self {
            kind: ApiErrorKind::InvalidKey,
            message: INVALID_KEY_ERROR.to_string(),
        }
    }

    fn timeout() -> Self {
        Self {
            kind: ApiErrorKind::Timeout,
            message: format!("No response within {}s", REQUEST_TIMEOUT_MS / 1000),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Endpoint names as they appear in the `API_Get<Target>.php` templates.
#[derive(Clone, Copy, Debug, Display)]
pub(crate) enum ApiTarget {
    UserSummary,
    UserCompletedGames,
}

/// Client for the RetroAchievements web API.
///
/// Credentials ride along on every request as the `z`/`y` query pair.
#[derive(Clone)]
pub(crate) struct RaClient {
    username: String,
    api_key: String,
}

impl RaClient {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    fn auth_query(&self) -> String {
        format!(
            "?z={}&y={}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.api_key)
        )
    }

    fn ra_url(&self, target: ApiTarget, params: Option<&str>) -> String {
        let appended = params.map(|p| format!("&{p}")).unwrap_or_default();
        format!("{API_ROOT}/API_Get{target}.php{}{appended}", self.auth_query())
    }

    fn summary_params(&self, count: u32) -> String {
        // g: games to look at, a: achievements per game.
        // The service returns empty data when g is zero.
        let games = count.max(1);
        format!(
            "u={}&g={games}&a={games}",
            urlencoding::encode(&self.username)
        )
    }

    async fn fetch_text(&self, url: String) -> ApiResult<String> {
        let client = reqwest::Client::new();
        let request = client.get(&url).send();
        let deadline = TimeoutFuture::new(REQUEST_TIMEOUT_MS);
        futures::pin_mut!(request, deadline);

        match select(request, deadline).await {
            Either::Left((res, _)) => {
                let res = res.map_err(ApiError::network)?;
                if !res.status().is_success() {
                    let status = res.status();
                    let body = res.text().await.unwrap_or_default();
                    return Err(ApiError::http(status, body, "Request failed"));
                }
                res.text().await.map_err(ApiError::network)
            }
            Either::Right(((), _)) => Err(ApiError::timeout()),
        }
    }

    /// Fetch and normalize the user summary, including the flattened
    /// recent-achievement list.
    pub async fn get_summary(&self, count: u32) -> ApiResult<UserSummary> {
        let url = self.ra_url(ApiTarget::UserSummary, Some(&self.summary_params(count)));
        let body = self.fetch_text(url).await?;
        if is_invalid_key_body(&body) {
            return Err(ApiError::invalid_key());
        }

        let raw: normalize::RawUserSummary =
            serde_json::from_str(&body).map_err(ApiError::parse)?;
        let mut summary = normalize::user_summary(raw)?;
        if summary.username.is_empty() {
            summary.username = self.username.clone();
        }
        Ok(summary)
    }

    /// Fetch the full completed-sets list. Mastered/completed filtering and
    /// de-duplication happen in [`normalize::mastered_sets`] so the display
    /// flag can be applied without refetching.
    pub async fn get_completed_games(&self) -> ApiResult<Vec<CompletedGame>> {
        let params = format!("u={}", urlencoding::encode(&self.username));
        let url = self.ra_url(ApiTarget::UserCompletedGames, Some(&params));
        let body = self.fetch_text(url).await?;
        if is_invalid_key_body(&body) {
            return Err(ApiError::invalid_key());
        }

        let raw: Vec<normalize::RawCompletedGame> =
            serde_json::from_str(&body).map_err(ApiError::parse)?;
        normalize::completed_games(raw)
    }
}

/// The auth failure arrives as a plain-text body. An intermediary JSON layer
/// can re-quote it, so both spellings are recognized.
pub(crate) fn is_invalid_key_body(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed == INVALID_KEY_ERROR || trimmed == format!("\"{INVALID_KEY_ERROR}\"")
}
