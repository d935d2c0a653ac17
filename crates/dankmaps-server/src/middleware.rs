use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const ANONYMOUS_CALLER: &str = "anonymous";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// API key auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `DANKMAPS_API_KEYS` (comma-separated bearer tokens).
    ///
    /// # Errors
    ///
    /// Fails outside development when no key is configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("DANKMAPS_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// In development, empty keys disable auth for local iteration.
    /// In other environments, empty keys fail startup.
    ///
    /// # Errors
    ///
    /// Fails outside development when `raw` holds no key.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "DANKMAPS_API_KEYS not set; write routes are open in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(HashSet::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "DANKMAPS_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys
            .iter()
            .fold(false, |found, key| {
                found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
            })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    used: usize,
}

/// Fixed-window write budget, tracked per caller. Callers are told apart by
/// a bearer token that [`AuthState`] accepts; every other request, including
/// all requests while auth is disabled, shares the anonymous bucket.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    budget: usize,
    window: Duration,
    callers: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(budget: usize, window: Duration) -> Self {
        Self {
            budget,
            window,
            callers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request for `caller`. Returns how long until the window
    /// reopens when the budget is already spent.
    async fn admit(&self, caller: &str) -> Result<(), Duration> {
        let mut callers = self.callers.lock().await;
        let now = Instant::now();
        callers.retain(|_, w| now.duration_since(w.opened) < self.window);
        let slot = callers.entry(caller.to_owned()).or_insert(Window {
            opened: now,
            used: 0,
        });

        if slot.used >= self.budget {
            return Err(self.window.saturating_sub(now.duration_since(slot.opened)));
        }
        slot.used += 1;
        Ok(())
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => {
            tracing::warn!(path = %req.uri().path(), "rejected write without valid bearer token");
            ApiError::new(
                request_id_of(&req),
                "unauthorized",
                "missing or invalid bearer token",
            )
            .into_response()
        }
    }
}

/// Rejects writes past the caller's budget with 429 and `Retry-After`.
pub async fn enforce_rate_limit(
    State((auth, rate_limit)): State<(AuthState, RateLimitState)>,
    req: Request,
    next: Next,
) -> Response {
    let caller = caller_key(&auth, req.headers().get(AUTHORIZATION)).to_owned();

    match rate_limit.admit(&caller).await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            tracing::warn!(path = %req.uri().path(), retry_after_s = wait.as_secs(), "write rate limited");
            let mut res = ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
                .into_response();
            // Round up so a client never retries inside the closed window.
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            if let Ok(val) = HeaderValue::from_str(&secs.to_string()) {
                res.headers_mut().insert(RETRY_AFTER, val);
            }
            res
        }
    }
}

/// Rate-limit bucket for a request: the bearer token when it is a configured
/// key, otherwise the shared anonymous bucket.
fn caller_key<'a>(auth: &AuthState, header: Option<&'a HeaderValue>) -> &'a str {
    match extract_bearer_token(header) {
        Some(token) if auth.enabled && auth.allows(token) => token,
        _ => ANONYMOUS_CALLER,
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_keys("", true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_keys(" , ", false).is_err());
    }

    #[tokio::test]
    async fn rate_limit_budgets_callers_separately() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        assert!(limiter.admit("alpha").await.is_ok());
        assert!(limiter.admit("beta").await.is_ok());

        let wait = limiter.admit("alpha").await.expect_err("alpha over budget");
        assert!(wait <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn unrecognised_tokens_share_one_budget() {
        let auth = AuthState::from_keys("alpha", false).expect("keys");
        let limiter = RateLimitState::new(1, Duration::from_secs(60));

        let mut admitted = 0;
        for i in 0..1_000 {
            let header = HeaderValue::from_str(&format!("Bearer forged-{i}")).expect("header");
            if limiter.admit(caller_key(&auth, Some(&header))).await.is_ok() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(limiter.callers.lock().await.len(), 1);

        let valid = HeaderValue::from_static("Bearer alpha");
        assert_eq!(caller_key(&auth, Some(&valid)), "alpha");
        assert!(limiter.admit(caller_key(&auth, Some(&valid))).await.is_ok());
    }

    #[test]
    fn tokens_are_not_buckets_while_auth_is_disabled() {
        let auth = AuthState::from_keys("", true).expect("dev");
        let header = HeaderValue::from_static("Bearer anything");
        assert_eq!(caller_key(&auth, Some(&header)), ANONYMOUS_CALLER);
    }

    #[tokio::test]
    async fn expired_windows_are_dropped() {
        let limiter = RateLimitState::new(5, Duration::from_millis(20));
        assert!(limiter.admit("alpha").await.is_ok());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.admit("beta").await.is_ok());
        let callers = limiter.callers.lock().await;
        assert_eq!(callers.len(), 1);
        assert!(callers.contains_key("beta"));
    }

    #[tokio::test]
    async fn rate_limit_window_reopens() {
        let limiter = RateLimitState::new(1, Duration::from_millis(20));
        assert!(limiter.admit("alpha").await.is_ok());
        assert!(limiter.admit("alpha").await.is_err());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.admit("alpha").await.is_ok());
    }

    #[test]
    fn auth_state_matches_any_configured_key() {
        let state = AuthState::from_keys("alpha, beta", false).expect("keys");
        assert!(state.enabled);
        assert!(state.allows("beta"));
        assert!(!state.allows("gamma"));
        assert!(!state.allows("bet"));
    }
}
