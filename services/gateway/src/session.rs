//! Session cookie plumbing
//!
//! The opaque session token travels in a `session_id` cookie. The
//! extractor only reads it; the core mints tokens, and handlers attach a
//! `Set-Cookie` header whenever a request arrived without a valid one.

use axum::extract::FromRequestParts;
use axum::http::header::{HeaderName, COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use exchange::ResolvedSession;
use std::convert::Infallible;

pub const SESSION_COOKIE: &str = "session_id";

/// Cookie lifetime: 30 days
const COOKIE_MAX_AGE_SECS: u64 = 86_400 * 30;

/// The session token carried by the request, if any
#[derive(Debug, Clone)]
pub struct SessionToken(Option<String>);

impl SessionToken {
    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(token_from_headers(&parts.headers)))
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// `Set-Cookie` headers for a freshly created session, nothing otherwise
pub fn cookie_headers(resolved: &ResolvedSession) -> Option<[(HeaderName, String); 1]> {
    resolved.created.then(|| {
        [(
            SET_COOKIE,
            format!(
                "{SESSION_COOKIE}={}; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}; SameSite=Lax",
                resolved.session_id
            ),
        )]
    })
}
