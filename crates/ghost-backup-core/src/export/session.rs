//! Admin session authentication (username/password).

use serde::{Deserialize, Serialize};

use crate::config::Credentials;
use crate::http::{self, HttpOptions};

use super::{ExportError, ERROR_BODY_CHARS};

/// Cookie name the admin API uses for session auth.
pub const SESSION_COOKIE: &str = "ghost-admin-api-session";

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    data: Option<SessionData>,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    #[serde(default)]
    session_id: Option<String>,
}

/// `<api_url>/ghost/api/admin` with trailing slashes on `api_url` ignored.
pub fn admin_base(api_url: &str) -> String {
    format!("{}/ghost/api/admin", api_url.trim_end_matches('/'))
}

/// Logs in and returns the session token.
pub fn create_session(
    admin_base: &str,
    creds: &Credentials,
    opts: &HttpOptions,
) -> Result<String, ExportError> {
    let url = format!("{}/auth/session/", admin_base);
    let body = serde_json::to_vec(&SessionRequest {
        username: &creds.username,
        password: &creds.password,
    })?;
    let resp = http::post_json(&url, &body, opts)?;
    if !resp.is_success() {
        return Err(ExportError::Auth {
            code: resp.status,
            body: resp.body_snippet(ERROR_BODY_CHARS),
        });
    }

    token_from_body(&resp.body)
        .or_else(|| {
            resp.header_values("Set-Cookie")
                .find_map(token_from_set_cookie)
        })
        .ok_or(ExportError::NoSession)
}

/// `data.session_id` from the JSON body, if present and non-empty.
fn token_from_body(body: &[u8]) -> Option<String> {
    let parsed: SessionResponse = serde_json::from_slice(body).ok()?;
    parsed
        .data?
        .session_id
        .filter(|s| !s.is_empty())
}

/// Value of the session cookie in one `Set-Cookie` header.
fn token_from_set_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name.trim() == SESSION_COOKIE && !value.trim().is_empty()).then(|| value.trim().to_string())
}
