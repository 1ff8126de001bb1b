// src/utils/session.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::user::{CurrentUser, User},
    state::AppState,
};

/// Name of the cookie carrying the signed session.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
    Danger,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

/// Session payload stored client-side in a signed cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Score of the most recent exam submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_score: Option<i64>,

    /// Question count of the most recent exam submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_total: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
}

/// A change a handler wants applied to the session once it has answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Clears the session and binds it to the given user.
    SignIn(i64),
    SignOut,
    RecordScore { score: i64, total: i64 },
    Flash(Flash),
    /// Drops flashes already shown to the user.
    TakeFlashes,
}

/// Session updates travelling on a response's extensions.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdates(pub Vec<SessionUpdate>);

impl Session {
    pub fn apply(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::SignIn(user_id) => {
                *self = Session {
                    user_id: Some(user_id),
                    ..Session::default()
                };
            }
            SessionUpdate::SignOut => *self = Session::default(),
            SessionUpdate::RecordScore { score, total } => {
                self.last_score = Some(score);
                self.last_total = Some(total);
            }
            SessionUpdate::Flash(flash) => self.flashes.push(flash),
            SessionUpdate::TakeFlashes => self.flashes.clear(),
        }
    }
}

/// Request-scoped view of who is calling and what their session holds.
/// Injected by [`session_middleware`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<CurrentUser>,
    pub session: Session,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    session: Session,
    exp: usize,
}

/// Signs the session into a JWT valid for `ttl_seconds`.
pub fn encode_session(session: &Session, secret: &str, ttl_seconds: u64) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + ttl_seconds as usize;

    let claims = SessionClaims {
        session: session.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a session token.
///
/// Returns `None` for tampered, expired or otherwise invalid tokens.
pub fn decode_session(token: &str, secret: &str) -> Option<Session> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.session)
}

/// Finds a cookie value across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn session_cookie(token: &str, ttl_seconds: u64) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    ))
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Axum Middleware: Session.
///
/// Decodes the session cookie, loads the signed-in user and injects a
/// [`RequestContext`] into the request extensions. After the handler ran,
/// applies the [`SessionUpdates`] attached to the response and re-signs the
/// cookie.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let secret = &state.config.session_secret;
    let session = read_cookie(req.headers(), SESSION_COOKIE)
        .and_then(|token| decode_session(token, secret))
        .unwrap_or_default();

    // A session pointing at a vanished account is treated as anonymous.
    let user = match session.user_id {
        Some(id) => User::find_by_id(&state.pool, id)
            .await?
            .map(CurrentUser::from),
        None => None,
    };

    req.extensions_mut().insert(RequestContext {
        user,
        session: session.clone(),
    });

    let mut response = next.run(req).await;

    if let Some(SessionUpdates(updates)) = response.extensions_mut().remove::<SessionUpdates>() {
        let mut session = session;
        for update in updates {
            session.apply(update);
        }
        let ttl = state.config.session_ttl_secs;
        let token = encode_session(&session, secret, ttl)?;
        response
            .headers_mut()
            .append(header::SET_COOKIE, session_cookie(&token, ttl)?);
    }

    Ok(response)
}
