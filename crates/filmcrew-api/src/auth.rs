use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use filmcrew_db::Database;
use filmcrew_db::models::ProfileRow;
use filmcrew_gateway::dispatcher::Dispatcher;
use filmcrew_types::api::{
    AuthResponse, Claims, MagicLinkRequest, MagicLinkResponse, VerifyTokenRequest,
};

use crate::error::{ApiError, ApiResult};
use crate::oauth::OAuthProvider;
use crate::storage::Storage;

const SIGN_IN_TOKEN_TTL_MINUTES: u32 = 15;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
    pub storage: Storage,
    /// Echo sign-in tokens in the HTTP response instead of only logging
    /// them. Development convenience; never enable in production.
    pub echo_signin_token: bool,
    pub oauth: Option<OAuthProvider>,
    /// CSRF states handed out by the OAuth redirect, awaiting the callback.
    pub oauth_states: Mutex<HashSet<String>>,
}

/// POST /auth/magic-link — issue a single-use sign-in token for an email
/// address. Only the SHA-256 of the token is stored; delivery is the
/// operator's log (there is no mail sender in a local deployment).
pub async fn request_magic_link(
    State(state): State<AppState>,
    Json(req): Json<MagicLinkRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(ApiError::invalid("malformed email address"));
    }

    let token = generate_token();
    state
        .db
        .insert_sign_in_token(&hash_token(&token), &email, SIGN_IN_TOKEN_TTL_MINUTES)?;

    info!("Sign-in token for {}: {}", email, token);

    Ok((
        StatusCode::ACCEPTED,
        Json(MagicLinkResponse {
            status: "sent",
            token: state.echo_signin_token.then_some(token),
        }),
    ))
}

/// POST /auth/magic-link/verify — consume the token and return a session
/// JWT. The profile is created on first sign-in.
pub async fn verify_magic_link(
    State(state): State<AppState>,
    Json(req): Json<VerifyTokenRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = state
        .db
        .consume_sign_in_token(&hash_token(req.token.trim()))?
        .ok_or(ApiError::Unauthorized)?;

    let profile = ensure_profile(&state, &email, None)?;
    let user_id: Uuid = profile
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt profile id: {}", e)))?;

    let token = create_token(&state.jwt_secret, user_id, &profile.display_name)?;

    Ok(Json(AuthResponse {
        user_id,
        display_name: profile.display_name,
        token,
    }))
}

/// Look the profile up by email, creating it on first sign-in. The display
/// name falls back to the email local part when the identity provider gave
/// us nothing better.
pub(crate) fn ensure_profile(
    state: &AppState,
    email: &str,
    display_name: Option<&str>,
) -> ApiResult<ProfileRow> {
    if let Some(row) = state.db.get_profile_by_email(email)? {
        return Ok(row);
    }

    let id = Uuid::new_v4().to_string();
    let fallback = email.split('@').next().unwrap_or(email);
    let display_name = display_name.filter(|n| !n.trim().is_empty()).unwrap_or(fallback);

    state.db.create_profile(&id, email, display_name.trim())?;
    state
        .db
        .get_profile(&id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("profile vanished after insert")))
}

pub(crate) fn create_token(secret: &str, user_id: Uuid, name: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        name: name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub(crate) fn generate_token() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn is_plausible_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::is_plausible_email;

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("grip@setlife.example.com"));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@localhost"));
    }
}
