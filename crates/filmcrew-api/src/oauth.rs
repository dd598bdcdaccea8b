use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use filmcrew_types::api::AuthResponse;

use crate::auth::{AppState, create_token, ensure_profile, generate_token};
use crate::error::{ApiError, ApiResult};

/// A single OAuth 2.0 authorization-code provider, configured entirely by
/// environment. Any provider exposing the standard three endpoints works.
pub struct OAuthProvider {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl OAuthProvider {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            authorize_url: std::env::var("FILMCREW_OAUTH_AUTHORIZE_URL").ok()?,
            token_url: std::env::var("FILMCREW_OAUTH_TOKEN_URL").ok()?,
            userinfo_url: std::env::var("FILMCREW_OAUTH_USERINFO_URL").ok()?,
            client_id: std::env::var("FILMCREW_OAUTH_CLIENT_ID").ok()?,
            client_secret: std::env::var("FILMCREW_OAUTH_CLIENT_SECRET").ok()?,
            redirect_uri: std::env::var("FILMCREW_OAUTH_REDIRECT_URI").ok()?,
            scope: std::env::var("FILMCREW_OAUTH_SCOPE")
                .unwrap_or_else(|_| "openid email profile".into()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

/// GET /auth/oauth — bounce the browser to the provider's consent page.
pub async fn oauth_redirect(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let provider = state.oauth.as_ref().ok_or(ApiError::NotFound)?;

    let csrf = generate_token();
    state
        .oauth_states
        .lock()
        .expect("oauth state lock poisoned")
        .insert(csrf.clone());

    let url = reqwest::Url::parse_with_params(
        &provider.authorize_url,
        &[
            ("response_type", "code"),
            ("client_id", provider.client_id.as_str()),
            ("redirect_uri", provider.redirect_uri.as_str()),
            ("scope", provider.scope.as_str()),
            ("state", csrf.as_str()),
        ],
    )
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Redirect::to(url.as_str()))
}

/// GET /auth/oauth/callback — exchange the code, fetch the user's identity,
/// and return a session JWT. The profile is created on first sign-in.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<AuthResponse>> {
    let provider = state.oauth.as_ref().ok_or(ApiError::NotFound)?;

    let known_state = state
        .oauth_states
        .lock()
        .expect("oauth state lock poisoned")
        .remove(&query.state);
    if !known_state {
        return Err(ApiError::Unauthorized);
    }

    let client = reqwest::Client::new();

    let token: TokenResponse = client
        .post(&provider.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", query.code.as_str()),
            ("redirect_uri", provider.redirect_uri.as_str()),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let user_info: UserInfo = client
        .get(&provider.userinfo_url)
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let email = user_info.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let profile = ensure_profile(&state, &email, user_info.name.as_deref())?;
    let user_id: Uuid = profile
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt profile id: {}", e)))?;

    info!("OAuth sign-in for {} ({})", email, user_id);

    let jwt = create_token(&state.jwt_secret, user_id, &profile.display_name)?;

    Ok(Json(AuthResponse {
        user_id,
        display_name: profile.display_name,
        token: jwt,
    }))
}
