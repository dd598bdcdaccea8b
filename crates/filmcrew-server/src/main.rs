use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{DefaultBodyLimit, State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use filmcrew_api::auth::{self, AppState, AppStateInner};
use filmcrew_api::middleware::require_auth;
use filmcrew_api::oauth::{self, OAuthProvider};
use filmcrew_api::storage::Storage;
use filmcrew_api::{
    avatars, companies, connections, conversations, invitations, jobs, productions, profiles,
};
use filmcrew_gateway::connection;
use filmcrew_gateway::dispatcher::Dispatcher;
use filmcrew_gateway::reconcile;

#[derive(Clone)]
struct ServerState {
    dispatcher: Dispatcher,
    db: Arc<filmcrew_db::Database>,
    jwt_secret: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filmcrew=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("FILMCREW_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("FILMCREW_DB_PATH").unwrap_or_else(|_| "filmcrew.db".into());
    let host = std::env::var("FILMCREW_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FILMCREW_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let storage_dir: PathBuf = std::env::var("FILMCREW_STORAGE_DIR")
        .unwrap_or_else(|_| "./avatar-storage".into())
        .into();
    let reconcile_secs: u64 = std::env::var("FILMCREW_UNREAD_RECONCILE_SECS")
        .unwrap_or_else(|_| "30".into())
        .parse()?;
    let echo_signin_token =
        std::env::var("FILMCREW_ECHO_SIGNIN_TOKEN").map_or(false, |v| v == "1");

    // Init database and storage
    let db = Arc::new(filmcrew_db::Database::open(&PathBuf::from(&db_path))?);
    let storage = Storage::new(storage_dir).await?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let app_state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        jwt_secret: jwt_secret.clone(),
        dispatcher: dispatcher.clone(),
        storage,
        echo_signin_token,
        oauth: OAuthProvider::from_env(),
        oauth_states: Mutex::new(HashSet::new()),
    });

    // Background unread reconciliation: the badge's correctness backstop
    tokio::spawn(reconcile::run_unread_reconciliation(
        db.clone(),
        dispatcher.clone(),
        reconcile_secs,
    ));

    // Routes
    let public_routes = Router::new()
        .route("/auth/magic-link", post(auth::request_magic_link))
        .route("/auth/magic-link/verify", post(auth::verify_magic_link))
        .route("/auth/oauth", get(oauth::oauth_redirect))
        .route("/auth/oauth/callback", get(oauth::oauth_callback))
        .route("/avatars/{user_id}", get(avatars::get_avatar))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/profiles/me", get(profiles::get_me).put(profiles::update_me))
        .route("/profiles/me/avatar", post(avatars::upload_avatar))
        .route("/profiles/{user_id}", get(profiles::get_profile))
        .route(
            "/connections",
            post(connections::request_connection).get(connections::list_connections),
        )
        .route("/connections/{id}", delete(connections::remove_connection))
        .route("/connections/{id}/accept", post(connections::accept_connection))
        .route("/connections/{id}/decline", post(connections::decline_connection))
        .route("/companies", post(companies::create_company))
        .route("/companies/check-slug", get(companies::check_slug))
        .route(
            "/companies/{id}",
            get(companies::get_company).put(companies::update_company),
        )
        .route("/companies/{id}/members", get(companies::list_members))
        .route(
            "/companies/{id}/members/{user_id}",
            delete(companies::remove_member),
        )
        .route("/companies/{id}/leave", post(companies::leave_company))
        .route(
            "/companies/{id}/transfer-ownership",
            post(companies::transfer_ownership),
        )
        .route("/companies/{id}/invitations", post(invitations::invite))
        .route(
            "/companies/{id}/productions",
            post(productions::create_production).get(productions::list_productions),
        )
        .route("/invitations", get(invitations::list_my_invitations))
        .route("/invitations/{id}/accept", post(invitations::accept_invitation))
        .route("/invitations/{id}/decline", post(invitations::decline_invitation))
        .route(
            "/productions/{id}",
            get(productions::get_production).put(productions::update_production),
        )
        .route("/productions/{id}/jobs", post(jobs::create_job))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}/close", post(jobs::close_job))
        .route(
            "/jobs/{id}/applications",
            post(jobs::apply).get(jobs::list_job_applications),
        )
        .route("/applications", get(jobs::my_applications))
        .route("/applications/{id}/decision", post(jobs::decide_application))
        .route(
            "/conversations",
            post(conversations::start_conversation).get(conversations::list_conversations),
        )
        .route(
            "/conversations/{id}/messages",
            get(conversations::get_messages).post(conversations::send_message),
        )
        .route("/conversations/{id}/read", post(conversations::mark_read))
        .route("/unread-count", get(conversations::unread_count))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        // Avatar uploads are the largest accepted bodies
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024))
        .with_state(app_state);

    let ws_state = ServerState {
        dispatcher,
        db,
        jwt_secret,
    };
    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(ws_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("FilmCrew server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(
    State(state): State<ServerState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher, state.db, state.jwt_secret)
    })
}
