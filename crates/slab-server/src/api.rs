use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::Method,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slab_shared::community::{BoardMessage, LeaderboardEntry, LeaderboardQuery};
use slab_shared::{Collection, RecordId};
use slab_store::{Database, EditorSuite};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::{admin, community};

/// Backups carry every inline image, so they get more room than other bodies.
const BACKUP_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Open editor suites, one per admin session token.
pub type EditorSessions = Arc<Mutex<HashMap<String, EditorSuite>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub editors: EditorSessions,
    pub rate_limiter: RateLimiter,
    pub login_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            editors: Arc::new(Mutex::new(HashMap::new())),
            rate_limiter: RateLimiter::default(),
            login_limiter: RateLimiter::for_logins(),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Multipart image uploads carry some framing on top of the image.
    let body_limit = state.config.max_image_size + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/api/content/{collection}", get(list_content))
        .route("/api/content/{collection}/{id}", get(get_content))
        .route("/api/leaderboard", get(leaderboard))
        .route(
            "/api/messages",
            get(list_messages).post(community::post_message),
        )
        .route("/api/messages/{id}/replies", post(community::reply))
        .route("/api/messages/{id}/like", post(community::like))
        .route("/api/submissions/{kind}", post(community::submit))
        .route("/api/donations", post(community::donate))
        .route("/api/members/register", post(community::register))
        .route("/api/members/login", post(community::login))
        .route("/api/members/logout", post(community::logout))
        .route("/api/members/me", get(community::me))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/session", get(admin::session))
        .route("/api/admin/submissions", get(admin::list_submissions))
        .route(
            "/api/admin/submissions/{kind}/{index}/approve",
            post(admin::approve),
        )
        .route(
            "/api/admin/submissions/{kind}/{index}/reject",
            post(admin::reject),
        )
        .route("/api/admin/donations", get(admin::list_donations))
        .route("/api/admin/editors/{entity}", get(admin::editor_state))
        .route("/api/admin/editors/{entity}/select/{id}", post(admin::select))
        .route("/api/admin/editors/{entity}/new", post(admin::add_new))
        .route("/api/admin/editors/{entity}/draft", patch(admin::update_draft))
        .route("/api/admin/editors/{entity}/image", post(admin::upload_image))
        .route("/api/admin/editors/{entity}/quotes", post(admin::add_quote))
        .route(
            "/api/admin/editors/{entity}/quotes/{index}",
            delete(admin::remove_quote),
        )
        .route("/api/admin/editors/{entity}/save", post(admin::save))
        .route("/api/admin/editors/{entity}/cancel", post(admin::cancel))
        .route("/api/admin/editors/{entity}/delete", post(admin::delete_record))
        .route(
            "/api/admin/backup",
            get(admin::export_backup)
                .post(admin::import_backup)
                .layer(DefaultBodyLimit::max(BACKUP_BODY_LIMIT)),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    require_member_auth: bool,
    collections: Vec<&'static str>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SearchQuery {
    pub search: Option<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.site_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        require_member_auth: state.config.require_member_auth,
        collections: Collection::ALL.iter().map(|c| c.slug()).collect(),
    })
}

fn parse_collection(raw: &str) -> Result<Collection, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::NotFound(format!("unknown collection {raw}")))
}

async fn list_content(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Value>>, ServerError> {
    let collection = parse_collection(&collection)?;
    let records = state.db.lock().await.list_values(collection)?;
    Ok(Json(records))
}

async fn get_content(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, RecordId)>,
) -> Result<Json<Value>, ServerError> {
    let collection = parse_collection(&collection)?;
    let record = state.db.lock().await.get_value(collection, id)?;
    Ok(Json(record))
}

async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ServerError> {
    // Reject unknown levels before touching the store.
    query.level_filter()?;
    let entries = state.db.lock().await.leaderboard(&query)?;
    Ok(Json(entries))
}

async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BoardMessage>>, ServerError> {
    let messages = state
        .db
        .lock()
        .await
        .list_messages(query.search.as_deref())?;
    Ok(Json(messages))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    pub(crate) fn test_state(config: ServerConfig) -> AppState {
        let mut db = Database::open_in_memory().unwrap();
        db.seed_defaults().unwrap();
        AppState::new(db, config)
    }

    pub(crate) async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    pub(crate) async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_and_info() {
        let state = test_state(ServerConfig::default());
        let response = send(&state, "GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");

        let info = json_body(send(&state, "GET", "/info", None, None).await).await;
        assert_eq!(info["name"], "Slab City Legends");
        assert_eq!(info["requireMemberAuth"], true);
    }

    #[tokio::test]
    async fn content_is_public_by_slug_or_key() {
        let state = test_state(ServerConfig::default());
        let characters =
            json_body(send(&state, "GET", "/api/content/characters", None, None).await).await;
        assert_eq!(characters.as_array().unwrap().len(), 4);

        let by_key =
            json_body(send(&state, "GET", "/api/content/slabLocations/1", None, None).await).await;
        assert_eq!(by_key["name"], "Salvation Mountain");

        let missing = send(&state, "GET", "/api/content/slabNope", None, None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let missing = send(&state, "GET", "/api/content/characters/999", None, None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn leaderboard_filters() {
        let state = test_state(ServerConfig::default());
        let all = json_body(send(&state, "GET", "/api/leaderboard", None, None).await).await;
        assert_eq!(all.as_array().unwrap().len(), 12);
        assert_eq!(all[0]["rank"], 1);

        let legends =
            json_body(send(&state, "GET", "/api/leaderboard?level=legend", None, None).await)
                .await;
        assert!(legends
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["level"] == "Legend"));

        let bad = send(&state, "GET", "/api/leaderboard?level=wizard", None, None).await;
        assert_eq!(bad.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn messages_are_searchable() {
        let state = test_state(ServerConfig::default());
        let all = json_body(send(&state, "GET", "/api/messages", None, None).await).await;
        assert_eq!(all.as_array().unwrap().len(), 5);

        let hits =
            json_body(send(&state, "GET", "/api/messages?search=salvation", None, None).await)
                .await;
        let hits = hits.as_array().unwrap();
        assert!(!hits.is_empty());
        assert!(hits.len() < 5);
    }
}
