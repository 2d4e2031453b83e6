//! Admin routes: the password gate, moderation, the editor suite and
//! backups.  Every route except login requires an admin bearer token.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use slab_shared::community::Donation;
use slab_shared::schema::FieldSpec;
use slab_shared::submissions::Submission;
use slab_shared::types::{Decision, SubmissionKind};
use slab_shared::{EntityKind, Notice, RecordId};
use slab_store::{BackupPayload, Database, DraftEditor, ImportStats, Moderation};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::api::AppState;
use crate::auth::require_admin;
use crate::error::ServerError;
use crate::rate_limit::{check_login, ClientIp};

// ─── Gate ───

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    token: String,
    expires_at: String,
    notice: Notice,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    authorized: bool,
    open_drafts: usize,
}

fn password_matches(given: &str, expected: &str) -> bool {
    let given = given.as_bytes();
    let expected = expected.as_bytes();
    given.len() == expected.len() && given.ct_eq(expected).unwrap_u8() == 1
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientIp,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ServerError> {
    check_login(&state.login_limiter, client).await?;

    if !password_matches(&req.password, state.config.effective_admin_password()) {
        warn!(ip = %client.0, "Admin login refused");
        return Err(ServerError::Unauthorized(
            "Please enter the correct admin password.".into(),
        ));
    }

    let session = state
        .db
        .lock()
        .await
        .create_admin_session(state.config.admin_session_ttl_secs)?;
    state
        .editors
        .lock()
        .await
        .insert(session.token.clone(), Default::default());

    info!(ip = %client.0, "Admin session opened");
    Ok(Json(AdminLoginResponse {
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
        notice: Notice::success(
            "Welcome to Admin Panel",
            "You now have access to edit game content.",
        ),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ServerError> {
    let token = require_admin(&headers, &state).await?;

    let dropped = state
        .editors
        .lock()
        .await
        .remove(&token)
        .map(|suite| suite.open_drafts())
        .unwrap_or(0);
    state.db.lock().await.end_admin_session(&token)?;

    info!(discarded_drafts = dropped, "Admin session closed");
    Ok(Json(json!({
        "loggedOut": true,
        "discardedDrafts": dropped,
        "notice": Notice::success("Signed out", ""),
    })))
}

pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let open_drafts = state
        .editors
        .lock()
        .await
        .get(&token)
        .map(|suite| suite.open_drafts())
        .unwrap_or(0);
    Ok(Json(SessionResponse {
        authorized: true,
        open_drafts,
    }))
}

// ─── Moderation ───

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SubmissionsQuery {
    /// `pending` (default) or `all`.
    status: Option<String>,
}

#[derive(Serialize)]
pub struct SubmissionLists {
    story: Vec<Submission>,
    card: Vec<Submission>,
    companion: Vec<Submission>,
}

pub async fn list_submissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SubmissionsQuery>,
) -> Result<Json<SubmissionLists>, ServerError> {
    require_admin(&headers, &state).await?;
    let all = match query.status.as_deref() {
        None | Some("pending") => false,
        Some("all") => true,
        Some(other) => {
            return Err(ServerError::BadRequest(format!(
                "status must be pending or all, not {other}"
            )))
        }
    };

    let db = state.db.lock().await;
    let list = |kind: SubmissionKind| {
        if all {
            db.list_submissions(kind)
        } else {
            db.pending_submissions(kind)
        }
    };
    Ok(Json(SubmissionLists {
        story: list(SubmissionKind::Story)?,
        card: list(SubmissionKind::Card)?,
        companion: list(SubmissionKind::Companion)?,
    }))
}

pub async fn approve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((kind, index)): Path<(String, usize)>,
) -> Result<Json<Value>, ServerError> {
    moderate(state, headers, &kind, index, Decision::Approve).await
}

pub async fn reject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((kind, index)): Path<(String, usize)>,
) -> Result<Json<Value>, ServerError> {
    moderate(state, headers, &kind, index, Decision::Reject).await
}

async fn moderate(
    state: AppState,
    headers: HeaderMap,
    kind: &str,
    index: usize,
    decision: Decision,
) -> Result<Json<Value>, ServerError> {
    require_admin(&headers, &state).await?;
    let kind: SubmissionKind = kind
        .parse()
        .map_err(|_| ServerError::NotFound(format!("unknown submission kind {kind}")))?;

    let outcome = state.db.lock().await.moderate(kind, index, decision)?;

    let body = match &outcome {
        Moderation::Approved {
            submission,
            collection,
            id,
        } => json!({
            "submission": submission,
            "published": { "collection": collection, "id": id },
            "notice": Notice::success(
                "Submission Approved",
                "The submission has been approved and published.",
            ),
        }),
        Moderation::Rejected { submission } => json!({
            "submission": submission,
            "notice": Notice::success("Submission Rejected", "The submission has been rejected."),
        }),
        Moderation::AlreadyDecided { submission } => json!({
            "submission": submission,
            "notice": Notice::success(
                "No change",
                format!("This submission was already {}.", submission.status.as_str()),
            ),
        }),
    };
    Ok(Json(body))
}

pub async fn list_donations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Donation>>, ServerError> {
    require_admin(&headers, &state).await?;
    let donations = state.db.lock().await.list_donations()?;
    Ok(Json(donations))
}

// ─── Editors ───

fn parse_entity(raw: &str) -> Result<EntityKind, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::NotFound(format!("no editor for {raw}")))
}

fn kind_title(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Character => "Character",
        EntityKind::Location => "Location",
        EntityKind::Mission => "Mission",
        EntityKind::Companion => "Companion",
        EntityKind::Expansion => "Expansion",
        EntityKind::Card => "Card",
        EntityKind::Story => "Story",
    }
}

/// Run `op` against this session's editor for `kind`.  Lock order is
/// editors, then the database.
async fn with_editor<T>(
    state: &AppState,
    token: &str,
    kind: EntityKind,
    op: impl FnOnce(&mut dyn DraftEditor, &mut Database) -> Result<T, ServerError>,
) -> Result<T, ServerError> {
    let mut editors = state.editors.lock().await;
    let suite = editors.entry(token.to_string()).or_default();
    let mut db = state.db.lock().await;
    op(suite.editor(kind), &mut db)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    entity: EntityKind,
    fields: &'static [FieldSpec],
    editing: bool,
    is_new: bool,
    draft: Option<Value>,
    records: Vec<Value>,
}

#[derive(Serialize)]
pub struct DraftResponse {
    draft: Value,
}

pub async fn editor_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
) -> Result<Json<EditorView>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let view = with_editor(&state, &token, kind, |editor, db| {
        let draft = editor.draft_value()?;
        let mut records = Vec::new();
        for collection in kind.collections() {
            records.extend(db.list_values(*collection)?);
        }
        Ok(EditorView {
            entity: kind,
            fields: editor.fields(),
            editing: draft.is_some(),
            is_new: editor.is_new(),
            draft,
            records,
        })
    })
    .await?;
    Ok(Json(view))
}

pub async fn select(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((entity, id)): Path<(String, RecordId)>,
) -> Result<Json<DraftResponse>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let draft = with_editor(&state, &token, kind, |editor, db| {
        Ok(editor.select(db, id)?)
    })
    .await?;
    Ok(Json(DraftResponse { draft }))
}

pub async fn add_new(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
) -> Result<Json<DraftResponse>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let draft = with_editor(&state, &token, kind, |editor, db| Ok(editor.add_new(db)?)).await?;
    Ok(Json(DraftResponse { draft }))
}

#[derive(Deserialize)]
pub struct DraftUpdate {
    field: String,
    value: String,
}

pub async fn update_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
    Json(update): Json<DraftUpdate>,
) -> Result<Json<DraftResponse>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let draft = with_editor(&state, &token, kind, |editor, _| {
        Ok(editor.update(&update.field, &update.value)?)
    })
    .await?;
    Ok(Json(DraftResponse { draft }))
}

pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<DraftResponse>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let mime = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {e}")))?;
            upload = Some((mime, data));
            break;
        }
    }
    let (mime, data) = upload.ok_or_else(|| {
        ServerError::BadRequest("Missing 'file' field in multipart form".to_string())
    })?;

    let max = state.config.max_image_size;
    let draft = with_editor(&state, &token, kind, |editor, _| {
        Ok(editor.set_image(&mime, &data, max)?)
    })
    .await?;
    info!(entity = %kind, size = data.len(), mime = %mime, "Image attached to draft");
    Ok(Json(DraftResponse { draft }))
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    text: String,
}

pub async fn add_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<DraftResponse>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let draft = with_editor(&state, &token, kind, |editor, _| {
        Ok(editor.push_item("quotes", &req.text)?)
    })
    .await?;
    Ok(Json(DraftResponse { draft }))
}

pub async fn remove_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((entity, index)): Path<(String, usize)>,
) -> Result<Json<DraftResponse>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let draft = with_editor(&state, &token, kind, |editor, _| {
        Ok(editor.remove_item("quotes", index)?)
    })
    .await?;
    Ok(Json(DraftResponse { draft }))
}

pub async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let saved = with_editor(&state, &token, kind, |editor, db| Ok(editor.save(db)?)).await?;

    let notice = if saved.inserted {
        Notice::success(
            format!("{} Added", kind_title(kind)),
            format!("{} has been added to the game.", saved.label),
        )
    } else {
        Notice::success(
            format!("{} Updated", kind_title(kind)),
            format!("{} has been updated successfully.", saved.label),
        )
    };
    Ok(Json(json!({ "saved": saved, "notice": notice })))
}

pub async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let cancelled = with_editor(&state, &token, kind, |editor, _| Ok(editor.cancel())).await?;
    Ok(Json(json!({ "cancelled": cancelled })))
}

pub async fn delete_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let token = require_admin(&headers, &state).await?;
    let kind = parse_entity(&entity)?;
    let deleted = with_editor(&state, &token, kind, |editor, db| Ok(editor.delete(db)?)).await?;
    let notice = Notice::success(
        "Deleted Successfully",
        format!("{} has been removed.", deleted.label),
    );
    Ok(Json(json!({ "deleted": deleted, "notice": notice })))
}

// ─── Backup ───

pub async fn export_backup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BackupPayload>, ServerError> {
    require_admin(&headers, &state).await?;
    let payload = state.db.lock().await.export_backup()?;
    Ok(Json(payload))
}

#[derive(Serialize)]
pub struct ImportResponse {
    stats: ImportStats,
    notice: Notice,
}

pub async fn import_backup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BackupPayload>,
) -> Result<Json<ImportResponse>, ServerError> {
    require_admin(&headers, &state).await?;
    let stats = state.db.lock().await.import_backup(&payload)?;
    let notice = Notice::success(
        "Backup restored",
        format!(
            "{} collections replaced with {} records.",
            stats.collections_replaced, stats.records_imported
        ),
    );
    Ok(Json(ImportResponse { stats, notice }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{json_body, send, test_state};
    use crate::api::build_router;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    const BOUNDARY: &str = "slab-boundary";

    async fn upload(
        state: &AppState,
        token: &str,
        field: &str,
        content_type: &str,
        data: &[u8],
    ) -> Response {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/admin/editors/location/image")
            .header("authorization", format!("Bearer {token}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    fn config() -> ServerConfig {
        ServerConfig {
            admin_password: Some("correct horse".into()),
            ..Default::default()
        }
    }

    async fn admin_token(state: &AppState) -> String {
        let response = send(
            state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "password": "correct horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn password_compare() {
        assert!(password_matches("slab-admin", "slab-admin"));
        assert!(!password_matches("slab-admi", "slab-admin"));
        assert!(!password_matches("", "slab-admin"));
    }

    #[tokio::test]
    async fn wrong_password_is_denied_with_a_notice() {
        let state = test_state(config());
        let response = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "password": "nope" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["notice"]["title"], "Access denied");
        assert_eq!(body["notice"]["variant"], "destructive");

        let response = send(&state, "GET", "/api/admin/session", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn fallback_password_only_when_unset() {
        let state = test_state(ServerConfig::default());
        let response = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "password": "slab-admin" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let state = test_state(config());
        let response = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "password": "slab-admin" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_is_throttled() {
        let state = test_state(config());
        for _ in 0..5 {
            let response = send(
                &state,
                "POST",
                "/api/admin/login",
                None,
                Some(json!({ "password": "nope" })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        let response = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "password": "correct horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn logout_ends_the_session_and_drops_drafts() {
        let state = test_state(config());
        let token = admin_token(&state).await;

        send(&state, "POST", "/api/admin/editors/character/select/1", Some(&token), None).await;
        let session = json_body(send(&state, "GET", "/api/admin/session", Some(&token), None).await).await;
        assert_eq!(session["openDrafts"], 1);

        let response = send(&state, "POST", "/api/admin/logout", Some(&token), None).await;
        assert_eq!(json_body(response).await["discardedDrafts"], 1);

        let response = send(&state, "GET", "/api/admin/session", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.editors.lock().await.is_empty());
    }

    #[tokio::test]
    async fn editor_round_trip() {
        let state = test_state(config());
        let token = admin_token(&state).await;
        let t = Some(token.as_str());

        let new = json_body(send(&state, "POST", "/api/admin/editors/character/new", t, None).await).await;
        let id = new["draft"]["id"].as_i64().unwrap();
        assert_eq!(new["draft"]["name"], "New Character");

        send(
            &state,
            "PATCH",
            "/api/admin/editors/character/draft",
            t,
            Some(json!({ "field": "name", "value": "Generator Gina" })),
        )
        .await;
        send(
            &state,
            "POST",
            "/api/admin/editors/character/quotes",
            t,
            Some(json!({ "text": "Keep the lights on" })),
        )
        .await;
        let draft = json_body(
            send(&state, "DELETE", "/api/admin/editors/character/quotes/0", t, None).await,
        )
        .await;
        assert_eq!(draft["draft"]["quotes"], json!(["Keep the lights on"]));

        // Nothing published until save.
        let missing = send(&state, "GET", &format!("/api/content/characters/{id}"), None, None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let saved = json_body(send(&state, "POST", "/api/admin/editors/character/save", t, None).await).await;
        assert_eq!(saved["notice"]["title"], "Character Added");
        assert_eq!(saved["saved"]["inserted"], true);

        let published =
            json_body(send(&state, "GET", &format!("/api/content/characters/{id}"), None, None).await)
                .await;
        assert_eq!(published["name"], "Generator Gina");

        let view = json_body(send(&state, "GET", "/api/admin/editors/character", t, None).await).await;
        assert_eq!(view["editing"], false);
        assert_eq!(view["records"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn blank_required_field_is_rejected() {
        let state = test_state(config());
        let token = admin_token(&state).await;
        let t = Some(token.as_str());

        send(&state, "POST", "/api/admin/editors/location/select/1", t, None).await;
        send(
            &state,
            "PATCH",
            "/api/admin/editors/location/draft",
            t,
            Some(json!({ "field": "name", "value": "  " })),
        )
        .await;
        let response = send(&state, "POST", "/api/admin/editors/location/save", t, None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["notice"]["title"], "Missing required fields");

        let stored = json_body(send(&state, "GET", "/api/content/locations/1", None, None).await).await;
        assert_eq!(stored["name"], "Salvation Mountain");
    }

    #[tokio::test]
    async fn editor_routes_need_a_draft_and_an_admin() {
        let state = test_state(config());
        let response = send(&state, "POST", "/api/admin/editors/mission/save", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = admin_token(&state).await;
        let response =
            send(&state, "POST", "/api/admin/editors/mission/save", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(&state, "GET", "/api/admin/editors/wizard", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_upload_attaches_to_the_draft() {
        let state = test_state(config());
        let token = admin_token(&state).await;
        send(&state, "POST", "/api/admin/editors/location/select/1", Some(&token), None).await;

        let png = [0x89, b'P', b'N', b'G'];
        let response = upload(&state, &token, "picture", "image/png", &png).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = upload(&state, &token, "file", "text/plain", b"not an image").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = upload(&state, &token, "file", "image/png", &png).await;
        assert_eq!(response.status(), StatusCode::OK);
        let draft = json_body(response).await;
        assert!(draft["draft"]["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));

        // Still a draft; the published record keeps its image.
        let published =
            json_body(send(&state, "GET", "/api/content/locations/1", None, None).await).await;
        assert!(!published["image"]
            .as_str()
            .unwrap_or_default()
            .starts_with("data:"));
    }

    #[tokio::test]
    async fn moderation_publishes_once() {
        let state = test_state(ServerConfig {
            require_member_auth: false,
            ..config()
        });
        let story = json!({
            "title": "Desert Nights",
            "author": "Ann",
            "email": "a@x.com",
            "story": "..."
        });
        let response = send(&state, "POST", "/api/submissions/story", None, Some(story)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let token = admin_token(&state).await;
        let t = Some(token.as_str());
        let pending = json_body(send(&state, "GET", "/api/admin/submissions", t, None).await).await;
        assert_eq!(pending["story"].as_array().unwrap().len(), 1);
        assert_eq!(pending["story"][0]["status"], "pending");

        let approved = json_body(
            send(&state, "POST", "/api/admin/submissions/story/0/approve", t, None).await,
        )
        .await;
        assert_eq!(approved["notice"]["title"], "Submission Approved");
        assert_eq!(approved["published"]["collection"], "published-stories");

        let again = json_body(
            send(&state, "POST", "/api/admin/submissions/story/0/reject", t, None).await,
        )
        .await;
        assert_eq!(again["notice"]["title"], "No change");

        let stories =
            json_body(send(&state, "GET", "/api/content/published-stories", None, None).await)
                .await;
        assert_eq!(stories.as_array().unwrap().len(), 1);
        assert_eq!(stories[0]["title"], "Desert Nights");

        let pending = json_body(send(&state, "GET", "/api/admin/submissions", t, None).await).await;
        assert!(pending["story"].as_array().unwrap().is_empty());
        let all =
            json_body(send(&state, "GET", "/api/admin/submissions?status=all", t, None).await)
                .await;
        assert_eq!(all["story"][0]["status"], "approved");
    }

    #[tokio::test]
    async fn donations_are_listed_for_admins_only() {
        let state = test_state(ServerConfig {
            require_member_auth: false,
            ..config()
        });
        send(
            &state,
            "POST",
            "/api/donations",
            None,
            Some(json!({
                "cause": "game",
                "amount": 20,
                "donorName": "Ann",
                "donorEmail": "ann@slab.city"
            })),
        )
        .await;

        let response = send(&state, "GET", "/api/admin/donations", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = admin_token(&state).await;
        let donations =
            json_body(send(&state, "GET", "/api/admin/donations", Some(&token), None).await).await;
        assert_eq!(donations[0]["amountCents"], 2000);
        assert_eq!(donations[0]["cause"], "game");
    }

    #[tokio::test]
    async fn backup_round_trip() {
        let state = test_state(config());
        let token = admin_token(&state).await;
        let t = Some(token.as_str());

        let backup = json_body(send(&state, "GET", "/api/admin/backup", t, None).await).await;
        assert_eq!(backup["collections"]["slabCharacters"].as_array().unwrap().len(), 4);

        let mut trimmed = backup.clone();
        trimmed["collections"] = json!({ "slabCharacters": [backup["collections"]["slabCharacters"][0]] });
        let response = send(&state, "POST", "/api/admin/backup", t, Some(trimmed)).await;
        let body = json_body(response).await;
        assert_eq!(body["stats"]["recordsImported"], 1);

        let characters =
            json_body(send(&state, "GET", "/api/content/characters", None, None).await).await;
        assert_eq!(characters.as_array().unwrap().len(), 1);
        let locations =
            json_body(send(&state, "GET", "/api/content/locations", None, None).await).await;
        assert_eq!(locations.as_array().unwrap().len(), 5);
    }
}
