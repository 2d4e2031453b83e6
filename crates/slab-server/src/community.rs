//! Member accounts and the community write routes: intake forms, the
//! message board and donations.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use slab_shared::accounts::{LoginForm, Member, RegisterForm};
use slab_shared::community::{BoardMessage, DonationForm, PostForm};
use slab_shared::submissions::SubmissionForm;
use slab_shared::types::SubmissionKind;
use slab_shared::Notice;
use tracing::info;

use crate::api::AppState;
use crate::auth::{bearer_token, require_member};
use crate::error::ServerError;
use crate::rate_limit::{check_login, ClientIp};

// ─── Accounts ───

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSessionResponse {
    member: Member,
    token: String,
    expires_at: String,
    notice: Notice,
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<Json<MemberSessionResponse>, ServerError> {
    let db = state.db.lock().await;
    let member = db.register_member(&form)?;
    let session = db.create_member_session(member.id, state.config.member_session_ttl_secs)?;

    Ok(Json(MemberSessionResponse {
        notice: Notice::success(
            "Registration successful",
            format!("Welcome to the Slabs, {}.", member.username),
        ),
        member,
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientIp,
    Json(form): Json<LoginForm>,
) -> Result<Json<MemberSessionResponse>, ServerError> {
    check_login(&state.login_limiter, client).await?;

    let db = state.db.lock().await;
    let member = db.verify_member(&form)?;
    let session = db.create_member_session(member.id, state.config.member_session_ttl_secs)?;

    Ok(Json(MemberSessionResponse {
        notice: Notice::success("Signed in", format!("Welcome back, {}.", member.username)),
        member,
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ServerError> {
    let ended = match bearer_token(&headers) {
        Some(token) => state.db.lock().await.end_member_session(token)?,
        None => false,
    };
    Ok(Json(json!({
        "loggedOut": ended,
        "notice": Notice::success("Signed out", ""),
    })))
}

pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Member>, ServerError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ServerError::Unauthorized("sign in to continue".into()))?;
    let member = state
        .db
        .lock()
        .await
        .member_for_session(token)?
        .ok_or_else(|| ServerError::Unauthorized("session expired or unknown".into()))?;
    Ok(Json(member))
}

// ─── Intake forms ───

fn submitted_notice(kind: SubmissionKind) -> Notice {
    match kind {
        SubmissionKind::Story => Notice::success(
            "Story Submitted!",
            "Thanks for sharing your Slab City experience.",
        ),
        SubmissionKind::Card => Notice::success(
            "Card Submitted!",
            "Thanks for your creative contribution to Slab City.",
        ),
        SubmissionKind::Companion => Notice::success(
            "Companion Submitted!",
            "Thanks for introducing a new friend to Slab City.",
        ),
    }
}

pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ServerError> {
    let kind: SubmissionKind = kind
        .parse()
        .map_err(|_| ServerError::NotFound(format!("unknown submission kind {kind}")))?;
    require_member(&headers, &state).await?;

    let form = SubmissionForm::from_body(kind, body)
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    let index = state.db.lock().await.submit(&form)?;

    Ok(Json(json!({
        "index": index,
        "status": "pending",
        "notice": submitted_notice(kind),
    })))
}

// ─── Message board ───

#[derive(Serialize)]
pub struct MessageResponse {
    message: BoardMessage,
    notice: Notice,
}

pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<PostForm>,
) -> Result<Json<MessageResponse>, ServerError> {
    let caller = require_member(&headers, &state).await?;
    let message = state.db.lock().await.post_message(caller.author(), &form)?;
    Ok(Json(MessageResponse {
        message,
        notice: Notice::success(
            "Message Posted!",
            "Your message has been shared with the Slabbers community.",
        ),
    }))
}

pub async fn reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(form): Json<PostForm>,
) -> Result<Json<MessageResponse>, ServerError> {
    let caller = require_member(&headers, &state).await?;
    let db = state.db.lock().await;
    db.reply_to_message(id, caller.author(), &form)?;
    let message = db.get_message(id)?;
    Ok(Json(MessageResponse {
        message,
        notice: Notice::success(
            "Reply Posted!",
            "Your reply has been added to the conversation.",
        ),
    }))
}

pub async fn like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ServerError> {
    require_member(&headers, &state).await?;
    let likes = state.db.lock().await.like_message(id)?;
    Ok(Json(json!({ "id": id, "likes": likes })))
}

// ─── Donations ───

pub async fn donate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<DonationForm>,
) -> Result<Json<Value>, ServerError> {
    require_member(&headers, &state).await?;
    let donation = state.db.lock().await.record_donation(&form)?;
    info!(donation_id = donation.id, "Donation pledged");

    Ok(Json(json!({
        "donation": donation,
        "notice": Notice::success(
            "Donation Processed!",
            format!(
                "Thank you for contributing to the Slab City community ({}).",
                donation.cause.title()
            ),
        ),
    })))
}
