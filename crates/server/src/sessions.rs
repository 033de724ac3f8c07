//! Session booking and lifecycle endpoints.

use api_types::{
    ApiResponse,
    session::{
        SessionCancel, SessionCompleted, SessionListQuery, SessionNew, SessionRequest,
        SessionReviewNew, SessionUpdate, SessionView,
    },
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::{
    BookSessionCmd, Hours, Page, SessionListFilter, SessionRequestCmd, SessionStatus,
    SessionUpdateCmd, User,
};
use uuid::Uuid;

use crate::{
    ApiResult,
    ServerError,
    extract::{JsonBody, Path, Query},
    ok,
    server::ServerState,
    views,
};

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<SessionListQuery>,
) -> ApiResult<Vec<SessionView>> {
    let filter = SessionListFilter {
        status: query
            .status
            .as_deref()
            .map(SessionStatus::try_from)
            .transpose()?,
        upcoming: query.upcoming.unwrap_or(false),
    };
    let page = state
        .engine
        .list_sessions(user.id, filter, Page::new(query.page, query.limit))
        .await?;
    let pagination = views::pagination(&page);
    let sessions = page.items.iter().map(views::session).collect();
    Ok(Json(ApiResponse::paged(sessions, pagination)))
}

pub async fn book(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<SessionNew>,
) -> Result<(StatusCode, Json<ApiResponse<SessionView>>), ServerError> {
    let mut cmd = BookSessionCmd::new(
        payload.tutor_id,
        user.id,
        payload.skill,
        Hours::from_f64(payload.duration)?,
        payload.scheduled_date,
        payload.scheduled_time,
    );
    if let Some(category) = views::category(payload.category.as_deref())? {
        cmd = cmd.category(category);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    let session = state.engine.book_session(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(views::session(&session))),
    ))
}

pub async fn request(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<SessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionView>>), ServerError> {
    let session = state
        .engine
        .request_session(SessionRequestCmd {
            tutor_id: payload.tutor_id,
            student_id: user.id,
            skill: payload.skill,
            message: payload.message,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(views::session(&session))),
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionView> {
    let session = state.engine.session(user.id, id).await?;
    ok(views::session(&session))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<SessionUpdate>,
) -> ApiResult<SessionView> {
    let cmd = SessionUpdateCmd {
        status: payload
            .status
            .as_deref()
            .map(SessionStatus::try_from)
            .transpose()?,
        meeting_link: payload.meeting_link,
        notes: payload.notes.map(views::notes_from),
    };
    let session = state.engine.update_session(user.id, id, cmd).await?;
    ok(views::session(&session))
}

pub async fn complete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionCompleted> {
    let (session, tx) = state.engine.complete_session(user.id, id).await?;
    ok(SessionCompleted {
        session: views::session(&session),
        transaction: views::transaction(&tx, user.id),
    })
}

pub async fn cancel(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Option<JsonBody<SessionCancel>>,
) -> ApiResult<SessionView> {
    let reason = payload.and_then(|JsonBody(body)| body.reason);
    let session = state.engine.cancel_session(user.id, id, reason).await?;
    ok(views::session(&session))
}

pub async fn review(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<SessionReviewNew>,
) -> ApiResult<SessionView> {
    let session = state
        .engine
        .review_session(user.id, id, payload.rating, payload.comment)
        .await?;
    ok(views::session(&session))
}
