//! Tutor profile endpoints.

use api_types::{
    ApiResponse,
    tutor::{ReviewNew, ReviewView, TutorListQuery, TutorNew, TutorUpdate, TutorView},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::{
    Hours, Page, TutorListFilter, TutorProfileCmd, TutorSort, TutorUpdateCmd, User,
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
    State(state): State<ServerState>,
    Query(query): Query<TutorListQuery>,
) -> ApiResult<Vec<TutorView>> {
    let filter = TutorListFilter {
        category: views::category(query.category.as_deref())?,
        search: query.search,
        available_only: query.available.unwrap_or(false),
        min_rating: query.min_rating,
        sort: query
            .sort
            .as_deref()
            .map(TutorSort::try_from)
            .transpose()?
            .unwrap_or_default(),
    };
    let page = state
        .engine
        .list_tutors(&filter, Page::new(query.page, query.limit))
        .await?;
    let pagination = views::pagination(&page);
    let tutors = page.items.iter().map(views::tutor).collect();
    Ok(Json(ApiResponse::paged(tutors, pagination)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<TutorNew>,
) -> Result<(StatusCode, Json<ApiResponse<TutorView>>), ServerError> {
    let cmd = TutorProfileCmd {
        expertise: views::expertise_list(payload.expertise)?,
        hourly_rate: Hours::from_f64(payload.hourly_rate)?,
        bio: payload.bio,
        availability: payload
            .availability
            .map(views::availability_from)
            .transpose()?,
    };
    let tutor = state.engine.create_tutor_profile(user.id, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(views::tutor(&tutor))),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TutorView> {
    let tutor = state.engine.tutor(id).await?;
    ok(views::tutor(&tutor))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<TutorUpdate>,
) -> ApiResult<TutorView> {
    let cmd = TutorUpdateCmd {
        expertise: payload.expertise.map(views::expertise_list).transpose()?,
        hourly_rate: payload.hourly_rate.map(Hours::from_f64).transpose()?,
        bio: payload.bio,
        availability: payload
            .availability
            .map(views::availability_from)
            .transpose()?,
    };
    let tutor = state.engine.update_tutor(user.id, id, cmd).await?;
    ok(views::tutor(&tutor))
}

pub async fn reviews(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ReviewView>> {
    let reviews = state.engine.tutor_reviews(id).await?;
    ok(reviews.iter().map(views::review).collect())
}

pub async fn add_review(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ReviewNew>,
) -> Result<(StatusCode, Json<ApiResponse<TutorView>>), ServerError> {
    let tutor = state
        .engine
        .add_review(user.id, id, payload.rating, payload.comment, payload.session_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(views::tutor(&tutor))),
    ))
}
