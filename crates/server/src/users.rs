//! User directory endpoints.

use api_types::{
    ApiResponse,
    user::{ProfileUpdate, UserListQuery, UserStatsView, UserView},
};
use axum::{Extension, Json, extract::State};
use engine::{Page, ProfileUpdateCmd, User, UserListFilter};
use uuid::Uuid;

use crate::{
    ApiResult,
    extract::{JsonBody, Path, Query},
    ok,
    server::ServerState,
    views,
};

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Vec<UserView>> {
    let filter = UserListFilter {
        search: query.search,
        is_tutor: query.is_tutor,
    };
    let page = state
        .engine
        .list_users(&filter, Page::new(query.page, query.limit))
        .await?;
    let pagination = views::pagination(&page);
    let users = page.items.iter().map(views::user).collect();
    Ok(Json(ApiResponse::paged(users, pagination)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserView> {
    let user = state.engine.user(id).await?;
    ok(views::user(&user))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ProfileUpdate>,
) -> ApiResult<UserView> {
    let cmd = ProfileUpdateCmd {
        display_name: payload.display_name,
        bio: payload.bio,
        photo_url: payload.photo_url,
        interests: payload.interests,
    };
    let updated = state.engine.update_profile(user.id, id, cmd).await?;
    ok(views::user(&updated))
}

pub async fn deactivate(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.engine.deactivate_user(user.id, id).await?;
    ok(())
}

pub async fn stats(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserStatsView> {
    let stats = state.engine.user_stats(id).await?;
    ok(views::user_stats(&stats))
}
