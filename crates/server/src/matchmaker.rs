//! Tutor recommendation endpoints.

use api_types::matchmaker::{RecommendRequest, RecommendationView, SuggestionView};
use axum::{Extension, extract::State};
use engine::{MatchQuery, User};

use crate::{ApiResult, extract::JsonBody, ok, server::ServerState, views};

pub async fn recommend(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<RecommendRequest>,
) -> ApiResult<Vec<RecommendationView>> {
    let mut query = MatchQuery::default();
    if let Some(text) = payload.query {
        query = query.query(text);
    }
    if let Some(category) = views::category(payload.category.as_deref())? {
        query = query.category(category);
    }
    for skill in payload.skills {
        query = query.skill(skill);
    }
    let recommendations = state.engine.recommend(&query).await?;
    ok(recommendations.iter().map(views::recommendation).collect())
}

pub async fn suggestions(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<SuggestionView>> {
    let suggestions = state.engine.suggestions(user.id).await?;
    ok(suggestions.iter().map(views::suggestion).collect())
}
