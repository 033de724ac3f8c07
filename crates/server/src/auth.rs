//! Sign-in endpoints.

use api_types::{auth::VerifyRequest, user::UserView};
use axum::{Extension, extract::State};
use engine::User;

use crate::{ApiResult, Identity, extract::JsonBody, ok, server::ServerState, views};

/// Resolve the caller on sign-in and bump `last_login`.
///
/// The body is optional; its profile hints only apply to new accounts.
pub async fn verify(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    payload: Option<JsonBody<VerifyRequest>>,
) -> ApiResult<UserView> {
    let hints = payload.map(|JsonBody(hints)| hints).unwrap_or_default();
    let user = state
        .engine
        .sign_in(
            &identity.subject,
            &identity.email,
            hints.display_name.as_deref(),
            hints.photo_url.as_deref(),
        )
        .await?;
    tracing::debug!(user = %user.id, "signed in");
    ok(views::user(&user))
}

pub async fn me(Extension(user): Extension<User>) -> ApiResult<UserView> {
    ok(views::user(&user))
}
