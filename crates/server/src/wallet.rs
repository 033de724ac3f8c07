//! Time wallet endpoints.

use api_types::wallet::{WalletAdjust, WalletAdjusted, WalletView};
use axum::{Extension, extract::State};
use engine::{AdjustDirection, Hours, User};

use crate::{ApiResult, extract::JsonBody, ok, server::ServerState, views};

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> ApiResult<WalletView> {
    let wallet = state.engine.wallet(user.id).await?;
    ok(views::wallet(&wallet))
}

pub async fn adjust(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<WalletAdjust>,
) -> ApiResult<WalletAdjusted> {
    let direction = AdjustDirection::try_from(payload.direction.as_str())?;
    let amount = Hours::from_f64(payload.amount)?;
    let (wallet, tx) = state
        .engine
        .adjust_wallet(user.id, amount, direction)
        .await?;
    ok(WalletAdjusted {
        wallet: views::wallet(&wallet),
        transaction: views::transaction(&tx, user.id),
    })
}
