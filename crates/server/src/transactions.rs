//! Ledger endpoints.

use api_types::{
    ApiResponse,
    transaction::{LedgerStatsView, ManualTxNew, TransactionListQuery, TransactionView},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::{
    Hours, ManualTxCmd, Page, TransactionKind, TransactionListFilter, TransactionStatus, User,
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
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<Vec<TransactionView>> {
    let filter = TransactionListFilter {
        kind: query
            .kind
            .as_deref()
            .map(TransactionKind::try_from)
            .transpose()?,
        status: query
            .status
            .as_deref()
            .map(TransactionStatus::try_from)
            .transpose()?,
    };
    let page = state
        .engine
        .list_transactions(user.id, filter, Page::new(query.page, query.limit))
        .await?;
    let pagination = views::pagination(&page);
    let txs = page
        .items
        .iter()
        .map(|tx| views::transaction(tx, user.id))
        .collect();
    Ok(Json(ApiResponse::paged(txs, pagination)))
}

pub async fn stats(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> ApiResult<LedgerStatsView> {
    let stats = state.engine.transaction_stats(user.id).await?;
    ok(views::ledger_stats(&stats))
}

pub async fn manual(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<ManualTxNew>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionView>>), ServerError> {
    let mut cmd = ManualTxCmd::new(
        user.id,
        TransactionKind::try_from(payload.kind.as_str())?,
        Hours::from_f64(payload.amount)?,
        payload.skill,
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    let tx = state.engine.manual_transaction(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(views::transaction(&tx, user.id))),
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TransactionView> {
    let tx = state.engine.transaction(user.id, id).await?;
    ok(views::transaction(&tx, user.id))
}
