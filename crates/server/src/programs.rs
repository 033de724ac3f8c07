//! Community program endpoints.

use api_types::{
    ApiResponse,
    program::{JoinedProgramView, ProgramJoined, ProgramListQuery, ProgramNew, ProgramView},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::{Hours, NewProgramCmd, User};
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
    Query(query): Query<ProgramListQuery>,
) -> ApiResult<Vec<ProgramView>> {
    let category = views::category(query.category.as_deref())?;
    let programs = state.engine.list_programs(category).await?;
    ok(programs.iter().map(views::program).collect())
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<ProgramNew>,
) -> Result<(StatusCode, Json<ApiResponse<ProgramView>>), ServerError> {
    let mut cmd = NewProgramCmd::new(user.id, payload.title);
    if let Some(category) = views::category(payload.category.as_deref())? {
        cmd = cmd.category(category);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(reward) = payload.reward_hours {
        cmd = cmd.reward_hours(Hours::from_f64(reward)?);
    }
    let program = state.engine.create_program(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(views::program(&program))),
    ))
}

pub async fn joined(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<JoinedProgramView>> {
    let programs = state.engine.list_joined_programs(user.id).await?;
    ok(programs
        .iter()
        .map(|(program, role)| JoinedProgramView {
            program: views::program(program),
            role: role.as_str().to_string(),
        })
        .collect())
}

pub async fn join(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProgramJoined> {
    let outcome = state.engine.join_program(user.id, id).await?;
    ok(ProgramJoined {
        program: views::program(&outcome.program),
        transaction: outcome
            .transaction
            .as_ref()
            .map(|tx| views::transaction(tx, user.id)),
    })
}
