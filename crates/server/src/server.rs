use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use std::sync::Arc;

use crate::{
    IdentityVerifier, ServerError, auth, matchmaker, programs, sessions, transactions, tutors,
    users, wallet,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl ServerState {
    pub fn new(engine: Engine, verifier: impl IdentityVerifier + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
            verifier: Arc::new(verifier),
        }
    }
}

type BearerHeader = Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>;

fn bearer(header: BearerHeader) -> Result<Authorization<Bearer>, ServerError> {
    match header {
        Ok(TypedHeader(auth)) => Ok(auth),
        Err(rejection) if rejection.is_missing() => Err(ServerError::Unauthorized(
            "missing bearer token".to_string(),
        )),
        Err(_) => Err(ServerError::Unauthorized(
            "malformed authorization header".to_string(),
        )),
    }
}

/// Verify the bearer token and expose the [`Identity`](crate::Identity).
async fn identify(
    State(state): State<ServerState>,
    header: BearerHeader,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let identity = state.verifier.verify(bearer(header)?.token())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Verify the bearer token and resolve the acting user.
async fn authenticate(
    State(state): State<ServerState>,
    header: BearerHeader,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let identity = state.verifier.verify(bearer(header)?.token())?;
    let user = state
        .engine
        .resolve_user(&identity.subject, &identity.email)
        .await?;
    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get))
        .route("/users/{id}/stats", get(users::stats))
        .route("/tutors", get(tutors::list))
        .route("/tutors/{id}", get(tutors::get))
        .route("/tutors/{id}/reviews", get(tutors::reviews))
}

fn protected_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/users/{id}",
            axum::routing::put(users::update).delete(users::deactivate),
        )
        .route("/wallet", get(wallet::get))
        .route("/wallet/adjust", post(wallet::adjust))
        .route("/tutors", post(tutors::create))
        .route("/tutors/{id}", axum::routing::put(tutors::update))
        .route("/tutors/{id}/reviews", post(tutors::add_review))
        .route("/sessions", get(sessions::list).post(sessions::book))
        .route("/sessions/request", post(sessions::request))
        .route(
            "/sessions/{id}",
            get(sessions::get).put(sessions::update),
        )
        .route("/sessions/{id}/complete", post(sessions::complete))
        .route("/sessions/{id}/cancel", post(sessions::cancel))
        .route("/sessions/{id}/review", post(sessions::review))
        .route("/transactions", get(transactions::list))
        .route("/transactions/stats", get(transactions::stats))
        .route("/transactions/manual", post(transactions::manual))
        .route("/transactions/{id}", get(transactions::get))
        .route("/matchmaker/recommend", post(matchmaker::recommend))
        .route("/matchmaker/suggestions", get(matchmaker::suggestions))
        .route("/programs", get(programs::list).post(programs::create))
        .route("/programs/joined", get(programs::joined))
        .route("/programs/{id}/join", post(programs::join))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

pub fn router(state: ServerState) -> Router {
    let sign_in = Router::new()
        .route("/auth/verify", post(auth::verify))
        .route_layer(middleware::from_fn_with_state(state.clone(), identify));

    let api = public_routes()
        .merge(sign_in)
        .merge(protected_routes(&state));

    Router::new().nest("/api", api).with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
