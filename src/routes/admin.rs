use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::party::{PartyStateResponse, RevealedSongResponse},
    error::AppError,
    services::{party_service, results_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Endpoints reserved to the holder of the party's admin token.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/parties/{id}/start", post(start_competition))
        .route("/parties/{id}/next", post(next_round))
        .route("/parties/{id}/songs", get(get_party_songs))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Shuffle every submitted song into rounds and open round 1.
#[utoipa::path(
    post,
    path = "/parties/{id}/start",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token returned at party creation"),
        ("id" = String, Path, description = "Party identifier"),
    ),
    responses(
        (status = 200, description = "Competition started", body = PartyStateResponse),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 409, description = "No songs submitted, or already started"),
    )
)]
pub async fn start_competition(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PartyStateResponse>, AppError> {
    let progress = party_service::start_competition(&state, &id).await?;
    Ok(Json(progress.into()))
}

/// Reveal the current round, or move on to the next one once revealed.
#[utoipa::path(
    post,
    path = "/parties/{id}/next",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token returned at party creation"),
        ("id" = String, Path, description = "Party identifier"),
    ),
    responses(
        (status = 200, description = "Updated round cursor", body = PartyStateResponse),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 409, description = "Competition not running"),
    )
)]
pub async fn next_round(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PartyStateResponse>, AppError> {
    let progress = party_service::next_round(&state, &id).await?;
    Ok(Json(progress.into()))
}

/// Whole song pool with owners, for the host screen.
#[utoipa::path(
    get,
    path = "/parties/{id}/songs",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token returned at party creation"),
        ("id" = String, Path, description = "Party identifier"),
    ),
    responses(
        (status = 200, description = "Songs with owners", body = [RevealedSongResponse]),
        (status = 401, description = "Missing or invalid admin token"),
    )
)]
pub async fn get_party_songs(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RevealedSongResponse>>, AppError> {
    let songs = results_service::get_party_songs(&state, &id).await?;
    Ok(Json(songs.into_iter().map(Into::into).collect()))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    Path(party_id): Path<String>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    party_service::require_admin(&state, &party_id, provided).await?;
    Ok(next.run(req).await)
}
