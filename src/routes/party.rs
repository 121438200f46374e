use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::party::{
        CreatePartyRequest, CreatePartyResponse, CurrentRoundResponse, GuessResponse,
        JoinPartyRequest, JoinPartyResponse, LeaderboardEntryResponse, LeaderboardQuery,
        ParticipantResponse, PartyOverviewResponse, PartyStateResponse, ResultsQuery,
        RevealedSongResponse, RoundSongsResponse, SubmitGuessRequest,
    },
    error::AppError,
    services::{guess_service, party_service, results_service},
    state::SharedState,
};

/// Endpoints available to every participant of a party.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/parties", post(create_party))
        .route("/parties/{id}", get(get_party))
        .route("/parties/{id}/join", post(join_party))
        .route("/parties/{id}/users", get(get_users))
        .route("/parties/{id}/state", get(get_party_state))
        .route("/parties/{id}/round", get(get_current_round))
        .route("/parties/{id}/rounds/{round}", get(get_round_songs))
        .route("/parties/{id}/results", get(get_round_results))
        .route("/parties/{id}/reveal", get(get_final_reveal))
        .route("/parties/{id}/guess", post(submit_guess))
        .route("/parties/{id}/guesses/{user_id}", get(get_user_guesses))
        .route("/parties/{id}/leaderboard", get(get_leaderboard))
}

/// Open a new party and hand out its admin token.
#[utoipa::path(
    post,
    path = "/parties",
    tag = "parties",
    request_body = CreatePartyRequest,
    responses(
        (status = 201, description = "Party created", body = CreatePartyResponse),
        (status = 400, description = "Invalid party name or round size"),
    )
)]
pub async fn create_party(
    State(state): State<SharedState>,
    Json(payload): Json<CreatePartyRequest>,
) -> Result<(StatusCode, Json<CreatePartyResponse>), AppError> {
    payload.validate()?;
    let created =
        party_service::create_party(&state, &payload.name, payload.songs_per_round).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/parties/{id}",
    tag = "parties",
    params(("id" = String, Path, description = "Party identifier")),
    responses(
        (status = 200, description = "Party summary", body = PartyOverviewResponse),
        (status = 404, description = "Unknown party"),
    )
)]
pub async fn get_party(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PartyOverviewResponse>, AppError> {
    let overview = party_service::get_party_overview(&state, &id).await?;
    Ok(Json(overview.into()))
}

/// Join a party with exactly three songs.
#[utoipa::path(
    post,
    path = "/parties/{id}/join",
    tag = "parties",
    params(("id" = String, Path, description = "Party identifier")),
    request_body = JoinPartyRequest,
    responses(
        (status = 201, description = "Participant registered", body = JoinPartyResponse),
        (status = 400, description = "Wrong number of songs or blank fields"),
        (status = 404, description = "Unknown party"),
    )
)]
pub async fn join_party(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<JoinPartyRequest>,
) -> Result<(StatusCode, Json<JoinPartyResponse>), AppError> {
    payload.validate()?;
    let songs = payload.songs.into_iter().map(Into::into).collect();
    let user_id = party_service::join_party(&state, &id, &payload.name, songs).await?;
    Ok((StatusCode::CREATED, Json(JoinPartyResponse { user_id })))
}

#[utoipa::path(
    get,
    path = "/parties/{id}/users",
    tag = "parties",
    params(("id" = String, Path, description = "Party identifier")),
    responses((status = 200, description = "Participants ordered by name", body = [ParticipantResponse]))
)]
pub async fn get_users(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ParticipantResponse>>, AppError> {
    let users = party_service::get_users(&state, &id).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/parties/{id}/state",
    tag = "parties",
    params(("id" = String, Path, description = "Party identifier")),
    responses((status = 200, description = "Round cursor", body = PartyStateResponse))
)]
pub async fn get_party_state(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<PartyStateResponse>, AppError> {
    let progress = party_service::get_party_state(&state, &id).await?;
    Ok(Json(progress.into()))
}

/// Songs of the round being played.
#[utoipa::path(
    get,
    path = "/parties/{id}/round",
    tag = "rounds",
    params(("id" = String, Path, description = "Party identifier")),
    responses(
        (status = 200, description = "Current round", body = CurrentRoundResponse),
        (status = 409, description = "Competition has not started"),
    )
)]
pub async fn get_current_round(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<CurrentRoundResponse>, AppError> {
    let current = party_service::get_current_round(&state, &id).await?;
    Ok(Json(current.into()))
}

#[utoipa::path(
    get,
    path = "/parties/{id}/rounds/{round}",
    tag = "rounds",
    params(
        ("id" = String, Path, description = "Party identifier"),
        ("round" = i64, Path, description = "1-based round number"),
    ),
    responses(
        (status = 200, description = "Songs of the round in play order", body = RoundSongsResponse),
        (status = 400, description = "Round number below 1"),
    )
)]
pub async fn get_round_songs(
    State(state): State<SharedState>,
    Path((id, round)): Path<(String, i64)>,
) -> Result<Json<RoundSongsResponse>, AppError> {
    let songs = party_service::get_round_songs(&state, &id, round).await?;
    Ok(Json(songs.into()))
}

/// Owners of a round's songs, available once the round was revealed.
#[utoipa::path(
    get,
    path = "/parties/{id}/results",
    tag = "rounds",
    params(("id" = String, Path, description = "Party identifier"), ResultsQuery),
    responses(
        (status = 200, description = "Revealed songs", body = [RevealedSongResponse]),
        (status = 403, description = "Round not revealed yet"),
    )
)]
pub async fn get_round_results(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Vec<RevealedSongResponse>>, AppError> {
    let results = results_service::get_round_results(&state, &id, query.round).await?;
    Ok(Json(results.into_iter().map(Into::into).collect()))
}

/// Every played song with its owners, once the party is over.
#[utoipa::path(
    get,
    path = "/parties/{id}/reveal",
    tag = "rounds",
    params(("id" = String, Path, description = "Party identifier")),
    responses(
        (status = 200, description = "Final reveal", body = [RevealedSongResponse]),
        (status = 403, description = "Party still running"),
    )
)]
pub async fn get_final_reveal(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RevealedSongResponse>>, AppError> {
    let reveal = results_service::get_final_reveal(&state, &id).await?;
    Ok(Json(reveal.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/parties/{id}/guess",
    tag = "guesses",
    params(("id" = String, Path, description = "Party identifier")),
    request_body = SubmitGuessRequest,
    responses(
        (status = 204, description = "Guess recorded"),
        (status = 404, description = "Unknown party, song or participant"),
    )
)]
pub async fn submit_guess(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<SubmitGuessRequest>,
) -> Result<StatusCode, AppError> {
    guess_service::submit_guess(
        &state,
        &id,
        payload.guesser_id,
        payload.song_id,
        payload.guessed_user_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/parties/{id}/guesses/{user_id}",
    tag = "guesses",
    params(
        ("id" = String, Path, description = "Party identifier"),
        ("user_id" = u32, Path, description = "Guessing participant"),
    ),
    responses((status = 200, description = "Live guesses of the participant", body = [GuessResponse]))
)]
pub async fn get_user_guesses(
    State(state): State<SharedState>,
    Path((id, user_id)): Path<(String, u32)>,
) -> Result<Json<Vec<GuessResponse>>, AppError> {
    let guesses = guess_service::get_user_guesses(&state, &id, user_id).await?;
    Ok(Json(guesses.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/parties/{id}/leaderboard",
    tag = "guesses",
    params(("id" = String, Path, description = "Party identifier"), LeaderboardQuery),
    responses(
        (status = 200, description = "Scores, best first", body = [LeaderboardEntryResponse]),
        (status = 400, description = "Negative round number"),
    )
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntryResponse>>, AppError> {
    let rows = results_service::get_leaderboard(&state, &id, query.round).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
