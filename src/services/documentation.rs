use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the Wrapped Party backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::party::create_party,
        crate::routes::party::get_party,
        crate::routes::party::join_party,
        crate::routes::party::get_users,
        crate::routes::party::get_party_state,
        crate::routes::party::get_current_round,
        crate::routes::party::get_round_songs,
        crate::routes::party::get_round_results,
        crate::routes::party::get_final_reveal,
        crate::routes::party::submit_guess,
        crate::routes::party::get_user_guesses,
        crate::routes::party::get_leaderboard,
        crate::routes::admin::start_competition,
        crate::routes::admin::next_round,
        crate::routes::admin::get_party_songs,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::party::CreatePartyRequest,
            crate::dto::party::CreatePartyResponse,
            crate::dto::party::SongInput,
            crate::dto::party::JoinPartyRequest,
            crate::dto::party::JoinPartyResponse,
            crate::dto::party::PartyPhaseDto,
            crate::dto::party::PartyStateResponse,
            crate::dto::party::PartyOverviewResponse,
            crate::dto::party::ParticipantResponse,
            crate::dto::party::SongResponse,
            crate::dto::party::RoundSongsResponse,
            crate::dto::party::CurrentRoundResponse,
            crate::dto::party::RevealedSongResponse,
            crate::dto::party::SubmitGuessRequest,
            crate::dto::party::GuessResponse,
            crate::dto::party::LeaderboardEntryResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "parties", description = "Party creation and membership"),
        (name = "rounds", description = "Round contents and owner reveals"),
        (name = "guesses", description = "Guess submission and scoring"),
        (name = "admin", description = "Host controls, gated by the party admin token"),
    )
)]
pub struct ApiDoc;
