//! Request and response shapes of the party REST API.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dto::{
        format_system_time,
        validation::{MAX_NAME_LEN, MAX_TITLE_LEN, validate_not_blank},
    },
    services::{
        guess_service::RecordedGuess,
        party_service::{CreatedParty, CurrentRound, PartyOverview, RoundSongs},
    },
    state::{
        lifecycle::PartyPhase,
        party::{NewSong, Participant, RoundProgress, Song},
        scoring::{LeaderboardRow, RevealedSong},
    },
};

/// Separator used when listing every owner of a merged song.
const OWNER_SEPARATOR: &str = ", ";

/// Payload used to open a new party.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePartyRequest {
    #[validate(
        length(min = 1, max = MAX_NAME_LEN),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    /// Songs played per round. Defaults to the server configuration.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub songs_per_round: Option<u32>,
}

/// Identifiers of a freshly created party. The admin token is only ever returned here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePartyResponse {
    pub id: String,
    pub admin_token: String,
}

impl From<CreatedParty> for CreatePartyResponse {
    fn from(value: CreatedParty) -> Self {
        Self {
            id: value.id,
            admin_token: value.admin_token,
        }
    }
}

/// Song submitted by a joining participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SongInput {
    #[validate(
        length(min = 1, max = MAX_TITLE_LEN),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    /// Catalog identifier; songs sharing one are treated as the same song.
    #[serde(default, alias = "youtube_id")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl From<SongInput> for NewSong {
    fn from(value: SongInput) -> Self {
        NewSong::new(value.title, value.external_id, value.thumbnail_url)
    }
}

/// Payload sent by a participant joining a party with their songs.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinPartyRequest {
    #[serde(alias = "user_name")]
    #[validate(
        length(min = 1, max = MAX_NAME_LEN),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(nested)]
    pub songs: Vec<SongInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinPartyResponse {
    pub user_id: u32,
}

/// Lifecycle phase exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PartyPhaseDto {
    Joining,
    Playing,
    Revealed,
    Completed,
}

impl From<PartyPhase> for PartyPhaseDto {
    fn from(value: PartyPhase) -> Self {
        match value {
            PartyPhase::Joining => PartyPhaseDto::Joining,
            PartyPhase::InRound {
                revealed: false, ..
            } => PartyPhaseDto::Playing,
            PartyPhase::InRound { revealed: true, .. } => PartyPhaseDto::Revealed,
            PartyPhase::Completed => PartyPhaseDto::Completed,
        }
    }
}

/// Round cursor of a party.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct PartyStateResponse {
    pub started: bool,
    pub current_round: u32,
    pub show_results: bool,
}

impl From<RoundProgress> for PartyStateResponse {
    fn from(value: RoundProgress) -> Self {
        Self {
            started: value.started,
            current_round: value.current_round,
            show_results: value.show_results,
        }
    }
}

/// Public summary of a party.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PartyOverviewResponse {
    pub id: String,
    pub name: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub phase: PartyPhaseDto,
    pub state: PartyStateResponse,
    pub songs_per_round: u32,
    pub total_songs: usize,
    pub participant_count: usize,
    pub round_count: u32,
    pub game_over: bool,
}

impl From<PartyOverview> for PartyOverviewResponse {
    fn from(value: PartyOverview) -> Self {
        Self {
            game_over: value.game_over(),
            created_at: format_system_time(value.created_at),
            phase: value.phase.into(),
            state: value.progress.into(),
            songs_per_round: value.songs_per_round,
            total_songs: value.total_songs,
            participant_count: value.participant_count,
            round_count: value.round_count,
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: u32,
    pub name: String,
}

impl From<Participant> for ParticipantResponse {
    fn from(value: Participant) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Song as shown while its owner is still a secret.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SongResponse {
    pub id: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Play position; absent for songs submitted after the shuffle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle_index: Option<u32>,
}

impl From<Song> for SongResponse {
    fn from(value: Song) -> Self {
        Self {
            id: value.id,
            title: value.title,
            external_id: value.external_id,
            thumbnail_url: value.thumbnail_url,
            shuffle_index: value.shuffle_index,
        }
    }
}

/// Songs of a round in play order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoundSongsResponse {
    pub round: u32,
    pub songs: Vec<SongResponse>,
}

impl From<RoundSongs> for RoundSongsResponse {
    fn from(value: RoundSongs) -> Self {
        Self {
            round: value.round,
            songs: value.songs.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentRoundResponse {
    pub round: u32,
    pub revealed: bool,
    /// Set once every populated round was played and revealed.
    pub game_over: bool,
    pub songs: Vec<SongResponse>,
}

impl From<CurrentRound> for CurrentRoundResponse {
    fn from(value: CurrentRound) -> Self {
        Self {
            round: value.round,
            revealed: value.revealed,
            game_over: value.songs.is_empty() && !value.revealed,
            songs: value.songs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Song together with everyone who submitted it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevealedSongResponse {
    #[serde(flatten)]
    pub song: SongResponse,
    /// Comma-separated owner names, in join order.
    pub owner_names: String,
}

impl From<RevealedSong> for RevealedSongResponse {
    fn from(value: RevealedSong) -> Self {
        Self {
            owner_names: value.owner_names.join(OWNER_SEPARATOR),
            song: value.song.into(),
        }
    }
}

/// Payload of a guess. Sending another guess for the same song replaces the previous one.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitGuessRequest {
    pub guesser_id: u32,
    pub song_id: u32,
    #[serde(alias = "guessed_owner_id")]
    pub guessed_user_id: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GuessResponse {
    pub song_id: u32,
    pub guessed_user_id: u32,
    pub guessed_user_name: String,
}

impl From<RecordedGuess> for GuessResponse {
    fn from(value: RecordedGuess) -> Self {
        Self {
            song_id: value.song_id,
            guessed_user_id: value.guessed_owner_id,
            guessed_user_name: value.guessed_owner_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntryResponse {
    pub user_id: u32,
    pub user_name: String,
    pub score: u32,
}

impl From<LeaderboardRow> for LeaderboardEntryResponse {
    fn from(value: LeaderboardRow) -> Self {
        Self {
            user_id: value.participant_id,
            user_name: value.name,
            score: value.score,
        }
    }
}

/// Round selector of the results endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultsQuery {
    /// 1-based round number.
    pub round: i64,
}

/// Round selector of the leaderboard endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// 0 for the cumulative leaderboard over revealed rounds.
    #[serde(default)]
    pub round: i64,
}
