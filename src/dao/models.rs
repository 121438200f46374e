use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Party aggregate as persisted: one record per party embedding its participants, songs and guesses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartyEntity {
    /// Short code identifying the party.
    pub id: String,
    /// Display name chosen at creation.
    pub name: String,
    /// Secret required for admin operations.
    pub admin_token: String,
    /// Number of songs played per round, fixed at creation.
    pub songs_per_round: u32,
    /// Whether the competition has started.
    pub started: bool,
    /// 1-based round being played, 0 before the start.
    pub current_round: u32,
    /// Whether the owners of the current round are revealed.
    pub show_results: bool,
    /// Participants in join order.
    #[serde(default)]
    pub participants: Vec<ParticipantEntity>,
    /// Submitted songs in submission order.
    #[serde(default)]
    pub songs: Vec<SongEntity>,
    /// Live guesses, one per (guesser, song).
    #[serde(default)]
    pub guesses: Vec<GuessEntity>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last committed write.
    pub updated_at: SystemTime,
    /// Compare-and-swap token incremented on every write.
    #[serde(default)]
    pub version: u64,
}

/// Participant stored inside a party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Identifier unique within the party.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Song submitted by a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongEntity {
    /// Identifier unique within the party.
    pub id: u32,
    /// Participant who submitted the song.
    pub owner_id: u32,
    /// Song title as entered.
    pub title: String,
    /// Optional catalog identifier used to merge identical songs.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Optional thumbnail URL.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Play position assigned at start, absent until then.
    #[serde(default)]
    pub shuffle_index: Option<u32>,
}

/// Guess placed by a participant about a song's owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessEntity {
    /// Participant placing the guess.
    pub guesser_id: u32,
    /// Song being guessed.
    pub song_id: u32,
    /// Participant believed to own the song.
    pub guessed_owner_id: u32,
}
