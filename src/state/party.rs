//! Runtime view of a party aggregate: participants, their songs and the guess ledger.

use std::time::SystemTime;

use indexmap::IndexMap;

use crate::{
    dao::models::{GuessEntity, ParticipantEntity, PartyEntity, SongEntity},
    state::lifecycle::PartyPhase,
};

/// Identifier of a participant, unique within its party.
pub type ParticipantId = u32;
/// Identifier of a submitted song, unique within its party.
pub type SongId = u32;

/// Someone who joined the party and submitted songs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// A song submitted by a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: SongId,
    pub owner_id: ParticipantId,
    pub title: String,
    /// Catalog identifier (e.g. a video id). `None` when the song has no external identity.
    pub external_id: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Global play position, assigned when the competition starts.
    pub shuffle_index: Option<u32>,
}

/// Key under which songs are considered "the same song" when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKey<'a> {
    /// Songs sharing a non-empty external identifier.
    External(&'a str),
    /// A song without external identity only matches itself.
    Local(SongId),
}

impl Song {
    /// Identity of the song under the identity-merge rule.
    pub fn identity_key(&self) -> IdentityKey<'_> {
        match self.external_id.as_deref() {
            Some(external) if !external.is_empty() => IdentityKey::External(external),
            _ => IdentityKey::Local(self.id),
        }
    }
}

/// Song payload provided by a joining participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub external_id: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl NewSong {
    /// Build a song payload, trimming fields and dropping blank optional values.
    pub fn new(
        title: impl Into<String>,
        external_id: Option<String>,
        thumbnail_url: Option<String>,
    ) -> Self {
        Self {
            title: title.into().trim().to_owned(),
            external_id: non_blank(external_id),
            thumbnail_url: non_blank(thumbnail_url),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Ledger key: at most one live guess per guesser and song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuessKey {
    pub guesser_id: ParticipantId,
    pub song_id: SongId,
}

/// Persisted round cursor of a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundProgress {
    pub started: bool,
    /// 0 until the competition starts, then the 1-based round being played.
    pub current_round: u32,
    /// Whether the owners of the current round are visible.
    pub show_results: bool,
}

/// Party aggregate loaded from storage and mutated inside a single transaction.
#[derive(Debug, Clone)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub admin_token: String,
    pub songs_per_round: u32,
    pub progress: RoundProgress,
    pub participants: Vec<Participant>,
    pub songs: Vec<Song>,
    pub guesses: IndexMap<GuessKey, ParticipantId>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    /// Optimistic concurrency token, bumped on every committed write.
    pub version: u64,
}

impl Party {
    /// Fresh party accepting participants.
    pub fn new(
        id: String,
        name: String,
        admin_token: String,
        songs_per_round: u32,
        now: SystemTime,
    ) -> Self {
        Self {
            id,
            name,
            admin_token,
            songs_per_round,
            progress: RoundProgress::default(),
            participants: Vec::new(),
            songs: Vec::new(),
            guesses: IndexMap::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Lifecycle phase derived from the stored cursor and the assigned pool.
    pub fn phase(&self) -> PartyPhase {
        PartyPhase::derive(self.progress, self.assigned_songs(), self.songs_per_round)
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.id == id)
    }

    pub fn song(&self, id: SongId) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    /// Display name of a participant, empty when the id is unknown.
    pub fn participant_name(&self, id: ParticipantId) -> &str {
        self.participant(id)
            .map(|participant| participant.name.as_str())
            .unwrap_or_default()
    }

    /// Number of songs that received a play position.
    pub fn assigned_songs(&self) -> usize {
        self.songs
            .iter()
            .filter(|song| song.shuffle_index.is_some())
            .count()
    }

    /// Register a participant together with their songs, all unassigned.
    pub fn add_participant(&mut self, name: &str, songs: Vec<NewSong>) -> ParticipantId {
        let participant_id = next_id(self.participants.iter().map(|p| p.id));
        self.participants.push(Participant {
            id: participant_id,
            name: name.to_owned(),
        });

        let mut song_id = next_id(self.songs.iter().map(|song| song.id));
        for song in songs {
            self.songs.push(Song {
                id: song_id,
                owner_id: participant_id,
                title: song.title,
                external_id: song.external_id,
                thumbnail_url: song.thumbnail_url,
                shuffle_index: None,
            });
            song_id += 1;
        }

        participant_id
    }
}

fn next_id(existing: impl Iterator<Item = u32>) -> u32 {
    existing.max().map_or(1, |max| max + 1)
}

impl From<PartyEntity> for Party {
    fn from(entity: PartyEntity) -> Self {
        let guesses = entity
            .guesses
            .into_iter()
            .map(|guess| {
                (
                    GuessKey {
                        guesser_id: guess.guesser_id,
                        song_id: guess.song_id,
                    },
                    guess.guessed_owner_id,
                )
            })
            .collect();

        Self {
            id: entity.id,
            name: entity.name,
            admin_token: entity.admin_token,
            songs_per_round: entity.songs_per_round,
            progress: RoundProgress {
                started: entity.started,
                current_round: entity.current_round,
                show_results: entity.show_results,
            },
            participants: entity
                .participants
                .into_iter()
                .map(|participant| Participant {
                    id: participant.id,
                    name: participant.name,
                })
                .collect(),
            songs: entity
                .songs
                .into_iter()
                .map(|song| Song {
                    id: song.id,
                    owner_id: song.owner_id,
                    title: song.title,
                    external_id: non_blank(song.external_id),
                    thumbnail_url: song.thumbnail_url,
                    shuffle_index: song.shuffle_index,
                })
                .collect(),
            guesses,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            version: entity.version,
        }
    }
}

impl From<Party> for PartyEntity {
    fn from(party: Party) -> Self {
        Self {
            id: party.id,
            name: party.name,
            admin_token: party.admin_token,
            songs_per_round: party.songs_per_round,
            started: party.progress.started,
            current_round: party.progress.current_round,
            show_results: party.progress.show_results,
            participants: party
                .participants
                .into_iter()
                .map(|participant| ParticipantEntity {
                    id: participant.id,
                    name: participant.name,
                })
                .collect(),
            songs: party
                .songs
                .into_iter()
                .map(|song| SongEntity {
                    id: song.id,
                    owner_id: song.owner_id,
                    title: song.title,
                    external_id: song.external_id,
                    thumbnail_url: song.thumbnail_url,
                    shuffle_index: song.shuffle_index,
                })
                .collect(),
            guesses: party
                .guesses
                .into_iter()
                .map(|(key, guessed_owner_id)| GuessEntity {
                    guesser_id: key.guesser_id,
                    song_id: key.song_id,
                    guessed_owner_id,
                })
                .collect(),
            created_at: party.created_at,
            updated_at: party.updated_at,
            version: party.version,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{fixtures::party_with, *};

    #[test]
    fn identity_key_prefers_external_identifier() {
        let party = party_with(5, &[("Alice", [Some("yt1"), None, Some("")])]);

        assert_eq!(party.songs[0].identity_key(), IdentityKey::External("yt1"));
        assert_eq!(party.songs[1].identity_key(), IdentityKey::Local(2));
        // blank identifiers are dropped on input
        assert_eq!(party.songs[2].identity_key(), IdentityKey::Local(3));
    }

    #[test]
    fn add_participant_allocates_sequential_ids() {
        let mut party = party_with(5, &[("Alice", [None, None, None])]);
        let bob = party.add_participant(
            "Bob",
            vec![
                NewSong::new("a", None, None),
                NewSong::new("b", None, None),
                NewSong::new("c", None, None),
            ],
        );

        assert_eq!(bob, 2);
        let ids: Vec<_> = party.songs.iter().map(|song| song.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert!(party.songs.iter().all(|song| song.shuffle_index.is_none()));
        assert_eq!(party.participant_name(bob), "Bob");
    }

    #[test]
    fn entity_conversion_preserves_guesses_and_progress() {
        let mut party = party_with(5, &[("Alice", [Some("yt1"), None, None])]);
        party.progress = RoundProgress {
            started: true,
            current_round: 2,
            show_results: true,
        };
        party.guesses.insert(
            GuessKey {
                guesser_id: 1,
                song_id: 2,
            },
            1,
        );
        party.version = 7;

        let entity: PartyEntity = party.clone().into();
        assert_eq!(entity.guesses.len(), 1);
        assert_eq!(entity.version, 7);

        let restored = Party::from(entity);
        assert_eq!(restored.progress, party.progress);
        assert_eq!(restored.guesses, party.guesses);
        assert_eq!(restored.songs, party.songs);
    }
}
