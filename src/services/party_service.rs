//! Party lifecycle operations: creation, joining, starting the competition and stepping
//! through rounds, plus the read-only views the lifecycle drives.

use std::time::SystemTime;

use rand::rng;
use tracing::{debug, info, warn};

use crate::{
    dao::storage::StorageError,
    error::ServiceError,
    state::{
        SharedState,
        identifiers::{new_admin_token, new_party_id},
        lifecycle::{PartyEvent, PartyPhase, compute_transition},
        party::{NewSong, Participant, ParticipantId, Party, RoundProgress, Song},
        rounds::{self, assign_rounds},
    },
};

/// Number of songs every participant submits when joining.
pub const SONGS_PER_PARTICIPANT: usize = 3;

/// Identifiers handed back to the creator of a party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedParty {
    pub id: String,
    pub admin_token: String,
}

/// Public summary of a party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyOverview {
    pub id: String,
    pub name: String,
    pub created_at: SystemTime,
    pub progress: RoundProgress,
    pub phase: PartyPhase,
    pub songs_per_round: u32,
    pub total_songs: usize,
    pub participant_count: usize,
    /// Rounds populated by the last shuffle.
    pub round_count: u32,
}

impl PartyOverview {
    /// Every populated round was played and revealed.
    pub fn game_over(&self) -> bool {
        self.phase == PartyPhase::Completed
    }
}

/// Songs of one round in play order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSongs {
    pub round: u32,
    pub songs: Vec<Song>,
}

/// Songs of the round being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRound {
    pub round: u32,
    pub revealed: bool,
    /// Empty once the party is over.
    pub songs: Vec<Song>,
}

/// Create a party in the joining phase and return its identifiers.
///
/// `songs_per_round` falls back to the configured default. Identifier collisions are resolved
/// by drawing a new identifier, up to the configured number of attempts.
pub async fn create_party(
    state: &SharedState,
    name: &str,
    songs_per_round: Option<u32>,
) -> Result<CreatedParty, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "party name must not be empty".into(),
        ));
    }
    let songs_per_round = match songs_per_round {
        Some(0) => {
            return Err(ServiceError::InvalidInput(
                "songs per round must be positive".into(),
            ));
        }
        Some(value) => value,
        None => state.config().songs_per_round(),
    };

    let store = state.require_party_store().await?;
    let attempts = state.config().party_id_attempts();

    for attempt in 1..=attempts {
        let party = Party::new(
            new_party_id(),
            name.to_owned(),
            new_admin_token(),
            songs_per_round,
            SystemTime::now(),
        );
        let created = CreatedParty {
            id: party.id.clone(),
            admin_token: party.admin_token.clone(),
        };

        match store.insert_party(party.into()).await {
            Ok(()) => {
                info!(party_id = %created.id, songs_per_round, "party created");
                return Ok(created);
            }
            Err(err @ StorageError::Conflict { .. }) => {
                warn!(attempt, error = %err, "party id already taken; drawing a new one");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(StorageError::conflict(format!(
        "no free party id found after {attempts} attempt(s)"
    ))
    .into())
}

/// Add a participant with exactly [`SONGS_PER_PARTICIPANT`] songs.
///
/// Joining stays open after the competition started; late songs stay unassigned.
pub async fn join_party(
    state: &SharedState,
    party_id: &str,
    user_name: &str,
    songs: Vec<NewSong>,
) -> Result<ParticipantId, ServiceError> {
    if songs.len() != SONGS_PER_PARTICIPANT {
        return Err(ServiceError::InvalidInput(format!(
            "exactly {SONGS_PER_PARTICIPANT} songs are required, got {}",
            songs.len()
        )));
    }
    let user_name = user_name.trim();
    if user_name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "participant name must not be empty".into(),
        ));
    }
    if songs.iter().any(|song| song.title.is_empty()) {
        return Err(ServiceError::InvalidInput(
            "song titles must not be empty".into(),
        ));
    }

    let participant_id = state
        .run_party_transaction(party_id, |party| {
            Ok(party.add_participant(user_name, songs))
        })
        .await?;

    debug!(party_id, participant_id, "participant joined");
    Ok(participant_id)
}

/// Shuffle the whole pool into rounds and open round 1.
pub async fn start_competition(
    state: &SharedState,
    party_id: &str,
) -> Result<RoundProgress, ServiceError> {
    let (progress, song_count) = state
        .run_party_transaction(party_id, |party| {
            let phase = party.phase();
            if phase == PartyPhase::Joining && party.songs.is_empty() {
                return Err(ServiceError::NoSongs(party.id.clone()));
            }
            let next = compute_transition(phase, PartyEvent::StartCompetition)?;

            assign_rounds(&mut party.songs, &mut rng());
            party.progress = next;
            Ok((next, party.songs.len()))
        })
        .await?;

    info!(party_id, song_count, "competition started");
    Ok(progress)
}

/// Reveal the current round, or advance to the next one once revealed.
pub async fn next_round(
    state: &SharedState,
    party_id: &str,
) -> Result<RoundProgress, ServiceError> {
    let progress = state
        .run_party_transaction(party_id, |party| {
            let next = compute_transition(party.phase(), PartyEvent::NextRound)?;
            party.progress = next;
            Ok(next)
        })
        .await?;

    info!(
        party_id,
        round = progress.current_round,
        revealed = progress.show_results,
        "round cursor moved"
    );
    Ok(progress)
}

/// Current `(started, current_round, show_results)` cursor.
pub async fn get_party_state(
    state: &SharedState,
    party_id: &str,
) -> Result<RoundProgress, ServiceError> {
    Ok(state.load_party(party_id).await?.progress)
}

pub async fn get_party_overview(
    state: &SharedState,
    party_id: &str,
) -> Result<PartyOverview, ServiceError> {
    let party = state.load_party(party_id).await?;
    Ok(PartyOverview {
        phase: party.phase(),
        round_count: rounds::round_count(party.assigned_songs(), party.songs_per_round),
        total_songs: party.songs.len(),
        participant_count: party.participants.len(),
        id: party.id,
        name: party.name,
        created_at: party.created_at,
        progress: party.progress,
        songs_per_round: party.songs_per_round,
    })
}

/// Whether `token` is the party's admin token. Unknown parties never match.
pub async fn verify_admin(
    state: &SharedState,
    party_id: &str,
    token: &str,
) -> Result<bool, ServiceError> {
    match state.load_party(party_id).await {
        Ok(party) => Ok(party.admin_token == token),
        Err(ServiceError::NotFound(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Fail with [`ServiceError::Unauthorized`] unless `token` is the party's admin token.
pub async fn require_admin(
    state: &SharedState,
    party_id: &str,
    token: Option<&str>,
) -> Result<(), ServiceError> {
    let Some(token) = token else {
        return Err(ServiceError::Unauthorized("missing admin token".into()));
    };
    if verify_admin(state, party_id, token).await? {
        Ok(())
    } else {
        warn!(party_id, "rejected admin token");
        Err(ServiceError::Unauthorized("invalid admin token".into()))
    }
}

/// Participants ordered by name.
pub async fn get_users(
    state: &SharedState,
    party_id: &str,
) -> Result<Vec<Participant>, ServiceError> {
    let mut participants = state.load_party(party_id).await?.participants;
    participants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(participants)
}

/// Songs of `round` in play order; empty past the last populated round.
pub async fn get_round_songs(
    state: &SharedState,
    party_id: &str,
    round: i64,
) -> Result<RoundSongs, ServiceError> {
    let round = rounds::parse_round(round)?;
    let party = state.load_party(party_id).await?;
    Ok(RoundSongs {
        round,
        songs: rounds::round_songs(&party, round)
            .into_iter()
            .cloned()
            .collect(),
    })
}

pub async fn get_current_round(
    state: &SharedState,
    party_id: &str,
) -> Result<CurrentRound, ServiceError> {
    let party = state.load_party(party_id).await?;
    if !party.progress.started {
        return Err(ServiceError::InvalidState(
            "competition has not started".into(),
        ));
    }

    let round = party.progress.current_round;
    Ok(CurrentRound {
        round,
        revealed: party.progress.show_results,
        songs: rounds::round_songs(&party, round)
            .into_iter()
            .cloned()
            .collect(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::{
        config::AppConfig,
        dao::party_store::memory::MemoryPartyStore,
        state::{AppState, SharedState, party::NewSong},
    };

    pub fn memory_state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryPartyStore::new()))
    }

    pub fn three_songs(prefix: &str, external_ids: [Option<&str>; 3]) -> Vec<NewSong> {
        external_ids
            .iter()
            .enumerate()
            .map(|(index, external)| {
                NewSong::new(
                    format!("{prefix} {index}"),
                    external.map(str::to_owned),
                    None,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{test_support::*, *};

    #[tokio::test]
    async fn create_and_verify_admin() {
        let state = memory_state();
        let created = create_party(&state, "  New Year  ", None).await.unwrap();

        assert_eq!(created.id.len(), 6);
        assert_eq!(created.admin_token.len(), 12);
        assert!(verify_admin(&state, &created.id, &created.admin_token).await.unwrap());
        assert!(!verify_admin(&state, &created.id, "WRONG").await.unwrap());
        assert!(!verify_admin(&state, "NOPE00", &created.admin_token).await.unwrap());

        let overview = get_party_overview(&state, &created.id).await.unwrap();
        assert_eq!(overview.name, "New Year");
        assert_eq!(overview.songs_per_round, 5);
        assert_eq!(overview.phase, PartyPhase::Joining);
    }

    #[tokio::test]
    async fn create_rejects_blank_names_and_zero_round_size() {
        let state = memory_state();
        assert!(matches!(
            create_party(&state, "   ", None).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            create_party(&state, "Party", Some(0)).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn require_admin_rejects_missing_and_wrong_tokens() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();

        require_admin(&state, &party.id, Some(&party.admin_token))
            .await
            .unwrap();
        assert!(matches!(
            require_admin(&state, &party.id, None).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            require_admin(&state, &party.id, Some("WRONG")).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            require_admin(&state, "NOPE00", Some(&party.admin_token)).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn join_creates_three_unassigned_songs() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();

        let user_id = join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();

        let stored = state.load_party(&party.id).await.unwrap();
        let songs: Vec<_> = stored
            .songs
            .iter()
            .filter(|song| song.owner_id == user_id)
            .collect();
        assert_eq!(songs.len(), 3);
        assert!(songs.iter().all(|song| song.shuffle_index.is_none()));
    }

    #[tokio::test]
    async fn join_with_wrong_song_count_creates_nothing() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();

        for count in [0usize, 2, 4] {
            let songs = (0..count)
                .map(|index| NewSong::new(format!("s{index}"), None, None))
                .collect();
            let err = join_party(&state, &party.id, "Alice", songs)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }

        let stored = state.load_party(&party.id).await.unwrap();
        assert!(stored.participants.is_empty());
        assert!(stored.songs.is_empty());
    }

    #[tokio::test]
    async fn join_unknown_party_is_not_found() {
        let state = memory_state();
        let err = join_party(&state, "NOPE00", "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn start_requires_songs_and_happens_once() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();

        let err = start_competition(&state, &party.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoSongs(_)));

        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();
        start_competition(&state, &party.id).await.unwrap();

        let err = start_competition(&state, &party.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn start_assigns_a_permutation_of_the_pool() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        for name in ["Alice", "Bob", "Charlie", "Dana"] {
            join_party(&state, &party.id, name, three_songs(name, [None; 3]))
                .await
                .unwrap();
        }

        let progress = start_competition(&state, &party.id).await.unwrap();
        assert_eq!(
            progress,
            RoundProgress {
                started: true,
                current_round: 1,
                show_results: false
            }
        );

        let stored = state.load_party(&party.id).await.unwrap();
        let positions: HashSet<u32> = stored
            .songs
            .iter()
            .filter_map(|song| song.shuffle_index)
            .collect();
        assert_eq!(positions, (0..12).collect());

        let round_one = get_round_songs(&state, &party.id, 1).await.unwrap().songs;
        assert_eq!(round_one.len(), 5);
    }

    #[tokio::test]
    async fn rounds_split_six_songs_into_five_and_one() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();
        join_party(&state, &party.id, "Bob", three_songs("b", [None; 3]))
            .await
            .unwrap();
        start_competition(&state, &party.id).await.unwrap();

        let round_one = get_round_songs(&state, &party.id, 1).await.unwrap().songs;
        let round_two = get_round_songs(&state, &party.id, 2).await.unwrap().songs;
        let round_three = get_round_songs(&state, &party.id, 3).await.unwrap();
        assert_eq!(round_three.round, 3);
        let round_three = round_three.songs;
        assert_eq!(round_one.len(), 5);
        assert_eq!(round_two.len(), 1);
        assert!(round_three.is_empty());

        let ids: HashSet<_> = round_one.iter().chain(&round_two).map(|song| song.id).collect();
        assert_eq!(ids.len(), 6);

        let overview = get_party_overview(&state, &party.id).await.unwrap();
        assert_eq!(overview.round_count, 2);

        assert!(matches!(
            get_round_songs(&state, &party.id, 0).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn next_round_toggles_then_advances_until_game_over() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();

        let err = next_round(&state, &party.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();
        join_party(&state, &party.id, "Bob", three_songs("b", [None; 3]))
            .await
            .unwrap();
        start_competition(&state, &party.id).await.unwrap();

        let revealed = next_round(&state, &party.id).await.unwrap();
        assert_eq!(revealed.current_round, 1);
        assert!(revealed.show_results);

        let advanced = next_round(&state, &party.id).await.unwrap();
        assert_eq!(advanced.current_round, 2);
        assert!(!advanced.show_results);
        assert_eq!(get_party_state(&state, &party.id).await.unwrap(), advanced);

        next_round(&state, &party.id).await.unwrap();
        next_round(&state, &party.id).await.unwrap();

        let overview = get_party_overview(&state, &party.id).await.unwrap();
        assert!(overview.game_over());
        let current = get_current_round(&state, &party.id).await.unwrap();
        assert_eq!(current.round, 3);
        assert!(current.songs.is_empty());

        let err = next_round(&state, &party.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn concurrent_reveals_never_skip_a_round() {
        let state = memory_state();
        let party = create_party(&state, "Party", Some(1)).await.unwrap();
        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();
        start_competition(&state, &party.id).await.unwrap();

        let (first, second) = tokio::join!(
            next_round(&state, &party.id),
            next_round(&state, &party.id)
        );
        first.unwrap();
        second.unwrap();

        let progress = get_party_state(&state, &party.id).await.unwrap();
        assert_eq!(progress.current_round, 2);
        assert!(!progress.show_results);
    }

    #[tokio::test]
    async fn joins_racing_the_start_are_fully_shuffled_or_fully_unassigned() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();

        let joiners: Vec<_> = (0..6)
            .map(|index| {
                let state = state.clone();
                let party_id = party.id.clone();
                tokio::spawn(async move {
                    let name = format!("player {index}");
                    join_party(&state, &party_id, &name, three_songs(&name, [None; 3])).await
                })
            })
            .collect();
        let start = {
            let state = state.clone();
            let party_id = party.id.clone();
            tokio::spawn(async move { start_competition(&state, &party_id).await })
        };

        start.await.unwrap().unwrap();
        let mut joined = Vec::new();
        for task in joiners {
            joined.push(task.await.unwrap().unwrap());
        }

        let stored = state.load_party(&party.id).await.unwrap();
        for participant in &joined {
            let positions: Vec<_> = stored
                .songs
                .iter()
                .filter(|song| song.owner_id == *participant)
                .map(|song| song.shuffle_index)
                .collect();
            assert_eq!(positions.len(), 3);
            assert!(
                positions.iter().all(Option::is_some) || positions.iter().all(Option::is_none),
                "participant {participant} was partially shuffled: {positions:?}"
            );
        }

        let assigned: HashSet<u32> = stored
            .songs
            .iter()
            .filter_map(|song| song.shuffle_index)
            .collect();
        let assigned_count = stored.assigned_songs() as u32;
        assert_eq!(assigned.len() as u32, assigned_count);
        assert_eq!(assigned, (0..assigned_count).collect());
        assert_eq!(assigned_count % 3, 0);
        assert!(assigned_count >= 3);
    }

    #[tokio::test]
    async fn late_joiners_stay_unassigned() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();
        start_competition(&state, &party.id).await.unwrap();

        let late = join_party(&state, &party.id, "Late", three_songs("l", [None; 3]))
            .await
            .unwrap();
        let stored = state.load_party(&party.id).await.unwrap();
        assert!(
            stored
                .songs
                .iter()
                .filter(|song| song.owner_id == late)
                .all(|song| song.shuffle_index.is_none())
        );
        assert_eq!(get_round_songs(&state, &party.id, 1).await.unwrap().songs.len(), 3);
    }

    #[tokio::test]
    async fn users_are_listed_by_name() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        join_party(&state, &party.id, "Bob", three_songs("b", [None; 3]))
            .await
            .unwrap();
        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();

        let names: Vec<_> = get_users(&state, &party.id)
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn current_round_requires_a_started_competition() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        assert!(matches!(
            get_current_round(&state, &party.id).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}
