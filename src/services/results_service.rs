//! Read-side of the competition: leaderboards and owner reveals.

use crate::{
    error::ServiceError,
    state::{
        SharedState,
        lifecycle::PartyPhase,
        rounds,
        scoring::{self, LeaderboardRow, LeaderboardScope, RevealedSong},
    },
};

/// Scores for one round, or cumulative over revealed rounds when `round` is 0.
pub async fn get_leaderboard(
    state: &SharedState,
    party_id: &str,
    round: i64,
) -> Result<Vec<LeaderboardRow>, ServiceError> {
    let scope = LeaderboardScope::try_from(round)?;
    let party = state.load_party(party_id).await?;
    Ok(scoring::leaderboard(&party, scope))
}

/// Songs of `round` with their true owners. Refused until the round's reveal step ran.
pub async fn get_round_results(
    state: &SharedState,
    party_id: &str,
    round: i64,
) -> Result<Vec<RevealedSong>, ServiceError> {
    let round = rounds::parse_round(round)?;
    let party = state.load_party(party_id).await?;
    if !scoring::is_round_revealed(party.progress, round) {
        return Err(ServiceError::NotRevealed(format!(
            "round {round} of party `{party_id}` has not been revealed"
        )));
    }

    let songs = rounds::round_songs(&party, round);
    Ok(scoring::revealed_songs(&party, songs))
}

/// Admin listing of the whole pool with owners, in play order; unassigned songs come first.
pub async fn get_party_songs(
    state: &SharedState,
    party_id: &str,
) -> Result<Vec<RevealedSong>, ServiceError> {
    let party = state.load_party(party_id).await?;

    let mut songs: Vec<_> = party.songs.iter().collect();
    songs.sort_by(|a, b| {
        a.shuffle_index
            .cmp(&b.shuffle_index)
            .then_with(|| {
                party
                    .participant_name(a.owner_id)
                    .cmp(party.participant_name(b.owner_id))
            })
            .then(a.id.cmp(&b.id))
    });
    Ok(scoring::revealed_songs(&party, songs))
}

/// Every played song with its owners, once the party is over.
pub async fn get_final_reveal(
    state: &SharedState,
    party_id: &str,
) -> Result<Vec<RevealedSong>, ServiceError> {
    let party = state.load_party(party_id).await?;
    if party.phase() != PartyPhase::Completed {
        return Err(ServiceError::NotRevealed(format!(
            "party `{party_id}` is still running"
        )));
    }

    let mut songs: Vec<_> = party
        .songs
        .iter()
        .filter(|song| song.shuffle_index.is_some())
        .collect();
    songs.sort_by_key(|song| song.shuffle_index);
    Ok(scoring::revealed_songs(&party, songs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{
            guess_service::submit_guess,
            party_service::{
                CreatedParty, create_party, join_party, next_round, start_competition,
                test_support::*,
            },
        },
        state::party::Song,
    };

    async fn yt1_party(state: &SharedState) -> CreatedParty {
        let party = create_party(state, "Party", None).await.unwrap();
        join_party(
            state,
            &party.id,
            "Alice",
            three_songs("alice", [Some("yt1"), Some("a2"), Some("a3")]),
        )
        .await
        .unwrap();
        join_party(
            state,
            &party.id,
            "Bob",
            three_songs("bob", [Some("yt1"), Some("b2"), Some("b3")]),
        )
        .await
        .unwrap();
        join_party(state, &party.id, "Charlie", three_songs("charlie", [None; 3]))
            .await
            .unwrap();
        party
    }

    fn round_of_song(song: &Song) -> i64 {
        i64::from(rounds::round_of(song.shuffle_index.unwrap(), 5))
    }

    /// Advance until `round` is revealed.
    async fn reveal_through(state: &SharedState, party_id: &str, round: i64) {
        loop {
            let progress = crate::services::party_service::get_party_state(state, party_id)
                .await
                .unwrap();
            if scoring::is_round_revealed(progress, round as u32) {
                return;
            }
            next_round(state, party_id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn shared_external_id_scores_and_reveals_both_owners() {
        let state = memory_state();
        let party = yt1_party(&state).await;
        start_competition(&state, &party.id).await.unwrap();

        // Bob's copy of yt1 is song 4; Charlie credits Alice
        submit_guess(&state, &party.id, 3, 4, 1).await.unwrap();

        let songs = get_party_songs(&state, &party.id).await.unwrap();
        let bobs_copy = songs.iter().find(|entry| entry.song.id == 4).unwrap();
        assert_eq!(bobs_copy.owner_names, vec!["Alice", "Bob"]);
        let round = round_of_song(&bobs_copy.song);

        let hidden = get_leaderboard(&state, &party.id, 0).await.unwrap();
        assert!(hidden.iter().all(|row| row.score == 0));

        reveal_through(&state, &party.id, round).await;

        let cumulative = get_leaderboard(&state, &party.id, 0).await.unwrap();
        assert_eq!(cumulative[0].name, "Charlie");
        assert_eq!(cumulative[0].score, 1);

        let per_round = get_leaderboard(&state, &party.id, round).await.unwrap();
        assert_eq!(per_round[0].score, 1);

        let results = get_round_results(&state, &party.id, round).await.unwrap();
        let entry = results.iter().find(|entry| entry.song.id == 4).unwrap();
        assert_eq!(entry.owner_names.join(", "), "Alice, Bob");
    }

    #[tokio::test]
    async fn results_stay_hidden_until_the_reveal_step() {
        let state = memory_state();
        let party = yt1_party(&state).await;
        start_competition(&state, &party.id).await.unwrap();

        let err = get_round_results(&state, &party.id, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotRevealed(_)));

        next_round(&state, &party.id).await.unwrap();
        let results = get_round_results(&state, &party.id, 1).await.unwrap();
        assert_eq!(results.len(), 5);
        let positions: Vec<_> = results
            .iter()
            .map(|entry| entry.song.shuffle_index.unwrap())
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);

        let err = get_round_results(&state, &party.id, 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotRevealed(_)));
    }

    #[tokio::test]
    async fn rejects_invalid_round_numbers() {
        let state = memory_state();
        let party = yt1_party(&state).await;

        assert!(matches!(
            get_leaderboard(&state, &party.id, -1).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            get_round_results(&state, &party.id, 0).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn leaderboard_lists_everyone_before_any_guess() {
        let state = memory_state();
        let party = yt1_party(&state).await;

        let rows = get_leaderboard(&state, &party.id, 0).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.score == 0));
    }

    #[tokio::test]
    async fn party_songs_put_unassigned_first() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        join_party(&state, &party.id, "Bob", three_songs("b", [None; 3]))
            .await
            .unwrap();
        start_competition(&state, &party.id).await.unwrap();
        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();

        let songs = get_party_songs(&state, &party.id).await.unwrap();
        assert_eq!(songs.len(), 6);
        assert!(songs[..3].iter().all(|entry| entry.song.shuffle_index.is_none()));
        assert!(songs[..3].iter().all(|entry| entry.owner_names == ["Alice"]));
        let positions: Vec<_> = songs[3..]
            .iter()
            .map(|entry| entry.song.shuffle_index.unwrap())
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn final_reveal_waits_for_the_end() {
        let state = memory_state();
        let party = create_party(&state, "Party", None).await.unwrap();
        join_party(&state, &party.id, "Alice", three_songs("a", [None; 3]))
            .await
            .unwrap();
        start_competition(&state, &party.id).await.unwrap();

        let err = get_final_reveal(&state, &party.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotRevealed(_)));

        // reveal round 1, then step into the empty round 2
        next_round(&state, &party.id).await.unwrap();
        next_round(&state, &party.id).await.unwrap();

        let reveal = get_final_reveal(&state, &party.id).await.unwrap();
        assert_eq!(reveal.len(), 3);
        assert!(reveal.iter().all(|entry| entry.owner_names == ["Alice"]));
    }
}
