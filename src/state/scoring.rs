//! Scoring rules: leaderboards over revealed songs and owner reveals with identity merging.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::state::{
    party::{IdentityKey, ParticipantId, Party, RoundProgress, Song},
    rounds::{self, InvalidRound},
};

/// Songs a leaderboard is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardScope {
    /// Every song whose round has been revealed.
    Cumulative,
    /// Songs of a single round, whatever the reveal state.
    Round(u32),
}

impl TryFrom<i64> for LeaderboardScope {
    type Error = InvalidRound;

    fn try_from(round: i64) -> Result<Self, Self::Error> {
        match round {
            0 => Ok(LeaderboardScope::Cumulative),
            other => rounds::parse_round(other).map(LeaderboardScope::Round),
        }
    }
}

/// One participant's line on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub participant_id: ParticipantId,
    pub name: String,
    pub score: u32,
}

/// A song together with everyone who submitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedSong {
    pub song: Song,
    /// Names of every participant owning a song with the same identity, in join order.
    pub owner_names: Vec<String>,
}

/// Whether the true owners of `round` may be shown.
pub fn is_round_revealed(progress: RoundProgress, round: u32) -> bool {
    progress.current_round > round || (progress.current_round == round && progress.show_results)
}

/// Score every participant over the songs in `scope`, best first.
///
/// A guess is correct when the guessed participant owns a song sharing the guessed song's
/// identity. Participants without a correct guess are listed with a zero score; ties keep
/// join order.
pub fn leaderboard(party: &Party, scope: LeaderboardScope) -> Vec<LeaderboardRow> {
    let in_scope = |song: &Song| {
        let Some(index) = song.shuffle_index.map(u64::from) else {
            return false;
        };
        match scope {
            LeaderboardScope::Cumulative => {
                index < rounds::revealed_boundary(party.progress, party.songs_per_round)
            }
            LeaderboardScope::Round(round) => {
                rounds::round_window(round, party.songs_per_round).contains(&index)
            }
        }
    };

    let owned: HashSet<(ParticipantId, IdentityKey<'_>)> = party
        .songs
        .iter()
        .map(|song| (song.owner_id, song.identity_key()))
        .collect();

    let mut scores: IndexMap<ParticipantId, u32> = party
        .participants
        .iter()
        .map(|participant| (participant.id, 0))
        .collect();

    for (key, guessed_owner) in &party.guesses {
        let Some(song) = party.song(key.song_id) else {
            continue;
        };
        if !in_scope(song) || !owned.contains(&(*guessed_owner, song.identity_key())) {
            continue;
        }
        if let Some(score) = scores.get_mut(&key.guesser_id) {
            *score += 1;
        }
    }

    let mut rows: Vec<LeaderboardRow> = scores
        .into_iter()
        .map(|(participant_id, score)| LeaderboardRow {
            participant_id,
            name: party.participant_name(participant_id).to_owned(),
            score,
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows
}

/// Attach owner names to `songs`, merging owners across songs sharing an identity.
pub fn revealed_songs<'a>(
    party: &'a Party,
    songs: impl IntoIterator<Item = &'a Song>,
) -> Vec<RevealedSong> {
    let mut owners: IndexMap<IdentityKey<'a>, IndexSet<ParticipantId>> = IndexMap::new();
    for song in &party.songs {
        owners
            .entry(song.identity_key())
            .or_default()
            .insert(song.owner_id);
    }

    songs
        .into_iter()
        .map(|song| {
            let owner_names = owners
                .get(&song.identity_key())
                .into_iter()
                .flatten()
                .map(|owner_id| party.participant_name(*owner_id).to_owned())
                .collect();
            RevealedSong {
                song: song.clone(),
                owner_names,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        ledger::{Guess, record_guess},
        party::fixtures::{assign_in_order, party_with},
    };

    fn guess(party: &mut Party, guesser_id: u32, song_id: u32, guessed_owner_id: u32) {
        record_guess(
            party,
            Guess {
                guesser_id,
                song_id,
                guessed_owner_id,
            },
        )
        .unwrap();
    }

    fn score_of(rows: &[LeaderboardRow], name: &str) -> u32 {
        rows.iter()
            .find(|row| row.name == name)
            .map(|row| row.score)
            .unwrap()
    }

    /// Alice and Bob both submitted "yt1" (songs 1 and 4), Charlie did not.
    fn shared_track_party() -> Party {
        let mut party = party_with(
            5,
            &[
                ("Alice", [Some("yt1"), Some("a2"), None]),
                ("Bob", [Some("yt1"), Some("b2"), None]),
                ("Charlie", [Some("c1"), Some("c2"), Some("c3")]),
            ],
        );
        assign_in_order(&mut party);
        party.progress = RoundProgress {
            started: true,
            current_round: 1,
            show_results: true,
        };
        party
    }

    #[test]
    fn merged_identity_accepts_either_submitter() {
        let mut party = shared_track_party();
        // Charlie credits Alice for Bob's copy of yt1
        guess(&mut party, 3, 4, 1);

        let rows = leaderboard(&party, LeaderboardScope::Cumulative);
        assert_eq!(score_of(&rows, "Charlie"), 1);
        assert_eq!(rows[0].name, "Charlie");
    }

    #[test]
    fn local_identity_requires_the_exact_owner() {
        let mut party = shared_track_party();
        // song 3 is Alice's and has no external id
        guess(&mut party, 2, 3, 3);
        guess(&mut party, 3, 3, 1);

        let rows = leaderboard(&party, LeaderboardScope::Cumulative);
        assert_eq!(score_of(&rows, "Bob"), 0);
        assert_eq!(score_of(&rows, "Charlie"), 1);
    }

    #[test]
    fn cumulative_scope_ignores_unrevealed_rounds() {
        let mut party = shared_track_party();
        party.progress.show_results = false;
        guess(&mut party, 3, 1, 1);

        let hidden = leaderboard(&party, LeaderboardScope::Cumulative);
        assert!(hidden.iter().all(|row| row.score == 0));

        // single-round scope ignores the reveal flag
        let round_one = leaderboard(&party, LeaderboardScope::Round(1));
        assert_eq!(score_of(&round_one, "Charlie"), 1);

        party.progress.show_results = true;
        let revealed = leaderboard(&party, LeaderboardScope::Cumulative);
        assert_eq!(score_of(&revealed, "Charlie"), 1);
    }

    #[test]
    fn round_scope_only_counts_its_window() {
        let mut party = shared_track_party();
        // song 7 sits at position 6, in round 2
        guess(&mut party, 1, 7, 3);
        guess(&mut party, 2, 1, 1);

        let round_two = leaderboard(&party, LeaderboardScope::Round(2));
        assert_eq!(score_of(&round_two, "Alice"), 1);
        assert_eq!(score_of(&round_two, "Bob"), 0);
    }

    #[test]
    fn unassigned_songs_never_score() {
        let mut party = shared_track_party();
        party.songs[0].shuffle_index = None;
        party.progress = RoundProgress {
            started: true,
            current_round: 5,
            show_results: true,
        };
        guess(&mut party, 3, 1, 1);

        let rows = leaderboard(&party, LeaderboardScope::Cumulative);
        assert_eq!(score_of(&rows, "Charlie"), 0);
    }

    #[test]
    fn everyone_is_listed_and_sorted_by_score() {
        let mut party = shared_track_party();
        guess(&mut party, 2, 2, 1);
        guess(&mut party, 2, 3, 1);
        guess(&mut party, 3, 2, 1);

        let rows = leaderboard(&party, LeaderboardScope::Cumulative);
        let names: Vec<_> = rows.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Charlie", "Alice"]);
        assert_eq!(rows[2].score, 0);
    }

    #[test]
    fn reveal_merges_owner_names() {
        let party = shared_track_party();
        let revealed = revealed_songs(&party, &party.songs[..4]);

        assert_eq!(revealed[0].owner_names, vec!["Alice", "Bob"]);
        assert_eq!(revealed[1].owner_names, vec!["Alice"]);
        assert_eq!(revealed[3].owner_names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn round_reveal_gating() {
        let mut progress = RoundProgress {
            started: true,
            current_round: 1,
            show_results: false,
        };
        assert!(!is_round_revealed(progress, 1));
        assert!(!is_round_revealed(progress, 2));

        progress.show_results = true;
        assert!(is_round_revealed(progress, 1));
        assert!(!is_round_revealed(progress, 2));

        progress = RoundProgress {
            started: true,
            current_round: 2,
            show_results: false,
        };
        assert!(is_round_revealed(progress, 1));
        assert!(!is_round_revealed(progress, 2));
        assert!(!is_round_revealed(RoundProgress::default(), 1));
    }

    #[test]
    fn scope_parsing() {
        assert_eq!(
            LeaderboardScope::try_from(0_i64),
            Ok(LeaderboardScope::Cumulative)
        );
        assert_eq!(
            LeaderboardScope::try_from(2_i64),
            Ok(LeaderboardScope::Round(2))
        );
        assert_eq!(LeaderboardScope::try_from(-1_i64), Err(InvalidRound(-1)));
    }
}
