//! Round scheduling: the start-time shuffle and the arithmetic mapping play positions to rounds.

use std::ops::Range;

use rand::{Rng, seq::SliceRandom};
use thiserror::Error;

use crate::state::party::{Party, RoundProgress, Song};

/// Rejected round number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid round number {0}")]
pub struct InvalidRound(pub i64);

/// Parse a 1-based round number.
pub fn parse_round(raw: i64) -> Result<u32, InvalidRound> {
    u32::try_from(raw)
        .ok()
        .filter(|round| *round >= 1)
        .ok_or(InvalidRound(raw))
}

/// Give every song a distinct play position in `0..songs.len()` following a uniform permutation.
pub fn assign_rounds<R>(songs: &mut [Song], rng: &mut R)
where
    R: Rng + ?Sized,
{
    let mut order: Vec<usize> = (0..songs.len()).collect();
    order.shuffle(rng);

    for (position, slot) in order.into_iter().enumerate() {
        songs[slot].shuffle_index = Some(position as u32);
    }
}

/// Play positions covered by `round` (1-based). Round 0 covers nothing.
pub fn round_window(round: u32, songs_per_round: u32) -> Range<u64> {
    if round == 0 {
        return 0..0;
    }
    let size = u64::from(songs_per_round);
    let start = u64::from(round - 1) * size;
    start..start + size
}

/// Round a play position belongs to.
pub fn round_of(position: u32, songs_per_round: u32) -> u32 {
    position / songs_per_round.max(1) + 1
}

/// Number of populated rounds for `assigned` positioned songs.
pub fn round_count(assigned: usize, songs_per_round: u32) -> u32 {
    let size = u64::from(songs_per_round.max(1));
    (assigned as u64).div_ceil(size) as u32
}

/// Positions strictly below this bound belong to rounds whose owners were revealed.
pub fn revealed_boundary(progress: RoundProgress, songs_per_round: u32) -> u64 {
    if !progress.started || progress.current_round == 0 {
        return 0;
    }
    let completed_rounds = if progress.show_results {
        progress.current_round
    } else {
        progress.current_round - 1
    };
    u64::from(completed_rounds) * u64::from(songs_per_round)
}

/// Songs played in `round`, in play order. Empty past the last populated round.
pub fn round_songs(party: &Party, round: u32) -> Vec<&Song> {
    let window = round_window(round, party.songs_per_round);
    let mut songs: Vec<&Song> = party
        .songs
        .iter()
        .filter(|song| {
            song.shuffle_index
                .is_some_and(|index| window.contains(&u64::from(index)))
        })
        .collect();
    songs.sort_by_key(|song| song.shuffle_index);
    songs
}
