//! Guess ledger: one live guess per (guesser, song), later guesses overwrite earlier ones.

use thiserror::Error;

use crate::state::party::{GuessKey, ParticipantId, Party, SongId};

/// A participant's claim about who submitted a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guess {
    pub guesser_id: ParticipantId,
    pub song_id: SongId,
    pub guessed_owner_id: ParticipantId,
}

/// Reference in a guess that does not exist in the party.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("song `{0}` does not exist in this party")]
    UnknownSong(SongId),
    #[error("participant `{0}` does not exist in this party")]
    UnknownParticipant(ParticipantId),
}

/// Upsert a guess, returning the guessed owner it replaced.
pub fn record_guess(party: &mut Party, guess: Guess) -> Result<Option<ParticipantId>, LedgerError> {
    if party.song(guess.song_id).is_none() {
        return Err(LedgerError::UnknownSong(guess.song_id));
    }
    for participant_id in [guess.guesser_id, guess.guessed_owner_id] {
        if party.participant(participant_id).is_none() {
            return Err(LedgerError::UnknownParticipant(participant_id));
        }
    }

    let key = GuessKey {
        guesser_id: guess.guesser_id,
        song_id: guess.song_id,
    };
    Ok(party.guesses.insert(key, guess.guessed_owner_id))
}

/// Guesses placed by `guesser_id`, as `(song, guessed owner)` pairs in submission order.
pub fn guesses_by(party: &Party, guesser_id: ParticipantId) -> Vec<(SongId, ParticipantId)> {
    party
        .guesses
        .iter()
        .filter(|(key, _)| key.guesser_id == guesser_id)
        .map(|(key, guessed)| (key.song_id, *guessed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::party::fixtures::party_with;

    fn guess(guesser_id: u32, song_id: u32, guessed_owner_id: u32) -> Guess {
        Guess {
            guesser_id,
            song_id,
            guessed_owner_id,
        }
    }

    #[test]
    fn second_guess_overwrites_the_first() {
        let mut party = party_with(5, &[("Alice", [None; 3]), ("Bob", [None; 3])]);

        assert_eq!(record_guess(&mut party, guess(1, 4, 1)), Ok(None));
        assert_eq!(record_guess(&mut party, guess(1, 4, 2)), Ok(Some(1)));

        assert_eq!(party.guesses.len(), 1);
        assert_eq!(guesses_by(&party, 1), vec![(4, 2)]);
    }

    #[test]
    fn distinct_keys_are_kept_apart() {
        let mut party = party_with(5, &[("Alice", [None; 3]), ("Bob", [None; 3])]);

        record_guess(&mut party, guess(1, 4, 2)).unwrap();
        record_guess(&mut party, guess(2, 4, 2)).unwrap();
        record_guess(&mut party, guess(1, 5, 1)).unwrap();

        assert_eq!(party.guesses.len(), 3);
        assert_eq!(guesses_by(&party, 1), vec![(4, 2), (5, 1)]);
        assert_eq!(guesses_by(&party, 2), vec![(4, 2)]);
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut party = party_with(5, &[("Alice", [None; 3])]);

        assert_eq!(
            record_guess(&mut party, guess(1, 99, 1)),
            Err(LedgerError::UnknownSong(99))
        );
        assert_eq!(
            record_guess(&mut party, guess(7, 1, 1)),
            Err(LedgerError::UnknownParticipant(7))
        );
        assert_eq!(
            record_guess(&mut party, guess(1, 1, 8)),
            Err(LedgerError::UnknownParticipant(8))
        );
        assert!(party.guesses.is_empty());
    }
}
