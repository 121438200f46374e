use tracing::debug;

use crate::{
    error::ServiceError,
    state::{
        SharedState,
        ledger::{self, Guess},
        party::{ParticipantId, SongId},
    },
};

/// A guess as shown back to the participant who placed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedGuess {
    pub song_id: SongId,
    pub guessed_owner_id: ParticipantId,
    pub guessed_owner_name: String,
}

/// Record (or overwrite) `guesser_id`'s claim that `guessed_owner_id` submitted `song_id`.
///
/// Guesses are accepted in every phase; only revealed songs ever count towards a score.
pub async fn submit_guess(
    state: &SharedState,
    party_id: &str,
    guesser_id: ParticipantId,
    song_id: SongId,
    guessed_owner_id: ParticipantId,
) -> Result<(), ServiceError> {
    let guess = Guess {
        guesser_id,
        song_id,
        guessed_owner_id,
    };
    let replaced = state
        .run_party_transaction(party_id, |party| Ok(ledger::record_guess(party, guess)?))
        .await?;

    debug!(
        party_id,
        guesser_id,
        song_id,
        guessed_owner_id,
        overwritten = replaced.is_some(),
        "guess recorded"
    );
    Ok(())
}

/// Every live guess placed by `user_id`.
pub async fn get_user_guesses(
    state: &SharedState,
    party_id: &str,
    user_id: ParticipantId,
) -> Result<Vec<RecordedGuess>, ServiceError> {
    let party = state.load_party(party_id).await?;
    if party.participant(user_id).is_none() {
        return Err(ServiceError::NotFound(format!(
            "participant `{user_id}` does not exist in party `{party_id}`"
        )));
    }

    Ok(ledger::guesses_by(&party, user_id)
        .into_iter()
        .map(|(song_id, guessed_owner_id)| RecordedGuess {
            song_id,
            guessed_owner_id,
            guessed_owner_name: party.participant_name(guessed_owner_id).to_owned(),
        })
        .collect())
}
