//! Party lifecycle: phases derived from the stored round cursor and the transitions between them.
//!
//! A freshly created party is persisted directly in [`PartyPhase::Joining`]. Starting the
//! competition moves it to round 1, then every `NextRound` is a half-step: reveal the current
//! round, then advance to the next hidden one. The party is complete once the cursor points
//! past the last populated round while nothing is being revealed.

use thiserror::Error;

use crate::state::party::RoundProgress;

/// High-level phases a party can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyPhase {
    /// Accepting participants, the competition has not started.
    Joining,
    /// Playing round `round`; `revealed` mirrors the stored `show_results` flag.
    InRound {
        /// 1-based round number.
        round: u32,
        /// Whether the round's owners are visible.
        revealed: bool,
    },
    /// Every populated round was played and revealed.
    Completed,
}

impl PartyPhase {
    /// Derive the phase from the cursor and the number of songs holding a play position.
    pub fn derive(progress: RoundProgress, assigned_songs: usize, songs_per_round: u32) -> Self {
        if !progress.started || progress.current_round == 0 {
            return PartyPhase::Joining;
        }

        let already_played = u64::from(progress.current_round - 1) * u64::from(songs_per_round);
        if !progress.show_results && already_played >= assigned_songs as u64 {
            return PartyPhase::Completed;
        }

        PartyPhase::InRound {
            round: progress.current_round,
            revealed: progress.show_results,
        }
    }
}

/// Events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyEvent {
    /// Shuffle the pool and open round 1.
    StartCompetition,
    /// Reveal the current round, or advance once it is revealed.
    NextRound,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the party was in when the event was received.
    pub from: PartyPhase,
    /// Rejected event.
    pub event: PartyEvent,
}

/// Compute the cursor reached by applying `event` from `from`.
pub fn compute_transition(
    from: PartyPhase,
    event: PartyEvent,
) -> Result<RoundProgress, InvalidTransition> {
    let next = match (from, event) {
        (PartyPhase::Joining, PartyEvent::StartCompetition) => RoundProgress {
            started: true,
            current_round: 1,
            show_results: false,
        },
        (
            PartyPhase::InRound {
                round,
                revealed: false,
            },
            PartyEvent::NextRound,
        ) => RoundProgress {
            started: true,
            current_round: round,
            show_results: true,
        },
        (
            PartyPhase::InRound {
                round,
                revealed: true,
            },
            PartyEvent::NextRound,
        ) => RoundProgress {
            started: true,
            current_round: round + 1,
            show_results: false,
        },
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}
