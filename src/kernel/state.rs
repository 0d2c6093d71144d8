use serde::{Deserialize, Serialize};

use super::result::{CollectKind, CollectResult};

/// States of one prompt/collect/validate interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionState {
    /// Entry action delivers the prompt for the current attempt.
    Prompting,
    /// A recognition matched; the predicate decides acceptance.
    Validating,
    /// The attempt failed (no-input, no-match or rejected).
    InputError,
    Complete,
    Failure,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::Prompting
    }
}

impl InteractionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InteractionState::Complete | InteractionState::Failure)
    }
}

/// Inputs to the graph. Collect outcomes plus the two internal decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Collected(CollectKind),
    Accepted,
    Rejected,
    /// Emitted on entry to InputError.
    Escalate,
}

/// Side effect owed by the engine when a transition is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run the validation predicate.
    Validate,
    /// Count the failure and decide retry vs fail.
    Escalate,
    /// Bump the attempt index and deliver the next prompt.
    Reprompt,
    InvokeComplete,
    InvokeFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    To(InteractionState, Action),
    /// Collaborator stopped the prompt. Quiet exit, no callbacks.
    Stopped,
    /// Caller hung up. Propagated as an error, no callbacks.
    HungUp,
}

/// Per-run bookkeeping. Dropped when the run ends.
#[derive(Debug, Clone, Default)]
pub struct AttemptState {
    /// Failed attempts so far.
    pub attempt_index: usize,
    pub latest_result: Option<CollectResult>,
    pub current: InteractionState,
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Another attempt is allowed after the one that just failed.
    pub fn can_retry(&self, max_attempts: usize) -> bool {
        self.attempt_index + 1 < max_attempts
    }
}

/// The transition table. Pure: no I/O, no callbacks.
pub struct InteractionGraph;

impl InteractionGraph {
    /// (State, Signal, Attempts) -> Transition.
    /// Returns None for pairs the table does not define.
    pub fn transition(current: InteractionState, signal: Signal, attempts: &AttemptState, max_attempts: usize) -> Option<Transition> {
        use InteractionState::*;

        match (current, signal) {
            // --- From Prompting ---
            (Prompting, Signal::Collected(kind)) => Some(match kind {
                CollectKind::Match => Transition::To(Validating, Action::Validate),
                CollectKind::NoMatch | CollectKind::NoInput => Transition::To(InputError, Action::Escalate),
                CollectKind::Stop => Transition::Stopped,
                CollectKind::Hangup => Transition::HungUp,
            }),

            // --- From Validating ---
            (Validating, Signal::Accepted) => Some(Transition::To(Complete, Action::InvokeComplete)),
            // Same path as a no-match.
            (Validating, Signal::Rejected) => Some(Transition::To(InputError, Action::Escalate)),

            // --- From InputError ---
            (InputError, Signal::Escalate) => {
                if attempts.can_retry(max_attempts) {
                    Some(Transition::To(Prompting, Action::Reprompt))
                } else {
                    Some(Transition::To(Failure, Action::InvokeFailure))
                }
            }

            // Terminal states accept nothing.
            _ => None,
        }
    }
}
