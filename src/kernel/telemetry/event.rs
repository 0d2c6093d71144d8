use serde::{Deserialize, Serialize};

use crate::kernel::result::CollectKind;
use crate::kernel::state::InteractionState;

// Allowed: attempt indices, kinds, states, flags
// Forbidden: prompt text, utterances, interpretations, NLSML

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    AttemptStarted {
        attempt: usize,
        interruptible: bool,
    },

    OutcomeClassified {
        attempt: usize,
        kind: CollectKind,
    },

    /// Validation verdict on a match.
    Validated {
        attempt: usize,
        accepted: bool,
    },

    Transition {
        from: InteractionState,
        to: InteractionState,
    },

    Terminated {
        reason: TerminationReason,
        attempts: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    Complete,
    Failure,
    Stopped,
    HungUp,
}
