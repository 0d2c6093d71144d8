use super::call::Call;

/// Evaluation context handed to every user closure of a menu.
///
/// Prompt producers, the validation predicate and both terminal callbacks
/// all receive the SAME context for the whole run, so per-run state written
/// by one is visible to the others.
#[derive(Debug)]
pub struct InteractionContext<S = ()> {
    pub call: Call,
    /// Caller-owned per-run state.
    pub state: S,
    attempt: usize,
}

impl<S> InteractionContext<S> {
    pub fn new(call: Call, state: S) -> Self {
        Self {
            call,
            state,
            attempt: 0,
        }
    }

    /// Zero-based index of the attempt currently in flight.
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    pub(crate) fn set_attempt(&mut self, attempt: usize) {
        self.attempt = attempt;
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

impl InteractionContext<()> {
    pub fn for_call(call: Call) -> Self {
        Self::new(call, ())
    }
}
