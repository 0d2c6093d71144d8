use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

use super::call::Call;
use super::context::InteractionContext;
use super::error::IvrError;
use super::menu::{resolve_from, MenuDefinition, Prompt, PromptSource};
use super::result::{CollectKind, CollectResult};
use super::state::{Action, AttemptState, InteractionGraph, InteractionState, Signal, Transition};
use super::telemetry::event::{TelemetryEvent, TerminationReason};
use super::telemetry::recorder::TelemetryRecorder;
use crate::services::collect::Collector;

/// How a run ended, when it did not end in an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Validated result. The completion callback, if any, has already run.
    Complete(CollectResult),
    /// Attempts exhausted. Carries the last failing result.
    Failed(CollectResult),
    /// The collaborator stopped the prompt. No callback ran.
    Stopped,
}

impl Outcome {
    pub fn result(&self) -> Option<&CollectResult> {
        match self {
            Outcome::Complete(r) | Outcome::Failed(r) => Some(r),
            Outcome::Stopped => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete(_))
    }
}

/// What the driver loop does next.
enum Next {
    Deliver,
    Signal(Signal),
    Done(Outcome),
}

/// Runs one menu interaction on one call.
///
/// Single in-flight interaction: `run` takes `&mut self`, so a second
/// collect can never be issued while one is outstanding.
pub struct InteractionEngine<S = ()> {
    menu: Arc<MenuDefinition<S>>,
    collector: Option<Arc<dyn Collector>>,
    prompt_override: Option<Vec<PromptSource<S>>>,
    pub context: InteractionContext<S>,
    pub attempts: AttemptState,
    pub telemetry: TelemetryRecorder,
}

impl InteractionEngine<()> {
    pub fn for_call(menu: Arc<MenuDefinition<()>>, call: Call) -> Self {
        Self::new(menu, InteractionContext::for_call(call))
    }
}

impl<S> InteractionEngine<S> {
    pub fn new(menu: Arc<MenuDefinition<S>>, context: InteractionContext<S>) -> Self {
        Self {
            menu,
            collector: None,
            prompt_override: None,
            context,
            attempts: AttemptState::new(),
            telemetry: TelemetryRecorder::new(),
        }
    }

    pub fn with_collector(self, collector: impl Collector + 'static) -> Self {
        self.with_shared_collector(Arc::new(collector))
    }

    pub fn with_shared_collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Replaces the prompt list for this engine only. The menu is untouched.
    pub fn with_prompts<I, P>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PromptSource<S>>,
    {
        self.prompt_override = Some(prompts.into_iter().map(Into::into).collect());
        self
    }

    pub fn menu(&self) -> &MenuDefinition<S> {
        &self.menu
    }

    pub fn state(&self) -> InteractionState {
        self.attempts.current
    }

    pub fn into_context(self) -> InteractionContext<S> {
        self.context
    }

    /// Runs the interaction to a terminal state, a stop, or an error.
    pub async fn run(&mut self) -> Result<Outcome, IvrError> {
        let span = info_span!(
            "interaction",
            call_id = %self.context.call.id(),
            max_attempts = self.menu.max_attempts()
        );
        self.drive().instrument(span).await
    }

    async fn drive(&mut self) -> Result<Outcome, IvrError> {
        if self.collector.is_none() {
            return Err(IvrError::NoCollector);
        }
        self.attempts = AttemptState::new();
        self.context.set_attempt(0);

        let mut next = Next::Deliver;
        loop {
            let signal = match next {
                Next::Deliver => Signal::Collected(self.deliver_prompt().await?),
                Next::Signal(signal) => signal,
                Next::Done(outcome) => return Ok(outcome),
            };
            next = self.step(signal)?;
        }
    }

    /// Entry action of Prompting: resolve prompt and options for the current
    /// attempt, collect once, and report the outcome kind.
    pub async fn deliver_prompt(&mut self) -> Result<CollectKind, IvrError> {
        let collector = self.collector.clone().ok_or(IvrError::NoCollector)?;
        let attempt = self.attempts.attempt_index;

        // Options first: a bad menu is reported as such, even on a dead call,
        // and never consumes a stateful prompt.
        let options = self.menu.build_collect_options(attempt)?;
        if self.context.call.is_terminated() {
            info!("Call is already dead. Not prompting");
            return Err(IvrError::CallTerminated {
                call_id: self.context.call.id(),
            });
        }

        self.context.set_attempt(attempt);
        let prompt: Prompt = match &self.prompt_override {
            Some(sources) => resolve_from(sources, attempt, &mut self.context)?,
            None => self.menu.resolve_prompt(attempt, &mut self.context)?,
        };
        debug!(attempt, interruptible = options.interruptible, "Prompt: {}", prompt);

        self.telemetry.record(TelemetryEvent::AttemptStarted {
            attempt,
            interruptible: options.interruptible,
        });

        let result = collector.collect(&prompt, &options).await?;
        debug!("Got result {:?}", result);

        let kind = result.kind();
        self.telemetry.record(TelemetryEvent::OutcomeClassified { attempt, kind });
        self.attempts.latest_result = Some(result);
        Ok(kind)
    }

    /// Feeds one signal through the graph and performs the transition action.
    fn step(&mut self, signal: Signal) -> Result<Next, IvrError> {
        let from = self.attempts.current;
        let transition = InteractionGraph::transition(from, signal, &self.attempts, self.menu.max_attempts())
            .ok_or_else(|| IvrError::ContractViolation(format!("no transition from {:?} on {:?}", from, signal)))?;

        match transition {
            Transition::Stopped => {
                info!("Prompt was stopped forcibly. Exiting cleanly");
                self.terminated(TerminationReason::Stopped);
                Ok(Next::Done(Outcome::Stopped))
            }
            Transition::HungUp => {
                info!("Call was hung up mid-prompt. Exiting interaction");
                self.context.call.terminate();
                self.terminated(TerminationReason::HungUp);
                Err(IvrError::CallTerminated {
                    call_id: self.context.call.id(),
                })
            }
            Transition::To(to, action) => {
                self.attempts.current = to;
                self.telemetry.record(TelemetryEvent::Transition { from, to });
                self.perform(action)
            }
        }
    }

    fn perform(&mut self, action: Action) -> Result<Next, IvrError> {
        match action {
            Action::Validate => self.validate().map(Next::Signal),
            Action::Escalate => Ok(Next::Signal(Signal::Escalate)),
            Action::Reprompt => {
                self.attempts.attempt_index += 1;
                self.context.set_attempt(self.attempts.attempt_index);
                debug!(attempt = self.attempts.attempt_index, "Re-prompting");
                Ok(Next::Deliver)
            }
            Action::InvokeComplete => {
                let result = self.latest_result()?;
                if let Some(callback) = self.menu.completion_callback() {
                    callback(&mut self.context, &result);
                }
                info!(attempt = self.attempts.attempt_index, "Interaction complete");
                self.terminated(TerminationReason::Complete);
                Ok(Next::Done(Outcome::Complete(result)))
            }
            Action::InvokeFailure => {
                let result = self.latest_result()?;
                if let Some(callback) = self.menu.failure_callback() {
                    callback(&mut self.context);
                }
                info!(attempts = self.attempts.attempt_index + 1, "Interaction failed");
                self.terminated(TerminationReason::Failure);
                Ok(Next::Done(Outcome::Failed(result)))
            }
        }
    }

    /// Absent predicate means every match is accepted.
    fn validate(&mut self) -> Result<Signal, IvrError> {
        let result = self
            .attempts
            .latest_result
            .as_ref()
            .ok_or_else(|| IvrError::ContractViolation("validating without a result".to_string()))?;
        let accepted = match self.menu.validator() {
            Some(predicate) => predicate(&mut self.context, result),
            None => true,
        };
        self.telemetry.record(TelemetryEvent::Validated {
            attempt: self.attempts.attempt_index,
            accepted,
        });
        if !accepted {
            debug!("Validation rejected the match");
        }
        Ok(if accepted { Signal::Accepted } else { Signal::Rejected })
    }

    fn latest_result(&self) -> Result<CollectResult, IvrError> {
        self.attempts
            .latest_result
            .clone()
            .ok_or_else(|| IvrError::ContractViolation("terminal state without a result".to_string()))
    }

    fn terminated(&mut self, reason: TerminationReason) {
        self.telemetry.record(TelemetryEvent::Terminated {
            reason,
            attempts: self.attempts.attempt_index + 1,
        });
    }
}
