use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::context::InteractionContext;
use super::error::IvrError;
use super::options::{merge_output_options, CollectOptions, CollectionCriteria, Grammar, OptionBag};
use super::result::CollectResult;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_BARGE_IN: bool = false;

/// A renderable prompt. Usually text or SSML, but the renderer decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prompt(pub Value);

impl Prompt {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt(Value::String(s.to_string()))
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt(Value::String(s))
    }
}

impl From<Value> for Prompt {
    fn from(v: Value) -> Self {
        Prompt(v)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

pub type PromptProducer<S> = Arc<dyn Fn(&mut InteractionContext<S>) -> Prompt + Send + Sync>;
pub type Validator<S> = Arc<dyn Fn(&mut InteractionContext<S>, &CollectResult) -> bool + Send + Sync>;
pub type CompletionCallback<S> = Arc<dyn Fn(&mut InteractionContext<S>, &CollectResult) + Send + Sync>;
pub type FailureCallback<S> = Arc<dyn Fn(&mut InteractionContext<S>) + Send + Sync>;

/// One entry of the prompt list.
pub enum PromptSource<S = ()> {
    Literal(Prompt),
    /// Evaluated every time the entry is selected. May be stateful.
    Producer(PromptProducer<S>),
}

impl<S> PromptSource<S> {
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn(&mut InteractionContext<S>) -> Prompt + Send + Sync + 'static,
    {
        PromptSource::Producer(Arc::new(f))
    }

    fn evaluate(&self, ctx: &mut InteractionContext<S>) -> Prompt {
        match self {
            PromptSource::Literal(p) => p.clone(),
            PromptSource::Producer(f) => f(ctx),
        }
    }
}

impl<S> Clone for PromptSource<S> {
    fn clone(&self) -> Self {
        match self {
            PromptSource::Literal(p) => PromptSource::Literal(p.clone()),
            PromptSource::Producer(f) => PromptSource::Producer(Arc::clone(f)),
        }
    }
}

impl<S> fmt::Debug for PromptSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptSource::Literal(p) => f.debug_tuple("Literal").field(p).finish(),
            PromptSource::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl<S> From<Prompt> for PromptSource<S> {
    fn from(p: Prompt) -> Self {
        PromptSource::Literal(p)
    }
}

impl<S> From<&str> for PromptSource<S> {
    fn from(s: &str) -> Self {
        PromptSource::Literal(s.into())
    }
}

impl<S> From<String> for PromptSource<S> {
    fn from(s: String) -> Self {
        PromptSource::Literal(s.into())
    }
}

impl<S> From<Value> for PromptSource<S> {
    fn from(v: Value) -> Self {
        PromptSource::Literal(v.into())
    }
}

/// Picks `sources[attempt]`, falling back to the last entry, and evaluates it.
pub fn resolve_from<S>(
    sources: &[PromptSource<S>],
    attempt: usize,
    ctx: &mut InteractionContext<S>,
) -> Result<Prompt, IvrError> {
    let source = sources
        .get(attempt)
        .or_else(|| sources.last())
        .ok_or(IvrError::NoPrompts)?;
    Ok(source.evaluate(ctx))
}

/// Declarative menu. Immutable once built; share it behind an `Arc` across
/// as many engines as needed.
pub struct MenuDefinition<S = ()> {
    prompts: Vec<PromptSource<S>>,
    max_attempts: usize,
    barge_in: bool,
    barge_in_overrides: HashMap<usize, bool>,
    timeout: Option<Duration>,
    renderer: Option<Value>,
    input_options: Option<OptionBag>,
    output_options: Option<OptionBag>,
    grammar: Option<Grammar>,
    grammar_url: Option<String>,
    limit: Option<u32>,
    validate: Option<Validator<S>>,
    on_complete: Option<CompletionCallback<S>>,
    on_failure: Option<FailureCallback<S>>,
}

impl<S> MenuDefinition<S> {
    pub fn builder() -> MenuBuilder<S> {
        MenuBuilder::new()
    }

    // --- Getters (setters live on the builder) ---

    pub fn prompts(&self) -> &[PromptSource<S>] {
        &self.prompts
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn barge_in(&self) -> bool {
        self.barge_in
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn renderer(&self) -> Option<&Value> {
        self.renderer.as_ref()
    }

    pub fn input_options(&self) -> Option<&OptionBag> {
        self.input_options.as_ref()
    }

    pub fn output_options(&self) -> Option<&OptionBag> {
        self.output_options.as_ref()
    }

    pub fn grammar(&self) -> Option<&Grammar> {
        self.grammar.as_ref()
    }

    pub fn grammar_url(&self) -> Option<&str> {
        self.grammar_url.as_deref()
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub(crate) fn validator(&self) -> Option<&Validator<S>> {
        self.validate.as_ref()
    }

    pub(crate) fn completion_callback(&self) -> Option<&CompletionCallback<S>> {
        self.on_complete.as_ref()
    }

    pub(crate) fn failure_callback(&self) -> Option<&FailureCallback<S>> {
        self.on_failure.as_ref()
    }

    pub fn has_completion_callback(&self) -> bool {
        self.on_complete.is_some()
    }

    // --- Evaluation rules ---

    pub fn resolve_prompt(&self, attempt: usize, ctx: &mut InteractionContext<S>) -> Result<Prompt, IvrError> {
        resolve_from(&self.prompts, attempt, ctx)
    }

    /// Only the very first prompt is interruptible by default.
    pub fn resolve_barge_in(&self, attempt: usize) -> bool {
        match self.barge_in_overrides.get(&attempt) {
            Some(&explicit) => explicit,
            None => attempt == 0 && self.barge_in,
        }
    }

    /// Digit-limit mode wins over grammar mode.
    pub fn collection_criteria(&self) -> Result<CollectionCriteria, IvrError> {
        if let Some(limit) = self.limit {
            if self.grammar.is_some() || self.grammar_url.is_some() {
                warn!("Digit limit {} overrides configured grammar", limit);
            }
            return Ok(CollectionCriteria::Limit(limit));
        }
        match (&self.grammar, &self.grammar_url) {
            (Some(_), Some(_)) => Err(IvrError::AmbiguousCollectionCriteria),
            (Some(g), None) => Ok(CollectionCriteria::Grammar(g.clone())),
            (None, Some(url)) => Ok(CollectionCriteria::GrammarUrl(url.clone())),
            (None, None) => Err(IvrError::MissingCollectionCriteria),
        }
    }

    pub fn build_collect_options(&self, attempt: usize) -> Result<CollectOptions, IvrError> {
        Ok(CollectOptions {
            criteria: self.collection_criteria()?,
            interruptible: self.resolve_barge_in(attempt),
            timeout: self.timeout,
            output_options: merge_output_options(self.renderer.as_ref(), self.output_options.as_ref()),
            input_options: self.input_options.clone(),
        })
    }
}

impl<S> Clone for MenuDefinition<S> {
    fn clone(&self) -> Self {
        Self {
            prompts: self.prompts.clone(),
            max_attempts: self.max_attempts,
            barge_in: self.barge_in,
            barge_in_overrides: self.barge_in_overrides.clone(),
            timeout: self.timeout,
            renderer: self.renderer.clone(),
            input_options: self.input_options.clone(),
            output_options: self.output_options.clone(),
            grammar: self.grammar.clone(),
            grammar_url: self.grammar_url.clone(),
            limit: self.limit,
            validate: self.validate.clone(),
            on_complete: self.on_complete.clone(),
            on_failure: self.on_failure.clone(),
        }
    }
}

impl<S> fmt::Debug for MenuDefinition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuDefinition")
            .field("prompts", &self.prompts)
            .field("max_attempts", &self.max_attempts)
            .field("barge_in", &self.barge_in)
            .field("timeout", &self.timeout)
            .field("grammar", &self.grammar)
            .field("grammar_url", &self.grammar_url)
            .field("limit", &self.limit)
            .field("validate", &self.validate.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Fluent builder for `MenuDefinition`.
pub struct MenuBuilder<S = ()> {
    menu: MenuDefinition<S>,
}

impl<S> Default for MenuBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MenuBuilder<S> {
    pub fn new() -> Self {
        Self {
            menu: MenuDefinition {
                prompts: Vec::new(),
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                barge_in: DEFAULT_BARGE_IN,
                barge_in_overrides: HashMap::new(),
                timeout: None,
                renderer: None,
                input_options: None,
                output_options: None,
                grammar: None,
                grammar_url: None,
                limit: None,
                validate: None,
                on_complete: None,
                on_failure: None,
            },
        }
    }

    /// Appends one prompt to the list.
    pub fn prompt(mut self, prompt: impl Into<PromptSource<S>>) -> Self {
        self.menu.prompts.push(prompt.into());
        self
    }

    /// Appends a prompt computed from the context each time it is selected.
    pub fn prompt_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut InteractionContext<S>) -> Prompt + Send + Sync + 'static,
    {
        self.menu.prompts.push(PromptSource::producer(f));
        self
    }

    pub fn prompts<I, P>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PromptSource<S>>,
    {
        self.menu.prompts.extend(prompts.into_iter().map(Into::into));
        self
    }

    pub fn max_attempts(mut self, n: usize) -> Self {
        self.menu.max_attempts = n;
        self
    }

    pub fn barge_in(mut self, allowed: bool) -> Self {
        self.menu.barge_in = allowed;
        self
    }

    /// Explicit interruptibility for one attempt. Beats the default policy.
    pub fn barge_in_on(mut self, attempt: usize, allowed: bool) -> Self {
        self.menu.barge_in_overrides.insert(attempt, allowed);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.menu.timeout = Some(timeout);
        self
    }

    pub fn renderer(mut self, renderer: impl Into<Value>) -> Self {
        self.menu.renderer = Some(renderer.into());
        self
    }

    pub fn input_options(mut self, options: OptionBag) -> Self {
        self.menu.input_options = Some(options);
        self
    }

    pub fn output_options(mut self, options: OptionBag) -> Self {
        self.menu.output_options = Some(options);
        self
    }

    pub fn grammar(mut self, grammar: impl Into<Grammar>) -> Self {
        self.menu.grammar = Some(grammar.into());
        self
    }

    pub fn grammar_url(mut self, url: impl Into<String>) -> Self {
        self.menu.grammar_url = Some(url.into());
        self
    }

    pub fn limit(mut self, digits: u32) -> Self {
        self.menu.limit = Some(digits);
        self
    }

    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut InteractionContext<S>, &CollectResult) -> bool + Send + Sync + 'static,
    {
        self.menu.validate = Some(Arc::new(f));
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut InteractionContext<S>, &CollectResult) + Send + Sync + 'static,
    {
        self.menu.on_complete = Some(Arc::new(f));
        self
    }

    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut InteractionContext<S>) + Send + Sync + 'static,
    {
        self.menu.on_failure = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<MenuDefinition<S>, IvrError> {
        if self.menu.max_attempts == 0 {
            return Err(IvrError::InvalidMaxAttempts);
        }
        Ok(self.menu)
    }
}
