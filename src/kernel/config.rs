use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::error::IvrError;
use super::menu::{MenuBuilder, DEFAULT_BARGE_IN, DEFAULT_MAX_ATTEMPTS};
use super::options::OptionBag;

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_barge_in() -> bool {
    DEFAULT_BARGE_IN
}

/// Static half of a menu, loadable from JSON.
///
/// Closures (dynamic prompts, validation, callbacks) cannot be expressed
/// here; attach them to the builder returned by `into_builder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuConfig {
    #[serde(default)]
    pub prompts: Vec<Value>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_barge_in")]
    pub barge_in: bool,
    /// Attempt index -> interruptible.
    #[serde(default)]
    pub barge_in_overrides: BTreeMap<usize, bool>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub renderer: Option<Value>,
    #[serde(default)]
    pub input_options: Option<OptionBag>,
    #[serde(default)]
    pub output_options: Option<OptionBag>,
    #[serde(default)]
    pub grammar: Option<String>,
    #[serde(default)]
    pub grammar_url: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            prompts: Vec::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            barge_in: DEFAULT_BARGE_IN,
            barge_in_overrides: BTreeMap::new(),
            timeout_ms: None,
            renderer: None,
            input_options: None,
            output_options: None,
            grammar: None,
            grammar_url: None,
            limit: None,
        }
    }
}

impl MenuConfig {
    pub fn from_json(raw: &str) -> Result<Self, IvrError> {
        serde_json::from_str(raw).map_err(|e| IvrError::InvalidConfig(e.to_string()))
    }

    pub fn into_builder<S>(self) -> MenuBuilder<S> {
        let mut builder = MenuBuilder::new()
            .prompts(self.prompts)
            .max_attempts(self.max_attempts)
            .barge_in(self.barge_in);

        for (attempt, allowed) in self.barge_in_overrides {
            builder = builder.barge_in_on(attempt, allowed);
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(renderer) = self.renderer {
            builder = builder.renderer(renderer);
        }
        if let Some(options) = self.input_options {
            builder = builder.input_options(options);
        }
        if let Some(options) = self.output_options {
            builder = builder.output_options(options);
        }
        if let Some(grammar) = self.grammar {
            builder = builder.grammar(grammar.as_str());
        }
        if let Some(url) = self.grammar_url {
            builder = builder.grammar_url(url);
        }
        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }
        builder
    }
}
