use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Opaque recognition grammar token. The kernel never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grammar(pub String);

impl From<&str> for Grammar {
    fn from(s: &str) -> Self {
        Grammar(s.to_string())
    }
}

/// Option bag forwarded verbatim to the collaborator.
pub type OptionBag = Map<String, Value>;

/// What the collaborator should listen for. Exactly one per collect call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionCriteria {
    Grammar(Grammar),
    GrammarUrl(String),
    /// DTMF digit ceiling. Replaces grammar-based collection entirely.
    Limit(u32),
}

/// Full parameter set for one collect call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectOptions {
    #[serde(flatten)]
    pub criteria: CollectionCriteria,
    pub interruptible: bool,
    /// Milliseconds on the wire.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_ms"
    )]
    pub timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_options: Option<OptionBag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_options: Option<OptionBag>,
}

impl CollectOptions {
    pub fn grammar(&self) -> Option<&Grammar> {
        match &self.criteria {
            CollectionCriteria::Grammar(g) => Some(g),
            _ => None,
        }
    }

    pub fn limit(&self) -> Option<u32> {
        match self.criteria {
            CollectionCriteria::Limit(n) => Some(n),
            _ => None,
        }
    }

    /// Renderer nested inside the output options, if any.
    pub fn renderer(&self) -> Option<&Value> {
        self.output_options.as_ref().and_then(|o| o.get("renderer"))
    }
}

/// Merges renderer into output options under a nested `renderer` key.
/// Returns None when neither is set.
pub fn merge_output_options(renderer: Option<&Value>, output: Option<&OptionBag>) -> Option<OptionBag> {
    if renderer.is_none() && output.is_none() {
        return None;
    }
    let mut merged = output.cloned().unwrap_or_default();
    if let Some(r) = renderer {
        merged.insert("renderer".to_string(), r.clone());
    }
    Some(merged)
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(d.as_millis() as u64),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
