use serde::{Deserialize, Serialize};
use std::fmt;

/// How the caller answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Voice,
    Dtmf,
}

/// Payload of a `match`. Opaque to the engine: it is only forwarded to the
/// validation predicate and the completion callback.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Utterance {
    /// Recognized text. Absent for interpretation-only or NLSML-only matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utterance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<InputMode>,
    /// Raw NLSML document, if the recognizer produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlsml: Option<String>,
}

impl Utterance {
    pub fn voice(text: &str) -> Self {
        Self {
            utterance: Some(text.to_string()),
            interpretation: Some(serde_json::Value::String(text.to_string())),
            confidence: Some(1.0),
            mode: Some(InputMode::Voice),
            nlsml: None,
        }
    }

    pub fn dtmf(digits: &str) -> Self {
        Self {
            utterance: Some(digits.to_string()),
            interpretation: Some(serde_json::Value::String(digits.to_string())),
            confidence: Some(1.0),
            mode: Some(InputMode::Dtmf),
            nlsml: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.utterance.as_deref()
    }
}

/// One outcome of the collect collaborator.
///
/// The set of kinds is closed. Anything else coming over the wire fails to
/// deserialize and is treated as a contract violation by the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CollectResult {
    Match(Utterance),
    NoInput,
    NoMatch,
    Stop,
    Hangup,
}

/// Payload-free tag of a `CollectResult`. Safe for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectKind {
    Match,
    NoInput,
    NoMatch,
    Stop,
    Hangup,
}

impl CollectResult {
    pub fn kind(&self) -> CollectKind {
        match self {
            CollectResult::Match(_) => CollectKind::Match,
            CollectResult::NoInput => CollectKind::NoInput,
            CollectResult::NoMatch => CollectKind::NoMatch,
            CollectResult::Stop => CollectKind::Stop,
            CollectResult::Hangup => CollectKind::Hangup,
        }
    }

    pub fn matched(text: &str) -> Self {
        CollectResult::Match(Utterance::voice(text))
    }

    pub fn utterance(&self) -> Option<&Utterance> {
        match self {
            CollectResult::Match(u) => Some(u),
            _ => None,
        }
    }
}

impl fmt::Display for CollectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CollectKind::Match => "match",
            CollectKind::NoInput => "no-input",
            CollectKind::NoMatch => "no-match",
            CollectKind::Stop => "stop",
            CollectKind::Hangup => "hangup",
        };
        f.write_str(s)
    }
}
