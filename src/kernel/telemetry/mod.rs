//! Interaction telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a WRITE-ONLY side-effect layer for the engine.
//! It must **NEVER** be read inside transition logic.
//!
//! # PRIVACY INVARIANT
//! Events must **NEVER** contain caller content (prompts, utterances,
//! interpretations). Only attempt indices, outcome kinds and states.

pub mod event;
pub mod metrics;
pub mod recorder;
