use std::collections::VecDeque;

use super::event::{TelemetryEvent, TerminationReason};
use crate::kernel::result::CollectKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionStats {
    pub attempts: u64,
    pub interruptible_attempts: u64,
    pub matches: u64,
    pub no_input: u64,
    pub no_match: u64,
    pub rejected: u64,
    pub completions: u64,
    pub failures: u64,
    pub stops: u64,
    pub hangups: u64,
    /// Failed attempts over all attempts.
    pub failure_ratio: f64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> InteractionStats {
    let mut snap = InteractionStats::default();

    for event in events {
        match event {
            TelemetryEvent::AttemptStarted { interruptible, .. } => {
                snap.attempts += 1;
                if *interruptible {
                    snap.interruptible_attempts += 1;
                }
            }
            TelemetryEvent::OutcomeClassified { kind, .. } => match kind {
                CollectKind::Match => snap.matches += 1,
                CollectKind::NoInput => snap.no_input += 1,
                CollectKind::NoMatch => snap.no_match += 1,
                // Counted once, on termination
                CollectKind::Stop | CollectKind::Hangup => {}
            },
            TelemetryEvent::Validated { accepted: false, .. } => snap.rejected += 1,
            TelemetryEvent::Terminated { reason, .. } => match reason {
                TerminationReason::Complete => snap.completions += 1,
                TerminationReason::Failure => snap.failures += 1,
                TerminationReason::Stopped => snap.stops += 1,
                TerminationReason::HungUp => snap.hangups += 1,
            },
            _ => {}
        }
    }

    if snap.attempts > 0 {
        let failed = snap.no_input + snap.no_match + snap.rejected;
        snap.failure_ratio = failed as f64 / snap.attempts as f64;
    }

    snap
}
