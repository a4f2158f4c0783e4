//! Turn observation port.
//!
//! Presentation code taps into a streaming turn through this trait instead
//! of reaching into the message store. Callbacks fire only for events that
//! were actually applied; a superseded or cancelled turn goes silent
//! immediately and never reports a terminal outcome.

use solace_domain::{MessageId, TurnOutcome};

/// Callbacks for the lifecycle of one assistant turn.
///
/// All methods default to no-ops so implementations only override what
/// they render.
pub trait TurnObserver: Send + Sync {
    /// The assistant placeholder was appended; streaming is about to start.
    fn turn_started(&self, _message_id: MessageId) {}

    /// A text fragment was appended to the assistant message.
    fn delta(&self, _chunk: &str) {}

    /// A risk warning was inserted alongside the assistant message.
    fn risk_warning(&self, _content: &str) {}

    /// The turn reached its terminal outcome.
    fn turn_finished(&self, _outcome: TurnOutcome) {}
}

/// No-op observer for headless use and tests.
pub struct NoTurnObserver;

impl TurnObserver for NoTurnObserver {}
