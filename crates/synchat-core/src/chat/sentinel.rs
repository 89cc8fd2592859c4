//! Stream termination sentinels
//!
//! The upstream protocol grew several overlapping end-of-stream forms, so
//! the set is an ordered list of rules rather than hard-coded comparisons.
//! All matching is case-insensitive over the trimmed payload.

#[derive(Debug, Clone)]
enum SignalRule {
    /// Whole-payload match.
    Exact(String),
    /// Payload contains the needle anywhere.
    Substring(String),
}

/// Ordered set of termination matchers for candidate payloads.
#[derive(Debug, Clone)]
pub struct TerminationSignals {
    rules: Vec<SignalRule>,
}

impl Default for TerminationSignals {
    fn default() -> Self {
        let mut signals = Self { rules: Vec::new() };
        signals.push_exact("[DONE]");
        signals.push_exact("{\"done\": true}");
        signals.push_substring("\"done\":true");
        signals.push_substring("\"done\": true");
        signals.push_substring("stream completed");
        signals
    }
}

impl TerminationSignals {
    /// Add a whole-payload match rule.
    pub fn push_exact(&mut self, payload: &str) {
        self.rules.push(SignalRule::Exact(payload.to_lowercase()));
    }

    /// Add a contains-anywhere rule.
    pub fn push_substring(&mut self, needle: &str) {
        self.rules.push(SignalRule::Substring(needle.to_lowercase()));
    }

    /// True if the payload signals end of stream.
    pub fn is_terminal(&self, payload: &str) -> bool {
        let candidate = payload.trim().to_lowercase();
        self.rules.iter().any(|rule| match rule {
            SignalRule::Exact(expected) => candidate == *expected,
            SignalRule::Substring(needle) => candidate.contains(needle),
        })
    }
}
