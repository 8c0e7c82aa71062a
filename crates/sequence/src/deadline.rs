//! One-shot deadline with cancel-on-transition semantics.
//!
//! Every arm bumps a generation counter, so a timer set up for an earlier
//! sequence can never fire into a later one: its token simply stops
//! matching.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineToken {
    generation: u64,
    pub at: Instant,
}

#[derive(Debug, Default)]
pub struct Deadline {
    generation: u64,
    armed: Option<DeadlineToken>,
}

impl Deadline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `at`, replacing any earlier deadline.
    pub fn arm(&mut self, at: Instant) -> DeadlineToken {
        self.generation = self.generation.wrapping_add(1);
        let token = DeadlineToken {
            generation: self.generation,
            at,
        };
        self.armed = Some(token);
        token
    }

    /// Returns whether something was armed.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn pending(&self) -> Option<DeadlineToken> {
        self.armed
    }

    pub fn is_current(&self, token: DeadlineToken) -> bool {
        self.armed == Some(token)
    }

    /// Ties go to the deadline.
    pub fn is_due(&self, now: Instant) -> bool {
        self.armed.is_some_and(|token| now >= token.at)
    }

    /// Consume the deadline if `token` is still the armed one and due.
    pub fn fire(&mut self, token: DeadlineToken, now: Instant) -> bool {
        if self.is_current(token) && now >= token.at {
            self.armed = None;
            true
        } else {
            false
        }
    }
}
