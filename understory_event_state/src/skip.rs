// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A one-shot gate that swallows the next event.

/// Drops exactly one event after being armed.
///
/// ```
/// use understory_event_state::skip::SkipGate;
///
/// let mut gate = SkipGate::armed();
/// assert!(!gate.pass());
/// assert!(gate.pass());
/// gate.arm();
/// assert!(!gate.pass());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkipGate {
    armed: bool,
}

impl SkipGate {
    /// A gate that lets everything through.
    pub const fn new() -> Self {
        Self { armed: false }
    }

    /// A gate that will swallow the next event.
    pub const fn armed() -> Self {
        Self { armed: true }
    }

    /// Swallow the next event. Arming twice still swallows only one.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Let the next event through.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Returns `true` if the next event will be swallowed.
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Offer an event to the gate: `false` means drop it (and disarm).
    #[must_use]
    pub fn pass(&mut self) -> bool {
        !core::mem::take(&mut self.armed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_arm_skips_once() {
        let mut gate = SkipGate::new();
        assert!(gate.pass());
        gate.arm();
        gate.arm();
        assert!(gate.is_armed());
        assert!(!gate.pass());
        assert!(gate.pass());
    }

    #[test]
    fn disarm_lets_next_through() {
        let mut gate = SkipGate::armed();
        gate.disarm();
        assert!(gate.pass());
    }
}
