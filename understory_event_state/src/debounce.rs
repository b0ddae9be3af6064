// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trailing-edge debounce with cancel tokens.
//!
//! A [`Debounce`] holds at most one pending value. Scheduling a new value
//! replaces the pending one and restarts the quiet period, so a burst of
//! events yields exactly one delivery carrying the last value.
//!
//! ```
//! use understory_event_state::debounce::Debounce;
//!
//! let mut notify: Debounce<u32> = Debounce::new(1_500);
//! let first = notify.schedule(10, 0);
//! let second = notify.schedule(20, 500);
//!
//! // The first token is stale once a newer value has been scheduled.
//! assert!(!notify.cancel(first));
//! assert_eq!(notify.poll(1_999), None);
//! assert!(notify.cancel(second));
//! assert_eq!(notify.poll(5_000), None);
//! ```

/// Identifies one call to [`Debounce::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Clone, Debug)]
struct Pending<T> {
    value: T,
    deadline: u64,
    token: TimerToken,
}

/// Debounce state for one logical event stream.
#[derive(Clone, Debug)]
pub struct Debounce<T> {
    delay: u64,
    pending: Option<Pending<T>>,
    next_token: u64,
}

impl<T> Debounce<T> {
    /// Create a debounce that delivers `delay` milliseconds after the last schedule.
    pub const fn new(delay: u64) -> Self {
        Self {
            delay,
            pending: None,
            next_token: 0,
        }
    }

    /// Quiet period in milliseconds.
    pub const fn delay(&self) -> u64 {
        self.delay
    }

    /// Change the quiet period. A pending value keeps its deadline.
    pub fn set_delay(&mut self, delay: u64) {
        self.delay = delay;
    }

    /// Schedule `value` for delivery at `now + delay`, replacing any pending value.
    pub fn schedule(&mut self, value: T, now: u64) -> TimerToken {
        self.schedule_with_delay(value, now, self.delay)
    }

    /// Like [`Debounce::schedule`], with a one-off quiet period.
    pub fn schedule_with_delay(&mut self, value: T, now: u64, delay: u64) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        let deadline = now.saturating_add(delay);
        if self.pending.is_some() {
            log::trace!("debounce restarted, deadline {deadline}");
        }
        self.pending = Some(Pending {
            value,
            deadline,
            token,
        });
        token
    }

    /// Cancel the pending value if it was scheduled with `token`.
    ///
    /// Returns `true` if something was cancelled; stale tokens do nothing.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.token == token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Drop any pending value.
    pub fn cancel_all(&mut self) {
        self.pending = None;
    }

    /// Returns `true` while a value waits for delivery.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Token of the pending schedule, if any.
    pub fn pending_token(&self) -> Option<TimerToken> {
        self.pending.as_ref().map(|p| p.token)
    }

    /// When the pending value becomes due.
    pub fn deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// The pending value, without delivering it.
    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    /// Deliver the pending value if its deadline has passed.
    pub fn poll(&mut self, now: u64) -> Option<T> {
        if self.deadline()? > now {
            return None;
        }
        self.pending.take().map(|p| p.value)
    }

    /// Deliver the pending value immediately, regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }
}

impl<T> Default for Debounce<T> {
    fn default() -> Self {
        Self::new(0)
    }
}
