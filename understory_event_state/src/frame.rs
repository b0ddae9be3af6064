// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation-frame coalescing.
//!
//! Scroll and resize events can fire many times per frame. A [`FrameThrottle`]
//! tells the host to request a frame only for the first event; the work runs
//! once when that frame arrives.
//!
//! ```
//! use understory_event_state::frame::FrameThrottle;
//!
//! let mut ticking = FrameThrottle::new();
//! assert!(ticking.request()); // host: request an animation frame
//! assert!(!ticking.request()); // already requested
//! assert!(ticking.on_frame()); // frame arrived: do the work once
//! assert!(!ticking.on_frame());
//! ```

/// Tracks whether an animation frame has been requested and not yet run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameThrottle {
    requested: bool,
}

impl FrameThrottle {
    /// No frame requested.
    pub const fn new() -> Self {
        Self { requested: false }
    }

    /// Note that work is needed. Returns `true` if the caller must request a frame.
    #[must_use]
    pub fn request(&mut self) -> bool {
        !core::mem::replace(&mut self.requested, true)
    }

    /// A frame arrived. Returns `true` if work was requested for it.
    pub fn on_frame(&mut self) -> bool {
        core::mem::take(&mut self.requested)
    }

    /// Returns `true` while a requested frame has not run.
    pub const fn is_pending(&self) -> bool {
        self.requested
    }

    /// Forget a requested frame, for example when the host cancels it.
    pub fn cancel(&mut self) {
        self.requested = false;
    }
}
