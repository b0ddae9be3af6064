// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame scroll feedback: a progress percentage and the scroll direction.
//!
//! Both follow the same protocol. On every scroll event call `on_scroll`; if
//! it returns `true`, request an animation frame. When the frame arrives, call
//! `on_frame` with fresh metrics.

use understory_event_state::frame::FrameThrottle;

use crate::metrics::ScrollMetrics;

/// Live reading progress for a progress bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressIndicator {
    ticking: FrameThrottle,
    percentage: u8,
}

impl ProgressIndicator {
    /// Indicator showing the progress of `metrics`.
    pub fn new(metrics: &ScrollMetrics) -> Self {
        Self {
            ticking: FrameThrottle::new(),
            percentage: metrics.percentage(),
        }
    }

    /// Indicator pinned at 100%, for documents with nothing to track.
    pub fn complete() -> Self {
        Self {
            ticking: FrameThrottle::new(),
            percentage: 100,
        }
    }

    /// Last computed percentage.
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    /// A scroll event arrived. Returns `true` if a frame must be requested.
    #[must_use]
    pub fn on_scroll(&mut self) -> bool {
        self.ticking.request()
    }

    /// A frame arrived. Returns the new percentage if this indicator asked for the frame.
    pub fn on_frame(&mut self, metrics: &ScrollMetrics) -> Option<u8> {
        if !self.ticking.on_frame() {
            return None;
        }
        self.percentage = metrics.percentage();
        Some(self.percentage)
    }
}

/// Vertical scroll direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Toward the start of the document, or not moving.
    #[default]
    Up,
    /// Toward the end of the document.
    Down,
}

/// Detects whether the reader scrolls down or up, once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollDirectionTracker {
    ticking: FrameThrottle,
    previous: f64,
    direction: ScrollDirection,
}

impl ScrollDirectionTracker {
    /// Tracker starting at `scroll_top`.
    pub fn new(scroll_top: f64) -> Self {
        Self {
            ticking: FrameThrottle::new(),
            previous: scroll_top,
            direction: ScrollDirection::Up,
        }
    }

    /// Direction of the last frame's movement.
    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// A scroll event arrived. Returns `true` if a frame must be requested.
    #[must_use]
    pub fn on_scroll(&mut self) -> bool {
        self.ticking.request()
    }

    /// A frame arrived. Returns the direction if this tracker asked for the frame.
    pub fn on_frame(&mut self, scroll_top: f64) -> Option<ScrollDirection> {
        if !self.ticking.on_frame() {
            return None;
        }
        self.direction = if scroll_top > self.previous {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        self.previous = scroll_top;
        Some(self.direction)
    }
}
