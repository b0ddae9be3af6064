// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracker timings and tracking rules.

use alloc::string::String;

use crate::restore::ScrollAlign;
use crate::visibility::VisibilityBand;

/// Configuration for [`ReadingPositionTracker`](crate::ReadingPositionTracker).
///
/// Delays are in milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Quiet period after the last visibility report before the position is read.
    pub settle_delay: u64,
    /// Quiet period after the last position change before it is saved.
    pub notify_delay: u64,
    /// Band of the viewport that decides which element is being read.
    pub band: VisibilityBand,
    /// Elements with this tag are never tracked.
    pub ignored_tag: String,
    /// Alignment of a restored element.
    pub restore_align: ScrollAlign,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            settle_delay: 100,
            notify_delay: 1_500,
            band: VisibilityBand::default(),
            ignored_tag: "rd-annotation".into(),
            restore_align: ScrollAlign::Center,
        }
    }
}
