// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll metrics of the reading viewport and the percentage derived from them.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Snapshot of the scrolling element, in the host's logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Current scroll offset from the top of the document.
    pub scroll_top: f64,
    /// Full height of the scrollable content.
    pub scroll_height: f64,
    /// Height of the visible viewport.
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Metrics from raw values.
    pub const fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Largest valid scroll offset; `0` when the content fits.
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Clamp a scroll offset into `[0, max_scroll]`.
    pub fn clamp_offset(&self, offset: f64) -> f64 {
        offset.max(0.0).min(self.max_scroll())
    }

    /// Fraction of the scrollable distance already covered, rounded to three decimals.
    ///
    /// A document that does not scroll counts as fully read and answers `100`.
    pub fn viewed_fraction(&self) -> f64 {
        let scrollable = self.scroll_height - self.client_height;
        if scrollable <= 0.0 {
            return 100.0;
        }
        (self.scroll_top / scrollable * 1000.0).round() / 1000.0
    }

    /// Whole reading percentage in `0..=100`.
    pub fn percentage(&self) -> u8 {
        to_percent(self.viewed_fraction())
    }
}

/// Convert a viewed fraction to a whole percentage in `0..=100`.
///
/// Fractions past `1` (overscroll, or the "does not scroll" marker) count as `100`;
/// negative and NaN fractions count as `0`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "The value is rounded and lies in 0..=100."
)]
pub fn to_percent(fraction: f64) -> u8 {
    if fraction.is_nan() || fraction <= 0.0 {
        return 0;
    }
    (fraction.min(1.0) * 100.0).round() as u8
}
