// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning a stored reading position back into a scroll offset.

use kurbo::Rect;
use understory_anchor::{DocumentTree, PointAnchor, PointTarget, decode_point};

use crate::metrics::ScrollMetrics;

/// Alignment policy when scrolling an element into view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollAlign {
    /// Align the top of the element with the top of the viewport.
    Start,
    /// Center the element within the viewport.
    #[default]
    Center,
    /// Align the bottom of the element with the bottom of the viewport.
    End,
    /// Move just enough to make the element fully visible, preferring the
    /// smallest change from the current scroll offset.
    Nearest,
}

impl ScrollAlign {
    /// Scroll offset showing the content span `item_start..item_end`.
    ///
    /// The result is clamped to the valid scroll range of `metrics`.
    pub fn offset(self, item_start: f64, item_end: f64, metrics: &ScrollMetrics) -> f64 {
        let viewport = metrics.client_height;
        let raw = match self {
            Self::Start => item_start,
            Self::End => item_end - viewport,
            Self::Center => (item_start + item_end) / 2.0 - viewport / 2.0,
            Self::Nearest => {
                let current = metrics.scroll_top;
                if item_start >= current && item_end <= current + viewport {
                    current
                } else if item_start < current {
                    item_start
                } else {
                    item_end - viewport
                }
            }
        };
        metrics.clamp_offset(raw)
    }
}

/// Where to scroll after loading a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollTarget<K> {
    /// Offset `0`.
    Top,
    /// Offset `scroll_height`, unclamped; the scrolling element settles on its
    /// last offset.
    Bottom,
    /// Bring an element into view.
    Element {
        /// The resolved element.
        node: K,
        /// How to align it.
        align: ScrollAlign,
    },
}

impl<K> ScrollTarget<K> {
    /// Concrete scroll offset for this target.
    ///
    /// `bounds_of` supplies an element's bounds in content coordinates (that is,
    /// including the current scroll offset). Returns `None` if it cannot.
    /// Element offsets are clamped to the scroll range; [`ScrollTarget::Bottom`]
    /// is not.
    pub fn resolve_offset(
        &self,
        metrics: &ScrollMetrics,
        bounds_of: impl FnOnce(&K) -> Option<Rect>,
    ) -> Option<f64> {
        match self {
            Self::Top => Some(0.0),
            Self::Bottom => Some(metrics.scroll_height),
            Self::Element { node, align } => {
                let bounds = bounds_of(node)?;
                Some(align.offset(bounds.y0, bounds.y1, metrics))
            }
        }
    }
}

/// Resolve a stored point to a scroll target.
///
/// Top and bottom resolve without touching `doc`. Returns `None` when the
/// stored path no longer matches an element.
pub fn restore_target<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    point: &PointAnchor,
    align: ScrollAlign,
) -> Option<ScrollTarget<D::NodeId>> {
    match decode_point(doc, root, point) {
        Some(PointTarget::Top) => Some(ScrollTarget::Top),
        Some(PointTarget::Bottom) => Some(ScrollTarget::Bottom),
        Some(PointTarget::Element(node)) => Some(ScrollTarget::Element { node, align }),
        None => {
            log::debug!("reading position {:?} no longer resolves", point.path());
            None
        }
    }
}
