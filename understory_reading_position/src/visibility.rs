// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Which element the reader is looking at.
//!
//! The host observes the [tracked leaves](tracked_leaves) and reports their
//! bounding boxes; [`VisibilityBand::first_visible`] picks the element that
//! crosses a horizontal band in the lower part of the viewport.

use alloc::vec::Vec;

use kurbo::Rect;
use understory_anchor::DocumentTree;

/// A horizontal band inside the viewport, given as insets from its edges.
///
/// Insets are fractions of the viewport height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityBand {
    /// Distance of the band from the top of the viewport.
    pub top_inset: f64,
    /// Distance of the band from the bottom of the viewport.
    pub bottom_inset: f64,
}

impl Default for VisibilityBand {
    fn default() -> Self {
        Self {
            top_inset: 0.65,
            bottom_inset: 0.25,
        }
    }
}

impl VisibilityBand {
    /// The band in the viewport's coordinate space.
    ///
    /// Insets that overlap collapse the band to a line.
    pub fn rect(&self, viewport: Rect) -> Rect {
        let height = viewport.height();
        let y0 = viewport.y0 + height * self.top_inset;
        let y1 = (viewport.y1 - height * self.bottom_inset).max(y0);
        Rect::new(viewport.x0, y0, viewport.x1, y1)
    }

    /// Returns `true` if `bounds` touches the band.
    ///
    /// Edges count, so zero-height elements sitting on the band are visible.
    pub fn intersects(&self, viewport: Rect, bounds: Rect) -> bool {
        let band = self.rect(viewport);
        bounds.y0 <= band.y1 && bounds.y1 >= band.y0 && bounds.x0 <= band.x1 && bounds.x1 >= band.x0
    }

    /// First entry, in the order given, whose bounds touch the band.
    pub fn first_visible<K>(
        &self,
        viewport: Rect,
        entries: impl IntoIterator<Item = (K, Rect)>,
    ) -> Option<K> {
        entries
            .into_iter()
            .find(|(_, bounds)| self.intersects(viewport, *bounds))
            .map(|(key, _)| key)
    }
}

/// Elements under `root` that have no element children, in document order.
///
/// `root` itself is never included, and neither are elements tagged
/// `ignored_tag` (annotation wrappers come and go and make poor anchors).
pub fn tracked_leaves<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    ignored_tag: &str,
) -> Vec<D::NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<D::NodeId> = doc.children(root).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        let Some(tag) = doc.tag_name(node) else {
            continue;
        };
        let children = doc.children(node);
        let is_leaf = !children.iter().any(|&c| doc.is_element(c));
        if is_leaf && !tag.eq_ignore_ascii_case(ignored_tag) {
            out.push(node);
        }
        stack.extend(children.iter().rev().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_dom_tree::Tree;

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 400.0, 1000.0);

    #[test]
    fn default_band_sits_in_the_lower_third() {
        let band = VisibilityBand::default().rect(VIEWPORT);
        assert_eq!(band, Rect::new(0.0, 650.0, 400.0, 750.0));
    }

    #[test]
    fn overlapping_insets_collapse() {
        let band = VisibilityBand {
            top_inset: 0.8,
            bottom_inset: 0.5,
        };
        let r = band.rect(VIEWPORT);
        assert_eq!(r.y0, 800.0);
        assert_eq!(r.height(), 0.0);
    }

    #[test]
    fn first_entry_crossing_the_band_wins() {
        let band = VisibilityBand::default();
        let entries = [
            ('a', Rect::new(0.0, 100.0, 400.0, 600.0)),
            ('b', Rect::new(0.0, 600.0, 400.0, 700.0)),
            ('c', Rect::new(0.0, 700.0, 400.0, 900.0)),
        ];
        assert_eq!(band.first_visible(VIEWPORT, entries), Some('b'));
        assert_eq!(band.first_visible(VIEWPORT, entries[2..].iter().copied()), Some('c'));
        assert_eq!(band.first_visible(VIEWPORT, entries[..1].iter().copied()), None);
    }

    #[test]
    fn edges_touch() {
        let band = VisibilityBand::default();
        assert!(band.intersects(VIEWPORT, Rect::new(0.0, 750.0, 400.0, 760.0)), "bottom edge");
        assert!(band.intersects(VIEWPORT, Rect::new(0.0, 700.0, 400.0, 700.0)), "zero height");
        assert!(!band.intersects(VIEWPORT, Rect::new(0.0, 751.0, 400.0, 760.0)), "below");
        assert!(!band.intersects(VIEWPORT, Rect::new(500.0, 700.0, 600.0, 710.0)), "off to the side");
    }

    #[test]
    fn leaves_skip_containers_and_wrappers() {
        let (tree, root) = Tree::from_markup(
            "<article><h1>Title</h1><p>One <rd-annotation>two</rd-annotation></p><ul><li>a</li><li><img></li></ul><p>Three</p></article>",
        )
        .unwrap();
        let leaves = tracked_leaves(&tree, root, "rd-annotation");
        let tags: Vec<_> = leaves.iter().map(|&n| tree.tag_name(n).unwrap()).collect();
        // The first <p> has an element child (the wrapper), so it is not a leaf.
        assert_eq!(tags, ["h1", "li", "img", "p"]);
    }

    #[test]
    fn root_is_never_a_leaf() {
        let (tree, root) = Tree::from_markup("<div>only text</div>").unwrap();
        assert!(tracked_leaves(&tree, root, "rd-annotation").is_empty());
    }
}
