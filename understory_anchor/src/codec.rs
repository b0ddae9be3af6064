// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted anchors for spans and points, and their encode/decode operations.

use core::cmp::Ordering;

use crate::document::DocumentTree;
use crate::offset::{Affinity, TextPosition, from_offset_with_affinity, to_offset};
use crate::path::{StructuralPath, decode, encode};
use crate::range::{TextRange, compare_positions};

/// A text boundary: an element path plus a character offset into that element's text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextAnchor {
    /// Path to the element whose text the offset indexes.
    pub path: StructuralPath,
    /// Character offset over all text nodes under the element.
    pub offset: usize,
}

/// The persisted extent of an annotation.
///
/// With the `serde` feature this serializes flat, as `start_selector`,
/// `start_offset`, `end_selector` and `end_offset`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "SpanWire", into = "SpanWire")
)]
pub struct SpanAnchor {
    /// Start boundary.
    pub start: TextAnchor,
    /// End boundary.
    pub end: TextAnchor,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SpanWire {
    start_selector: StructuralPath,
    start_offset: usize,
    end_selector: StructuralPath,
    end_offset: usize,
}

#[cfg(feature = "serde")]
impl From<SpanWire> for SpanAnchor {
    fn from(wire: SpanWire) -> Self {
        Self {
            start: TextAnchor {
                path: wire.start_selector,
                offset: wire.start_offset,
            },
            end: TextAnchor {
                path: wire.end_selector,
                offset: wire.end_offset,
            },
        }
    }
}

#[cfg(feature = "serde")]
impl From<SpanAnchor> for SpanWire {
    fn from(span: SpanAnchor) -> Self {
        Self {
            start_selector: span.start.path,
            start_offset: span.start.offset,
            end_selector: span.end.path,
            end_offset: span.end.offset,
        }
    }
}

/// A reading position: a percentage through the document plus, strictly
/// between 0 and 100, the path of the element at that position.
///
/// The invariant is enforced by construction: [`PointAnchor::top`] and
/// [`PointAnchor::bottom`] never carry a path, [`PointAnchor::at`] always does.
/// With the `serde` feature this serializes as `{"s": path-or-null, "p": percentage}`.
///
/// ```
/// use understory_anchor::{PointAnchor, StructuralPath};
///
/// let path: StructuralPath = "p[3]".parse().unwrap();
/// let point = PointAnchor::at(path.clone(), 42).unwrap();
/// assert_eq!(point.path(), Some(&path));
/// assert!(PointAnchor::at(path, 100).is_none());
/// assert_eq!(PointAnchor::bottom().path(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "PointWire", into = "PointWire")
)]
pub struct PointAnchor {
    path: Option<StructuralPath>,
    percentage: u8,
}

impl PointAnchor {
    /// Top of the document (0%).
    pub const fn top() -> Self {
        Self {
            path: None,
            percentage: 0,
        }
    }

    /// Bottom of the document (100%).
    pub const fn bottom() -> Self {
        Self {
            path: None,
            percentage: 100,
        }
    }

    /// A position inside the document. `percentage` must be in `1..=99`.
    pub fn at(path: StructuralPath, percentage: u8) -> Option<Self> {
        (1..=99).contains(&percentage).then_some(Self {
            path: Some(path),
            percentage,
        })
    }

    /// Rebuild a point from stored parts.
    ///
    /// A path stored alongside 0 or 100 is dropped. Returns `None` for
    /// percentages over 100 and for in-between percentages without a path.
    pub fn from_parts(path: Option<StructuralPath>, percentage: u8) -> Option<Self> {
        match percentage {
            0 => Some(Self::top()),
            100 => Some(Self::bottom()),
            1..=99 => Self::at(path?, percentage),
            _ => None,
        }
    }

    /// Element path; `None` at the top and bottom.
    pub fn path(&self) -> Option<&StructuralPath> {
        self.path.as_ref()
    }

    /// Percentage through the document, `0..=100`.
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    /// Returns `true` at 0%.
    pub fn is_top(&self) -> bool {
        self.percentage == 0
    }

    /// Returns `true` at 100%.
    pub fn is_bottom(&self) -> bool {
        self.percentage == 100
    }
}

/// Stored point data that violates the [`PointAnchor`] invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid point anchor: {percentage}% requires a path strictly between 0 and 100")]
pub struct InvalidPointAnchor {
    /// The stored percentage.
    pub percentage: u8,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct PointWire {
    #[serde(rename = "s")]
    selector: Option<StructuralPath>,
    #[serde(rename = "p")]
    percentage: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<PointWire> for PointAnchor {
    type Error = InvalidPointAnchor;

    fn try_from(wire: PointWire) -> Result<Self, Self::Error> {
        Self::from_parts(wire.selector, wire.percentage).ok_or(InvalidPointAnchor {
            percentage: wire.percentage,
        })
    }
}

#[cfg(feature = "serde")]
impl From<PointAnchor> for PointWire {
    fn from(point: PointAnchor) -> Self {
        Self {
            selector: point.path,
            percentage: point.percentage,
        }
    }
}

/// Where a decoded [`PointAnchor`] points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointTarget<K> {
    /// The start of the document.
    Top,
    /// The end of the document.
    Bottom,
    /// A resolved element.
    Element(K),
}

/// Encode a text position against the element that directly contains it.
pub fn encode_position<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    position: TextPosition<D::NodeId>,
) -> Option<TextAnchor> {
    if !doc.is_text(position.node) {
        return None;
    }
    let element = doc.parent(position.node)?;
    Some(TextAnchor {
        path: encode(doc, root, element)?,
        offset: to_offset(doc, element, position.node, position.offset)?,
    })
}

/// Resolve a text anchor to a position.
pub fn decode_position<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    anchor: &TextAnchor,
    affinity: Affinity,
) -> Option<TextPosition<D::NodeId>> {
    let element = decode(doc, root, &anchor.path)?;
    from_offset_with_affinity(doc, element, anchor.offset, affinity)
}

/// Encode a range. Returns `None` if either boundary is outside `root` or not in a text node.
pub fn encode_span<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    range: &TextRange<D::NodeId>,
) -> Option<SpanAnchor> {
    Some(SpanAnchor {
        start: encode_position(doc, root, range.start)?,
        end: encode_position(doc, root, range.end)?,
    })
}

/// Resolve a span against the current document.
///
/// The start resolves downstream and the end upstream, so a boundary on a text
/// node seam lands inside the covered text. Returns `None` if either boundary
/// fails to resolve or if the end resolves before the start.
pub fn decode_span<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    span: &SpanAnchor,
) -> Option<TextRange<D::NodeId>> {
    let start = decode_position(doc, root, &span.start, Affinity::Downstream);
    let end = if span.end == span.start {
        start
    } else {
        decode_position(doc, root, &span.end, Affinity::Upstream)
    };
    let (Some(start), Some(end)) = (start, end) else {
        log::debug!(
            "span {}@{}..{}@{} does not resolve",
            span.start.path,
            span.start.offset,
            span.end.path,
            span.end.offset
        );
        return None;
    };
    match compare_positions(doc, start, end) {
        Some(Ordering::Less | Ordering::Equal) => Some(TextRange::new(start, end)),
        _ => {
            log::debug!("span {}..{} resolves inverted", span.start.path, span.end.path);
            None
        }
    }
}

/// Encode a reading position.
///
/// `0` and values of `100` or more encode as [`PointAnchor::top`] and
/// [`PointAnchor::bottom`]; in between, `element` is required.
pub fn encode_point<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    element: Option<D::NodeId>,
    percentage: u8,
) -> Option<PointAnchor> {
    match percentage {
        0 => Some(PointAnchor::top()),
        100.. => Some(PointAnchor::bottom()),
        _ => PointAnchor::at(encode(doc, root, element?)?, percentage),
    }
}

/// Resolve a reading position. Top and bottom never touch the document.
pub fn decode_point<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    point: &PointAnchor,
) -> Option<PointTarget<D::NodeId>> {
    if point.is_top() {
        return Some(PointTarget::Top);
    }
    if point.is_bottom() {
        return Some(PointTarget::Bottom);
    }
    let element = decode(doc, root, point.path()?)?;
    Some(PointTarget::Element(element))
}

#[cfg(all(test, feature = "dom_tree_adapter"))]
mod tests {
    use super::*;
    use crate::document::text_nodes;
    use crate::range::range_text;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use understory_dom_tree::{NodeId, Tree};

    const SCENARIO: &str = "<div id=root><p>Hello <b>world</b></p></div>";

    fn world(tree: &Tree, root: NodeId) -> NodeId {
        let p = tree.children_of(root)[0];
        tree.children_of(tree.children_of(p)[1])[0]
    }

    #[test]
    fn scenario_survives_reload() {
        let (tree, root) = Tree::from_markup(SCENARIO).unwrap();
        let text = world(&tree, root);
        let range = TextRange::new(TextPosition::new(text, 0), TextPosition::new(text, 5));
        let span = encode_span(&tree, root, &range).unwrap();
        assert_eq!(span.start.path.to_string(), "p[1]/b[1]");
        assert_eq!(span.start.offset, 0);
        assert_eq!(span.end.offset, 5);

        let (reloaded, new_root) = Tree::from_markup(SCENARIO).unwrap();
        let decoded = decode_span(&reloaded, new_root, &span).unwrap();
        assert_eq!(range_text(&reloaded, &decoded), "world");
        assert_eq!(decoded.start.node, world(&reloaded, new_root));
    }

    #[test]
    fn encode_then_decode_reproduces_text() {
        let (tree, root) = Tree::from_markup(
            "<div><p>One <em>two</em> three</p><blockquote><p>four <b>five</b></p></blockquote><p>six</p></div>",
        )
        .unwrap();
        let nodes: Vec<_> = text_nodes(&tree, root).collect();
        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i..] {
                let a_len = tree.text(a).unwrap().chars().count();
                let b_len = tree.text(b).unwrap().chars().count();
                for s in 0..=a_len {
                    for e in 0..=b_len {
                        if a == b && e < s {
                            continue;
                        }
                        let range = TextRange::new(TextPosition::new(a, s), TextPosition::new(b, e));
                        let span = encode_span(&tree, root, &range).unwrap();
                        let decoded = decode_span(&tree, root, &span).unwrap();
                        assert_eq!(range_text(&tree, &decoded), range_text(&tree, &range));
                        assert_ne!(
                            compare_positions(&tree, decoded.start, decoded.end),
                            Some(Ordering::Greater)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn inverted_span_does_not_decode() {
        let (tree, root) = Tree::from_markup("<div><p>first</p><p>second</p></div>").unwrap();
        let span = SpanAnchor {
            start: TextAnchor {
                path: "p[2]".parse().unwrap(),
                offset: 1,
            },
            end: TextAnchor {
                path: "p[1]".parse().unwrap(),
                offset: 2,
            },
        };
        assert_eq!(decode_span(&tree, root, &span), None);
    }

    #[test]
    fn shrunk_or_restructured_content_orphans() {
        let (tree, root) = Tree::from_markup(SCENARIO).unwrap();
        let text = world(&tree, root);
        let span = encode_span(
            &tree,
            root,
            &TextRange::new(TextPosition::new(text, 1), TextPosition::new(text, 4)),
        )
        .unwrap();

        let (shrunk, shrunk_root) = Tree::from_markup("<div><p>Hello <b>wo</b></p></div>").unwrap();
        assert_eq!(decode_span(&shrunk, shrunk_root, &span), None);

        let (moved, moved_root) = Tree::from_markup("<div><p>Hello <i>world</i></p></div>").unwrap();
        assert_eq!(decode_span(&moved, moved_root, &span), None);
    }

    #[test]
    fn duplicated_paragraph_resolves_to_first_copy() {
        let (tree, root) = Tree::from_markup("<div><p>Some <b>text</b></p><p>tail</p></div>").unwrap();
        let text = tree.children_of(tree.children_of(tree.children_of(root)[0])[1])[0];
        let span = encode_span(
            &tree,
            root,
            &TextRange::new(TextPosition::new(text, 0), TextPosition::new(text, 4)),
        )
        .unwrap();

        let (dup, dup_root) =
            Tree::from_markup("<div><p>Some <b>text</b></p><p>Some <b>text</b></p><p>tail</p></div>")
                .unwrap();
        let first_copy = dup.children_of(dup_root)[0];
        for _ in 0..3 {
            let decoded = decode_span(&dup, dup_root, &span).unwrap();
            assert!(dup.contains(first_copy, decoded.start.node));
            assert_eq!(range_text(&dup, &decoded), "text");
        }
    }

    #[test]
    fn points() {
        let (tree, root) = Tree::from_markup("<div><p>a</p><p>b</p></div>").unwrap();
        let second = tree.children_of(root)[1];
        assert_eq!(encode_point(&tree, root, None, 0), Some(PointAnchor::top()));
        assert_eq!(encode_point(&tree, root, Some(second), 100), Some(PointAnchor::bottom()));
        assert_eq!(encode_point(&tree, root, None, 50), None);

        let mid = encode_point(&tree, root, Some(second), 50).unwrap();
        assert_eq!(mid.path().unwrap().to_string(), "p[2]");
        assert_eq!(decode_point(&tree, root, &mid), Some(PointTarget::Element(second)));
        assert_eq!(decode_point(&tree, root, &PointAnchor::top()), Some(PointTarget::Top));

        let gone = PointAnchor::at("p[9]".parse().unwrap(), 10).unwrap();
        assert_eq!(decode_point(&tree, root, &gone), None);
    }

    #[test]
    fn point_parts() {
        let path: StructuralPath = "p[1]".parse().unwrap();
        assert_eq!(PointAnchor::from_parts(Some(path.clone()), 0), Some(PointAnchor::top()));
        assert_eq!(PointAnchor::from_parts(None, 100), Some(PointAnchor::bottom()));
        assert_eq!(PointAnchor::from_parts(None, 40), None);
        assert_eq!(PointAnchor::from_parts(Some(path.clone()), 101), None);
        let point = PointAnchor::from_parts(Some(path), 40).unwrap();
        assert_eq!(point.percentage(), 40);
        assert!(!point.is_top() && !point.is_bottom());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn persisted_shapes() {
        let span = SpanAnchor {
            start: TextAnchor {
                path: "p[1]/b[1]".parse().unwrap(),
                offset: 0,
            },
            end: TextAnchor {
                path: "p[2]".parse().unwrap(),
                offset: 3,
            },
        };
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(
            json,
            r#"{"start_selector":"p[1]/b[1]","start_offset":0,"end_selector":"p[2]","end_offset":3}"#
        );
        assert_eq!(serde_json::from_str::<SpanAnchor>(&json).unwrap(), span);

        let point = PointAnchor::at("div[1]/p[4]".parse().unwrap(), 37).unwrap();
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"s":"div[1]/p[4]","p":37}"#);
        assert_eq!(serde_json::from_str::<PointAnchor>(&json).unwrap(), point);
        assert_eq!(
            serde_json::from_str::<PointAnchor>(r#"{"s":null,"p":100}"#).unwrap(),
            PointAnchor::bottom()
        );
        assert!(serde_json::from_str::<PointAnchor>(r#"{"s":null,"p":50}"#).is_err());
        assert!(serde_json::from_str::<SpanAnchor>(r#"{"start_selector":"p[0]","start_offset":0,"end_selector":"p[1]","end_offset":0}"#).is_err());
    }
}
