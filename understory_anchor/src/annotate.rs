// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering span anchors into a document by wrapping the covered text.

use alloc::string::String;
use alloc::vec::Vec;

use crate::codec::{SpanAnchor, decode_position};
use crate::document::{DocumentTree, DocumentTreeMut, char_len};
use crate::offset::{Affinity, byte_index};
use crate::range::{TextRange, covered_text_nodes};

/// Reasons a span cannot be wrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnnotateError {
    /// The start anchor does not resolve in this document.
    #[error("start boundary does not resolve")]
    UnresolvedStart,
    /// The end anchor does not resolve in this document.
    #[error("end boundary does not resolve")]
    UnresolvedEnd,
    /// The end resolves before the start.
    #[error("end boundary precedes start boundary")]
    InvertedRange,
    /// The span covers no characters.
    #[error("range covers no text")]
    EmptyRange,
    /// Some covered text is already wrapped by an element with the same tag.
    #[error("range overlaps an existing annotation")]
    Overlapping,
}

/// A piece of one text node: `start..end` in characters.
#[derive(Clone, Copy, Debug)]
struct Segment<K> {
    node: K,
    start: usize,
    end: usize,
}

/// Resolve `span` and split it into non-empty per-text-node segments.
fn segments<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    span: &SpanAnchor,
) -> Result<Vec<Segment<D::NodeId>>, AnnotateError> {
    let start = decode_position(doc, root, &span.start, Affinity::Downstream)
        .ok_or(AnnotateError::UnresolvedStart)?;
    let end = if span.end == span.start {
        start
    } else {
        decode_position(doc, root, &span.end, Affinity::Upstream)
            .ok_or(AnnotateError::UnresolvedEnd)?
    };
    let range = TextRange::new(start, end);
    let nodes = covered_text_nodes(doc, &range);
    if nodes.is_empty() || (nodes.len() == 1 && start.offset > end.offset) {
        return Err(AnnotateError::InvertedRange);
    }
    let last = nodes.len() - 1;
    let segments: Vec<_> = nodes
        .into_iter()
        .enumerate()
        .map(|(i, node)| Segment {
            node,
            start: if i == 0 { start.offset } else { 0 },
            end: if i == last {
                end.offset
            } else {
                char_len(doc, node)
            },
        })
        .filter(|s| s.start < s.end)
        .collect();
    if segments.is_empty() {
        return Err(AnnotateError::EmptyRange);
    }
    Ok(segments)
}

/// Check that `span` could be wrapped with `tag_name` without changing the document.
pub fn check_annotation<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    span: &SpanAnchor,
    tag_name: &str,
) -> Result<(), AnnotateError> {
    let segments = segments(doc, root, span)?;
    let overlaps = segments.iter().any(|s| {
        doc.parent(s.node)
            .and_then(|p| doc.tag_name(p))
            .is_some_and(|t| t.eq_ignore_ascii_case(tag_name))
    });
    if overlaps {
        return Err(AnnotateError::Overlapping);
    }
    Ok(())
}

/// Wrap the text covered by `span` in `tag_name` elements.
///
/// Boundary text nodes are split so that each wrapper holds exactly the
/// covered characters; every covered text node gets its own wrapper.
/// `on_wrap` is called with each wrapper and its 0-based index, which is
/// where hosts set id and color attributes. Returns the wrappers in
/// document order.
///
/// The document is left untouched on error.
///
/// ```
/// use understory_anchor::{SpanAnchor, TextAnchor, add_annotation};
/// use understory_dom_tree::Tree;
///
/// let (mut tree, root) = Tree::from_markup("<div><p>Hello <b>world</b>!</p></div>").unwrap();
/// let span = SpanAnchor {
///     start: TextAnchor { path: "p[1]".parse().unwrap(), offset: 3 },
///     end: TextAnchor { path: "p[1]/b[1]".parse().unwrap(), offset: 2 },
/// };
/// let wrappers = add_annotation(&mut tree, root, &span, "mark", |doc, node, _| {
///     doc.set_attribute(node, "data-id", "a1");
/// })
/// .unwrap();
///
/// assert_eq!(wrappers.len(), 2);
/// assert_eq!(
///     tree.inner_markup(root),
///     "<p>Hel<mark data-id=\"a1\">lo </mark><b><mark data-id=\"a1\">wo</mark>rld</b>!</p>"
/// );
/// ```
pub fn add_annotation<D, F>(
    doc: &mut D,
    root: D::NodeId,
    span: &SpanAnchor,
    tag_name: &str,
    mut on_wrap: F,
) -> Result<Vec<D::NodeId>, AnnotateError>
where
    D: DocumentTreeMut + ?Sized,
    F: FnMut(&mut D, D::NodeId, usize),
{
    check_annotation(doc, root, span, tag_name)?;
    let segments = segments(doc, root, span)?;
    let mut wrappers = Vec::with_capacity(segments.len());
    for (index, segment) in segments.into_iter().enumerate() {
        let Some(wrapper) = wrap_segment(doc, segment, tag_name) else {
            continue;
        };
        on_wrap(doc, wrapper, index);
        wrappers.push(wrapper);
    }
    Ok(wrappers)
}

/// Split `segment.node` around the segment and move the middle into a new wrapper.
fn wrap_segment<D: DocumentTreeMut + ?Sized>(
    doc: &mut D,
    segment: Segment<D::NodeId>,
    tag_name: &str,
) -> Option<D::NodeId> {
    let Segment { node, start, end } = segment;
    let parent = doc.parent(node)?;
    let text = String::from(doc.text(node)?);
    let len = text.chars().count();
    let (from, to) = (byte_index(&text, start), byte_index(&text, end));

    let wrapper = doc.create_element(tag_name);
    doc.insert_before(parent, wrapper, Some(node));
    if start > 0 {
        let before = doc.create_text(&text[..from]);
        doc.insert_before(parent, before, Some(wrapper));
    }
    if end < len {
        let after = doc.create_text(&text[to..]);
        doc.insert_before(parent, after, Some(node));
    }
    doc.set_text(node, &text[from..to]);
    doc.insert_before(wrapper, node, None);
    Some(wrapper)
}

#[cfg(all(test, feature = "dom_tree_adapter"))]
mod tests {
    use super::*;
    use crate::codec::{TextAnchor, encode_span};
    use crate::offset::TextPosition;
    use understory_dom_tree::Tree;

    fn span(start: &str, so: usize, end: &str, eo: usize) -> SpanAnchor {
        SpanAnchor {
            start: TextAnchor {
                path: start.parse().unwrap(),
                offset: so,
            },
            end: TextAnchor {
                path: end.parse().unwrap(),
                offset: eo,
            },
        }
    }

    #[test]
    fn wraps_inside_one_node() {
        let (mut tree, root) = Tree::from_markup("<div><p>Hello world</p></div>").unwrap();
        let wrappers =
            add_annotation(&mut tree, root, &span("p[1]", 6, "p[1]", 11), "rd-annotation", |_, _, _| {})
                .unwrap();
        assert_eq!(wrappers.len(), 1);
        assert_eq!(
            tree.inner_markup(root),
            "<p>Hello <rd-annotation>world</rd-annotation></p>"
        );
    }

    #[test]
    fn wraps_every_covered_node_with_indices() {
        let (mut tree, root) =
            Tree::from_markup("<div><p>one <i>two</i></p><p>three</p></div>").unwrap();
        let mut seen = Vec::new();
        let wrappers = add_annotation(
            &mut tree,
            root,
            &span("p[1]", 2, "p[2]", 2),
            "x",
            |_, node, index| seen.push((node, index)),
        )
        .unwrap();
        assert_eq!(wrappers.len(), 3);
        assert_eq!(seen.iter().map(|&(_, i)| i).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(
            tree.inner_markup(root),
            "<p>on<x>e </x><i><x>two</x></i></p><p><x>th</x>ree</p>"
        );
    }

    #[test]
    fn refuses_overlap_and_leaves_document_alone() {
        let (mut tree, root) = Tree::from_markup("<div><p>Hello world</p></div>").unwrap();
        add_annotation(&mut tree, root, &span("p[1]", 0, "p[1]", 5), "mark", |_, _, _| {}).unwrap();
        let before = tree.inner_markup(root);
        assert_eq!(
            add_annotation(&mut tree, root, &span("p[1]", 3, "p[1]", 8), "mark", |_, _, _| {}),
            Err(AnnotateError::Overlapping)
        );
        assert_eq!(tree.inner_markup(root), before);
        // Adjacent is fine: the seam after the first wrapper is not covered text.
        add_annotation(&mut tree, root, &span("p[1]", 5, "p[1]", 11), "mark", |_, _, _| {}).unwrap();
        assert_eq!(
            tree.inner_markup(root),
            "<p><mark>Hello</mark><mark> world</mark></p>"
        );
    }

    #[test]
    fn rejects_bad_spans() {
        let (mut tree, root) = Tree::from_markup("<div><p>Hello</p><p>world</p></div>").unwrap();
        let mut try_span = |s: SpanAnchor| add_annotation(&mut tree, root, &s, "mark", |_, _, _| {});
        assert_eq!(try_span(span("p[3]", 0, "p[1]", 1)), Err(AnnotateError::UnresolvedStart));
        assert_eq!(try_span(span("p[1]", 0, "p[1]", 9)), Err(AnnotateError::UnresolvedEnd));
        assert_eq!(try_span(span("p[1]", 4, "p[1]", 2)), Err(AnnotateError::InvertedRange));
        assert_eq!(try_span(span("p[2]", 1, "p[1]", 2)), Err(AnnotateError::InvertedRange));
        assert_eq!(try_span(span("p[1]", 2, "p[1]", 2)), Err(AnnotateError::EmptyRange));
    }

    #[test]
    fn wrapped_text_keeps_its_anchor() {
        let (mut tree, root) = Tree::from_markup("<div><p>Hello <b>world</b></p></div>").unwrap();
        let world = tree.children_of(tree.children_of(tree.children_of(root)[0])[1])[0];
        let anchor = encode_span(
            &tree,
            root,
            &TextRange::new(TextPosition::new(world, 1), TextPosition::new(world, 4)),
        )
        .unwrap();
        add_annotation(&mut tree, root, &anchor, "rd-annotation", |_, _, _| {}).unwrap();
        assert_eq!(
            tree.inner_markup(root),
            "<p>Hello <b>w<rd-annotation>orl</rd-annotation>d</b></p>"
        );
        // The wrapped node kept its identity and holds the covered text.
        assert_eq!(tree.text(world), Some("orl"));
    }
}
