// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text ranges between two [`TextPosition`]s.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::document::{DocumentTree, common_ancestor, document_order, text_nodes};
use crate::offset::{TextPosition, byte_index};

/// A range of text from `start` to `end`, both inside text nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextRange<K> {
    /// Start boundary.
    pub start: TextPosition<K>,
    /// End boundary.
    pub end: TextPosition<K>,
}

impl<K: Copy + Eq> TextRange<K> {
    /// Create a range.
    pub const fn new(start: TextPosition<K>, end: TextPosition<K>) -> Self {
        Self { start, end }
    }

    /// Returns `true` when both boundaries are the same position.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Order of two text positions in the document.
///
/// Returns `None` for positions in different trees.
pub fn compare_positions<D: DocumentTree + ?Sized>(
    doc: &D,
    a: TextPosition<D::NodeId>,
    b: TextPosition<D::NodeId>,
) -> Option<Ordering> {
    if a.node == b.node {
        return Some(a.offset.cmp(&b.offset));
    }
    document_order(doc, a.node, b.node)
}

/// The element that contains the whole range.
///
/// This is the common ancestor of both boundary nodes, lifted to its parent
/// element when the range sits inside a single text node.
pub fn range_ancestor<D: DocumentTree + ?Sized>(
    doc: &D,
    range: &TextRange<D::NodeId>,
) -> Option<D::NodeId> {
    let ancestor = common_ancestor(doc, range.start.node, range.end.node)?;
    if doc.is_text(ancestor) {
        doc.parent(ancestor)
    } else {
        Some(ancestor)
    }
}

/// Text nodes touched by the range, from the start node to the end node inclusive.
///
/// Empty when the end node precedes the start node.
pub fn covered_text_nodes<D: DocumentTree + ?Sized>(
    doc: &D,
    range: &TextRange<D::NodeId>,
) -> Vec<D::NodeId> {
    let Some(ancestor) = range_ancestor(doc, range) else {
        return Vec::new();
    };
    let mut covered = Vec::new();
    let mut started = false;
    for node in text_nodes(doc, ancestor) {
        if node == range.start.node {
            started = true;
        }
        if started {
            covered.push(node);
        }
        if node == range.end.node {
            if !started {
                covered.clear();
            }
            break;
        }
    }
    covered
}

/// The text the range covers.
pub fn range_text<D: DocumentTree + ?Sized>(doc: &D, range: &TextRange<D::NodeId>) -> String {
    let nodes = covered_text_nodes(doc, range);
    let last = nodes.len().saturating_sub(1);
    let mut out = String::new();
    for (i, &node) in nodes.iter().enumerate() {
        let text = doc.text(node).unwrap_or_default();
        let from = if i == 0 {
            byte_index(text, range.start.offset)
        } else {
            0
        };
        let to = if i == last {
            byte_index(text, range.end.offset)
        } else {
            text.len()
        };
        if from < to {
            out.push_str(&text[from..to]);
        }
    }
    out
}

#[cfg(all(test, feature = "dom_tree_adapter"))]
mod tests {
    use super::*;
    use understory_dom_tree::Tree;

    #[test]
    fn text_across_nodes() {
        let (tree, root) = Tree::from_markup("<div><p>Hello <b>bold</b> world</p><p>again</p></div>").unwrap();
        let p1 = tree.children_of(root)[0];
        let hello = tree.children_of(p1)[0];
        let again = tree.children_of(tree.children_of(root)[1])[0];
        let range = TextRange::new(TextPosition::new(hello, 2), TextPosition::new(again, 3));
        assert_eq!(range_text(&tree, &range), "llo bold worldaga");
        assert_eq!(covered_text_nodes(&tree, &range).len(), 4);
        assert_eq!(range_ancestor(&tree, &range), Some(root));
        assert_eq!(
            compare_positions(&tree, range.start, range.end),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn single_node_range_lifts_ancestor() {
        let (tree, root) = Tree::from_markup("<p>Hello</p>").unwrap();
        let text = tree.children_of(root)[0];
        let range = TextRange::new(TextPosition::new(text, 1), TextPosition::new(text, 4));
        assert_eq!(range_ancestor(&tree, &range), Some(root));
        assert_eq!(range_text(&tree, &range), "ell");
        assert!(!range.is_collapsed());
        assert!(TextRange::new(range.start, range.start).is_collapsed());
    }

    #[test]
    fn inverted_range_covers_nothing() {
        let (tree, root) = Tree::from_markup("<p>a<b>b</b></p>").unwrap();
        let a = tree.children_of(root)[0];
        let b = tree.children_of(tree.children_of(root)[1])[0];
        let range = TextRange::new(TextPosition::new(b, 0), TextPosition::new(a, 1));
        assert!(covered_text_nodes(&tree, &range).is_empty());
        assert_eq!(range_text(&tree, &range), "");
    }
}
