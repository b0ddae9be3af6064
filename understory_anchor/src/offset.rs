// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text offsets: positions in the concatenated text of an element's text nodes.
//!
//! Offsets count characters (Unicode scalar values), not bytes. Both directions
//! walk text nodes with [`text_nodes`], so they agree on document order.

use crate::document::{DocumentTree, char_len, text_nodes};

/// Which text node an offset on the seam between two text nodes resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Affinity {
    /// End of the earlier node.
    #[default]
    Upstream,
    /// Start of the later node.
    Downstream,
}

/// A position inside a text node: the node plus a character offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextPosition<K> {
    /// The text node.
    pub node: K,
    /// Character offset inside `node`, `0..=len`.
    pub offset: usize,
}

impl<K> TextPosition<K> {
    /// Create a position.
    pub const fn new(node: K, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Character offset of `(text_node, local)` within the text of `element`.
///
/// Returns `None` if `text_node` is not a text node under `element` or if
/// `local` is past its end.
pub fn to_offset<D: DocumentTree + ?Sized>(
    doc: &D,
    element: D::NodeId,
    text_node: D::NodeId,
    local: usize,
) -> Option<usize> {
    if local > char_len(doc, text_node) {
        return None;
    }
    let mut consumed = 0;
    for node in text_nodes(doc, element) {
        if node == text_node {
            return Some(consumed + local);
        }
        consumed += char_len(doc, node);
    }
    None
}

/// Resolve `offset` within `element` to a text position, preferring the earlier node on seams.
///
/// Returns `None` when `offset` exceeds the total text length or the element
/// has no text nodes.
pub fn from_offset<D: DocumentTree + ?Sized>(
    doc: &D,
    element: D::NodeId,
    offset: usize,
) -> Option<TextPosition<D::NodeId>> {
    from_offset_with_affinity(doc, element, offset, Affinity::Upstream)
}

/// Resolve `offset` within `element` to a text position.
pub fn from_offset_with_affinity<D: DocumentTree + ?Sized>(
    doc: &D,
    element: D::NodeId,
    offset: usize,
    affinity: Affinity,
) -> Option<TextPosition<D::NodeId>> {
    let mut consumed = 0;
    let mut last = None;
    for node in text_nodes(doc, element) {
        let len = char_len(doc, node);
        let end = consumed + len;
        let hit = match affinity {
            Affinity::Upstream => offset <= end,
            Affinity::Downstream => offset < end,
        };
        if hit {
            return Some(TextPosition::new(node, offset - consumed));
        }
        consumed = end;
        last = Some((node, len));
    }
    // Downstream misses the very end of the text; it belongs to the last node.
    match (affinity, last) {
        (Affinity::Downstream, Some((node, len))) if offset == consumed => {
            Some(TextPosition::new(node, len))
        }
        _ => None,
    }
}

/// Byte index of the `chars`-th character of `text`, clamped to its length.
pub(crate) fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(idx, _)| idx)
}
