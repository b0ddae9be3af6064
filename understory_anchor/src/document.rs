// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document seam: read-only and mutable tree traits plus traversal helpers.

use core::cmp::Ordering;

use smallvec::SmallVec;

/// Read-only view of a document tree.
///
/// Anchoring only needs parents, ordered children, tag names, text, and
/// attributes. Elements answer `Some` from [`DocumentTree::tag_name`]; text
/// nodes answer `Some` from [`DocumentTree::text`]. Any other node kind
/// (comments, processing instructions) answers `None` to both and is skipped.
pub trait DocumentTree {
    /// Node handle. Must be cheap to copy and compare.
    type NodeId: Copy + Eq + core::fmt::Debug;

    /// Parent of a node, or `None` for roots.
    fn parent(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    /// Ordered children of a node.
    fn children(&self, node: Self::NodeId) -> &[Self::NodeId];

    /// Tag name of an element, or `None` for non-elements.
    fn tag_name(&self, node: Self::NodeId) -> Option<&str>;

    /// Content of a text node, or `None` for non-text nodes.
    fn text(&self, node: Self::NodeId) -> Option<&str>;

    /// Attribute value of an element.
    fn attribute(&self, node: Self::NodeId, name: &str) -> Option<&str>;

    /// Returns `true` if `node` is an element.
    fn is_element(&self, node: Self::NodeId) -> bool {
        self.tag_name(node).is_some()
    }

    /// Returns `true` if `node` is a text node.
    fn is_text(&self, node: Self::NodeId) -> bool {
        self.text(node).is_some()
    }
}

/// Mutations needed to render annotations into a document.
pub trait DocumentTreeMut: DocumentTree {
    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Self::NodeId;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> Self::NodeId;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: Self::NodeId, text: &str);

    /// Set an attribute on an element.
    fn set_attribute(&mut self, node: Self::NodeId, name: &str, value: &str);

    /// Move `child` under `parent` just before `reference`, or last when `reference` is `None`.
    fn insert_before(
        &mut self,
        parent: Self::NodeId,
        child: Self::NodeId,
        reference: Option<Self::NodeId>,
    );
}

/// Iterate the text nodes strictly under `node`, in document order.
pub fn text_nodes<D: DocumentTree + ?Sized>(doc: &D, node: D::NodeId) -> TextNodes<'_, D> {
    let mut stack = SmallVec::new();
    stack.push((node, 0));
    TextNodes { doc, stack }
}

/// Pre-order iterator over text nodes. Created by [`text_nodes`].
pub struct TextNodes<'a, D: DocumentTree + ?Sized> {
    doc: &'a D,
    stack: SmallVec<[(D::NodeId, usize); 16]>,
}

impl<D: DocumentTree + ?Sized> core::fmt::Debug for TextNodes<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextNodes")
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl<D: DocumentTree + ?Sized> Iterator for TextNodes<'_, D> {
    type Item = D::NodeId;

    fn next(&mut self) -> Option<D::NodeId> {
        loop {
            let (node, idx) = self.stack.last_mut()?;
            let Some(&child) = self.doc.children(*node).get(*idx) else {
                self.stack.pop();
                continue;
            };
            *idx += 1;
            if self.doc.is_text(child) {
                return Some(child);
            }
            self.stack.push((child, 0));
        }
    }
}

/// Number of characters (Unicode scalar values) in a text node; `0` for other nodes.
pub fn char_len<D: DocumentTree + ?Sized>(doc: &D, node: D::NodeId) -> usize {
    doc.text(node).map_or(0, |t| t.chars().count())
}

/// Returns `true` if `ancestor` is `node` or one of its ancestors.
pub fn contains<D: DocumentTree + ?Sized>(doc: &D, ancestor: D::NodeId, node: D::NodeId) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n == ancestor {
            return true;
        }
        current = doc.parent(n);
    }
    false
}

/// The closest element sibling before `node`.
pub fn previous_element_sibling<D: DocumentTree + ?Sized>(
    doc: &D,
    node: D::NodeId,
) -> Option<D::NodeId> {
    let parent = doc.parent(node)?;
    let siblings = doc.children(parent);
    let pos = siblings.iter().position(|&s| s == node)?;
    siblings[..pos]
        .iter()
        .rev()
        .copied()
        .find(|&s| doc.is_element(s))
}

/// First text node under `node` in document order.
pub fn first_text_node<D: DocumentTree + ?Sized>(doc: &D, node: D::NodeId) -> Option<D::NodeId> {
    text_nodes(doc, node).next()
}

/// Last text node under `node` in document order.
pub fn last_text_node<D: DocumentTree + ?Sized>(doc: &D, node: D::NodeId) -> Option<D::NodeId> {
    text_nodes(doc, node).last()
}

type Chain<K> = SmallVec<[K; 16]>;

/// Path of nodes from the topmost ancestor down to `node` (inclusive).
fn ancestor_chain<D: DocumentTree + ?Sized>(doc: &D, node: D::NodeId) -> Chain<D::NodeId> {
    let mut chain = Chain::new();
    let mut current = Some(node);
    while let Some(n) = current {
        chain.push(n);
        current = doc.parent(n);
    }
    chain.reverse();
    chain
}

/// Deepest node that contains both `a` and `b` (either may be the answer).
///
/// Returns `None` when the nodes live under different roots.
pub fn common_ancestor<D: DocumentTree + ?Sized>(
    doc: &D,
    a: D::NodeId,
    b: D::NodeId,
) -> Option<D::NodeId> {
    let chain_a = ancestor_chain(doc, a);
    let chain_b = ancestor_chain(doc, b);
    chain_a
        .iter()
        .zip(chain_b.iter())
        .take_while(|(x, y)| x == y)
        .last()
        .map(|(x, _)| *x)
}

/// Compare two nodes by document (pre-)order.
///
/// An ancestor sorts before its descendants. Returns `None` when the nodes
/// live under different roots.
pub fn document_order<D: DocumentTree + ?Sized>(
    doc: &D,
    a: D::NodeId,
    b: D::NodeId,
) -> Option<Ordering> {
    if a == b {
        return Some(Ordering::Equal);
    }
    let chain_a = ancestor_chain(doc, a);
    let chain_b = ancestor_chain(doc, b);
    if chain_a.first() != chain_b.first() {
        return None;
    }
    let shared = chain_a
        .iter()
        .zip(chain_b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    let (Some(&next_a), Some(&next_b)) = (chain_a.get(shared), chain_b.get(shared)) else {
        // One chain is a prefix of the other: the shorter one is the ancestor.
        return Some(chain_a.len().cmp(&chain_b.len()));
    };
    let siblings = doc.children(chain_a[shared - 1]);
    let pos_a = siblings.iter().position(|&s| s == next_a)?;
    let pos_b = siblings.iter().position(|&s| s == next_b)?;
    Some(pos_a.cmp(&pos_b))
}
