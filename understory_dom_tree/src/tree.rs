// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, mutation, traversal.

use alloc::string::String;
use alloc::vec::Vec;

use crate::types::{Element, NodeId, NodeKind};

/// Document tree of elements and text nodes.
///
/// Nodes live in a slot arena addressed by generational [`NodeId`]s. A node
/// without a parent is a root; a tree may hold several roots (for example a
/// parsed fragment plus detached nodes created for later insertion).
///
/// Children are ordered, and document order is the pre-order traversal
/// exposed by [`Tree::descendants`].
///
/// ## Example
///
/// ```rust
/// use understory_dom_tree::Tree;
///
/// let mut tree = Tree::new();
/// let root = tree.insert_element(None, "div");
/// let p = tree.insert_element(Some(root), "p");
/// tree.insert_text(Some(p), "Hello");
///
/// assert_eq!(tree.tag_name(p), Some("p"));
/// assert_eq!(tree.text_content(root), "Hello");
/// ```
#[derive(Clone, Default)]
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    fn new(generation: u32, kind: NodeKind) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit indices."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, kind)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit indices."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Insert a new element as the last child of `parent` (or as a root if `None`).
    ///
    /// The tag name is stored lower-case.
    pub fn insert_element(&mut self, parent: Option<NodeId>, tag: &str) -> NodeId {
        let id = self.alloc(NodeKind::Element(Element::new(tag)));
        if let Some(p) = parent
            && self.is_alive(p)
        {
            self.link_parent(id, p, None);
        }
        id
    }

    /// Insert a new text node as the last child of `parent` (or as a root if `None`).
    pub fn insert_text(&mut self, parent: Option<NodeId>, text: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text(text.into()));
        if let Some(p) = parent
            && self.is_alive(p)
        {
            self.link_parent(id, p, None);
        }
        id
    }

    /// Remove a node (and its subtree) from the tree.
    ///
    /// Every identifier in the subtree becomes stale.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.detach(id);
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Unlink `id` from its parent, turning it into a root. The subtree stays live.
    pub fn detach(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
    }

    /// Move `child` under `parent`, just before `reference`.
    ///
    /// When `reference` is `None` or is not a child of `parent`, `child` is appended.
    /// Does nothing if either node is stale or if the move would create a cycle.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.is_alive(parent) || !self.is_alive(child) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        self.link_parent(child, parent, reference);
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .is_some_and(|node| node.generation == id.1)
    }

    /// Returns the payload of a live node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node_opt(id).map(|n| &n.kind)
    }

    /// Returns the parent of a live node, or `None` for roots and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Returns the tag name of an element, or `None` for text nodes and stale ids.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.kind(id)
            .and_then(NodeKind::as_element)
            .map(|e| e.tag.as_str())
    }

    /// Returns the content of a text node, or `None` for elements and stale ids.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.kind(id).and_then(NodeKind::as_text)
    }

    /// Replace the content of a text node. Ignored for elements and stale ids.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(NodeKind::Text(t)) = self.node_opt_mut(id).map(|n| &mut n.kind) {
            t.clear();
            t.push_str(text);
        }
    }

    /// Returns an attribute value of an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.kind(id)
            .and_then(NodeKind::as_element)
            .and_then(|e| e.attribute(name))
    }

    /// Set an attribute on an element. Ignored for text nodes and stale ids.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element(e)) = self.node_opt_mut(id).map(|n| &mut n.kind) {
            e.set_attribute(name, value);
        }
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_alive(ancestor) || !self.is_alive(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent_of(n);
        }
        false
    }

    /// Iterate the strict descendants of `root` in document (pre-)order.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let next = if self.is_alive(root) {
            self.children_of(root).first().copied()
        } else {
            None
        };
        Descendants {
            tree: self,
            root,
            next,
        }
    }

    /// Concatenated content of every text node at or under `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.into();
        }
        let mut out = String::new();
        for n in self.descendants(id) {
            if let Some(t) = self.text(n) {
                out.push_str(t);
            }
        }
        out
    }

    fn next_in_order(&self, current: NodeId, stop: Option<NodeId>) -> Option<NodeId> {
        let children = &self.node(current).children;
        if let Some(&first_child) = children.first()
            && self.is_alive(first_child)
        {
            return Some(first_child);
        }

        let mut node = current;
        while Some(node) != stop {
            let parent = self.parent_of(node)?;
            if let Some(next_sibling) = self.next_sibling(node) {
                return Some(next_sibling);
            }
            node = parent;
        }
        None
    }

    /// Returns the sibling following `node` under the same parent.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos + 1).copied()
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId, before: Option<NodeId>) {
        let parent_node = self.node_mut(parent);
        let pos = before.and_then(|b| parent_node.children.iter().position(|&c| c == b));
        match pos {
            Some(pos) => parent_node.children.insert(pos, id),
            None => parent_node.children.push(id),
        }
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let parent_node = self.node_mut(parent);
        parent_node.children.retain(|&c| c != id);
        self.node_mut(id).parent = None;
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()]
            .as_ref()
            .expect("dangling NodeId (node)")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()]
            .as_mut()
            .expect("dangling NodeId (node_mut)")
    }
}

/// Pre-order iterator over the descendants of a node.
///
/// Created by [`Tree::descendants`].
#[derive(Clone, Debug)]
pub struct Descendants<'a> {
    tree: &'a Tree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_in_order(current, Some(self.root));
        Some(current)
    }
}
