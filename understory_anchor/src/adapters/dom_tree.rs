// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter for Understory DOM Tree.
//!
//! ## Feature
//!
//! Enable with `dom_tree_adapter` (default).
//!
//! ## Notes
//!
//! Stale [`NodeId`]s behave like detached, empty nodes: no parent, no
//! children, no tag, no text. Mutations on stale ids are ignored.

use understory_dom_tree::{NodeId, Tree};

use crate::document::{DocumentTree, DocumentTreeMut};

impl DocumentTree for Tree {
    type NodeId = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_of(node)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.children_of(node)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        Self::tag_name(self, node)
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        Self::text(self, node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        Self::attribute(self, node, name)
    }
}

impl DocumentTreeMut for Tree {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert_element(None, tag)
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.insert_text(None, text)
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        Self::set_text(self, node, text);
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        Self::set_attribute(self, node, name, value);
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        Self::insert_before(self, parent, child, reference);
    }
}
