// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document tree: node identifiers and node payloads.

use alloc::string::String;
use alloc::vec::Vec;

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// An element: a lower-case tag name plus attributes in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Lower-case tag name.
    pub tag: String,
    /// Attributes as `(name, value)` pairs, in insertion order.
    pub attributes: Vec<(String, String)>,
}

impl Element {
    /// Create an element with the given tag and no attributes.
    ///
    /// The tag is stored lower-case.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Returns the value of an attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(slot) = self
            .attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            slot.1 = value.into();
        } else {
            self.attributes
                .push((name.to_ascii_lowercase(), value.into()));
        }
    }
}

/// Payload of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A tagged node with attributes and ordered children.
    Element(Element),
    /// A leaf holding a character string.
    Text(String),
}

impl NodeKind {
    /// Returns the element payload, if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            Self::Text(_) => None,
        }
    }

    /// Returns the text payload, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Element(_) => None,
        }
    }
}
