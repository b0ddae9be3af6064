// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dom_tree --heading-base-level=0

//! Understory DOM Tree: an arena-backed document tree of elements and text nodes.
//!
//! This crate is the in-memory stand-in for a live document. It holds an ordered
//! tree of *elements* (tag plus attributes plus ordered children) and *text
//! nodes* (leaves holding a string). Text order is the pre-order traversal of the
//! tree, which is what text offsets and structural paths are computed against.
//!
//! - Nodes are addressed by generational [`NodeId`]s; removing a node makes every
//!   id in its subtree stale, and stale ids answer `None`/empty everywhere.
//! - Structure edits ([`Tree::insert_before`], [`Tree::detach`]) are what
//!   annotation wrapping needs; there is no layout, styling, or event model here.
//! - With the `markup` feature, `Tree::from_markup` and `Tree::to_markup` read
//!   and write HTML-like markup so hosts and tests can build fixtures quickly.
//!
//! ## Example
//!
//! ```rust
//! use understory_dom_tree::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.insert_element(None, "div");
//! let p = tree.insert_element(Some(root), "p");
//! tree.insert_text(Some(p), "Hello ");
//! let b = tree.insert_element(Some(p), "b");
//! tree.insert_text(Some(b), "world");
//!
//! assert_eq!(tree.tag_name(b), Some("b"));
//! assert_eq!(tree.text_content(p), "Hello world");
//! assert!(tree.contains(root, b));
//! ```
//!
//! ## Features
//!
//! - `markup` (default): markup reader and writer on top of `quick-xml`. Requires `std`.
//! - `std`: enable std mode for deps that support it.
//!
//! Without `markup` this crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "markup")]
mod markup;
mod tree;
mod types;

#[cfg(feature = "markup")]
pub use markup::MarkupError;
pub use tree::{Descendants, Tree};
pub use types::{Element, NodeId, NodeKind};
