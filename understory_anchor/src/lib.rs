// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_anchor --heading-base-level=0

//! Understory Anchor: durable references to text ranges and reading positions.
//!
//! A live selection or scroll position refers to nodes that do not survive a
//! reload. This crate turns them into *anchors* that can be stored and later
//! re-resolved against a freshly built copy of the same document.
//!
//! ## Pieces
//!
//! - [`StructuralPath`]: a `tag[ordinal]` chain from a root element down to an
//!   element, for example `p[2]/b[1]`. [`encode`] and [`decode`] convert between
//!   elements and paths. Decoding never guesses: a step that does not match
//!   makes the whole path fail.
//! - Text offsets: [`to_offset`] and [`from_offset`] map between a position in a
//!   text node and a character offset into the concatenated text of an element.
//! - [`SpanAnchor`] and [`PointAnchor`]: the persisted shapes for annotations and
//!   reading positions, produced by [`encode_span`] / [`encode_point`] and
//!   resolved by [`decode_span`] / [`decode_point`].
//! - [`add_annotation`]: render a span by wrapping the covered text in marker
//!   elements.
//!
//! Failing to resolve is normal (the document changed); decoders return `None`
//! and callers treat the anchor as orphaned.
//!
//! ## Documents
//!
//! Algorithms run against the [`DocumentTree`] trait (and [`DocumentTreeMut`]
//! for wrapping). With the default `dom_tree_adapter` feature both are
//! implemented for [`understory_dom_tree::Tree`].
//!
//! ## Example
//!
//! ```rust
//! use understory_anchor::{TextPosition, TextRange, decode_span, encode_span, range_text};
//! use understory_dom_tree::Tree;
//!
//! let markup = "<div id=root><p>Hello <b>world</b></p></div>";
//! let (tree, root) = Tree::from_markup(markup).unwrap();
//! let b = tree.children_of(tree.children_of(root)[0])[1];
//! let world = tree.children_of(b)[0];
//!
//! let range = TextRange::new(TextPosition::new(world, 0), TextPosition::new(world, 5));
//! let span = encode_span(&tree, root, &range).unwrap();
//! assert_eq!(span.start.path.to_string(), "p[1]/b[1]");
//!
//! // A reload rebuilds every node; the anchor still finds the text.
//! let (reloaded, root) = Tree::from_markup(markup).unwrap();
//! let range = decode_span(&reloaded, root, &span).unwrap();
//! assert_eq!(range_text(&reloaded, &range), "world");
//! ```
//!
//! ## Features
//!
//! - `dom_tree_adapter` (default): trait implementations for `understory_dom_tree`.
//! - `serde`: `Serialize`/`Deserialize` for paths and anchors in their stored shapes.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;

mod annotate;
mod codec;
mod document;
mod offset;
mod path;
mod range;

pub use annotate::{AnnotateError, add_annotation, check_annotation};
pub use codec::{
    InvalidPointAnchor, PointAnchor, PointTarget, SpanAnchor, TextAnchor, decode_point,
    decode_position, decode_span, encode_point, encode_position, encode_span,
};
pub use document::{
    DocumentTree, DocumentTreeMut, TextNodes, char_len, common_ancestor, contains,
    document_order, first_text_node, last_text_node, previous_element_sibling, text_nodes,
};
pub use offset::{Affinity, TextPosition, from_offset, from_offset_with_affinity, to_offset};
pub use path::{PathParseError, PathStep, StructuralPath, decode, encode};
pub use range::{TextRange, compare_positions, covered_text_nodes, range_ancestor, range_text};
