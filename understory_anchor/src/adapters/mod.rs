// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters that implement the document traits for concrete trees.
//!
//! Each adapter is gated behind a feature flag so the anchoring core stays
//! independent of any particular document representation.
//!
//! ## Available Adapters
//!
//! - [`dom_tree`] (`dom_tree_adapter` feature, on by default): implements
//!   [`DocumentTree`](crate::DocumentTree) and [`DocumentTreeMut`](crate::DocumentTreeMut)
//!   for [`understory_dom_tree::Tree`].

#[cfg(feature = "dom_tree_adapter")]
pub mod dom_tree;
