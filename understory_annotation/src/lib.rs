// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_annotation --heading-base-level=0

//! Understory Annotation: from a user selection to a persisted highlight.
//!
//! ## Overview
//!
//! One interaction goes through [`AnnotationBuilder`]:
//!
//! 1) The host reports the current [`Selection`] (ranges of [`Boundary`] pairs,
//!    as a live document would express them).
//! 2) The builder checks its shape (exactly one non-collapsed range inside the
//!    tracked root), moves element boundaries onto text nodes, and classifies it:
//!    - [`Classification::Creatable`] carries the [`SpanAnchor`](understory_anchor::SpanAnchor) to persist.
//!    - [`Classification::CoincidesWithExisting`] lists the rendered annotations the
//!      selection enters; the UI should offer delete, not create.
//!    - [`Classification::Invalid`] explains why nothing can be done.
//! 3) [`AnnotationBuilder::save`], [`AnnotationBuilder::delete`] or
//!    [`AnnotationBuilder::dismiss`] ends the interaction.
//!
//! Persistence goes through the [`AnnotationStore`] trait. [`AnnotationSet`] is an
//! in-memory implementation that can also render itself into a document.
//!
//! [`FloatingControlPositioner`] computes where the create/delete toolbar goes.
//!
//! ## Example
//!
//! ```rust
//! use understory_annotation::{
//!     AnnotationBuilder, AnnotationSet, Boundary, Classification, RawRange, Selection,
//! };
//! use understory_dom_tree::Tree;
//!
//! let (mut tree, root) = Tree::from_markup("<div><p>Hello <b>world</b></p></div>").unwrap();
//! let world = tree.children_of(tree.children_of(tree.children_of(root)[0])[1])[0];
//! let selection = Selection::single(RawRange::new(Boundary::new(world, 0), Boundary::new(world, 5)));
//!
//! let mut builder = AnnotationBuilder::new();
//! let mut store = AnnotationSet::new();
//! assert!(matches!(
//!     builder.on_selection_change(&tree, root, &selection),
//!     Classification::Creatable(_)
//! ));
//! let id = builder.save(&mut store).unwrap().unwrap();
//!
//! // Render, then select the same text again: it now belongs to an annotation.
//! assert!(store.render(&mut tree, root, builder.config()).is_empty());
//! assert_eq!(
//!     builder.on_selection_change(&tree, root, &selection),
//!     Classification::CoincidesWithExisting(vec![id])
//! );
//! ```
//!
//! ## Features
//!
//! - `std` (default) / `libm`: float math for the toolbar geometry.
//! - `serde`: `Serialize`/`Deserialize` for [`Annotation`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod builder;
mod config;
mod selection;
mod store;
mod toolbar;

pub use builder::{AnnotationBuilder, Candidate, Classification, ToolbarMode};
pub use config::AnnotationConfig;
pub use selection::{
    Boundary, CoveredAnnotations, InvalidSelection, RawRange, Selection, contributing_text_nodes,
    covered_annotations, normalize, single_range, step_off_wrappers,
};
pub use store::{
    Annotation, AnnotationSet, AnnotationStore, DEFAULT_COLOR, SHORT_TEXT_LEN, short_text,
};
pub use toolbar::{
    DeviceCapabilities, FloatingControlPositioner, Placement, ToolbarLayout, ToolbarStyle,
};
