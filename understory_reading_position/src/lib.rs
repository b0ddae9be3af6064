// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_reading_position --heading-base-level=0

//! Understory Reading Position: remember how far a reader got, and take them back there.
//!
//! ## Overview
//!
//! A reading position is a [`PointAnchor`](understory_anchor::PointAnchor): a
//! percentage plus, strictly between 0% and 100%, the structural path of the
//! element being read.
//!
//! - [`tracked_leaves`] lists the elements worth observing (elements without
//!   element children, annotation wrappers excluded).
//! - [`VisibilityBand`] decides which observed element the reader is on;
//!   [`ReadingPositionTracker::visible_in_band`] applies the configured band.
//! - [`ReadingPositionTracker`] debounces those reports, reads the
//!   [`ScrollMetrics`] when they settle, and hands a stable position to a
//!   [`PositionStore`]. After loading, hash navigation or a restore it ignores
//!   one report so that its own scrolling is never recorded.
//! - [`ScrollTarget`] and [`ScrollAlign`] turn a stored position back into a
//!   scroll offset.
//! - [`ProgressIndicator`] and [`ScrollDirectionTracker`] give per-frame feedback.
//!
//! The crate has no clock. Every event carries a timestamp in milliseconds and
//! the host calls [`ReadingPositionTracker::poll`] once
//! [`ReadingPositionTracker::next_deadline`] has passed.
//!
//! ## Example
//!
//! ```rust
//! use understory_anchor::PointAnchor;
//! use understory_dom_tree::Tree;
//! use understory_reading_position::{ReadingPositionTracker, ScrollMetrics, ScrollTarget};
//!
//! let (tree, root) = Tree::from_markup("<article><p>one</p><p>two</p><p>three</p></article>").unwrap();
//! let mut store: Option<PointAnchor> = None;
//! let mut tracker = ReadingPositionTracker::new(None);
//!
//! // Nothing stored yet: restoring goes to the top.
//! let connection = tracker.connect(&tree, root, false, 0);
//! assert_eq!(connection.restore, Some(ScrollTarget::Top));
//! let second = connection.leaves[1];
//!
//! // The restore scroll itself is not recorded.
//! tracker.on_visibility_changed(Some(connection.leaves[0]), 10);
//! tracker.poll_into(&tree, root, 110, &mut store).unwrap();
//!
//! // The reader scrolls a third of the way.
//! tracker.on_scroll(ScrollMetrics::new(300.0, 1_100.0, 200.0));
//! tracker.on_visibility_changed(Some(second), 1_000);
//! tracker.poll_into(&tree, root, 1_100, &mut store).unwrap();
//! let saved = tracker.poll_into(&tree, root, 2_600, &mut store).unwrap().unwrap();
//! assert_eq!(saved.percentage(), 33);
//! assert_eq!(saved.path().unwrap().to_string(), "p[2]");
//!
//! // Next visit.
//! let mut tracker = ReadingPositionTracker::new(store);
//! let connection = tracker.connect(&tree, root, false, 0);
//! assert!(matches!(connection.restore, Some(ScrollTarget::Element { node, .. }) if node == second));
//! ```
//!
//! ## Features
//!
//! - `std` (default) / `libm`: float math for percentages.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod indicator;
mod metrics;
mod restore;
mod tracker;
mod visibility;

pub use config::TrackerConfig;
pub use indicator::{ProgressIndicator, ScrollDirection, ScrollDirectionTracker};
pub use metrics::{ScrollMetrics, to_percent};
pub use restore::{ScrollAlign, ScrollTarget, restore_target};
pub use tracker::{Connection, PositionStore, ReadingPositionTracker, TrackerEvent};
pub use visibility::{VisibilityBand, tracked_leaves};
