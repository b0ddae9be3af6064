// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_event_state --heading-base-level=0

//! Understory Event State: deterministic timing helpers for event streams.
//!
//! Hosts deliver events and the current time; these state machines decide
//! what should happen and when. None of them own a clock or spawn timers:
//! callers pass explicit millisecond timestamps and poll at the reported
//! deadlines, which keeps every transition reproducible in tests.
//!
//! - [`debounce::Debounce`]: collapse a burst of values into the last one,
//!   delivered after a quiet period. Scheduling returns a [`debounce::TimerToken`]
//!   that can cancel exactly that schedule.
//! - [`skip::SkipGate`]: drop the next event once, for example right after a
//!   programmatic scroll.
//! - [`frame::FrameThrottle`]: coalesce many requests into one callback per
//!   animation frame.
//!
//! ## Example
//!
//! ```
//! use understory_event_state::debounce::Debounce;
//!
//! let mut settle = Debounce::new(100);
//! settle.schedule("a", 1_000);
//! settle.schedule("b", 1_040);
//! settle.schedule("c", 1_090);
//!
//! assert_eq!(settle.deadline(), Some(1_190));
//! assert_eq!(settle.poll(1_150), None);
//! assert_eq!(settle.poll(1_190), Some("c"));
//! assert!(!settle.is_pending());
//! ```
//!
//! This crate is `no_std`.

#![no_std]

pub mod debounce;
pub mod frame;
pub mod skip;
