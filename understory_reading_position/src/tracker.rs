// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The reading position state machine.
//!
//! Time is explicit: every event carries `now` in milliseconds and the host
//! calls [`ReadingPositionTracker::poll`] whenever
//! [`ReadingPositionTracker::next_deadline`] passes. Two debounces run in
//! sequence. The settle debounce collapses a burst of visibility reports into
//! one reading of the position; the notify debounce waits for the position to
//! stay put before it is handed to storage.

use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt::Debug;

use kurbo::Rect;
use understory_anchor::{DocumentTree, PointAnchor, encode_point};
use understory_event_state::debounce::Debounce;
use understory_event_state::skip::SkipGate;

use crate::config::TrackerConfig;
use crate::metrics::ScrollMetrics;
use crate::restore::{ScrollTarget, restore_target};
use crate::visibility::tracked_leaves;

/// Persistence of the reading position.
pub trait PositionStore {
    /// Failure reported by the store. The tracker never retries.
    type Error;

    /// Save the current position.
    fn save_position(&mut self, point: &PointAnchor) -> Result<(), Self::Error>;

    /// The saved position, if any.
    fn load_position(&self) -> Result<Option<PointAnchor>, Self::Error>;
}

/// A single slot in memory.
impl PositionStore for Option<PointAnchor> {
    type Error = Infallible;

    fn save_position(&mut self, point: &PointAnchor) -> Result<(), Self::Error> {
        *self = Some(point.clone());
        Ok(())
    }

    fn load_position(&self) -> Result<Option<PointAnchor>, Self::Error> {
        Ok(self.clone())
    }
}

/// Input to the tracker, decoupled from host event shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackerEvent<K> {
    /// Visibility detection reported the element in the band, or nothing.
    VisibilityChanged(Option<K>),
    /// The scrolling element moved or resized.
    Scrolled(ScrollMetrics),
    /// The host navigated to an in-page fragment.
    HashChanged,
}

/// What the host needs after [`ReadingPositionTracker::connect`].
#[derive(Clone, Debug, PartialEq)]
pub struct Connection<K> {
    /// Elements to observe with visibility detection, in document order.
    pub leaves: Vec<K>,
    /// Where to scroll, if a stored position should be restored.
    pub restore: Option<ScrollTarget<K>>,
}

/// Tracks and persists how far the reader got.
#[derive(Clone, Debug)]
pub struct ReadingPositionTracker<K> {
    config: TrackerConfig,
    current: PointAnchor,
    metrics: ScrollMetrics,
    skip: SkipGate,
    settle: Debounce<K>,
    notify: Debounce<()>,
}

impl<K: Copy + Eq + Debug> ReadingPositionTracker<K> {
    /// Tracker with the default configuration, starting from a stored position.
    pub fn new(stored: Option<PointAnchor>) -> Self {
        Self::with_config(TrackerConfig::default(), stored)
    }

    /// Tracker with a custom configuration, starting from a stored position.
    ///
    /// Without a stored position the reader starts at the top.
    pub fn with_config(config: TrackerConfig, stored: Option<PointAnchor>) -> Self {
        Self {
            settle: Debounce::new(config.settle_delay),
            notify: Debounce::new(config.notify_delay),
            config,
            current: stored.unwrap_or_else(PointAnchor::top),
            metrics: ScrollMetrics::default(),
            skip: SkipGate::new(),
        }
    }

    /// Tracker starting from whatever `store` holds.
    pub fn load<S: PositionStore + ?Sized>(
        config: TrackerConfig,
        store: &S,
    ) -> Result<Self, S::Error> {
        Ok(Self::with_config(config, store.load_position()?))
    }

    /// Configuration in use.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The live position. Saved positions lag behind it by the notify delay.
    pub fn current(&self) -> &PointAnchor {
        &self.current
    }

    /// Last scroll metrics reported.
    pub fn metrics(&self) -> ScrollMetrics {
        self.metrics
    }

    /// Returns `true` if the next settled report will be ignored.
    pub fn is_skipping(&self) -> bool {
        self.skip.is_armed()
    }

    /// Start tracking `root`.
    ///
    /// Returns the leaves to observe and, unless the host is about to jump to
    /// a fragment, where to restore the stored position. A root without
    /// leaves reads as fully read and schedules a save of 100% if needed.
    /// The first settled report after connecting is ignored.
    pub fn connect<D: DocumentTree<NodeId = K> + ?Sized>(
        &mut self,
        doc: &D,
        root: K,
        has_fragment: bool,
        now: u64,
    ) -> Connection<K> {
        self.skip.arm();
        let leaves = tracked_leaves(doc, root, &self.config.ignored_tag);
        if leaves.is_empty() {
            log::debug!("no tracked leaves under {root:?}, position is the end");
            if !self.current.is_bottom() {
                self.current = PointAnchor::bottom();
                self.notify.schedule_with_delay((), now, self.config.settle_delay);
            }
            return Connection {
                leaves,
                restore: None,
            };
        }
        let restore = self.restore(doc, root, has_fragment);
        Connection { leaves, restore }
    }

    /// Where to scroll to bring back the current position.
    ///
    /// Returns `None` while a fragment navigation takes precedence or when the
    /// stored element is gone. Either way the scroll that follows is not
    /// recorded: the next settled report is ignored.
    pub fn restore<D: DocumentTree<NodeId = K> + ?Sized>(
        &mut self,
        doc: &D,
        root: K,
        has_fragment: bool,
    ) -> Option<ScrollTarget<K>> {
        self.skip.arm();
        if has_fragment {
            log::debug!("fragment navigation pending, not restoring");
            return None;
        }
        let target = restore_target(doc, root, &self.current, self.config.restore_align);
        log::debug!("restoring {}% to {target:?}", self.current.percentage());
        target
    }

    /// Feed one event.
    pub fn handle(&mut self, event: TrackerEvent<K>, now: u64) {
        match event {
            TrackerEvent::VisibilityChanged(element) => self.on_visibility_changed(element, now),
            TrackerEvent::Scrolled(metrics) => self.on_scroll(metrics),
            TrackerEvent::HashChanged => self.on_hash_change(),
        }
    }

    /// Visibility detection reported `element` in the band.
    ///
    /// `None` is ignored and leaves a pending report in place. Otherwise the
    /// settle period restarts.
    pub fn on_visibility_changed(&mut self, element: Option<K>, now: u64) {
        if let Some(element) = element {
            self.settle.schedule(element, now);
        }
    }

    /// Bounding boxes of the observed leaves changed.
    ///
    /// Entries are given in document order; the first one touching the
    /// configured [`VisibilityBand`](crate::VisibilityBand) is reported through
    /// [`ReadingPositionTracker::on_visibility_changed`] and returned.
    pub fn visible_in_band(
        &mut self,
        viewport: Rect,
        entries: impl IntoIterator<Item = (K, Rect)>,
        now: u64,
    ) -> Option<K> {
        let element = self.config.band.first_visible(viewport, entries);
        self.on_visibility_changed(element, now);
        element
    }

    /// Record the latest scroll metrics. They are read when a report settles.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        self.metrics = metrics;
    }

    /// An in-page navigation happened; its scroll is not a reading position.
    pub fn on_hash_change(&mut self) {
        self.skip.arm();
    }

    /// When [`ReadingPositionTracker::poll`] next has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.settle.deadline(), self.notify.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run the timers due at `now`.
    ///
    /// Returns the position to save if the notify period elapsed. Timers fire
    /// in deadline order, so a late poll behaves like timely ones.
    pub fn poll<D: DocumentTree<NodeId = K> + ?Sized>(
        &mut self,
        doc: &D,
        root: K,
        now: u64,
    ) -> Option<PointAnchor> {
        let mut due = None;
        loop {
            let settle = self.settle.deadline().filter(|&d| d <= now);
            let notify = self.notify.deadline().filter(|&d| d <= now);
            match (settle, notify) {
                (None, None) => break,
                (Some(s), Some(n)) if s < n => self.settle_due(doc, root, s),
                (Some(s), None) => self.settle_due(doc, root, s),
                (_, Some(_)) => {
                    self.notify.cancel_all();
                    due = Some(self.current.clone());
                }
            }
        }
        due
    }

    /// Like [`ReadingPositionTracker::poll`], handing a due position to `store`.
    ///
    /// Returns the saved position. A store error is returned unchanged and the
    /// position is not retried.
    pub fn poll_into<D, S>(
        &mut self,
        doc: &D,
        root: K,
        now: u64,
        store: &mut S,
    ) -> Result<Option<PointAnchor>, S::Error>
    where
        D: DocumentTree<NodeId = K> + ?Sized,
        S: PositionStore + ?Sized,
    {
        let Some(point) = self.poll(doc, root, now) else {
            return Ok(None);
        };
        store.save_position(&point)?;
        Ok(Some(point))
    }

    /// Stop tracking. Pending reports and saves are dropped.
    pub fn disconnect(&mut self) {
        self.settle.cancel_all();
        self.notify.cancel_all();
    }

    fn settle_due<D: DocumentTree<NodeId = K> + ?Sized>(&mut self, doc: &D, root: K, at: u64) {
        let Some(element) = self.settle.poll(at) else {
            return;
        };
        if !self.skip.pass() {
            log::debug!("skipping settled report for {element:?}");
            return;
        }
        let percentage = self.metrics.percentage();
        let Some(next) = encode_point(doc, root, Some(element), percentage) else {
            log::debug!("{element:?} is not under the tracked root");
            return;
        };
        if next == self.current {
            return;
        }
        self.current = next;
        self.notify.schedule((), at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::ScrollAlign;
    use crate::visibility::VisibilityBand;
    use understory_anchor::StructuralPath;
    use understory_dom_tree::{NodeId, Tree};

    const ARTICLE: &str = "<article><p>one</p><p>two</p><p>three</p><p>four</p></article>";
    const QUARTER: ScrollMetrics = ScrollMetrics::new(250.0, 1200.0, 200.0);

    fn fixture() -> (Tree, NodeId, Vec<NodeId>) {
        let (tree, root) = Tree::from_markup(ARTICLE).unwrap();
        let ps = tree.children_of(root).to_vec();
        (tree, root, ps)
    }

    fn path(s: &str) -> StructuralPath {
        s.parse().unwrap()
    }

    /// A document that must never be looked at.
    struct Untouchable;

    impl DocumentTree for Untouchable {
        type NodeId = u32;

        fn parent(&self, _: u32) -> Option<u32> {
            panic!("parent() called")
        }
        fn children(&self, _: u32) -> &[u32] {
            panic!("children() called")
        }
        fn tag_name(&self, _: u32) -> Option<&str> {
            panic!("tag_name() called")
        }
        fn text(&self, _: u32) -> Option<&str> {
            panic!("text() called")
        }
        fn attribute(&self, _: u32, _: &str) -> Option<&str> {
            panic!("attribute() called")
        }
    }

    #[test]
    fn burst_of_reports_saves_once_with_the_last_position() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        let mut store: Option<PointAnchor> = None;
        tracker.on_scroll(QUARTER);

        for (i, &p) in ps.iter().enumerate() {
            let t = 30 * u64::try_from(i).unwrap();
            tracker.on_visibility_changed(Some(p), t);
            assert_eq!(tracker.poll_into(&tree, root, t, &mut store), Ok(None));
        }
        assert_eq!(tracker.next_deadline(), Some(190));
        assert_eq!(tracker.poll(&tree, root, 189), None);
        assert_eq!(tracker.poll(&tree, root, 190), None);
        let expected = PointAnchor::at(path("p[4]"), 25).unwrap();
        assert_eq!(tracker.current(), &expected);
        assert_eq!(tracker.next_deadline(), Some(1_690));

        assert_eq!(tracker.poll_into(&tree, root, 1_689, &mut store), Ok(None));
        assert_eq!(
            tracker.poll_into(&tree, root, 1_690, &mut store),
            Ok(Some(expected.clone()))
        );
        assert_eq!(store, Some(expected));
        assert_eq!(tracker.next_deadline(), None);
        assert_eq!(tracker.poll(&tree, root, 10_000), None);
    }

    #[test]
    fn notify_reads_the_latest_position() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.on_visibility_changed(Some(ps[1]), 0);
        assert_eq!(tracker.poll(&tree, root, 100), None);

        // A second settle before the first notify restarts the notify period.
        tracker.on_scroll(ScrollMetrics::new(500.0, 1200.0, 200.0));
        tracker.on_visibility_changed(Some(ps[2]), 1_000);
        assert_eq!(tracker.poll(&tree, root, 1_600), None, "old notify was replaced");
        assert_eq!(
            tracker.poll(&tree, root, 2_600),
            Some(PointAnchor::at(path("p[3]"), 50).unwrap())
        );
    }

    #[test]
    fn metrics_are_read_when_the_report_settles() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.handle(TrackerEvent::VisibilityChanged(Some(ps[0])), 0);
        tracker.handle(TrackerEvent::Scrolled(ScrollMetrics::new(600.0, 1200.0, 200.0)), 50);
        assert_eq!(tracker.poll(&tree, root, 100), None);
        assert_eq!(tracker.current().percentage(), 60);
    }

    #[test]
    fn late_poll_fires_timers_in_order() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.on_visibility_changed(Some(ps[1]), 0);
        assert_eq!(
            tracker.poll(&tree, root, 60_000),
            Some(PointAnchor::at(path("p[2]"), 25).unwrap())
        );
    }

    #[test]
    fn connect_skips_the_first_report() {
        let (tree, root, ps) = fixture();
        let stored = PointAnchor::at(path("p[3]"), 50).unwrap();
        let mut tracker = ReadingPositionTracker::new(Some(stored.clone()));
        let connection = tracker.connect(&tree, root, false, 0);
        assert_eq!(connection.leaves, ps);
        assert_eq!(
            connection.restore,
            Some(ScrollTarget::Element {
                node: ps[2],
                align: ScrollAlign::Center
            })
        );
        assert!(tracker.is_skipping());

        // The scroll caused by the restore settles and is dropped.
        tracker.on_scroll(ScrollMetrics::new(500.0, 1200.0, 200.0));
        tracker.on_visibility_changed(Some(ps[2]), 10);
        assert_eq!(tracker.poll(&tree, root, 110), None);
        assert_eq!(tracker.current(), &stored);
        assert_eq!(tracker.next_deadline(), None);

        // The reader then moves on.
        tracker.on_scroll(QUARTER);
        tracker.on_visibility_changed(Some(ps[0]), 200);
        assert_eq!(tracker.poll(&tree, root, 300), None);
        assert_eq!(tracker.current(), &PointAnchor::at(path("p[1]"), 25).unwrap());
    }

    #[test]
    fn fragment_navigation_wins_over_restore() {
        let (tree, root, _) = fixture();
        let stored = PointAnchor::at(path("p[3]"), 50).unwrap();
        let mut tracker = ReadingPositionTracker::new(Some(stored));
        let connection = tracker.connect(&tree, root, true, 0);
        assert_eq!(connection.restore, None);
        assert!(tracker.is_skipping());
    }

    #[test]
    fn hash_change_skips_one_report() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.handle(TrackerEvent::HashChanged, 0);
        tracker.on_visibility_changed(Some(ps[3]), 0);
        assert_eq!(tracker.poll(&tree, root, 100), None);
        assert!(tracker.current().is_top());

        tracker.on_visibility_changed(Some(ps[3]), 200);
        assert_eq!(tracker.poll(&tree, root, 300), None);
        assert_eq!(tracker.current().path(), Some(&path("p[4]")));
    }

    #[test]
    fn nothing_in_the_band_keeps_pending_report() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.on_visibility_changed(Some(ps[1]), 0);
        tracker.on_visibility_changed(None, 50);
        assert_eq!(tracker.next_deadline(), Some(100));
        assert_eq!(tracker.poll(&tree, root, 100), None);
        assert_eq!(tracker.current().path(), Some(&path("p[2]")));
    }

    #[test]
    fn band_from_the_config_picks_the_reported_element() {
        let (tree, root, ps) = fixture();
        let viewport = Rect::new(0.0, 0.0, 400.0, 100.0);
        // One 40px line per paragraph, stacked from the top of the viewport.
        let lines = |top: f64| {
            ps.iter()
                .enumerate()
                .map(move |(i, &p)| {
                    let y0 = top + 40.0 * i as f64;
                    (p, Rect::new(0.0, y0, 400.0, y0 + 40.0))
                })
                .collect::<Vec<_>>()
        };

        // Default band covers y in 65..=75: the second line.
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        assert_eq!(tracker.visible_in_band(viewport, lines(0.0), 0), Some(ps[1]));
        assert_eq!(tracker.poll(&tree, root, 100), None);
        assert_eq!(tracker.current().path(), Some(&path("p[2]")));

        // A band at the very top of the viewport picks the first line instead.
        let config = TrackerConfig {
            band: VisibilityBand {
                top_inset: 0.0,
                bottom_inset: 0.9,
            },
            ..TrackerConfig::default()
        };
        let mut tracker = ReadingPositionTracker::with_config(config, None);
        tracker.on_scroll(QUARTER);
        assert_eq!(tracker.visible_in_band(viewport, lines(0.0), 0), Some(ps[0]));
        assert_eq!(tracker.poll(&tree, root, 100), None);
        assert_eq!(tracker.current().path(), Some(&path("p[1]")));

        // Nothing in the band: no report, nothing pending.
        assert_eq!(tracker.visible_in_band(viewport, lines(500.0), 200), None);
        assert_eq!(tracker.next_deadline(), Some(1_600));
    }

    #[test]
    fn unchanged_position_is_not_saved_again() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.on_visibility_changed(Some(ps[1]), 0);
        assert_eq!(tracker.poll(&tree, root, 100), None);
        assert!(tracker.poll(&tree, root, 1_600).is_some(), "first save");

        tracker.on_visibility_changed(Some(ps[1]), 2_000);
        assert_eq!(tracker.poll(&tree, root, 2_100), None);
        assert_eq!(tracker.next_deadline(), None);
    }

    #[test]
    fn ends_of_the_document_carry_no_path() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(ScrollMetrics::new(1000.0, 1200.0, 200.0));
        tracker.on_visibility_changed(Some(ps[3]), 0);
        assert_eq!(tracker.poll(&tree, root, 1_600), Some(PointAnchor::bottom()));

        tracker.on_scroll(ScrollMetrics::new(0.0, 1200.0, 200.0));
        tracker.on_visibility_changed(Some(ps[0]), 2_000);
        assert_eq!(tracker.poll(&tree, root, 3_600), Some(PointAnchor::top()));
    }

    #[test]
    fn reports_outside_the_root_are_dropped() {
        let (mut tree, root, _) = fixture();
        let stray = tree.insert_element(None, "p");
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.on_visibility_changed(Some(stray), 0);
        assert_eq!(tracker.poll(&tree, root, 5_000), None);
        assert!(tracker.current().is_top());
    }

    #[test]
    fn empty_root_reads_as_fully_read() {
        let (tree, root) = Tree::from_markup("<article>Just text.</article>").unwrap();
        let stored = PointAnchor::at(path("p[1]"), 40).unwrap();
        let mut tracker = ReadingPositionTracker::new(Some(stored));
        let mut store: Option<PointAnchor> = None;
        let connection = tracker.connect(&tree, root, false, 0);
        assert!(connection.leaves.is_empty());
        assert_eq!(connection.restore, None);
        assert!(tracker.current().is_bottom());
        assert_eq!(tracker.poll_into(&tree, root, 99, &mut store), Ok(None));
        assert_eq!(
            tracker.poll_into(&tree, root, 100, &mut store),
            Ok(Some(PointAnchor::bottom()))
        );

        // Already at the end: nothing to save.
        let mut again = ReadingPositionTracker::<NodeId>::new(Some(PointAnchor::bottom()));
        again.connect(&tree, root, false, 0);
        assert_eq!(again.next_deadline(), None);
    }

    #[test]
    fn end_positions_restore_without_reading_the_document() {
        let mut tracker = ReadingPositionTracker::new(Some(PointAnchor::bottom()));
        assert_eq!(tracker.restore(&Untouchable, 0, false), Some(ScrollTarget::Bottom));
        let mut tracker = ReadingPositionTracker::new(Some(PointAnchor::top()));
        assert_eq!(tracker.restore(&Untouchable, 0, false), Some(ScrollTarget::Top));
        assert!(tracker.is_skipping());
    }

    #[test]
    fn load_from_store() {
        let stored = Some(PointAnchor::at(path("p[2]"), 30).unwrap());
        let tracker =
            ReadingPositionTracker::<NodeId>::load(TrackerConfig::default(), &stored).unwrap();
        assert_eq!(tracker.current().percentage(), 30);
    }

    #[test]
    fn store_errors_propagate() {
        struct Broken;
        impl PositionStore for Broken {
            type Error = &'static str;
            fn save_position(&mut self, _: &PointAnchor) -> Result<(), Self::Error> {
                Err("offline")
            }
            fn load_position(&self) -> Result<Option<PointAnchor>, Self::Error> {
                Err("offline")
            }
        }

        assert_eq!(
            ReadingPositionTracker::<NodeId>::load(TrackerConfig::default(), &Broken).err(),
            Some("offline")
        );
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_scroll(QUARTER);
        tracker.on_visibility_changed(Some(ps[0]), 0);
        assert_eq!(tracker.poll_into(&tree, root, 1_600, &mut Broken), Err("offline"));
        // Not retried.
        assert_eq!(tracker.poll_into(&tree, root, 5_000, &mut Broken), Ok(None));
    }

    #[test]
    fn disconnect_drops_pending_work() {
        let (tree, root, ps) = fixture();
        let mut tracker = ReadingPositionTracker::new(None);
        tracker.on_visibility_changed(Some(ps[0]), 0);
        tracker.disconnect();
        assert_eq!(tracker.next_deadline(), None);
        assert_eq!(tracker.poll(&tree, root, 5_000), None);
    }
}
