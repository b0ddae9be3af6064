// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-interaction state machine that turns a selection into a create or delete action.
//!
//! ```text
//! Idle ──selection──▶ Captured ──▶ Normalized ──▶ Classified ──save/delete/dismiss──▶ Idle
//!                        │              │
//!                        └──invalid─────┴──────────▶ Idle
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use understory_anchor::{DocumentTree, SpanAnchor, TextRange, encode_span, range_text};

use crate::config::AnnotationConfig;
use crate::selection::{
    InvalidSelection, RawRange, Selection, covered_annotations, normalize, single_range,
    step_off_wrappers,
};
use crate::store::AnnotationStore;

/// Outcome of inspecting a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The selection can become a new annotation with this anchor.
    Creatable(SpanAnchor),
    /// The selection enters existing annotations; offer to delete these ids.
    CoincidesWithExisting(Vec<String>),
    /// The selection cannot be used.
    Invalid(InvalidSelection),
}

/// Which toolbar actions to offer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolbarMode {
    /// Offer "create".
    pub can_create: bool,
    /// Offer "delete".
    pub can_delete: bool,
}

impl ToolbarMode {
    /// Hidden toolbar.
    pub const HIDDEN: Self = Self {
        can_create: false,
        can_delete: false,
    };

    /// Returns `true` if any action is offered.
    pub fn is_visible(&self) -> bool {
        self.can_create || self.can_delete
    }
}

/// A classified selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate<K> {
    /// Selection with boundaries inside text nodes.
    pub range: TextRange<K>,
    /// Selected text.
    pub text: String,
    /// Creatable or coinciding; never invalid.
    pub classification: Classification,
}

#[derive(Clone, Debug)]
enum State<K> {
    Idle,
    Captured(RawRange<K>),
    Normalized(TextRange<K>),
    Classified(Candidate<K>),
}

/// Builds annotations from user selections.
///
/// Feed every selection change to [`AnnotationBuilder::on_selection_change`],
/// then act on the user's choice with [`AnnotationBuilder::save`],
/// [`AnnotationBuilder::delete`] or [`AnnotationBuilder::dismiss`]. Each of
/// those ends the interaction and returns the builder to idle.
#[derive(Clone, Debug)]
pub struct AnnotationBuilder<K> {
    config: AnnotationConfig,
    state: State<K>,
}

impl<K: Copy + Eq + core::fmt::Debug> Default for AnnotationBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + core::fmt::Debug> AnnotationBuilder<K> {
    /// Idle builder with the default markup conventions.
    pub fn new() -> Self {
        Self::with_config(AnnotationConfig::default())
    }

    /// Idle builder using `config` for overlap detection.
    pub fn with_config(config: AnnotationConfig) -> Self {
        Self {
            config,
            state: State::Idle,
        }
    }

    /// Markup conventions in use.
    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    /// Returns `true` when no candidate is held.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// The current candidate, once classified.
    pub fn candidate(&self) -> Option<&Candidate<K>> {
        match &self.state {
            State::Classified(candidate) => Some(candidate),
            _ => None,
        }
    }

    /// Actions to offer for the current state.
    pub fn toolbar_mode(&self) -> ToolbarMode {
        match self.candidate().map(|c| &c.classification) {
            Some(Classification::Creatable(_)) => ToolbarMode {
                can_create: true,
                can_delete: false,
            },
            Some(Classification::CoincidesWithExisting(_)) => ToolbarMode {
                can_create: false,
                can_delete: true,
            },
            _ => ToolbarMode::HIDDEN,
        }
    }

    /// Run a new selection through capture, normalization and classification.
    ///
    /// Any previous candidate is discarded. Invalid selections leave the
    /// builder idle.
    pub fn on_selection_change<D>(
        &mut self,
        doc: &D,
        root: K,
        selection: &Selection<K>,
    ) -> Classification
    where
        D: DocumentTree<NodeId = K> + ?Sized,
    {
        self.state = State::Idle;
        let result = self
            .capture(doc, root, selection)
            .and_then(|()| self.normalize(doc))
            .and_then(|()| self.classify(doc, root));
        match result {
            Ok(classification) => classification,
            Err(reason) => {
                log::debug!("selection rejected: {reason:?}");
                self.state = State::Idle;
                Classification::Invalid(reason)
            }
        }
    }

    fn capture<D>(
        &mut self,
        doc: &D,
        root: K,
        selection: &Selection<K>,
    ) -> Result<(), InvalidSelection>
    where
        D: DocumentTree<NodeId = K> + ?Sized,
    {
        let range = single_range(doc, root, selection)?;
        self.state = State::Captured(range);
        Ok(())
    }

    fn normalize<D>(&mut self, doc: &D) -> Result<(), InvalidSelection>
    where
        D: DocumentTree<NodeId = K> + ?Sized,
    {
        let State::Captured(raw) = &self.state else {
            return Err(InvalidSelection::Empty);
        };
        let range = normalize(doc, raw).ok_or(InvalidSelection::NoTextBoundary)?;
        self.state = State::Normalized(range);
        Ok(())
    }

    fn classify<D>(&mut self, doc: &D, root: K) -> Result<Classification, InvalidSelection>
    where
        D: DocumentTree<NodeId = K> + ?Sized,
    {
        let State::Normalized(range) = self.state else {
            return Err(InvalidSelection::Empty);
        };
        let text = range_text(doc, &range);
        if text.trim().is_empty() {
            return Err(InvalidSelection::Whitespace);
        }
        let covered = covered_annotations(doc, &range, &self.config);
        let range = if covered.is_empty() {
            step_off_wrappers(doc, &range, &self.config)
        } else {
            range
        };
        let classification = if covered.is_empty() {
            let span = encode_span(doc, root, &range).ok_or(InvalidSelection::Unanchorable)?;
            Classification::Creatable(span)
        } else {
            Classification::CoincidesWithExisting(covered.ids)
        };
        self.state = State::Classified(Candidate {
            range,
            text,
            classification: classification.clone(),
        });
        Ok(classification)
    }

    /// Create the candidate annotation, if it is creatable.
    ///
    /// Returns the new id, or `None` (staying in the current state) when there
    /// is nothing to create. Store failures are returned unchanged; the
    /// candidate is discarded either way.
    pub fn save<S: AnnotationStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<Option<String>, S::Error> {
        let span = match &self.state {
            State::Classified(Candidate {
                classification: Classification::Creatable(span),
                ..
            }) => span.clone(),
            _ => return Ok(None),
        };
        self.state = State::Idle;
        store.create(&span).map(Some)
    }

    /// Delete the annotations the candidate coincides with.
    ///
    /// Returns the deleted ids; empty when there is nothing to delete. Stops at
    /// the first store failure.
    pub fn delete<S: AnnotationStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<Vec<String>, S::Error> {
        let ids = match &mut self.state {
            State::Classified(Candidate {
                classification: Classification::CoincidesWithExisting(ids),
                ..
            }) => core::mem::take(ids),
            _ => return Ok(Vec::new()),
        };
        self.state = State::Idle;
        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            store.delete(&id)?;
            deleted.push(id);
        }
        Ok(deleted)
    }

    /// Drop the candidate without acting on it.
    pub fn dismiss(&mut self) {
        self.state = State::Idle;
    }
}
