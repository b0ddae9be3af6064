// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host selections, their normalization to text boundaries, and overlap detection.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashSet;
use smallvec::SmallVec;
use understory_anchor::{
    DocumentTree, TextPosition, TextRange, char_len, common_ancestor, contains, first_text_node,
    last_text_node, previous_element_sibling,
};

use crate::config::AnnotationConfig;

/// A selection boundary as a host reports it.
///
/// For a text node `offset` is a character offset; for an element it is a
/// child index, the way live documents express boundaries between children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Boundary<K> {
    /// Container node.
    pub node: K,
    /// Offset inside the container.
    pub offset: usize,
}

impl<K> Boundary<K> {
    /// Create a boundary.
    pub const fn new(node: K, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// One selected range, before normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawRange<K> {
    /// Start boundary.
    pub start: Boundary<K>,
    /// End boundary.
    pub end: Boundary<K>,
}

impl<K: Copy + Eq> RawRange<K> {
    /// Create a range.
    pub const fn new(start: Boundary<K>, end: Boundary<K>) -> Self {
        Self { start, end }
    }

    /// Returns `true` if start and end are the same boundary.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The user's current selection: usually zero or one range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection<K> {
    ranges: SmallVec<[RawRange<K>; 1]>,
}

impl<K: Copy + Eq> Selection<K> {
    /// Nothing selected.
    pub fn empty() -> Self {
        Self {
            ranges: SmallVec::new(),
        }
    }

    /// A single range.
    pub fn single(range: RawRange<K>) -> Self {
        let mut ranges = SmallVec::new();
        ranges.push(range);
        Self { ranges }
    }

    /// Selected ranges, in host order.
    pub fn ranges(&self) -> &[RawRange<K>] {
        &self.ranges
    }
}

impl<K: Copy + Eq> FromIterator<RawRange<K>> for Selection<K> {
    fn from_iter<I: IntoIterator<Item = RawRange<K>>>(iter: I) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}

/// Why a selection cannot become an annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidSelection {
    /// Nothing is selected.
    Empty,
    /// More than one range is selected.
    MultipleRanges,
    /// The range is collapsed to a caret.
    Collapsed,
    /// The range reaches outside the tracked root.
    OutsideRoot,
    /// A boundary could not be moved onto a text node.
    NoTextBoundary,
    /// The range only covers whitespace.
    Whitespace,
    /// A boundary could not be encoded relative to the root.
    Unanchorable,
}

/// Check the shape of a selection and return its only range.
pub fn single_range<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    selection: &Selection<D::NodeId>,
) -> Result<RawRange<D::NodeId>, InvalidSelection> {
    let range = match selection.ranges() {
        [] => return Err(InvalidSelection::Empty),
        [range] => *range,
        _ => return Err(InvalidSelection::MultipleRanges),
    };
    if range.is_collapsed() {
        return Err(InvalidSelection::Collapsed);
    }
    let inside = common_ancestor(doc, range.start.node, range.end.node)
        .is_some_and(|ancestor| contains(doc, root, ancestor));
    if !inside {
        return Err(InvalidSelection::OutsideRoot);
    }
    Ok(range)
}

/// Move element boundaries onto text nodes.
///
/// An element start moves to the start of its first text node. An element end
/// moves to the end of its last text node; an end at child index `0` means
/// "before this element", so the previous element sibling is used instead.
/// Returns `None` when no text node can be found.
pub fn normalize<D: DocumentTree + ?Sized>(
    doc: &D,
    range: &RawRange<D::NodeId>,
) -> Option<TextRange<D::NodeId>> {
    let start = if doc.is_text(range.start.node) {
        TextPosition::new(range.start.node, range.start.offset.min(char_len(doc, range.start.node)))
    } else {
        TextPosition::new(first_text_node(doc, range.start.node)?, 0)
    };
    let end = if doc.is_text(range.end.node) {
        TextPosition::new(range.end.node, range.end.offset.min(char_len(doc, range.end.node)))
    } else {
        let container = if range.end.offset == 0 {
            previous_element_sibling(doc, range.end.node)?
        } else {
            range.end.node
        };
        let node = last_text_node(doc, container)?;
        TextPosition::new(node, char_len(doc, node))
    };
    Some(TextRange::new(start, end))
}

/// Text nodes that contribute at least one character to `range`.
pub fn contributing_text_nodes<D: DocumentTree + ?Sized>(
    doc: &D,
    range: &TextRange<D::NodeId>,
) -> Vec<D::NodeId> {
    let nodes = understory_anchor::covered_text_nodes(doc, range);
    let last = nodes.len().saturating_sub(1);
    nodes
        .iter()
        .enumerate()
        .filter(|&(i, &node)| {
            let from = if i == 0 { range.start.offset } else { 0 };
            let to = if i == last {
                range.end.offset
            } else {
                char_len(doc, node)
            };
            from < to
        })
        .map(|(_, &node)| node)
        .collect()
}

/// Returns `true` if `node` sits directly inside an annotation wrapper.
fn is_wrapped<D: DocumentTree + ?Sized>(
    doc: &D,
    node: D::NodeId,
    config: &AnnotationConfig,
) -> bool {
    doc.parent(node)
        .and_then(|parent| doc.tag_name(parent))
        .is_some_and(|t| t.eq_ignore_ascii_case(&config.tag_name))
}

/// Move boundaries that only touch the edge of a rendered annotation onto
/// the nearest text that the range actually covers.
///
/// A boundary at the end of a wrapped text node (start) or at offset `0` of
/// one (end) contributes nothing; encoded as is, the anchor would name the
/// wrapper element. Boundaries in text that contributes characters are left
/// alone, as are ranges with no contributing text.
pub fn step_off_wrappers<D: DocumentTree + ?Sized>(
    doc: &D,
    range: &TextRange<D::NodeId>,
    config: &AnnotationConfig,
) -> TextRange<D::NodeId> {
    let nodes = contributing_text_nodes(doc, range);
    let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
        return *range;
    };
    let mut out = *range;
    if first != range.start.node && is_wrapped(doc, range.start.node, config) {
        out.start = TextPosition::new(first, 0);
    }
    if last != range.end.node && is_wrapped(doc, range.end.node, config) {
        out.end = TextPosition::new(last, char_len(doc, last));
    }
    out
}

/// What a selection touches of the annotations already rendered in the document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoveredAnnotations {
    /// Number of covered text nodes inside annotation wrappers.
    pub wrapped_nodes: usize,
    /// Distinct annotation ids, in document order.
    pub ids: Vec<String>,
}

impl CoveredAnnotations {
    /// Returns `true` if the range enters at least one rendered annotation.
    pub fn is_empty(&self) -> bool {
        self.wrapped_nodes == 0
    }
}

/// Find rendered annotations that `range` enters.
///
/// A text node counts when its parent is an annotation wrapper (per
/// `config.tag_name`); ids are read from `config.id_attribute`. Wrappers
/// without an id still count as covered.
pub fn covered_annotations<D: DocumentTree + ?Sized>(
    doc: &D,
    range: &TextRange<D::NodeId>,
    config: &AnnotationConfig,
) -> CoveredAnnotations {
    let mut covered = CoveredAnnotations::default();
    let mut seen: HashSet<&str> = HashSet::new();
    for node in contributing_text_nodes(doc, range) {
        let Some(parent) = doc.parent(node) else {
            continue;
        };
        if !is_wrapped(doc, node, config) {
            continue;
        }
        covered.wrapped_nodes += 1;
        if let Some(id) = doc.attribute(parent, &config.id_attribute)
            && seen.insert(id)
        {
            covered.ids.push(id.into());
        }
    }
    covered
}
