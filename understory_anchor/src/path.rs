// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural paths: `tag[ordinal]` chains from a root element down to a target element.

use alloc::string::String;
use core::fmt;
use core::num::NonZeroUsize;
use core::str::FromStr;

use smallvec::SmallVec;

use crate::document::DocumentTree;

/// One step of a [`StructuralPath`].
///
/// The ordinal is the 1-based position of the element among its element
/// siblings with the same tag name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathStep {
    tag: String,
    ordinal: NonZeroUsize,
}

impl PathStep {
    /// Create a step. The tag is stored lower-case; returns `None` for an ordinal of `0`.
    pub fn new(tag: &str, ordinal: usize) -> Option<Self> {
        Some(Self {
            tag: tag.to_ascii_lowercase(),
            ordinal: NonZeroUsize::new(ordinal)?,
        })
    }

    /// Lower-case tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 1-based ordinal among same-tag element siblings.
    pub fn ordinal(&self) -> usize {
        self.ordinal.get()
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag, self.ordinal)
    }
}

/// Location of an element relative to a root, as a sequence of [`PathStep`]s.
///
/// The empty path addresses the root itself. The text form joins steps with
/// `/`, for example `p[1]/b[1]`.
///
/// ```
/// use understory_anchor::StructuralPath;
///
/// let path: StructuralPath = "section[2]/P[1]".parse().unwrap();
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "section[2]/p[1]");
/// assert!("p[0]".parse::<StructuralPath>().is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StructuralPath {
    steps: SmallVec<[PathStep; 8]>,
}

impl StructuralPath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Steps from the root downwards.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a step below the current target.
    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }
}

impl FromIterator<PathStep> for StructuralPath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Errors from parsing the text form of a [`StructuralPath`].
///
/// `step` is the 0-based index of the offending step.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    /// Two separators in a row, or a leading/trailing separator.
    #[error("step {step} is empty")]
    EmptyStep {
        /// Index of the step.
        step: usize,
    },
    /// The step is not of the form `tag[n]`.
    #[error("step {step} is not of the form `tag[n]`")]
    MalformedStep {
        /// Index of the step.
        step: usize,
    },
    /// The bracketed ordinal is not a number.
    #[error("step {step} has an invalid ordinal")]
    InvalidOrdinal {
        /// Index of the step.
        step: usize,
    },
    /// Ordinals are 1-based.
    #[error("step {step} has ordinal 0")]
    ZeroOrdinal {
        /// Index of the step.
        step: usize,
    },
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

impl FromStr for StructuralPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let mut path = Self::root();
        for (step, raw) in s.split('/').enumerate() {
            if raw.is_empty() {
                return Err(PathParseError::EmptyStep { step });
            }
            let (tag, rest) = raw
                .split_once('[')
                .ok_or(PathParseError::MalformedStep { step })?;
            let digits = rest
                .strip_suffix(']')
                .ok_or(PathParseError::MalformedStep { step })?;
            if tag.is_empty() || !tag.chars().all(is_tag_char) {
                return Err(PathParseError::MalformedStep { step });
            }
            let ordinal: usize = digits
                .parse()
                .map_err(|_| PathParseError::InvalidOrdinal { step })?;
            let step = PathStep::new(tag, ordinal).ok_or(PathParseError::ZeroOrdinal { step })?;
            path.push(step);
        }
        Ok(path)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StructuralPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for StructuralPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// 1-based position of `node` among the element children of its parent sharing its tag.
fn ordinal_of<D: DocumentTree + ?Sized>(doc: &D, parent: D::NodeId, node: D::NodeId, tag: &str) -> usize {
    let preceding = doc
        .children(parent)
        .iter()
        .take_while(|&&sibling| sibling != node)
        .filter(|&&sibling| {
            doc.tag_name(sibling)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag))
        })
        .count();
    preceding + 1
}

/// Encode the position of `element` relative to `root`.
///
/// Returns the empty path when `element` is `root`, and `None` when `element`
/// is not an element or not a descendant of `root`.
pub fn encode<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    element: D::NodeId,
) -> Option<StructuralPath> {
    doc.tag_name(element)?;
    let mut steps: SmallVec<[PathStep; 8]> = SmallVec::new();
    let mut current = element;
    while current != root {
        let parent = doc.parent(current)?;
        let tag = doc.tag_name(current)?;
        let ordinal = ordinal_of(doc, parent, current, tag);
        steps.push(PathStep::new(tag, ordinal)?);
        current = parent;
    }
    steps.reverse();
    Some(StructuralPath { steps })
}

/// Resolve `path` against `root`.
///
/// Each step selects the ordinal-th element child with a matching tag name
/// (ASCII case-insensitive). Returns `None` as soon as a step cannot be
/// satisfied; there is no approximate matching.
pub fn decode<D: DocumentTree + ?Sized>(
    doc: &D,
    root: D::NodeId,
    path: &StructuralPath,
) -> Option<D::NodeId> {
    doc.tag_name(root)?;
    let mut current = root;
    for step in path.steps() {
        current = doc
            .children(current)
            .iter()
            .copied()
            .filter(|&child| {
                doc.tag_name(child)
                    .is_some_and(|t| t.eq_ignore_ascii_case(step.tag()))
            })
            .nth(step.ordinal() - 1)?;
    }
    Some(current)
}
