// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted annotations: the store seam and an in-memory collection.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::convert::Infallible;

use understory_anchor::{
    AnnotateError, DocumentTree, DocumentTreeMut, SpanAnchor, add_annotation, check_annotation,
    compare_positions, decode_span, range_text,
};

use crate::config::AnnotationConfig;

/// Color given to annotations that do not name one.
pub const DEFAULT_COLOR: &str = "yellow";

/// Maximum length of [`Annotation::text`].
pub const SHORT_TEXT_LEN: usize = 60;

/// A stored annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Annotation {
    /// Store-assigned id.
    pub id: String,
    /// Anchored extent.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub span: SpanAnchor,
    /// Highlight color name.
    #[cfg_attr(feature = "serde", serde(default = "default_color"))]
    pub color: String,
    /// Short excerpt of the annotated text.
    #[cfg_attr(feature = "serde", serde(default))]
    pub text: String,
}

#[cfg(feature = "serde")]
fn default_color() -> String {
    DEFAULT_COLOR.into()
}

impl Annotation {
    /// Create an annotation with the default color and no excerpt.
    pub fn new(id: impl Into<String>, span: SpanAnchor) -> Self {
        Self {
            id: id.into(),
            span,
            color: DEFAULT_COLOR.into(),
            text: String::new(),
        }
    }
}

/// The persistence collaborator for annotations.
///
/// Errors are the collaborator's own and are handed back to the caller
/// unchanged; nothing here retries.
pub trait AnnotationStore {
    /// Collaborator failure.
    type Error;

    /// Persist a new annotation and return its id.
    fn create(&mut self, span: &SpanAnchor) -> Result<String, Self::Error>;

    /// Remove an annotation.
    fn delete(&mut self, id: &str) -> Result<(), Self::Error>;

    /// All stored annotations.
    fn load_annotations(&self) -> Result<Vec<Annotation>, Self::Error>;
}

/// Collapse whitespace and cut `text` to at most `max_chars` characters.
///
/// Long text is cut between words and marked with `...`; a single word
/// longer than the limit is cut inside the word.
///
/// ```
/// use understory_annotation::short_text;
///
/// assert_eq!(short_text("  a   short\ntext ", 60), "a short text");
/// assert_eq!(short_text("one two three four", 10), "one two...");
/// ```
pub fn short_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut out = String::new();
    let mut counted = 0;
    for (i, word) in text.split_whitespace().enumerate() {
        let len = word.chars().count();
        counted += len;
        if counted >= max_chars {
            if len > max_chars {
                out.extend(word.chars().take(max_chars));
            }
            break;
        }
        if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.push_str("...");
    out
}

/// An in-memory set of annotations.
///
/// Ids are assigned sequentially. The set can render itself into a document
/// and reorder itself by where the annotations appear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    items: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set holds no annotations.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Annotations in their current order.
    pub fn iter(&self) -> core::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    /// Look up an annotation by id.
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.items.iter().find(|a| a.id == id)
    }

    /// Append an annotation. The color defaults when empty.
    pub fn add(&mut self, mut annotation: Annotation) {
        if annotation.color.is_empty() {
            annotation.color = DEFAULT_COLOR.into();
        }
        self.items.push(annotation);
    }

    /// Remove an annotation by id.
    pub fn delete(&mut self, id: &str) -> Option<Annotation> {
        let index = self.items.iter().position(|a| a.id == id)?;
        Some(self.items.remove(index))
    }

    fn allocate_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("a{}", self.next_id);
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Validate `span` against `doc` and store it with an excerpt of its text.
    ///
    /// Fails without storing when the span does not resolve or overlaps an
    /// annotation already rendered in `doc`.
    pub fn create_checked<D: DocumentTree + ?Sized>(
        &mut self,
        doc: &D,
        root: D::NodeId,
        span: &SpanAnchor,
        config: &AnnotationConfig,
    ) -> Result<&Annotation, AnnotateError> {
        check_annotation(doc, root, span, &config.tag_name)?;
        let range = decode_span(doc, root, span).ok_or(AnnotateError::InvertedRange)?;
        let mut annotation = Annotation::new(self.allocate_id(), span.clone());
        annotation.text = short_text(&range_text(doc, &range), SHORT_TEXT_LEN);
        self.items.push(annotation);
        Ok(&self.items[self.items.len() - 1])
    }

    /// Order annotations by where their text starts in `doc`.
    ///
    /// Annotations that do not resolve keep their relative order at the end.
    pub fn sort<D: DocumentTree + ?Sized>(&mut self, doc: &D, root: D::NodeId) {
        let mut keyed: Vec<_> = core::mem::take(&mut self.items)
            .into_iter()
            .map(|a| (decode_span(doc, root, &a.span).map(|r| r.start), a))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => compare_positions(doc, *a, *b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self.items = keyed.into_iter().map(|(_, a)| a).collect();
    }

    /// Wrap every annotation's text in `doc`, in set order.
    ///
    /// Each wrapper carries the id and color attributes from `config`; the first
    /// wrapper of an annotation also gets an element `id`. Excerpts are refreshed
    /// from the wrapped text. Returns the ids of annotations that could not be
    /// rendered (orphans); the document is left as it was for those.
    pub fn render<D: DocumentTreeMut + ?Sized>(
        &mut self,
        doc: &mut D,
        root: D::NodeId,
        config: &AnnotationConfig,
    ) -> Vec<String> {
        let mut orphans = Vec::new();
        for annotation in &mut self.items {
            let mut wrapped = String::new();
            let result = add_annotation(doc, root, &annotation.span, &config.tag_name, |doc, node, index| {
                if index == 0 {
                    let element_id = format!("{}{}", config.element_id_prefix, annotation.id);
                    doc.set_attribute(node, "id", &element_id);
                }
                doc.set_attribute(node, &config.id_attribute, &annotation.id);
                doc.set_attribute(node, &config.color_attribute, &annotation.color);
                if let Some(&child) = doc.children(node).first() {
                    wrapped.push_str(doc.text(child).unwrap_or_default());
                }
            });
            match result {
                Ok(_) => annotation.text = short_text(&wrapped, SHORT_TEXT_LEN),
                Err(err) => {
                    log::debug!("annotation {} not rendered: {err}", annotation.id);
                    orphans.push(annotation.id.clone());
                }
            }
        }
        orphans
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = core::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl AnnotationStore for AnnotationSet {
    type Error = Infallible;

    fn create(&mut self, span: &SpanAnchor) -> Result<String, Infallible> {
        let id = self.allocate_id();
        self.add(Annotation::new(id.clone(), span.clone()));
        Ok(id)
    }

    fn delete(&mut self, id: &str) -> Result<(), Infallible> {
        Self::delete(self, id);
        Ok(())
    }

    fn load_annotations(&self) -> Result<Vec<Annotation>, Infallible> {
        Ok(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_anchor::TextAnchor;
    use understory_dom_tree::{NodeId, Tree};

    fn span(start: &str, so: usize, end: &str, eo: usize) -> SpanAnchor {
        SpanAnchor {
            start: TextAnchor {
                path: start.parse().unwrap(),
                offset: so,
            },
            end: TextAnchor {
                path: end.parse().unwrap(),
                offset: eo,
            },
        }
    }

    fn article() -> (Tree, NodeId) {
        Tree::from_markup("<div><p>The quick brown fox</p><p>jumps over the lazy dog</p></div>").unwrap()
    }

    #[test]
    fn short_text_rules() {
        assert_eq!(short_text("", 60), "");
        assert_eq!(short_text("exactly ten", 11), "exactly ten");
        assert_eq!(short_text("abcdefghijklmnop qr", 5), "abcde...");
        assert_eq!(short_text("ab cd ef gh", 6), "ab cd...");
        let long = "word ".repeat(30);
        // Word characters are counted, separators are not.
        let expected = format!("{}...", ["word"; 14].join(" "));
        assert_eq!(short_text(&long, SHORT_TEXT_LEN), expected);
    }

    #[test]
    fn store_round_trip() {
        let mut set = AnnotationSet::new();
        let id = set.create(&span("p[1]", 0, "p[1]", 3)).unwrap();
        assert_eq!(set.get(&id).unwrap().color, DEFAULT_COLOR);
        let second = set.create(&span("p[2]", 0, "p[2]", 3)).unwrap();
        assert_ne!(id, second);
        assert_eq!(set.load_annotations().unwrap().len(), 2);
        AnnotationStore::delete(&mut set, &id).unwrap();
        assert!(set.get(&id).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn ids_skip_taken_values() {
        let mut set = AnnotationSet::new();
        set.add(Annotation::new("a1", span("p[1]", 0, "p[1]", 1)));
        let id = set.create(&span("p[1]", 1, "p[1]", 2)).unwrap();
        assert_eq!(id, "a2");
    }

    #[test]
    fn create_checked_stores_excerpt() {
        let (tree, root) = article();
        let mut set = AnnotationSet::new();
        let config = AnnotationConfig::default();
        let created = set
            .create_checked(&tree, root, &span("p[1]", 4, "p[2]", 5), &config)
            .unwrap();
        assert_eq!(created.text, "quick brown foxjumps");
        assert_eq!(
            set.create_checked(&tree, root, &span("p[3]", 0, "p[3]", 1), &config),
            Err(AnnotateError::UnresolvedStart)
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn render_marks_wrappers_and_reports_orphans() {
        let (mut tree, root) = article();
        let mut set = AnnotationSet::new();
        let fox = set.create(&span("p[1]", 16, "p[1]", 19)).unwrap();
        let gone = set.create(&span("p[5]", 0, "p[5]", 2)).unwrap();
        let orphans = set.render(&mut tree, root, &AnnotationConfig::default());
        assert_eq!(orphans, [gone]);
        assert_eq!(
            tree.inner_markup(root),
            "<p>The quick brown <rd-annotation id=\"annotation-a1\" data-annotation-id-value=\"a1\" data-annotation-color=\"yellow\">fox</rd-annotation></p><p>jumps over the lazy dog</p>"
        );
        assert_eq!(set.get(&fox).unwrap().text, "fox");
    }

    #[test]
    fn sort_follows_document_order() {
        let (tree, root) = article();
        let mut set = AnnotationSet::new();
        set.add(Annotation::new("lazy", span("p[2]", 15, "p[2]", 19)));
        set.add(Annotation::new("orphan", span("p[9]", 0, "p[9]", 1)));
        set.add(Annotation::new("quick", span("p[1]", 4, "p[1]", 9)));
        set.add(Annotation::new("jumps", span("p[2]", 0, "p[2]", 5)));
        set.sort(&tree, root);
        let order: Vec<_> = set.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, ["quick", "jumps", "lazy", "orphan"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn stored_shape() {
        let json = r#"{"id":"x1","start_selector":"p[1]","start_offset":0,"end_selector":"p[1]","end_offset":3}"#;
        let annotation: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(annotation.color, DEFAULT_COLOR);
        assert_eq!(annotation.span, span("p[1]", 0, "p[1]", 3));
        let back = serde_json::to_value(&annotation).unwrap();
        assert_eq!(back["start_selector"], "p[1]");
        assert_eq!(back["color"], "yellow");
    }
}
