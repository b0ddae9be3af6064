// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup fixtures: read HTML-like markup into a [`Tree`] and write it back.
//!
//! Tokenizing is done by `quick-xml` in a lenient configuration: end tag names
//! are checked here rather than by the reader, attributes may be unquoted, and
//! the usual void elements need no end tag. Adjacent text, CDATA and character
//! references become one text node, kept verbatim (whitespace included) because
//! text offsets are computed over it. Comments, doctypes and processing
//! instructions are dropped.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use smallvec::SmallVec;

use crate::tree::Tree;
use crate::types::{NodeId, NodeKind};

/// Errors produced while reading markup.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// The tokenizer rejected the input.
    #[error("malformed markup at byte {offset}: {source}")]
    Syntax {
        /// Byte offset where the error was detected.
        offset: u64,
        /// The tokenizer error.
        #[source]
        source: quick_xml::Error,
    },
    /// An end tag that does not match the innermost open element.
    #[error("unexpected end tag </{found}> at byte {offset}")]
    UnexpectedEndTag {
        /// Tag name found in the end tag.
        found: String,
        /// Byte offset of the end tag.
        offset: u64,
    },
    /// Input ended while an element was still open.
    #[error("element <{tag}> is never closed")]
    UnclosedElement {
        /// Tag name of the innermost open element.
        tag: String,
    },
    /// A character reference that is not known.
    #[error("unknown character reference &{name};")]
    UnknownEntity {
        /// The reference name, without `&` and `;`.
        name: String,
    },
    /// The markup has no top-level element.
    #[error("markup contains no root element")]
    NoRootElement,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Predefined XML entities plus `&nbsp;`.
fn resolve_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{a0}"),
        other => resolve_predefined_entity(other),
    }
}

impl Tree {
    /// Parse `markup` into a new tree and return it with its first top-level element.
    ///
    /// Whitespace-only text between top-level nodes is dropped.
    ///
    /// ```rust
    /// use understory_dom_tree::Tree;
    ///
    /// let (tree, root) = Tree::from_markup("<div><p>Hello <b>world</b></p></div>").unwrap();
    /// assert_eq!(tree.tag_name(root), Some("div"));
    /// assert_eq!(tree.text_content(root), "Hello world");
    /// ```
    pub fn from_markup(markup: &str) -> Result<(Self, NodeId), MarkupError> {
        let mut tree = Self::new();
        let top = tree.append_markup(None, markup)?;
        let root = top
            .into_iter()
            .find(|&n| tree.tag_name(n).is_some())
            .ok_or(MarkupError::NoRootElement)?;
        Ok((tree, root))
    }

    /// Parse `markup` and append the resulting nodes under `parent` (or as roots).
    ///
    /// Returns the top-level nodes that were created. On error, nodes created so
    /// far are removed again.
    pub fn append_markup(
        &mut self,
        parent: Option<NodeId>,
        markup: &str,
    ) -> Result<Vec<NodeId>, MarkupError> {
        let mut top = Vec::new();
        let result = Builder {
            tree: self,
            stack: SmallVec::new(),
            parent,
            pending: String::new(),
            top: &mut top,
        }
        .run(markup);
        match result {
            Ok(()) => Ok(top),
            Err(err) => {
                for n in top {
                    self.remove(n);
                }
                Err(err)
            }
        }
    }

    /// Serialize a node and its subtree.
    ///
    /// ```rust
    /// use understory_dom_tree::Tree;
    ///
    /// let (tree, root) = Tree::from_markup("<p title='a \"b\"'>1 &lt; 2</p>").unwrap();
    /// assert_eq!(tree.to_markup(root), "<p title=\"a &quot;b&quot;\">1 &lt; 2</p>");
    /// ```
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    /// Serialize the children of a node, without the node itself.
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children_of(id) {
            self.write_markup(child, &mut out);
        }
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(t)) => out.push_str(&partial_escape(t.as_str())),
            Some(NodeKind::Element(e)) => {
                out.push('<');
                out.push_str(&e.tag);
                for (name, value) in &e.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value.as_str()));
                    out.push('"');
                }
                out.push('>');
                if is_void(&e.tag) && self.children_of(id).is_empty() {
                    return;
                }
                for &child in self.children_of(id) {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(&e.tag);
                out.push('>');
            }
            None => {}
        }
    }
}

/// Turns reader events into tree nodes.
struct Builder<'a> {
    tree: &'a mut Tree,
    stack: SmallVec<[NodeId; 16]>,
    parent: Option<NodeId>,
    /// Text read since the last tag; flushed as a single node.
    pending: String,
    top: &'a mut Vec<NodeId>,
}

impl Builder<'_> {
    fn run(&mut self, markup: &str) -> Result<(), MarkupError> {
        let mut reader = Reader::from_str(markup);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;

        loop {
            let offset = reader.buffer_position();
            let event = reader.read_event().map_err(|source| MarkupError::Syntax {
                offset: reader.error_position(),
                source,
            })?;
            let syntax = |source: quick_xml::Error| MarkupError::Syntax { offset, source };
            match event {
                Event::Start(e) => {
                    self.flush_text();
                    let element = self.start(&reader, &e).map_err(syntax)?;
                    if !self.tree.tag_name(element).is_some_and(is_void) {
                        self.stack.push(element);
                    }
                }
                Event::Empty(e) => {
                    self.flush_text();
                    self.start(&reader, &e).map_err(syntax)?;
                }
                Event::End(e) => {
                    self.flush_text();
                    let name = decode_tag_name(&reader, e.name().as_ref()).map_err(syntax)?;
                    if is_void(&name) {
                        continue;
                    }
                    let matches = self
                        .stack
                        .last()
                        .and_then(|&open| self.tree.tag_name(open))
                        .is_some_and(|tag| tag == name);
                    if !matches {
                        return Err(MarkupError::UnexpectedEndTag {
                            found: name,
                            offset,
                        });
                    }
                    self.stack.pop();
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(|err| syntax(err.into()))?;
                    self.pending.push_str(&text);
                }
                Event::CData(e) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|err| syntax(err.into()))?;
                    self.pending.push_str(&text);
                }
                Event::GeneralRef(e) => {
                    let name = e.decode().map_err(|err| syntax(err.into()))?;
                    let reference = ["&", &*name, ";"].concat();
                    let resolved = unescape_with(&reference, resolve_entity).map_err(|_| {
                        MarkupError::UnknownEntity {
                            name: name.to_string(),
                        }
                    })?;
                    self.pending.push_str(&resolved);
                }
                Event::Eof => break,
                // Comments, declarations, processing instructions, doctypes.
                _ => {}
            }
        }
        self.flush_text();

        if let Some(&open) = self.stack.last() {
            return Err(MarkupError::UnclosedElement {
                tag: self.tree.tag_name(open).unwrap_or_default().to_string(),
            });
        }
        Ok(())
    }

    fn current_parent(&self) -> Option<NodeId> {
        self.stack.last().copied().or(self.parent)
    }

    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = core::mem::take(&mut self.pending);
        if self.stack.is_empty() && self.parent.is_none() && text.trim().is_empty() {
            return;
        }
        let parent = self.current_parent();
        let id = self.tree.insert_text(parent, &text);
        if self.stack.is_empty() {
            self.top.push(id);
        }
    }

    /// Create the element for a start (or empty) tag, attributes included.
    fn start(
        &mut self,
        reader: &Reader<&[u8]>,
        e: &BytesStart<'_>,
    ) -> Result<NodeId, quick_xml::Error> {
        let tag = decode_tag_name(reader, e.name().as_ref())?;
        let parent = self.current_parent();
        let element = self.tree.insert_element(parent, &tag);
        if self.stack.is_empty() {
            self.top.push(element);
        }
        for attr in e.html_attributes() {
            let attr = attr?;
            let key = reader.decoder().decode(attr.key.as_ref())?;
            let raw = reader.decoder().decode(&attr.value)?;
            let value = unescape_with(&raw, resolve_entity)?;
            self.tree.set_attribute(element, &key, &value);
        }
        Ok(element)
    }
}

/// Tag names are matched and stored in ASCII lowercase.
fn decode_tag_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Result<String, quick_xml::Error> {
    let decoded: Cow<'_, str> = reader.decoder().decode(raw)?;
    Ok(decoded.to_ascii_lowercase())
}
