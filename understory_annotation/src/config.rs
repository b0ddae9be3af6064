// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup conventions for rendered annotations.

use alloc::string::String;

/// Tag and attribute names used when annotations are rendered into a document.
///
/// Overlap detection reads the same names back, so the builder and the
/// renderer must share one configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationConfig {
    /// Tag of the wrapper elements.
    pub tag_name: String,
    /// Attribute holding the annotation id on every wrapper.
    pub id_attribute: String,
    /// Attribute holding the annotation color on every wrapper.
    pub color_attribute: String,
    /// Prefix of the element `id` set on the first wrapper of each annotation.
    pub element_id_prefix: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            tag_name: "rd-annotation".into(),
            id_attribute: "data-annotation-id-value".into(),
            color_attribute: "data-annotation-color".into(),
            element_id_prefix: "annotation-".into(),
        }
    }
}
