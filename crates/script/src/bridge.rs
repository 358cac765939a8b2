//! Host bridge: query and mutate the DOM without going through script text.
//!
//! The query side returns plain-data snapshots so hosts never hold node
//! handles across mutations.

use crate::interpreter::{
    normalize_style_property, set_element_attribute, set_element_text, set_inline_style_property,
};
use html::dom::Document;
use html::queries::{query_first_by_id, query_first_by_tag};
use html::NodeId;
use std::collections::BTreeMap;

/// Snapshot of one element for host consumption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeElement {
    /// Always true for returned elements.
    pub found: bool,
    /// Lowercase tag name.
    pub tag_name: String,
    /// Recursive text content.
    pub text_content: String,
    /// Attributes, key-sorted.
    pub attributes: BTreeMap<String, String>,
    /// Direct child count (all node kinds).
    pub child_count: usize,
}

/// Result of a bridge query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// False only for invalid requests (empty id/selector).
    pub ok: bool,
    /// "OK", "Not found", or the request problem.
    pub message: String,
    /// Matched elements; empty when nothing matched.
    pub elements: Vec<BridgeElement>,
}

/// Result of a bridge mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    /// True when the mutation was applied.
    pub ok: bool,
    /// "OK" or the failure reason.
    pub message: String,
}

impl MutationResult {
    fn ok() -> Self {
        Self {
            ok: true,
            message: "OK".to_owned(),
        }
    }

    fn failed(message: String) -> Self {
        Self { ok: false, message }
    }
}

fn snapshot_element(document: &Document, element: NodeId) -> BridgeElement {
    BridgeElement {
        found: true,
        tag_name: document.tag(element).unwrap_or_default().to_owned(),
        text_content: document.inner_text(element),
        attributes: document.sorted_attributes(element).into_iter().collect(),
        child_count: document.children(element).count(),
    }
}

fn first_element_with_exact_class(document: &Document, class_name: &str) -> Option<NodeId> {
    document
        .descendants(document.root())
        .find(|&id| document.is_element(id) && document.attribute(id, "class") == Some(class_name))
}

/// Find one element by its `id` attribute.
#[must_use]
pub fn query_by_id(document: &Document, id: &str) -> QueryResult {
    if id.is_empty() {
        return QueryResult {
            ok: false,
            message: "Empty id".to_owned(),
            elements: Vec::new(),
        };
    }

    match query_first_by_id(document, document.root(), id) {
        None => QueryResult {
            ok: true,
            message: "Not found".to_owned(),
            elements: Vec::new(),
        },
        Some(element) => QueryResult {
            ok: true,
            message: "OK".to_owned(),
            elements: vec![snapshot_element(document, element)],
        },
    }
}

/// Find the first element for a `#id`, `.class`, or tag selector.
#[must_use]
pub fn query_selector(document: &Document, selector: &str) -> QueryResult {
    if selector.is_empty() {
        return QueryResult {
            ok: false,
            message: "Empty selector".to_owned(),
            elements: Vec::new(),
        };
    }

    let element = if let Some(id) = selector.strip_prefix('#') {
        (!id.is_empty())
            .then(|| query_first_by_id(document, document.root(), id))
            .flatten()
    } else if let Some(class_name) = selector.strip_prefix('.') {
        first_element_with_exact_class(document, class_name)
    } else {
        query_first_by_tag(document, document.root(), selector)
    };

    match element {
        None => QueryResult {
            ok: true,
            message: "Not found".to_owned(),
            elements: Vec::new(),
        },
        Some(element) => QueryResult {
            ok: true,
            message: "OK".to_owned(),
            elements: vec![snapshot_element(document, element)],
        },
    }
}

/// Find all elements for a `#id`, `.class`, or tag selector.
#[must_use]
pub fn query_selector_all(document: &Document, selector: &str) -> QueryResult {
    if selector.is_empty() {
        return QueryResult {
            ok: false,
            message: "Empty selector".to_owned(),
            elements: Vec::new(),
        };
    }

    let mut nodes: Vec<NodeId> = Vec::new();
    if let Some(id) = selector.strip_prefix('#') {
        if !id.is_empty()
            && let Some(element) = query_first_by_id(document, document.root(), id)
        {
            nodes.push(element);
        }
    } else if let Some(class_name) = selector.strip_prefix('.') {
        nodes.extend(document.descendants(document.root()).filter(|&id| {
            document.is_element(id) && document.attribute(id, "class") == Some(class_name)
        }));
    } else {
        nodes = html::queries::query_all_by_tag(document, document.root(), selector);
    }

    QueryResult {
        ok: true,
        message: "OK".to_owned(),
        elements: nodes
            .into_iter()
            .map(|element| snapshot_element(document, element))
            .collect(),
    }
}

fn locate_by_id(document: &Document, id: &str) -> Result<NodeId, MutationResult> {
    if id.is_empty() {
        return Err(MutationResult::failed("Empty id".to_owned()));
    }
    query_first_by_id(document, document.root(), id)
        .ok_or_else(|| MutationResult::failed(format!("Element not found: {id}")))
}

/// Set an attribute on the element with the given id.
pub fn set_attribute_by_id(
    document: &mut Document,
    id: &str,
    attribute: &str,
    value: &str,
) -> MutationResult {
    if attribute.is_empty() {
        return MutationResult::failed("Empty attribute name".to_owned());
    }
    match locate_by_id(document, id) {
        Err(failure) => failure,
        Ok(element) => {
            set_element_attribute(document, element, attribute, value);
            MutationResult::ok()
        }
    }
}

/// Remove an attribute from the element with the given id.
pub fn remove_attribute_by_id(document: &mut Document, id: &str, attribute: &str) -> MutationResult {
    if attribute.is_empty() {
        return MutationResult::failed("Empty attribute name".to_owned());
    }
    match locate_by_id(document, id) {
        Err(failure) => failure,
        Ok(element) => {
            document.remove_attribute(element, attribute);
            MutationResult::ok()
        }
    }
}

/// Set one inline-style property on the element with the given id.
pub fn set_style_by_id(
    document: &mut Document,
    id: &str,
    property: &str,
    value: &str,
) -> MutationResult {
    if property.is_empty() {
        return MutationResult::failed("Empty style property".to_owned());
    }
    match locate_by_id(document, id) {
        Err(failure) => failure,
        Ok(element) => {
            let Some(css_property) = normalize_style_property(property) else {
                return MutationResult::failed(format!("Unsupported style property: {property}"));
            };
            set_inline_style_property(document, element, &css_property, value);
            MutationResult::ok()
        }
    }
}

/// Replace the text content of the element with the given id.
pub fn set_text_by_id(document: &mut Document, id: &str, text: &str) -> MutationResult {
    match locate_by_id(document, id) {
        Err(failure) => failure,
        Ok(element) => {
            set_element_text(document, element, text);
            MutationResult::ok()
        }
    }
}
