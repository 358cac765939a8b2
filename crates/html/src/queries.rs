//! DOM lookup helpers.
//!
//! All traversals are pre-order over the subtree rooted at `start`, so
//! results are stable across runs for the same tree.

use crate::dom::Document;
use indextree::NodeId;

/// True if `attr_value`, split on ASCII whitespace, contains `token`.
#[must_use]
pub fn has_attr_token(attr_value: &str, token: &str) -> bool {
    attr_value
        .split_ascii_whitespace()
        .any(|candidate| candidate == token)
}

fn element_matches<F>(document: &Document, id: NodeId, predicate: &F) -> bool
where
    F: Fn(&Document, NodeId) -> bool,
{
    document.is_element(id) && predicate(document, id)
}

fn collect_elements<F>(document: &Document, start: NodeId, predicate: F) -> Vec<NodeId>
where
    F: Fn(&Document, NodeId) -> bool,
{
    document
        .descendants(start)
        .filter(|&id| element_matches(document, id, &predicate))
        .collect()
}

fn find_first_element<F>(document: &Document, start: NodeId, predicate: F) -> Option<NodeId>
where
    F: Fn(&Document, NodeId) -> bool,
{
    document
        .descendants(start)
        .find(|&id| element_matches(document, id, &predicate))
}

/// All elements with the given tag name (compared lowercased).
#[must_use]
pub fn query_all_by_tag(document: &Document, start: NodeId, tag: &str) -> Vec<NodeId> {
    if tag.is_empty() {
        return Vec::new();
    }
    let tag = tag.to_ascii_lowercase();
    collect_elements(document, start, |doc, id| doc.tag(id) == Some(tag.as_str()))
}

/// First element with the given tag name in pre-order.
#[must_use]
pub fn query_first_by_tag(document: &Document, start: NodeId, tag: &str) -> Option<NodeId> {
    if tag.is_empty() {
        return None;
    }
    let tag = tag.to_ascii_lowercase();
    find_first_element(document, start, |doc, id| doc.tag(id) == Some(tag.as_str()))
}

/// First element whose `id` attribute equals `id_value` exactly.
#[must_use]
pub fn query_first_by_id(document: &Document, start: NodeId, id_value: &str) -> Option<NodeId> {
    if id_value.is_empty() {
        return None;
    }
    find_first_element(document, start, |doc, id| {
        doc.attribute(id, "id") == Some(id_value)
    })
}

/// All elements where `attr` equals `value` exactly.
#[must_use]
pub fn query_all_by_attr(document: &Document, start: NodeId, attr: &str, value: &str) -> Vec<NodeId> {
    if attr.is_empty() {
        return Vec::new();
    }
    let attr = attr.to_ascii_lowercase();
    collect_elements(document, start, |doc, id| {
        doc.attribute(id, &attr) == Some(value)
    })
}

/// First element where `attr` equals `value` exactly.
#[must_use]
pub fn query_first_by_attr(
    document: &Document,
    start: NodeId,
    attr: &str,
    value: &str,
) -> Option<NodeId> {
    if attr.is_empty() {
        return None;
    }
    let attr = attr.to_ascii_lowercase();
    find_first_element(document, start, |doc, id| {
        doc.attribute(id, &attr) == Some(value)
    })
}

/// All elements whose whitespace-split `attr` contains `token`.
#[must_use]
pub fn query_all_by_attr_token(
    document: &Document,
    start: NodeId,
    attr: &str,
    token: &str,
) -> Vec<NodeId> {
    if attr.is_empty() || token.is_empty() {
        return Vec::new();
    }
    let attr = attr.to_ascii_lowercase();
    collect_elements(document, start, |doc, id| {
        doc.attribute(id, &attr)
            .is_some_and(|value| has_attr_token(value, token))
    })
}

/// First element whose whitespace-split `attr` contains `token`.
#[must_use]
pub fn query_first_by_attr_token(
    document: &Document,
    start: NodeId,
    attr: &str,
    token: &str,
) -> Option<NodeId> {
    if attr.is_empty() || token.is_empty() {
        return None;
    }
    let attr = attr.to_ascii_lowercase();
    find_first_element(document, start, |doc, id| {
        doc.attribute(id, &attr)
            .is_some_and(|value| has_attr_token(value, token))
    })
}

/// All elements carrying `class_name` as a class token.
#[must_use]
pub fn query_all_by_class(document: &Document, start: NodeId, class_name: &str) -> Vec<NodeId> {
    query_all_by_attr_token(document, start, "class", class_name)
}

/// First element carrying `class_name` as a class token.
#[must_use]
pub fn query_first_by_class(document: &Document, start: NodeId, class_name: &str) -> Option<NodeId> {
    query_first_by_attr_token(document, start, "class", class_name)
}

/// All elements whose recursive `inner_text` contains `needle`.
#[must_use]
pub fn query_all_text_contains(document: &Document, start: NodeId, needle: &str) -> Vec<NodeId> {
    if needle.is_empty() {
        return Vec::new();
    }
    collect_elements(document, start, |doc, id| {
        doc.inner_text(id).contains(needle)
    })
}
