//! Cascade resolution: which declaration wins each property for a node.

use crate::matching::matches;
use crate::parser::parse_declarations;
use crate::selectors::parse_selector;
use crate::types::{INLINE_SPECIFICITY, Stylesheet};
use html::dom::Document;
use html::NodeId;
use std::collections::BTreeMap;

/// The winning declaration for one property while cascading.
struct Winner {
    specificity: i32,
    source_order: usize,
    value: String,
}

/// Parse a semicolon-separated inline style string into an ordered map.
#[must_use]
pub fn parse_inline_style(style_text: &str) -> BTreeMap<String, String> {
    parse_declarations(style_text)
        .into_iter()
        .map(|declaration| (declaration.property, declaration.value))
        .collect()
}

/// Canonical inline-style serialization: `k: v;` pairs joined by a space,
/// in the map's key order.
#[must_use]
pub fn serialize_inline_style(style_map: &BTreeMap<String, String>) -> String {
    let mut serialized = String::new();
    for (property, value) in style_map {
        if !serialized.is_empty() {
            serialized.push(' ');
        }
        serialized.push_str(property);
        serialized.push_str(": ");
        serialized.push_str(value);
        serialized.push(';');
    }
    serialized
}

/// Compute the cascaded property map for `node`.
///
/// Rules apply in source order; a declaration wins its property when its
/// rule has strictly higher specificity, or equal specificity and a later
/// source order. Inline `style` declarations apply last at specificity
/// 1000. Non-element nodes get an empty map.
#[must_use]
pub fn compute_style_for_node(
    document: &Document,
    node: NodeId,
    stylesheet: &Stylesheet,
) -> BTreeMap<String, String> {
    if !document.is_element(node) {
        return BTreeMap::new();
    }

    let mut winners: BTreeMap<String, Winner> = BTreeMap::new();
    let mut source_order: usize = 0;

    for rule in &stylesheet.rules {
        let Some(parsed) = parse_selector(&rule.selector) else {
            continue;
        };
        if !matches(document, &parsed, node) {
            continue;
        }

        for declaration in &rule.declarations {
            if declaration.property.is_empty() {
                continue;
            }

            let should_override = winners.get(&declaration.property).is_none_or(|winner| {
                rule.specificity > winner.specificity
                    || (rule.specificity == winner.specificity
                        && source_order >= winner.source_order)
            });
            if should_override {
                winners.insert(
                    declaration.property.clone(),
                    Winner {
                        specificity: rule.specificity,
                        source_order,
                        value: declaration.value.clone(),
                    },
                );
            }
            source_order += 1;
        }
    }

    let inline_text = document
        .attribute(node, "style")
        .map(str::trim)
        .unwrap_or_default();
    for (property, value) in parse_inline_style(inline_text) {
        winners.insert(
            property,
            Winner {
                specificity: INLINE_SPECIFICITY,
                source_order,
                value,
            },
        );
        source_order += 1;
    }

    winners
        .into_iter()
        .map(|(property, winner)| (property, winner.value))
        .collect()
}
