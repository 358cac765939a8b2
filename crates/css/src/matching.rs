//! Selector matching against DOM nodes.

use crate::selectors::{
    AttributeOperator, Combinator, CompoundSelector, NthPattern, ParsedSelector, PseudoClass,
    parse_compound_selector, parse_selector,
};
use html::dom::{Document, NodeKind};
use html::NodeId;

/// Trimmed attribute value; empty when the attribute is absent.
fn attribute_value(document: &Document, id: NodeId, key: &str) -> String {
    document
        .attribute(id, key)
        .map(str::trim)
        .unwrap_or_default()
        .to_owned()
}

/// True if the class attribute, split on whitespace, contains `token`.
fn has_class_token(class_attribute: &str, token: &str) -> bool {
    class_attribute
        .split_ascii_whitespace()
        .any(|candidate| candidate == token)
}

fn element_children(document: &Document, parent: NodeId) -> Vec<NodeId> {
    document
        .children(parent)
        .filter(|&child| document.is_element(child))
        .collect()
}

fn is_first_element_child(document: &Document, node: NodeId) -> bool {
    document
        .parent(node)
        .is_some_and(|parent| element_children(document, parent).first() == Some(&node))
}

fn is_last_element_child(document: &Document, node: NodeId) -> bool {
    document
        .parent(node)
        .is_some_and(|parent| element_children(document, parent).last() == Some(&node))
}

fn is_only_element_child(document: &Document, node: NodeId) -> bool {
    document.parent(node).is_some_and(|parent| {
        let elements = element_children(document, parent);
        elements.len() == 1 && elements[0] == node
    })
}

/// Element children of the parent that share `node`'s tag.
fn same_type_siblings(document: &Document, node: NodeId) -> Option<Vec<NodeId>> {
    let parent = document.parent(node)?;
    let tag = document.tag(node)?;
    if tag.is_empty() {
        return None;
    }
    Some(
        element_children(document, parent)
            .into_iter()
            .filter(|&sibling| document.tag(sibling) == Some(tag))
            .collect(),
    )
}

fn is_first_of_type(document: &Document, node: NodeId) -> bool {
    same_type_siblings(document, node).is_some_and(|siblings| siblings.first() == Some(&node))
}

fn is_last_of_type(document: &Document, node: NodeId) -> bool {
    same_type_siblings(document, node).is_some_and(|siblings| siblings.last() == Some(&node))
}

/// No element children and no non-whitespace text children.
fn is_empty_element(document: &Document, node: NodeId) -> bool {
    document.children(node).all(|child| match &document.node(child).kind {
        NodeKind::Element { .. } => false,
        NodeKind::Text { text } => text.trim().is_empty(),
        NodeKind::Document => true,
    })
}

fn matches_nth_pattern(pattern: NthPattern, index: i32) -> bool {
    match pattern {
        NthPattern::Index(expected) => index == expected,
        NthPattern::Odd => index % 2 == 1,
        NthPattern::Even => index % 2 == 0,
    }
}

fn is_nth_element_child(
    document: &Document,
    node: NodeId,
    pattern: NthPattern,
    same_tag_only: bool,
    count_from_end: bool,
) -> bool {
    let Some(parent) = document.parent(node) else {
        return false;
    };
    if let NthPattern::Index(index) = pattern
        && index <= 0
    {
        return false;
    }

    let mut siblings = if same_tag_only {
        let Some(siblings) = same_type_siblings(document, node) else {
            return false;
        };
        siblings
    } else {
        element_children(document, parent)
    };
    if count_from_end {
        siblings.reverse();
    }

    siblings
        .iter()
        .position(|&sibling| sibling == node)
        .is_some_and(|position| matches_nth_pattern(pattern, position as i32 + 1))
}

fn previous_element_sibling(document: &Document, node: NodeId) -> Option<NodeId> {
    let parent = document.parent(node)?;
    let mut previous = None;
    for sibling in document.children(parent) {
        if sibling == node {
            return previous;
        }
        if document.is_element(sibling) {
            previous = Some(sibling);
        }
    }
    None
}

fn pseudo_class_matches(document: &Document, pseudo: &PseudoClass, node: NodeId) -> bool {
    if !document.is_element(node) {
        return false;
    }

    match pseudo {
        PseudoClass::FirstChild => is_first_element_child(document, node),
        PseudoClass::LastChild => is_last_element_child(document, node),
        PseudoClass::FirstOfType => is_first_of_type(document, node),
        PseudoClass::LastOfType => is_last_of_type(document, node),
        PseudoClass::OnlyChild => is_only_element_child(document, node),
        PseudoClass::Root => document
            .parent(node)
            .is_none_or(|parent| matches!(document.node(parent).kind, NodeKind::Document)),
        PseudoClass::Empty => is_empty_element(document, node),
        PseudoClass::NthChild(pattern) => {
            is_nth_element_child(document, node, *pattern, false, false)
        }
        PseudoClass::NthOfType(pattern) => {
            is_nth_element_child(document, node, *pattern, true, false)
        }
        PseudoClass::NthLastChild(pattern) => {
            is_nth_element_child(document, node, *pattern, false, true)
        }
        PseudoClass::NthLastOfType(pattern) => {
            is_nth_element_child(document, node, *pattern, true, true)
        }
        PseudoClass::Not(negated) => {
            if negated.is_empty() {
                return false;
            }
            // Re-parsed here so an unparsable inner compound rejects.
            let Some(negated_compound) = parse_compound_selector(negated) else {
                return false;
            };
            !compound_matches_node(document, &negated_compound, node)
        }
    }
}

/// True if every simple selector in `compound` holds for `node`.
#[must_use]
pub fn compound_matches_node(
    document: &Document,
    compound: &CompoundSelector,
    node: NodeId,
) -> bool {
    if !document.is_element(node) {
        return false;
    }

    if !compound.tag.is_empty() && document.tag(node) != Some(compound.tag.as_str()) {
        return false;
    }

    if !compound.ids.is_empty() {
        let id = attribute_value(document, node, "id");
        if id.is_empty() {
            return false;
        }
        if compound.ids.iter().any(|selector_id| *selector_id != id) {
            return false;
        }
    }

    if !compound.classes.is_empty() {
        let class_attribute = attribute_value(document, node, "class");
        if class_attribute.is_empty() {
            return false;
        }
        if compound
            .classes
            .iter()
            .any(|class_name| !has_class_token(&class_attribute, class_name))
        {
            return false;
        }
    }

    for attribute_selector in &compound.attribute_selectors {
        let value = attribute_value(document, node, &attribute_selector.name);
        let holds = match attribute_selector.op {
            AttributeOperator::Exists => document.has_attribute(node, &attribute_selector.name),
            AttributeOperator::Exact => value == attribute_selector.value,
            AttributeOperator::ClassContainsToken => {
                has_class_token(&value, &attribute_selector.value)
            }
            AttributeOperator::Prefix => value.starts_with(&attribute_selector.value),
            AttributeOperator::Suffix => value.ends_with(&attribute_selector.value),
            AttributeOperator::ContainsSubstring => value.contains(&attribute_selector.value),
        };
        if !holds {
            return false;
        }
    }

    compound
        .pseudo_classes
        .iter()
        .all(|pseudo| pseudo_class_matches(document, pseudo, node))
}

/// True if `node` matches `selector`, reading combinators right to left.
#[must_use]
pub fn matches(document: &Document, selector: &ParsedSelector, node: NodeId) -> bool {
    if selector.compounds.is_empty()
        || selector.combinators.len() + 1 != selector.compounds.len()
    {
        return false;
    }

    let Some(rightmost) = selector.compounds.last() else {
        return false;
    };
    if !compound_matches_node(document, rightmost, node) {
        return false;
    }

    let mut current = node;
    for index in (0..selector.combinators.len()).rev() {
        let lhs = &selector.compounds[index];
        match selector.combinators[index] {
            Combinator::Descendant => {
                let mut ancestor = document.parent(current);
                let mut matched = false;
                while let Some(candidate) = ancestor {
                    if document.is_element(candidate)
                        && compound_matches_node(document, lhs, candidate)
                    {
                        current = candidate;
                        matched = true;
                        break;
                    }
                    ancestor = document.parent(candidate);
                }
                if !matched {
                    return false;
                }
            }
            Combinator::Child => {
                let Some(parent) = document.parent(current) else {
                    return false;
                };
                if !document.is_element(parent) || !compound_matches_node(document, lhs, parent) {
                    return false;
                }
                current = parent;
            }
            Combinator::AdjacentSibling => {
                let Some(sibling) = previous_element_sibling(document, current) else {
                    return false;
                };
                if !compound_matches_node(document, lhs, sibling) {
                    return false;
                }
                current = sibling;
            }
            Combinator::GeneralSibling => {
                let mut candidate = previous_element_sibling(document, current);
                let mut matched = false;
                while let Some(sibling) = candidate {
                    if compound_matches_node(document, lhs, sibling) {
                        current = sibling;
                        matched = true;
                        break;
                    }
                    candidate = previous_element_sibling(document, sibling);
                }
                if !matched {
                    return false;
                }
            }
        }
    }

    true
}

/// Parse `selector` and match it; an unparsable selector never matches.
#[must_use]
pub fn selector_matches_node(document: &Document, selector: &str, node: NodeId) -> bool {
    parse_selector(selector)
        .is_some_and(|parsed| matches(document, &parsed, node))
}
