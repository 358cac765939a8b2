//! Stylesheet parsing: rule extraction and declaration splitting.

use crate::imports;
use crate::selectors::{parse_selector, specificity_of, split_selector_list};
use crate::types::{Declaration, ParseCssResult, Rule, StyleWarning, Stylesheet};
use log::debug;

/// Split a declaration block on `;` into `property: value` declarations.
/// Properties are lowercased, values trimmed; empty properties are dropped.
#[must_use]
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for chunk in block.split(';') {
        let Some((property, value)) = chunk.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        if property.is_empty() {
            continue;
        }
        declarations.push(Declaration {
            property,
            value: value.trim().to_owned(),
        });
    }
    declarations
}

/// Specificity of a selector string; 0 when it does not parse.
#[must_use]
pub fn compute_specificity(selector: &str) -> i32 {
    parse_selector(selector).map_or(0, |parsed| specificity_of(&parsed))
}

fn parse_rules(css: &str, mut on_bad_selector: impl FnMut(&str)) -> Stylesheet {
    let mut stylesheet = Stylesheet::default();
    let (stripped, _imports) = imports::strip_imports(css);
    let source = stripped.as_str();

    let mut cursor = 0;
    while cursor < source.len() {
        let Some(open_offset) = source[cursor..].find('{') else {
            break;
        };
        let open_brace = cursor + open_offset;
        let Some(close_offset) = source[open_brace + 1..].find('}') else {
            break;
        };
        let close_brace = open_brace + 1 + close_offset;

        let selectors = split_selector_list(&source[cursor..open_brace]);
        let declarations = parse_declarations(&source[open_brace + 1..close_brace]);

        for selector in selectors {
            let Some(parsed) = parse_selector(&selector) else {
                on_bad_selector(&selector);
                continue;
            };
            stylesheet.rules.push(Rule {
                specificity: specificity_of(&parsed),
                selector,
                declarations: declarations.clone(),
            });
        }

        cursor = close_brace + 1;
    }

    stylesheet
}

/// Parse a stylesheet, silently dropping unsupported selectors.
/// Top-level `@import` statements are stripped before rule extraction.
#[must_use]
pub fn parse_css(css: &str) -> Stylesheet {
    parse_rules(css, |_selector| {})
}

/// Parse a stylesheet, reporting a warning for each dropped selector.
#[must_use]
pub fn parse_css_with_diagnostics(css: &str) -> ParseCssResult {
    let mut warnings = Vec::new();
    let stylesheet = parse_rules(css, |selector| {
        warnings.push(StyleWarning {
            message: "Unsupported selector skipped".to_owned(),
            selector: selector.to_owned(),
        });
    });
    debug!(
        "parse_css: {} rule(s), {} dropped selector(s)",
        stylesheet.rules.len(),
        warnings.len()
    );
    ParseCssResult {
        stylesheet,
        warnings,
    }
}
