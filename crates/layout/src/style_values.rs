//! Computed-style value parsing shared by the layout passes.

use std::collections::BTreeMap;

/// Computed style map for one node.
pub type StyleMap = BTreeMap<String, String>;

/// Look up a style property; empty string when absent.
#[must_use]
pub fn style_value<'style>(style: &'style StyleMap, key: &str) -> &'style str {
    style.get(key).map(String::as_str).unwrap_or_default()
}

/// Parse a px length: a signed number optionally suffixed with `px`,
/// rounded to the nearest integer. Anything else yields `fallback`.
#[must_use]
pub fn parse_css_px(raw: &str, fallback: i32) -> i32 {
    let mut value = raw.trim().to_ascii_lowercase();
    if value.is_empty() {
        return fallback;
    }

    if let Some(stripped) = value.strip_suffix("px") {
        value = stripped.trim().to_owned();
    }

    value
        .parse::<f64>()
        .map_or(fallback, |parsed| parsed.round() as i32)
}

/// Parse a whitespace-separated list of lengths, each falling back to 0.
#[must_use]
pub fn parse_length_list(raw: &str) -> Vec<i32> {
    raw.split_ascii_whitespace()
        .map(|token| parse_css_px(token, 0))
        .collect()
}

/// Per-side box edges in px.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxEdges {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// Resolve `padding`/`margin` edges: the shorthand takes 1/2/3/4 values
/// in CSS order, then `-top`/`-right`/`-bottom`/`-left` override.
#[must_use]
pub fn edges_from_style(style: &StyleMap, key: &str) -> BoxEdges {
    let mut edges = BoxEdges::default();
    let shorthand = parse_length_list(style_value(style, key));

    match shorthand.len() {
        1 => {
            edges.top = shorthand[0];
            edges.right = shorthand[0];
            edges.bottom = shorthand[0];
            edges.left = shorthand[0];
        }
        2 => {
            edges.top = shorthand[0];
            edges.bottom = shorthand[0];
            edges.left = shorthand[1];
            edges.right = shorthand[1];
        }
        3 => {
            edges.top = shorthand[0];
            edges.left = shorthand[1];
            edges.right = shorthand[1];
            edges.bottom = shorthand[2];
        }
        len if len >= 4 => {
            edges.top = shorthand[0];
            edges.right = shorthand[1];
            edges.bottom = shorthand[2];
            edges.left = shorthand[3];
        }
        _ => {}
    }

    edges.top = parse_css_px(style_value(style, &format!("{key}-top")), edges.top);
    edges.right = parse_css_px(style_value(style, &format!("{key}-right")), edges.right);
    edges.bottom = parse_css_px(style_value(style, &format!("{key}-bottom")), edges.bottom);
    edges.left = parse_css_px(style_value(style, &format!("{key}-left")), edges.left);

    edges
}

/// Apply `text-transform` to text content.
#[must_use]
pub fn apply_text_transform(text: &str, style: &StyleMap) -> String {
    match style_value(style, "text-transform")
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "uppercase" => text.to_ascii_uppercase(),
        "lowercase" => text.to_ascii_lowercase(),
        "capitalize" => {
            let mut out = String::with_capacity(text.len());
            let mut at_word_start = true;
            for character in text.chars() {
                if character.is_ascii_alphanumeric() {
                    if at_word_start && character.is_ascii_alphabetic() {
                        out.push(character.to_ascii_uppercase());
                    } else {
                        out.push(character);
                    }
                    at_word_start = false;
                } else {
                    out.push(character);
                    at_word_start = true;
                }
            }
            out
        }
        _ => text.to_owned(),
    }
}
