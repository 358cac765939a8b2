//! CSS color resolution for painting.
//!
//! Color syntax (named colors, hex forms, `rgb[a]()`, `hsl[a]()`) is
//! handled by `csscolorparser`. Anything translucent is composited
//! against opaque white here, since the canvas is pre-filled white and
//! stores plain RGB. `currentcolor` resolves to the box's text color.

use layout::engine::LayoutBox;
use layout::style_values::style_value;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Canvas default and compositing backdrop.
pub const WHITE: Color = Color {
    r: 255,
    g: 255,
    b: 255,
};

/// Default text color.
pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

/// Composite one channel over an opaque white backdrop.
fn blend_over_white(channel: u8, alpha: f64) -> u8 {
    let blended = f64::from(channel) * alpha + 255.0 * (1.0 - alpha);
    (blended + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// Parse a CSS color value to opaque RGB; translucent values are
/// composited against white. `None` when the value does not parse.
#[must_use]
pub fn parse_color(raw: &str) -> Option<Color> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = csscolorparser::parse(value).ok()?;
    let [r, g, b, _] = parsed.to_rgba8();
    let alpha = f64::from(parsed.a).clamp(0.0, 1.0);
    if alpha >= 1.0 {
        return Some(Color { r, g, b });
    }

    Some(Color {
        r: blend_over_white(r, alpha),
        g: blend_over_white(g, alpha),
        b: blend_over_white(b, alpha),
    })
}

/// Like [`parse_color`], but resolves `currentcolor` to `current_color`.
#[must_use]
pub fn parse_paint_color(raw: &str, current_color: Color) -> Option<Color> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if value.eq_ignore_ascii_case("currentcolor") {
        return Some(current_color);
    }
    parse_color(value)
}

/// Parse one border-width token: `thin`/`medium`/`thick` or an unsigned
/// integer with an optional `px` suffix.
fn parse_length_token(token: &str) -> Option<i32> {
    let lower = token.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }

    match lower.as_str() {
        "thin" => return Some(1),
        "medium" => return Some(3),
        "thick" => return Some(5),
        _ => {}
    }

    let bytes = lower.as_bytes();
    let digits_end = bytes
        .iter()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(bytes.len());
    if digits_end == 0 {
        return None;
    }
    if digits_end < bytes.len() && &lower[digits_end..] != "px" {
        return None;
    }

    lower[..digits_end].parse::<i32>().ok()
}

/// Border width from `border-width`, falling back to scanning the
/// `border` shorthand for a length token. Zero when neither parses.
#[must_use]
pub fn parse_border_width(border_width_value: &str, border_value: &str) -> i32 {
    if let Some(width) = parse_length_token(border_width_value) {
        return i32::max(width, 0);
    }

    for token in border_value.split_ascii_whitespace() {
        if let Some(width) = parse_length_token(token) {
            return i32::max(width, 0);
        }
    }

    0
}

/// Border color from `border-color`, falling back to scanning the
/// `border` shorthand for a parseable color token.
#[must_use]
pub fn parse_border_color(
    border_color_value: &str,
    border_value: &str,
    current_color: Color,
) -> Option<Color> {
    if let Some(color) = parse_paint_color(border_color_value, current_color) {
        return Some(color);
    }

    border_value
        .split_ascii_whitespace()
        .find_map(|token| parse_paint_color(token, current_color))
}

/// The box's text color: its `color` property, or black.
#[must_use]
pub fn resolve_box_text_color(layout_box: &LayoutBox) -> Color {
    parse_color(style_value(&layout_box.style, "color")).unwrap_or(BLACK)
}

/// Background value: `background-color`, falling back to `background`.
#[must_use]
pub fn box_background_value(layout_box: &LayoutBox) -> &str {
    let value = style_value(&layout_box.style, "background-color");
    if value.is_empty() {
        return style_value(&layout_box.style, "background");
    }
    value
}
