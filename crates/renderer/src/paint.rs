//! Painting: walk the layout tree and rasterize boxes onto the canvas.

use crate::canvas::Canvas;
use crate::color::{
    self, Color, box_background_value, parse_border_color, parse_border_width, parse_paint_color,
    resolve_box_text_color,
};
use crate::glyphs::glyph_for_char;
use layout::engine::LayoutBox;
use layout::style_values::style_value;
use log::debug;

/// Horizontal advance per glyph cell.
const GLYPH_ADVANCE_X: i32 = 6;
/// Vertical advance on an embedded newline.
const GLYPH_ADVANCE_Y: i32 = 8;

fn draw_glyph(canvas: &mut Canvas, x: i32, y: i32, character: char, color: Color) {
    let glyph = glyph_for_char(character);
    for (row, &bits) in glyph.iter().enumerate() {
        for col in 0..5 {
            let mask = 1u8 << (4 - col);
            if bits & mask != 0 {
                canvas.set_pixel(x + col, y + row as i32, color);
            }
        }
    }
}

fn draw_text(canvas: &mut Canvas, x: i32, y: i32, text: &str, color: Color) {
    let mut cursor_x = x;
    let mut cursor_y = y;

    for character in text.chars() {
        match character {
            '\n' => {
                cursor_x = x;
                cursor_y += GLYPH_ADVANCE_Y;
            }
            '\r' => {}
            other => {
                draw_glyph(canvas, cursor_x, cursor_y, other, color);
                cursor_x += GLYPH_ADVANCE_X;
            }
        }
    }
}

/// Draw a solid frame along all four edges, clamped so opposing edges
/// never cross.
fn draw_border(canvas: &mut Canvas, layout_box: &LayoutBox, border_width: i32, color: Color) {
    let (x, y, width, height) = (
        layout_box.x,
        layout_box.y,
        layout_box.width,
        layout_box.height,
    );
    if border_width <= 0 || width <= 0 || height <= 0 {
        return;
    }

    let clamped = i32::min(border_width, i32::max(1, i32::min(width, height) / 2));
    canvas.fill_rect(x, y, width, clamped, color);
    canvas.fill_rect(x, y + height - clamped, width, clamped, color);
    canvas.fill_rect(x, y, clamped, height, color);
    canvas.fill_rect(x + width - clamped, y, clamped, height, color);
}

fn find_first_box_with_tag<'tree>(
    layout_box: &'tree LayoutBox,
    normalized_tag: &str,
) -> Option<&'tree LayoutBox> {
    if normalized_tag.is_empty() {
        return None;
    }
    if layout_box.tag.trim().eq_ignore_ascii_case(normalized_tag) {
        return Some(layout_box);
    }
    layout_box
        .children
        .iter()
        .find_map(|child| find_first_box_with_tag(child, normalized_tag))
}

fn box_background_color(layout_box: &LayoutBox) -> Option<Color> {
    parse_paint_color(
        box_background_value(layout_box),
        resolve_box_text_color(layout_box),
    )
}

/// Canvas base color: the first `body` box's background, then the
/// root's, then white.
pub(crate) fn resolve_initial_canvas_color(root: &LayoutBox) -> Color {
    if let Some(body) = find_first_box_with_tag(root, "body")
        && let Some(resolved) = box_background_color(body)
    {
        return resolved;
    }
    box_background_color(root).unwrap_or(color::WHITE)
}

fn subtree_has_positive_area(layout_box: &LayoutBox) -> bool {
    (layout_box.width > 0 && layout_box.height > 0)
        || layout_box.children.iter().any(subtree_has_positive_area)
}

pub(crate) fn paint_box_tree(layout_box: &LayoutBox, canvas: &mut Canvas) {
    if !subtree_has_positive_area(layout_box) {
        return;
    }

    if layout_box.width > 0 && layout_box.height > 0 {
        let text_color = resolve_box_text_color(layout_box);

        if let Some(background) = box_background_color(layout_box) {
            canvas.fill_rect(
                layout_box.x,
                layout_box.y,
                layout_box.width,
                layout_box.height,
                background,
            );
        }

        let border_value = style_value(&layout_box.style, "border");
        let border_width = parse_border_width(
            style_value(&layout_box.style, "border-width"),
            border_value,
        );
        if border_width > 0
            && let Some(border_color) = parse_border_color(
                style_value(&layout_box.style, "border-color"),
                border_value,
                text_color,
            )
        {
            draw_border(canvas, layout_box, border_width, border_color);
        }

        if !layout_box.text.is_empty() {
            let inset = i32::max(1, border_width);
            draw_text(
                canvas,
                layout_box.x + inset + 1,
                layout_box.y + inset + 1,
                &layout_box.text,
                text_color,
            );
        }
    }

    for child in &layout_box.children {
        paint_box_tree(child, canvas);
    }
}

/// Paint a layout tree to a fresh canvas of the given size.
#[must_use]
pub fn render_to_canvas(root: &LayoutBox, width: i32, height: i32) -> Canvas {
    debug!("render_to_canvas: {width}x{height}");
    let mut canvas = Canvas::new(width, height);
    canvas.clear(resolve_initial_canvas_color(root));
    paint_box_tree(root, &mut canvas);
    canvas
}
