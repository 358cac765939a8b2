//! Layout tree construction and the block/text layout passes.

use crate::style_values::{
    BoxEdges, StyleMap, apply_text_transform, edges_from_style, parse_css_px, style_value,
};
use css::cascade::compute_style_for_node;
use css::types::Stylesheet;
use html::NodeId;
use html::dom::{Document, NodeKind};
use log::debug;

/// One laid-out box. Geometry is in integer px. Element and text-wrapper
/// boxes carry empty `text`; only `#line` leaves hold text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Tag name; `#document`, `#text`, and `#line` for non-elements.
    pub tag: String,
    /// One physical wrapped line, for `#line` boxes only.
    pub text: String,
    /// Computed style of the originating node.
    pub style: StyleMap,
    /// Child boxes in document order.
    pub children: Vec<LayoutBox>,
}

/// Pre-layout node: DOM structure with computed styles attached, with
/// `display: none` subtrees and whitespace-only text already dropped.
struct LayoutNode {
    is_text: bool,
    tag: String,
    text: String,
    style: StyleMap,
    children: Vec<LayoutNode>,
}

fn build_layout_tree(document: &Document, node: NodeId, sheet: &Stylesheet) -> LayoutNode {
    let (is_text, tag, text) = match &document.node(node).kind {
        NodeKind::Document => (false, "#document".to_owned(), String::new()),
        NodeKind::Element { tag } => {
            let tag = if tag.trim().is_empty() {
                "div".to_owned()
            } else {
                tag.trim().to_ascii_lowercase()
            };
            (false, tag, String::new())
        }
        NodeKind::Text { text } => (true, "#text".to_owned(), text.clone()),
    };

    let mut layout_node = LayoutNode {
        is_text,
        tag,
        text,
        style: compute_style_for_node(document, node, sheet),
        children: Vec::new(),
    };

    for child in document.children(node) {
        let child_node = build_layout_tree(document, child, sheet);
        if style_value(&child_node.style, "display") == "none" {
            continue;
        }
        if child_node.is_text && child_node.text.trim().is_empty() {
            continue;
        }
        layout_node.children.push(child_node);
    }

    layout_node
}

struct TextMetrics {
    char_width: i32,
    line_height: i32,
    max_chars: i32,
}

fn compute_text_metrics(style: &StyleMap, content_width: i32) -> TextMetrics {
    let font_size = i32::max(1, parse_css_px(style_value(style, "font-size"), 16));
    let line_height = i32::max(
        1,
        parse_css_px(
            style_value(style, "line-height"),
            (f64::from(font_size) * 1.2).round() as i32,
        ),
    );
    let char_width = i32::max(1, font_size / 2);
    let max_chars = i32::max(1, content_width / char_width);

    TextMetrics {
        char_width,
        line_height,
        max_chars,
    }
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for character in text.chars() {
        match character {
            '\r' => {}
            '\n' => {
                parts.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    parts.push(current);
    parts
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Greedy word wrap; words longer than the budget are hard-broken into
/// `max_chars`-character pieces.
fn wrap_paragraph(paragraph: &str, max_chars: i32) -> Vec<String> {
    let budget = max_chars as usize;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_ascii_whitespace() {
        let mut word = word.to_owned();
        while char_count(&word) > budget {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(budget)
                .map_or(word.len(), |(offset, _)| offset);
            let rest = word.split_off(split_at);
            lines.push(std::mem::replace(&mut word, rest));
        }

        if current.is_empty() {
            current = word;
        } else if char_count(&current) + 1 + char_count(&word) <= budget {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn wrap_text_lines(text: &str, max_chars: i32) -> Vec<String> {
    if max_chars <= 0 || text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in split_paragraphs(text) {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(wrap_paragraph(&paragraph, max_chars));
    }
    lines
}

fn layout_text_box(node: &LayoutNode, x: i32, y: i32, width: i32) -> LayoutBox {
    let transformed_text = apply_text_transform(&node.text, &node.style);

    let mut layout_box = LayoutBox {
        x,
        y,
        width: i32::max(0, width),
        tag: node.tag.clone(),
        style: node.style.clone(),
        ..LayoutBox::default()
    };

    let padding = edges_from_style(&node.style, "padding");
    let content_x = layout_box.x + padding.left;
    let content_y = layout_box.y + padding.top;
    let content_width = i32::max(0, layout_box.width - padding.left - padding.right);

    let metrics = compute_text_metrics(&node.style, i32::max(1, content_width));
    let lines = wrap_text_lines(&transformed_text, metrics.max_chars);
    let text_align = style_value(&node.style, "text-align")
        .trim()
        .to_ascii_lowercase();

    let mut cursor_y = content_y;
    for line in &lines {
        let line_width = i32::min(content_width, line.chars().count() as i32 * metrics.char_width);
        let line_offset_x = match text_align.as_str() {
            "center" => i32::max(0, (content_width - line_width) / 2),
            "right" | "end" => i32::max(0, content_width - line_width),
            // Full justification is not implemented; it lays out as left.
            _ => 0,
        };
        layout_box.children.push(LayoutBox {
            x: content_x + line_offset_x,
            y: cursor_y,
            width: line_width,
            height: metrics.line_height,
            tag: "#line".to_owned(),
            text: line.clone(),
            style: node.style.clone(),
            children: Vec::new(),
        });
        cursor_y += metrics.line_height;
    }

    let mut content_height = lines.len() as i32 * metrics.line_height;
    content_height = parse_css_px(style_value(&node.style, "height"), content_height);
    let min_height = parse_css_px(style_value(&node.style, "min-height"), 0);
    content_height = i32::max(content_height, min_height);
    let max_height = parse_css_px(style_value(&node.style, "max-height"), -1);
    if max_height >= 0 {
        content_height = i32::min(content_height, max_height);
    }

    layout_box.height = i32::max(0, padding.top + content_height + padding.bottom);
    let forced_width = parse_css_px(style_value(&node.style, "width"), -1);
    if forced_width >= 0 {
        layout_box.width = forced_width;
    }

    layout_box
}

fn layout_block_box(node: &LayoutNode, x: i32, y: i32, width: i32, viewport_width: i32) -> LayoutBox {
    let mut layout_box = LayoutBox {
        x,
        y,
        width: i32::max(0, width),
        tag: node.tag.clone(),
        style: node.style.clone(),
        ..LayoutBox::default()
    };

    let padding = edges_from_style(&node.style, "padding");
    let content_x = layout_box.x + padding.left;
    let content_y = layout_box.y + padding.top;
    let content_width = i32::max(0, layout_box.width - padding.left - padding.right);

    let mut cursor_y = content_y;
    for child in &node.children {
        let margin: BoxEdges = edges_from_style(&child.style, "margin");
        let child_x = content_x + margin.left;
        let child_y = cursor_y + margin.top;
        let child_width = i32::max(0, content_width - margin.left - margin.right);

        let child_box = layout_node_box(child, child_x, child_y, child_width, viewport_width);
        cursor_y = child_y + child_box.height + margin.bottom;
        layout_box.children.push(child_box);
    }

    let mut content_height = i32::max(0, cursor_y - content_y);
    content_height = parse_css_px(style_value(&node.style, "height"), content_height);
    let min_height = parse_css_px(style_value(&node.style, "min-height"), -1);
    if min_height >= 0 {
        content_height = i32::max(content_height, min_height);
    }
    let max_height = parse_css_px(style_value(&node.style, "max-height"), -1);
    if max_height >= 0 {
        content_height = i32::min(content_height, max_height);
    }

    layout_box.height = i32::max(0, padding.top + content_height + padding.bottom);
    let forced_width = parse_css_px(style_value(&node.style, "width"), -1);
    if forced_width >= 0 {
        layout_box.width = forced_width;
    }
    let max_width = parse_css_px(style_value(&node.style, "max-width"), -1);
    if max_width >= 0 {
        layout_box.width = i32::min(layout_box.width, max_width);
    }
    let min_width = parse_css_px(style_value(&node.style, "min-width"), -1);
    if min_width >= 0 {
        layout_box.width = i32::max(layout_box.width, min_width);
    }

    layout_box
}

fn layout_node_box(node: &LayoutNode, x: i32, y: i32, width: i32, viewport_width: i32) -> LayoutBox {
    if style_value(&node.style, "display") == "none" {
        return LayoutBox {
            x,
            y,
            tag: node.tag.clone(),
            style: node.style.clone(),
            ..LayoutBox::default()
        };
    }

    if node.is_text {
        layout_text_box(node, x, y, width)
    } else {
        layout_block_box(node, x, y, width, viewport_width)
    }
}

/// Lay out a document at the given viewport width. The root box is
/// pinned to the origin at exactly the viewport width.
#[must_use]
pub fn layout_document(document: &Document, sheet: &Stylesheet, viewport_width: i32) -> LayoutBox {
    let safe_width = i32::max(0, viewport_width);
    let layout_root = build_layout_tree(document, document.root(), sheet);
    let mut root_box = layout_node_box(&layout_root, 0, 0, safe_width, safe_width);
    root_box.x = 0;
    root_box.y = 0;
    root_box.width = safe_width;
    debug!(
        "layout_document: viewport {safe_width}px, root {}x{}",
        root_box.width, root_box.height
    );
    root_box
}

/// Canonical layout serialization used as a test oracle.
#[must_use]
pub fn serialize_layout(layout_box: &LayoutBox) -> String {
    let mut out = String::from("{");
    if !layout_box.tag.is_empty() {
        out.push_str("tag:");
        out.push_str(&layout_box.tag);
    } else if !layout_box.text.is_empty() {
        out.push_str("text:\"");
        out.push_str(&layout_box.text);
        out.push('"');
    }
    out.push_str(&format!(
        " x:{} y:{} w:{} h:{}",
        layout_box.x, layout_box.y, layout_box.width, layout_box.height
    ));
    for child in &layout_box.children {
        out.push_str(&serialize_layout(child));
    }
    out.push('}');
    out
}
