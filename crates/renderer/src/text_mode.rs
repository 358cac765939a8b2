//! Shell-mode output: the layout tree as an indented text transcript.

use layout::engine::LayoutBox;

fn collect_text_lines(layout_box: &LayoutBox, lines: &mut Vec<String>, indent: usize) {
    let prefix = "  ".repeat(indent);

    if !layout_box.text.is_empty() {
        lines.push(format!("{prefix}{}", layout_box.text));
    } else if !layout_box.tag.is_empty() {
        lines.push(format!("{prefix}<{}>", layout_box.tag));
    }

    for child in &layout_box.children {
        collect_text_lines(child, lines, indent + 1);
    }
}

/// Render the layout tree as indented lines: box text where present,
/// otherwise `<tag>`.
#[must_use]
pub fn render_to_text(root: &LayoutBox) -> String {
    let mut lines = Vec::new();
    collect_text_lines(root, &mut lines, 0);
    lines.join("\n")
}
