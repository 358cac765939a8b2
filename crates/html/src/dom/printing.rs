use super::{Document, NodeKind};
use indextree::NodeId;
use serde_json::{Map, Value, json};

/// Flush accumulated text buffer to children as a text node.
fn flush_text(children: &mut Vec<Value>, text_buf: &mut String) {
    if !text_buf.trim().is_empty() {
        children.push(json!({ "type": "text", "text": text_buf.clone() }));
    }
    text_buf.clear();
}

/// Coalesce adjacent text nodes and collect children for JSON serialization.
fn coalesce_children(document: &Document, id: NodeId) -> Vec<Value> {
    let mut children: Vec<Value> = Vec::new();
    let mut text_buf = String::new();
    for child in document.children(id) {
        if let NodeKind::Text { text } = &document.node(child).kind {
            text_buf.push_str(text);
            continue;
        }
        flush_text(&mut children, &mut text_buf);
        let value = node_to_json(document, child);
        if !value.is_null() {
            children.push(value);
        }
    }
    flush_text(&mut children, &mut text_buf);
    children
}

/// Convert a DOM node to a JSON value for snapshots.
fn node_to_json(document: &Document, id: NodeId) -> Value {
    match &document.node(id).kind {
        NodeKind::Document => {
            json!({ "type": "document", "children": coalesce_children(document, id) })
        }
        NodeKind::Element { tag } => {
            // Key-sorted attributes keep the snapshot deterministic
            let mut attrs_obj = Map::new();
            for (key, value) in document.sorted_attributes(id) {
                attrs_obj.insert(key, Value::String(value));
            }
            json!({
                "type": "element",
                "tag": tag,
                "attrs": Value::Object(attrs_obj),
                "children": coalesce_children(document, id),
            })
        }
        NodeKind::Text { text } => {
            if text.trim().is_empty() {
                Value::Null
            } else {
                json!({ "type": "text", "text": text })
            }
        }
    }
}

impl Document {
    /// Build a deterministic JSON representation of the DOM.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": {..}, "children":[ ... ] }
    /// - Text: { "type":"text", "text":"..." }
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        node_to_json(self, self.root())
    }

    /// Pretty JSON string for snapshots and test comparisons.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value()).unwrap_or_else(|_| String::from("{}"))
    }
}
