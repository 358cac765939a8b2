/// DOM printing and serialization utilities.
mod printing;

use indextree::{Arena, NodeId};
use smallvec::SmallVec;

/// The kind of a DOM node.
#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    /// The document root.
    #[default]
    Document,
    /// An element with a lowercase tag name.
    Element {
        /// Lowercase tag name.
        tag: String,
    },
    /// A text node.
    Text {
        /// Raw text content (entities already decoded).
        text: String,
    },
}

/// One node's payload in the DOM arena.
#[derive(Debug, Clone, Default)]
pub struct DomNode {
    /// Node kind and kind-specific data.
    pub kind: NodeKind,
    /// Attributes in insertion order; keys are lowercase and unique.
    pub attrs: SmallVec<(String, String), 4>,
}

/// A parsed document: an arena of nodes rooted at a Document node.
///
/// Children own the subtree through the arena; parent links come from the
/// arena, so lookups stay valid across subtree mutation.
pub struct Document {
    /// The arena storing all DOM nodes.
    arena: Arena<DomNode>,
    /// The root node ID.
    root: NodeId,
}

impl Document {
    /// Create an empty document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DomNode::default());
        Self { arena, root }
    }

    /// The root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Access a node's payload.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &DomNode {
        self.arena[id].get()
    }

    /// True if `id` is an element node.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// True if `id` is a text node.
    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text { .. })
    }

    /// The lowercase tag name of an element node.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            NodeKind::Document | NodeKind::Text { .. } => None,
        }
    }

    /// The content of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { text } => Some(text.as_str()),
            NodeKind::Document | NodeKind::Element { .. } => None,
        }
    }

    /// Look up an attribute value by lowercase name.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True if the attribute key is present, regardless of value.
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute, updating in place when the key already exists.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let attrs = &mut self.arena[id].get_mut().attrs;
        if let Some((_, existing)) = attrs.iter_mut().find(|(key, _)| key == name) {
            value.clone_into(existing);
        } else {
            attrs.push((name.to_owned(), value.to_owned()));
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        self.arena[id]
            .get_mut()
            .attrs
            .retain(|(key, _)| key.as_str() != name);
    }

    /// Attributes cloned and sorted by key, for deterministic output.
    #[must_use]
    pub fn sorted_attributes(&self, id: NodeId) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self.node(id).attrs.iter().cloned().collect();
        pairs.sort_by(|left, right| left.0.cmp(&right.0));
        pairs
    }

    /// Iterate the children of a node in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// The parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Iterate a subtree in pre-order, starting at (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(DomNode {
            kind: NodeKind::Element {
                tag: tag.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(DomNode {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    /// Detach a node from its parent. The node stays in the arena so any
    /// outstanding handles remain valid, it is just no longer reachable.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Append to the content of a text node.
    pub fn append_to_text(&mut self, id: NodeId, extra: &str) {
        if let NodeKind::Text { text } = &mut self.arena[id].get_mut().kind {
            text.push_str(extra);
        }
    }

    /// Replace all children of `id` with a single text node holding `text`.
    pub fn replace_children_with_text(&mut self, id: NodeId, text: &str) {
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            self.detach(child);
        }
        let text_node = self.create_text(text);
        self.append_child(id, text_node);
    }

    /// Concatenation of all text content in the subtree rooted at `id`.
    #[must_use]
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut output = String::new();
        for node in self.descendants(id) {
            if let NodeKind::Text { text } = &self.node(node).kind {
                output.push_str(text);
            }
        }
        output
    }

    /// Canonical serialization used as a test oracle: `#document[child]…`
    /// for the document, `<tag k="v">[child]…</tag>` with key-sorted
    /// attributes for elements, `TEXT("…")` for text.
    #[must_use]
    pub fn serialize_dom(&self, id: NodeId) -> String {
        let mut output = String::new();
        match &self.node(id).kind {
            NodeKind::Document => output.push_str("#document"),
            NodeKind::Text { text } => {
                output.push_str("TEXT(\"");
                output.push_str(text);
                output.push_str("\")");
                return output;
            }
            NodeKind::Element { tag } => {
                output.push('<');
                output.push_str(tag);
                for (key, value) in self.sorted_attributes(id) {
                    output.push(' ');
                    output.push_str(&key);
                    output.push_str("=\"");
                    output.push_str(&value);
                    output.push('"');
                }
                output.push('>');
            }
        }

        for child in self.children(id) {
            output.push('[');
            output.push_str(&self.serialize_dom(child));
            output.push(']');
        }

        if let NodeKind::Element { tag } = &self.node(id).kind {
            output.push_str("</");
            output.push_str(tag);
            output.push('>');
        }

        output
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
