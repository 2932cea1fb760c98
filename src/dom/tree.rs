//! Arena document tree
//!
//! Elements carry a tag name and a class list; text nodes carry their
//! content. The host rebuilds or patches this tree whenever it re-renders,
//! which is exactly the situation the anchoring machinery must survive.

use serde::{Deserialize, Serialize};

/// Handle to a node in a [`DocumentTree`]
///
/// Ids are only valid for the tree that issued them. A host that rebuilds
/// its mirrored tree after a re-render must discard every previously
/// obtained id; persisted selectors re-resolve to fresh ids through the
/// anchoring machinery instead of retaining handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

/// Node payload
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Element with tag name and classes
    Element { tag: String, classes: Vec<String> },
    /// Text node content
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena tree of elements and text nodes
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl DocumentTree {
    /// Create a tree with a root element of the given tag
    pub fn new(root_tag: impl Into<String>) -> Self {
        let root = Node {
            kind: NodeKind::Element {
                tag: root_tag.into(),
                classes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, node: NodeId) -> &Node {
        debug_assert!(node.0 < self.nodes.len(), "stale NodeId from another tree");
        &self.nodes[node.0]
    }

    fn node_mut(&mut self, node: NodeId) -> &mut Node {
        debug_assert!(node.0 < self.nodes.len(), "stale NodeId from another tree");
        &mut self.nodes[node.0]
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Append a child element
    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                tag: tag.into(),
                classes: Vec::new(),
            },
        )
    }

    /// Append a child element carrying a class
    pub fn append_element_with_class(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
        class: impl Into<String>,
    ) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                tag: tag.into(),
                classes: vec![class.into()],
            },
        )
    }

    /// Append a text node
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(parent, NodeKind::Text(text.into()))
    }

    /// Add a class to an element
    pub fn add_class(&mut self, node: NodeId, class: impl Into<String>) {
        if let NodeKind::Element { classes, .. } = &mut self.node_mut(node).kind {
            classes.push(class.into());
        }
    }

    /// Replace a text node's content
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let NodeKind::Text(content) = &mut self.node_mut(node).kind {
            *content = text.into();
        }
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.node(node).kind
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.node(node).kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.node(node).kind, NodeKind::Text(_))
    }

    /// Tag name, if this is an element
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Text content, if this is a text node
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Text(content) => Some(content),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).children.first().copied()
    }

    /// Whether `ancestor` contains `node` (inclusive)
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether the node or any ancestor is an element carrying `class`
    pub fn has_ancestor_class(&self, node: NodeId, class: &str) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if let NodeKind::Element { classes, .. } = &self.node(n).kind {
                if classes.iter().any(|c| c == class) {
                    return true;
                }
            }
            current = self.parent(n);
        }
        false
    }

    /// 1-based ordinal of an element among same-tag siblings
    pub fn sibling_index_by_tag(&self, node: NodeId) -> Option<u32> {
        let tag = self.tag(node)?;
        let parent = self.parent(node)?;
        let mut ordinal = 0;
        for &sibling in self.children(parent) {
            if self.tag(sibling) == Some(tag) {
                ordinal += 1;
                if sibling == node {
                    return Some(ordinal);
                }
            }
        }
        None
    }

    /// Nth (1-based) child element of `parent` with the given tag
    pub fn nth_child_by_tag(&self, parent: NodeId, tag: &str, index: u32) -> Option<NodeId> {
        let mut ordinal = 0;
        for &child in self.children(parent) {
            if self.tag(child) == Some(tag) {
                ordinal += 1;
                if ordinal == index {
                    return Some(child);
                }
            }
        }
        None
    }

    /// All text nodes under `node` (inclusive), in document order
    pub fn text_nodes_under(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_text_nodes(node, &mut out);
        out
    }

    fn collect_text_nodes(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if self.is_text(node) {
            out.push(node);
        }
        for &child in self.children(node) {
            self.collect_text_nodes(child, out);
        }
    }

    /// All elements under `node` (inclusive), in document order
    pub fn elements_under(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(node, &mut out);
        out
    }

    fn collect_elements(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if self.is_element(node) {
            out.push(node);
        }
        for &child in self.children(node) {
            self.collect_elements(child, out);
        }
    }

    /// Concatenated text content of the subtree rooted at `node`
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        for text_node in self.text_nodes_under(node) {
            if let Some(text) = self.text(text_node) {
                out.push_str(text);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DocumentTree, NodeId, NodeId) {
        let mut doc = DocumentTree::new("div");
        let p1 = doc.append_element(doc.root(), "p");
        doc.append_text(p1, "first paragraph");
        let p2 = doc.append_element(doc.root(), "p");
        doc.append_text(p2, "second paragraph");
        (doc, p1, p2)
    }

    #[test]
    fn test_sibling_index_counts_same_tag_only() {
        let (mut doc, _, p2) = sample();
        let root = doc.root();
        doc.append_element(root, "span");
        let p3 = doc.append_element(root, "p");
        assert_eq!(doc.sibling_index_by_tag(p2), Some(2));
        assert_eq!(doc.sibling_index_by_tag(p3), Some(3));
    }

    #[test]
    fn test_nth_child_by_tag() {
        let (doc, p1, p2) = sample();
        assert_eq!(doc.nth_child_by_tag(doc.root(), "p", 1), Some(p1));
        assert_eq!(doc.nth_child_by_tag(doc.root(), "p", 2), Some(p2));
        assert_eq!(doc.nth_child_by_tag(doc.root(), "p", 3), None);
    }

    #[test]
    fn test_ancestor_class() {
        let mut doc = DocumentTree::new("div");
        let widget = doc.append_element_with_class(doc.root(), "aside", "not-annotatable");
        let inner = doc.append_element(widget, "span");
        let text = doc.append_text(inner, "excluded");
        assert!(doc.has_ancestor_class(text, "not-annotatable"));
        assert!(!doc.has_ancestor_class(doc.root(), "not-annotatable"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stale NodeId")]
    fn test_id_from_rebuilt_tree_is_caught() {
        let (doc, _, p2) = sample();
        let stale = doc.text_nodes_under(p2)[0];
        // Host re-render: the old tree is discarded and rebuilt
        let rebuilt = DocumentTree::new("div");
        let _ = rebuilt.text(stale);
    }

    #[test]
    fn test_text_content_document_order() {
        let (doc, _, _) = sample();
        assert_eq!(doc.text_content(doc.root()), "first paragraphsecond paragraph");
    }
}
