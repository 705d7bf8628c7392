//! Arena-backed document tree.
//!
//! `scraper` (html5ever underneath) does the permissive parsing; the result is
//! copied into a flat arena owned by [`Document`] so the rest of the pipeline
//! can prune subtrees and edit attributes without touching parser internals.
//! Node ids are handed out in pre-order, so comparing two ids compares their
//! position in the source.

use scraper::{Html, Node};
use std::collections::BTreeMap;

use crate::extractor::errors::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Element classification, computed once when the node is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading(u8),
    Paragraph,
    UnorderedList,
    OrderedList,
    ListItem,
    Blockquote,
    Table,
    TableRow,
    TableCell,
    Strong,
    Emphasis,
    Code,
    Link,
    Image,
    LineBreak,
    Script,
    Style,
    Other,
}

impl ElementKind {
    pub fn classify(tag: &str) -> Self {
        match tag {
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            "p" => Self::Paragraph,
            "ul" => Self::UnorderedList,
            "ol" => Self::OrderedList,
            "li" => Self::ListItem,
            "blockquote" => Self::Blockquote,
            "table" => Self::Table,
            "tr" => Self::TableRow,
            "td" | "th" => Self::TableCell,
            "strong" | "b" => Self::Strong,
            "em" | "i" => Self::Emphasis,
            "code" => Self::Code,
            "a" => Self::Link,
            "img" => Self::Image,
            "br" => Self::LineBreak,
            "script" => Self::Script,
            "style" => Self::Style,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElementData {
    tag: String,
    kind: ElementKind,
    attrs: BTreeMap<String, String>,
}

impl ElementData {
    pub fn new<'a>(tag: &str, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let tag = tag.to_ascii_lowercase();
        Self {
            kind: ElementKind::classify(&tag),
            attrs: attrs
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
                .collect(),
            tag,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Case-insensitive substring test against the whole class attribute.
    pub fn class_contains(&self, token: &str) -> bool {
        self.attr("class")
            .is_some_and(|class| class.to_lowercase().contains(token))
    }

    /// Whitespace-separated class membership, case-sensitive like CSS.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One parsed page. Owns every node; dropped as a whole when the request ends.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeEntry>,
}

impl Document {
    pub const ROOT: NodeId = NodeId(0);

    /// Parses HTML text. Malformed markup never fails, it only produces a
    /// best-effort tree.
    pub fn load(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Self {
            nodes: vec![NodeEntry {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        };

        let mut pending = Vec::new();
        let top: Vec<_> = parsed.tree.root().children().collect();
        for child in top.into_iter().rev() {
            pending.push((child, Self::ROOT));
        }

        while let Some((node, parent)) = pending.pop() {
            let data = match node.value() {
                Node::Element(element) => NodeData::Element(ElementData::new(
                    element.name(),
                    element.attrs(),
                )),
                Node::Text(text) => NodeData::Text(text.text.to_string()),
                // Comments, doctypes and processing instructions carry no content.
                _ => continue,
            };
            let id = document.push(data, parent);
            let children: Vec<_> = node.children().collect();
            for child in children.into_iter().rev() {
                pending.push((child, id));
            }
        }

        document
    }

    /// Parses raw bytes, failing only when they are not valid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let html = std::str::from_utf8(bytes)?;
        Ok(Self::load(html))
    }

    fn push(&mut self, data: NodeData, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        self.element(id).map(ElementData::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => element.attrs.remove(name),
            _ => None,
        }
    }

    /// Element ancestors, nearest first. The node itself is not included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&current| self.parent(current))
    }

    pub fn has_ancestor_matching(
        &self,
        id: NodeId,
        mut predicate: impl FnMut(&ElementData) -> bool,
    ) -> bool {
        self.ancestors(id)
            .filter_map(|ancestor| self.element(ancestor))
            .any(|element| predicate(element))
    }

    /// Concatenated descendant text, trimmed only at the ends.
    pub fn text_of(&self, id: NodeId) -> String {
        let mut text = String::new();
        for node in self.descendants(id) {
            if let NodeData::Text(value) = self.data(node) {
                text.push_str(value);
            }
        }
        text.trim().to_string()
    }

    /// Detaches `id` and its subtree from the tree. A second call is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&child| child != id);
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Elements at or below `from` that satisfy `predicate`, in document order.
    pub fn select_all(
        &self,
        from: NodeId,
        mut predicate: impl FnMut(&ElementData) -> bool,
    ) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(&mut predicate))
            .collect()
    }
}
