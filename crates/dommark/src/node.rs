//! CDP-style DOM Node structure consumed by the walker.
//!
//! Any HTML parser (html5ever, CDP, a browser bridge) can convert its output
//! to this structure. The tree is owned top-down; parent context during a
//! walk comes from the rule context's ancestor stack.

/// Node types matching DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Comment node (nodeType = 8)
    Comment = 8,
    /// Document node (nodeType = 9)
    Document = 9,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

impl TryFrom<u32> for NodeType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(NodeType::Element),
            3 => Ok(NodeType::Text),
            8 => Ok(NodeType::Comment),
            9 => Ok(NodeType::Document),
            11 => Ok(NodeType::DocumentFragment),
            other => Err(other),
        }
    }
}

/// A DOM node following the CDP DOM.Node structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Node type (1 = Element, 3 = Text, etc.)
    pub node_type: NodeType,

    /// Node name (uppercase for elements, e.g. "DIV", "#text" for text nodes)
    pub node_name: String,

    /// Character data of text and comment nodes
    pub node_value: Option<String>,

    /// Attributes as flat array [name, value, name, value, ...] (CDP style)
    pub attributes: Vec<String>,

    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Self {
            node_type: NodeType::Element,
            node_name: tag_name.to_ascii_uppercase(),
            node_value: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let mut node = Self::element(tag_name);
        node.attributes = attrs
            .into_iter()
            .flat_map(|(k, v)| [k.to_string(), v.to_string()])
            .collect();
        node
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self {
            node_type: NodeType::Text,
            node_name: "#text".to_string(),
            node_value: Some(content.to_string()),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a new comment node
    pub fn comment(content: &str) -> Self {
        Self {
            node_type: NodeType::Comment,
            node_name: "#comment".to_string(),
            node_value: Some(content.to_string()),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a document fragment node
    pub fn document_fragment() -> Self {
        Self {
            node_type: NodeType::DocumentFragment,
            node_name: "#document-fragment".to_string(),
            node_value: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style child append, handy for literal trees
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Upper-cased tag name; empty for non-element nodes
    pub fn tag_name(&self) -> &str {
        if self.is_element() {
            &self.node_name
        } else {
            ""
        }
    }

    /// True if this is an element with the given tag (case-insensitive)
    pub fn is_tag(&self, tag: &str) -> bool {
        self.is_element() && self.node_name.eq_ignore_ascii_case(tag)
    }

    /// Get an attribute value by name (case-insensitive)
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .chunks_exact(2)
            .find(|pair| pair[0].eq_ignore_ascii_case(name))
            .map(|pair| pair[1].as_str())
    }

    /// Check if an attribute exists, even with an empty value
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Whitespace-separated entries of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attribute("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter()
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|n| n.is_element())
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Set an attribute, replacing an existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(pair) = self
            .attributes
            .chunks_exact_mut(2)
            .find(|pair| pair[0].eq_ignore_ascii_case(name))
        {
            pair[1] = value.to_string();
            return;
        }
        self.attributes.push(name.to_string());
        self.attributes.push(value.to_string());
    }

    /// Flattened text of this node and its descendants; comments excluded
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self.node_type {
            NodeType::Text => out.push_str(self.node_value.as_deref().unwrap_or("")),
            NodeType::Comment => {}
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Reconstruct outer HTML (for raw HTML passthrough)
    pub fn outer_html(&self) -> String {
        match self.node_type {
            NodeType::Text => escape_html_text(self.node_value.as_deref().unwrap_or("")),
            NodeType::Comment => format!("<!--{}-->", self.node_value.as_deref().unwrap_or("")),
            NodeType::Element => {
                let tag = self.node_name.to_ascii_lowercase();
                let attrs = self.attributes_string();
                let open = if attrs.is_empty() {
                    format!("<{}>", tag)
                } else {
                    format!("<{} {}>", tag, attrs)
                };

                if is_void_element(&tag) {
                    open
                } else {
                    format!("{}{}</{}>", open, self.inner_html(), tag)
                }
            }
            NodeType::Document | NodeType::DocumentFragment => self.inner_html(),
        }
    }

    /// Reconstruct inner HTML
    pub fn inner_html(&self) -> String {
        self.children.iter().map(Node::outer_html).collect()
    }

    fn attributes_string(&self) -> String {
        self.attributes
            .chunks_exact(2)
            .map(|pair| {
                if pair[1].is_empty() {
                    pair[0].clone()
                } else {
                    format!("{}=\"{}\"", pair[0], escape_html_attr(&pair[1]))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_void_element(tag: &str) -> bool {
    const VOID_ELEMENTS: &[&str] = &[
        "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
        "meta", "param", "source", "track", "wbr",
    ];
    VOID_ELEMENTS.contains(&tag)
}

fn escape_html_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_html_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_element() {
        let node = Node::element("div");
        assert!(node.is_element());
        assert_eq!(node.tag_name(), "DIV");
        assert!(node.is_tag("div"));
    }

    #[test]
    fn test_create_text() {
        let node = Node::text("Hello World");
        assert!(node.is_text());
        assert_eq!(node.tag_name(), "");
        assert_eq!(node.text_content(), "Hello World");
    }

    #[test]
    fn test_node_type_from_number() {
        assert_eq!(NodeType::try_from(8), Ok(NodeType::Comment));
        assert_eq!(NodeType::try_from(2), Err(2));
    }

    #[test]
    fn test_attributes() {
        let node = Node::element_with_attrs(
            "a",
            vec![("HREF", "https://example.com"), ("title", ""), ("class", "x  y")],
        );
        assert_eq!(node.get_attribute("href"), Some("https://example.com"));
        assert_eq!(node.get_attribute("title"), Some(""));
        assert!(node.has_attribute("title"));
        assert!(!node.has_attribute("rel"));
        assert_eq!(node.classes().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut node = Node::element_with_attrs("td", vec![("align", "left")]);
        node.set_attr("ALIGN", "right");
        node.set_attr("style", "color: red");
        assert_eq!(node.get_attribute("align"), Some("right"));
        assert_eq!(node.attributes.len(), 4);
    }

    #[test]
    fn test_text_content_skips_comments() {
        let div = Node::element("div")
            .with_child(Node::text("Hello "))
            .with_child(Node::comment("hidden"))
            .with_child(Node::element("span").with_child(Node::text("World")));
        assert_eq!(div.text_content(), "Hello World");
    }

    #[test]
    fn test_outer_html() {
        let a = Node::element_with_attrs("a", vec![("href", "https://example.com")])
            .with_child(Node::text("a < b"));
        assert_eq!(a.outer_html(), "<a href=\"https://example.com\">a &lt; b</a>");
        assert_eq!(Node::comment(" c ").outer_html(), "<!-- c -->");
    }

    #[test]
    fn test_void_element_html() {
        assert_eq!(Node::element("br").outer_html(), "<br>");
        let img = Node::element_with_attrs("img", vec![("src", "test.png"), ("alt", "Test")]);
        assert_eq!(img.outer_html(), "<img src=\"test.png\" alt=\"Test\">");
    }
}
