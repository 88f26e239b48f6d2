//! Markdown Abstract Syntax Tree
//!
//! This module defines the closed set of document-model nodes the walker
//! emits and the renderer consumes. Block and inline kinds share one sum type
//! so a rule can return either without wrapping.

use serde::{Deserialize, Serialize};

/// Column alignment of a table, taken from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Parse an HTML `align` value or a CSS `text-align` value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// A Markdown node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Root document container
    Document { children: Vec<Node> },

    /// Paragraph containing inline content
    Paragraph { children: Vec<Node> },

    /// Heading with level (1-6) and inline content
    Heading { level: u8, children: Vec<Node> },

    /// Plain text, emitted verbatim
    Text { value: String },

    /// Emphasis (italic)
    Emphasis { children: Vec<Node> },

    /// Strong emphasis (bold)
    Strong { children: Vec<Node> },

    /// Inline code span
    InlineCode { value: String },

    /// Link with URL, optional title and inline content
    Link {
        url: String,
        title: Option<String>,
        children: Vec<Node>,
    },

    /// Image with URL, optional alt text and optional title
    Image {
        url: String,
        alt: Option<String>,
        title: Option<String>,
    },

    /// Hard (`<br>`) or soft line break
    LineBreak { hard: bool },

    /// Strikethrough (`~~`)
    Strikethrough { children: Vec<Node> },

    /// Block quote containing nested blocks
    Blockquote { children: Vec<Node> },

    /// List (ordered or unordered)
    List {
        ordered: bool,
        start: Option<u32>,
        children: Vec<Node>,
    },

    /// A single list item
    ListItem { children: Vec<Node> },

    /// Table; `alignments` has one entry per column
    Table {
        alignments: Vec<Alignment>,
        children: Vec<Node>,
    },

    /// Table row
    TableRow { is_header: bool, children: Vec<Node> },

    /// Table cell with inline content
    TableCell { children: Vec<Node> },

    /// Fenced code block
    CodeBlock { language: Option<String>, code: String },

    /// Thematic break (horizontal rule)
    ThematicBreak,

    /// `[^label]`
    FootnoteReference {
        identifier: String,
        label: Option<String>,
    },

    /// `[^label]: ...`
    FootnoteDefinition {
        identifier: String,
        label: Option<String>,
        children: Vec<Node>,
    },

    /// Raw HTML, passed through untouched
    Html { value: String },
}

/// Discriminant of [`Node`], used for ancestor queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    Text,
    Emphasis,
    Strong,
    InlineCode,
    Link,
    Image,
    LineBreak,
    Strikethrough,
    Blockquote,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    CodeBlock,
    ThematicBreak,
    FootnoteReference,
    FootnoteDefinition,
    Html,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document { .. } => NodeKind::Document,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Heading { .. } => NodeKind::Heading,
            Node::Text { .. } => NodeKind::Text,
            Node::Emphasis { .. } => NodeKind::Emphasis,
            Node::Strong { .. } => NodeKind::Strong,
            Node::InlineCode { .. } => NodeKind::InlineCode,
            Node::Link { .. } => NodeKind::Link,
            Node::Image { .. } => NodeKind::Image,
            Node::LineBreak { .. } => NodeKind::LineBreak,
            Node::Strikethrough { .. } => NodeKind::Strikethrough,
            Node::Blockquote { .. } => NodeKind::Blockquote,
            Node::List { .. } => NodeKind::List,
            Node::ListItem { .. } => NodeKind::ListItem,
            Node::Table { .. } => NodeKind::Table,
            Node::TableRow { .. } => NodeKind::TableRow,
            Node::TableCell { .. } => NodeKind::TableCell,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::ThematicBreak => NodeKind::ThematicBreak,
            Node::FootnoteReference { .. } => NodeKind::FootnoteReference,
            Node::FootnoteDefinition { .. } => NodeKind::FootnoteDefinition,
            Node::Html { .. } => NodeKind::Html,
        }
    }

    /// Child nodes in document order; empty for scalar kinds
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Link { children, .. }
            | Node::Strikethrough { children }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::Table { children, .. }
            | Node::TableRow { children, .. }
            | Node::TableCell { children }
            | Node::FootnoteDefinition { children, .. } => children,
            Node::Text { .. }
            | Node::InlineCode { .. }
            | Node::Image { .. }
            | Node::LineBreak { .. }
            | Node::CodeBlock { .. }
            | Node::ThematicBreak
            | Node::FootnoteReference { .. }
            | Node::Html { .. } => &[],
        }
    }

    /// Block-level in the CommonMark sense: occupies whole lines.
    ///
    /// Raw HTML counts as inline; a comment inside a paragraph stays inline.
    pub fn is_block(&self) -> bool {
        self.kind().is_block()
    }

    /// Check if this node renders to nothing visible
    pub fn is_blank(&self) -> bool {
        match self {
            Node::Text { value } => value.trim().is_empty(),
            Node::InlineCode { value } => value.is_empty(),
            Node::Html { value } => value.trim().is_empty(),
            Node::CodeBlock { .. }
            | Node::ThematicBreak
            | Node::Image { .. }
            | Node::LineBreak { .. }
            | Node::FootnoteReference { .. } => false,
            _ => self.children().iter().all(Node::is_blank),
        }
    }

    /// Concatenated text of all descendant text-bearing nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { value } | Node::InlineCode { value } => out.push_str(value),
        Node::CodeBlock { code, .. } => out.push_str(code),
        Node::Image { alt, .. } => out.push_str(alt.as_deref().unwrap_or("")),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

impl NodeKind {
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::Paragraph
                | NodeKind::Heading
                | NodeKind::Blockquote
                | NodeKind::List
                | NodeKind::ListItem
                | NodeKind::Table
                | NodeKind::TableRow
                | NodeKind::TableCell
                | NodeKind::CodeBlock
                | NodeKind::ThematicBreak
                | NodeKind::FootnoteDefinition
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    #[test]
    fn test_alignment_parse() {
        assert_eq!(Alignment::parse("LEFT"), Some(Alignment::Left));
        assert_eq!(Alignment::parse(" center "), Some(Alignment::Center));
        assert_eq!(Alignment::parse("end"), Some(Alignment::Right));
        assert_eq!(Alignment::parse("justify"), None);
    }

    #[test]
    fn test_children_of_scalar_kinds_are_empty() {
        assert!(text("x").children().is_empty());
        assert!(thematic_break().children().is_empty());
        assert_eq!(paragraph(vec![text("a"), text("b")]).children().len(), 2);
    }

    #[test]
    fn test_is_blank() {
        assert!(paragraph(vec![text("  \n")]).is_blank());
        assert!(!paragraph(vec![text(" a ")]).is_blank());
        assert!(!paragraph(vec![image("x.png", None, None)]).is_blank());
        assert!(strong(vec![]).is_blank());
    }

    #[test]
    fn test_text_content() {
        let node = paragraph(vec![
            text("a "),
            strong(vec![text("b")]),
            inline_code("c"),
        ]);
        assert_eq!(node.text_content(), "a bc");
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(text("hi")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["value"], "hi");

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, text("hi"));
    }
}
