//! Builder functions for AST nodes.
//!
//! Rules construct nodes exclusively through these helpers so that
//! level clamping and optional-field normalization live in one place.

use crate::ast::{Alignment, Node};

pub fn document(children: Vec<Node>) -> Node {
    Node::Document { children }
}

pub fn paragraph(children: Vec<Node>) -> Node {
    Node::Paragraph { children }
}

/// Heading; `level` is clamped to 1..=6
pub fn heading(level: u8, children: Vec<Node>) -> Node {
    Node::Heading {
        level: level.clamp(1, 6),
        children,
    }
}

pub fn text(value: impl Into<String>) -> Node {
    Node::Text {
        value: value.into(),
    }
}

pub fn emphasis(children: Vec<Node>) -> Node {
    Node::Emphasis { children }
}

pub fn strong(children: Vec<Node>) -> Node {
    Node::Strong { children }
}

pub fn strikethrough(children: Vec<Node>) -> Node {
    Node::Strikethrough { children }
}

pub fn inline_code(value: impl Into<String>) -> Node {
    Node::InlineCode {
        value: value.into(),
    }
}

pub fn link(url: impl Into<String>, title: Option<String>, children: Vec<Node>) -> Node {
    Node::Link {
        url: url.into(),
        title,
        children,
    }
}

pub fn image(url: impl Into<String>, alt: Option<String>, title: Option<String>) -> Node {
    Node::Image {
        url: url.into(),
        alt,
        title,
    }
}

pub fn hard_break() -> Node {
    Node::LineBreak { hard: true }
}

pub fn soft_break() -> Node {
    Node::LineBreak { hard: false }
}

pub fn blockquote(children: Vec<Node>) -> Node {
    Node::Blockquote { children }
}

pub fn list(ordered: bool, start: Option<u32>, children: Vec<Node>) -> Node {
    Node::List {
        ordered,
        start,
        children,
    }
}

pub fn list_item(children: Vec<Node>) -> Node {
    Node::ListItem { children }
}

pub fn table(alignments: Vec<Alignment>, children: Vec<Node>) -> Node {
    Node::Table {
        alignments,
        children,
    }
}

pub fn table_row(is_header: bool, children: Vec<Node>) -> Node {
    Node::TableRow {
        is_header,
        children,
    }
}

pub fn table_cell(children: Vec<Node>) -> Node {
    Node::TableCell { children }
}

pub fn code_block(language: Option<String>, code: impl Into<String>) -> Node {
    Node::CodeBlock {
        language: language.filter(|l| !l.is_empty()),
        code: code.into(),
    }
}

pub fn thematic_break() -> Node {
    Node::ThematicBreak
}

pub fn footnote_reference(identifier: impl Into<String>, label: Option<String>) -> Node {
    Node::FootnoteReference {
        identifier: identifier.into(),
        label,
    }
}

pub fn footnote_definition(
    identifier: impl Into<String>,
    label: Option<String>,
    children: Vec<Node>,
) -> Node {
    Node::FootnoteDefinition {
        identifier: identifier.into(),
        label,
        children,
    }
}

pub fn html(value: impl Into<String>) -> Node {
    Node::Html {
        value: value.into(),
    }
}
