//! HTML parsing support.
//!
//! Parses HTML strings with scraper (html5ever) and converts the result to
//! the CDP-style Node structure the walker consumes.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;

/// Parse an HTML fragment into a DocumentFragment node.
///
/// Text, elements and comments are kept; doctypes and processing
/// instructions are dropped.
///
/// # Example
///
/// ```rust
/// use dommark::{parse_html, Converter};
///
/// let node = parse_html("<h1>Hello <em>World</em></h1>");
/// let markdown = Converter::new().convert(&node).unwrap();
/// assert_eq!(markdown, "# Hello *World*");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    let mut fragment = Node::document_fragment();
    append_children(document.root_element(), &mut fragment);
    fragment
}

/// Convert a scraper ElementRef to our Node structure
fn convert_element(element: ElementRef) -> Node {
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    let mut node = Node::element_with_attrs(element.value().name(), attrs);
    append_children(element, &mut node);
    node
}

fn append_children(element: ElementRef, parent: &mut Node) {
    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => parent.add_child(Node::text(&text.text)),
            ScraperNode::Comment(comment) => parent.add_child(Node::comment(&comment.comment)),
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    parent.add_child(convert_element(child_element));
                }
            }
            _ => {}
        }
    }
}
