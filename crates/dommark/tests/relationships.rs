//! Relationship invariants over generated DOM trees.

use dommark::ast::establish_relationships;
use dommark::{Node, Rules, WalkOptions, Walker};
use proptest::prelude::*;

const CONTAINER_TAGS: &[&str] = &[
    "div", "p", "section", "blockquote", "ul", "ol", "li", "h1", "h3", "em", "strong", "del",
    "code", "pre", "a", "span", "sup", "table", "thead", "tbody", "tr", "th", "td", "caption",
    "script", "custom-tag",
];

const EMPTY_TAGS: &[&str] = &["br", "hr", "img"];

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        4 => "[a-z ]{0,8}".prop_map(|s| Node::text(&s)),
        1 => "[a-z ]{0,8}".prop_map(|s| Node::comment(&s)),
        1 => prop::sample::select(EMPTY_TAGS).prop_map(Node::element),
    ]
}

fn dom() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(5, 96, 6, |inner| {
        (
            prop::sample::select(CONTAINER_TAGS),
            prop::collection::vec(inner, 0..6),
        )
            .prop_map(|(tag, children)| {
                children.into_iter().fold(Node::element(tag), Node::with_child)
            })
    })
}

fn fragment() -> impl Strategy<Value = Node> {
    prop::collection::vec(dom(), 0..4).prop_map(|children| {
        children
            .into_iter()
            .fold(Node::document_fragment(), Node::with_child)
    })
}

proptest! {
    #[test]
    fn test_walk_output_verifies(root in fragment(), preserve_comments in any::<bool>()) {
        let rules = Rules::default();
        let options = WalkOptions {
            verify_relationships: true,
            preserve_comments,
            ..WalkOptions::default()
        };

        let output = Walker::new(&rules, &options).walk(&root);
        prop_assert!(output.is_ok(), "{:?}", output.as_ref().err());
        let output = output.unwrap();

        prop_assert_eq!(output.roots.len(), 1);
        prop_assert_eq!(output.node_count, establish_relationships(&output.roots).len());
        prop_assert_eq!(output.links.map(|links| links.len()), Some(output.node_count));
    }
}
