//! DOM traversal and rule dispatch.

use dommark_core::builder::{document, html, text};
use dommark_core::{establish_relationships, verify_relationships, Links, Node as AstNode};
use serde::Deserialize;
use smallvec::{smallvec, SmallVec};
use tracing::debug;

use crate::context::RuleContext;
use crate::node::{Node, NodeType};
use crate::rules::Rules;
use crate::utilities::escape_markdown;
use crate::{ConvertError, Result};

/// Options controlling the walk, independent of rendering
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalkOptions {
    /// Record timings, node count and warnings for the conversion
    pub collect_metrics: bool,
    /// Raise an error for elements no rule handles
    pub strict_rules: bool,
    /// Emit comments as raw HTML instead of dropping them
    pub preserve_comments: bool,
    pub establish_relationships: bool,
    pub verify_relationships: bool,
    /// Emit unmatched elements as raw HTML in non-strict mode
    pub preserve_html: bool,
    /// Escape Markdown punctuation in text nodes
    pub escape_text: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            collect_metrics: false,
            strict_rules: false,
            preserve_comments: false,
            establish_relationships: true,
            verify_relationships: cfg!(debug_assertions),
            preserve_html: false,
            escape_text: false,
        }
    }
}

/// Result of a walk: the AST wrapped in a single Document root
#[derive(Debug, Clone, PartialEq)]
pub struct WalkOutput {
    pub roots: Vec<AstNode>,
    pub warnings: Vec<String>,
    /// Number of AST nodes, the Document included
    pub node_count: usize,
    /// Parent and sibling links over `roots` in preorder; present when
    /// `establish_relationships` is set
    pub links: Option<Links>,
}

/// Walks a DOM tree, dispatching elements through a rule registry.
///
/// A walker borrows its rules and options; every call to [`Walker::walk`]
/// builds a fresh [`RuleContext`], so one walker may serve many documents.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'r> {
    rules: &'r Rules,
    options: &'r WalkOptions,
}

impl<'r> Walker<'r> {
    pub fn new(rules: &'r Rules, options: &'r WalkOptions) -> Self {
        Self { rules, options }
    }

    /// Convert `root` into `[Document]`.
    ///
    /// Document and fragment roots have their children walked; any other
    /// node is dispatched as the single top-level node.
    pub fn walk(&self, root: &Node) -> Result<WalkOutput> {
        let (top_level, parent) = match root.node_type {
            NodeType::Document | NodeType::DocumentFragment => (root.children.as_slice(), Some(root)),
            _ => (std::slice::from_ref(root), None),
        };

        let mut ctx = RuleContext::new(self.rules, self.options, parent);
        let mut children = Vec::with_capacity(top_level.len());
        for node in top_level {
            children.extend(walk_node(&mut ctx, node)?);
        }
        let warnings = ctx.into_warnings();

        let roots = vec![document(children)];
        let (node_count, links) =
            if self.options.establish_relationships || self.options.verify_relationships {
                let relationships = establish_relationships(&roots);
                debug!(nodes = relationships.len(), "established AST relationships");
                if self.options.verify_relationships {
                    verify_relationships(&roots, &relationships)?;
                }
                let links = relationships.into_links();
                let count = links.len();
                (count, self.options.establish_relationships.then_some(links))
            } else {
                (count_nodes(&roots), None)
            };

        Ok(WalkOutput {
            roots,
            warnings,
            node_count,
            links,
        })
    }
}

/// Walk one DOM node; the result is already flattened
pub(crate) fn walk_node<'a>(ctx: &mut RuleContext<'a>, node: &'a Node) -> Result<SmallVec<[AstNode; 1]>> {
    match node.node_type {
        NodeType::Text => {
            let value = node.node_value.as_deref().unwrap_or("");
            if value.is_empty() {
                return Ok(SmallVec::new());
            }
            let value = if ctx.options().escape_text {
                escape_markdown(value)
            } else {
                value.to_string()
            };
            Ok(smallvec![text(value)])
        }
        NodeType::Comment => {
            if !ctx.options().preserve_comments {
                return Ok(SmallVec::new());
            }
            Ok(smallvec![html(node.outer_html())])
        }
        NodeType::Document | NodeType::DocumentFragment => {
            Ok(SmallVec::from_vec(ctx.render_children_as_ast(node)?))
        }
        NodeType::Element => dispatch_element(ctx, node),
    }
}

fn dispatch_element<'a>(ctx: &mut RuleContext<'a>, element: &'a Node) -> Result<SmallVec<[AstNode; 1]>> {
    let tag = element.node_name.to_ascii_uppercase();
    let rules = ctx.rules();

    let Some(rule) = rules.get(&tag).or_else(|| rules.fallback()) else {
        return unmatched(ctx, element, tag);
    };

    match rule.apply(element, ctx) {
        Ok(output) => Ok(output.into_nodes()),
        // errors from nested walks already carry their tag
        Err(err) => Err(match err.downcast::<ConvertError>() {
            Ok(inner) => *inner,
            Err(source) => ConvertError::Rule { tag, source },
        }),
    }
}

fn unmatched<'a>(ctx: &mut RuleContext<'a>, element: &'a Node, tag: String) -> Result<SmallVec<[AstNode; 1]>> {
    if ctx.options().strict_rules {
        return Err(ConvertError::UnmatchedTag { tag });
    }
    debug!(tag = %tag, "no rule for element, falling back");
    if ctx.options().preserve_html {
        return Ok(smallvec![html(element.outer_html())]);
    }
    Ok(SmallVec::from_vec(ctx.render_children_as_ast(element)?))
}

fn count_nodes(roots: &[AstNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&AstNode> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children());
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, RuleOutput};
    use dommark_core::builder::{emphasis, paragraph};
    use dommark_core::{NodeId, NodeKind};
    use pretty_assertions::assert_eq;

    fn walk(rules: &Rules, options: &WalkOptions, root: &Node) -> Result<WalkOutput> {
        Walker::new(rules, options).walk(root)
    }

    #[test]
    fn test_fragment_root_is_transparent() {
        let root = Node::document_fragment()
            .with_child(Node::element("p").with_child(Node::text("hi")));
        let output = walk(&Rules::default(), &WalkOptions::default(), &root).unwrap();
        assert_eq!(output.roots, vec![document(vec![paragraph(vec![text("hi")])])]);
        assert_eq!(output.node_count, 3);
    }

    #[test]
    fn test_element_root_is_dispatched() {
        let root = Node::element("em").with_child(Node::text("hi"));
        let output = walk(&Rules::default(), &WalkOptions::default(), &root).unwrap();
        assert_eq!(output.roots, vec![document(vec![emphasis(vec![text("hi")])])]);
    }

    #[test]
    fn test_whitespace_text_is_kept_and_empty_text_dropped() {
        let root = Node::document_fragment()
            .with_child(Node::text(""))
            .with_child(Node::text("  "));
        let output = walk(&Rules::default(), &WalkOptions::default(), &root).unwrap();
        assert_eq!(output.roots[0].children(), &[text("  ")]);
    }

    #[test]
    fn test_comments_follow_option() {
        let root = Node::document_fragment().with_child(Node::comment(" note "));
        let rules = Rules::default();

        let dropped = walk(&rules, &WalkOptions::default(), &root).unwrap();
        assert!(dropped.roots[0].children().is_empty());

        let options = WalkOptions {
            preserve_comments: true,
            ..WalkOptions::default()
        };
        let kept = walk(&rules, &options, &root).unwrap();
        assert_eq!(kept.roots[0].children(), &[html("<!-- note -->")]);
    }

    #[test]
    fn test_unmatched_tag_modes() {
        let root = Node::element("custom-tag").with_child(Node::text("text"));
        let rules = Rules::default();

        let lenient = walk(&rules, &WalkOptions::default(), &root).unwrap();
        assert_eq!(lenient.roots[0].children(), &[text("text")]);

        let preserving = WalkOptions {
            preserve_html: true,
            ..WalkOptions::default()
        };
        let raw = walk(&rules, &preserving, &root).unwrap();
        assert_eq!(raw.roots[0].children(), &[html("<custom-tag>text</custom-tag>")]);

        let strict = WalkOptions {
            strict_rules: true,
            ..WalkOptions::default()
        };
        let err = walk(&rules, &strict, &root).unwrap_err();
        assert!(matches!(err, ConvertError::UnmatchedTag { ref tag } if tag == "CUSTOM-TAG"));
        assert!(err.is_rule_error());
    }

    #[test]
    fn test_rule_errors_are_wrapped_once() {
        let rules = Rules::builder()
            .rule(&["X-FAIL"], Rule::new("fail", |_, _| Err("boom".into())))
            .rule(
                &["DIV"],
                Rule::new("container", |el, ctx| Ok(ctx.render_children_as_ast(el)?.into())),
            )
            .build();
        let root = Node::element("div").with_child(Node::element("x-fail"));

        let err = walk(&rules, &WalkOptions::default(), &root).unwrap_err();
        match err {
            ConvertError::Rule { tag, source } => {
                assert_eq!(tag, "X-FAIL");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_skip_suppresses_subtree() {
        let rules = Rules::builder()
            .rule(&["ASIDE"], Rule::new("skip", |_, _| Ok(RuleOutput::Skip)))
            .build();
        let root = Node::element("aside").with_child(Node::text("hidden"));
        let output = walk(&rules, &WalkOptions::default(), &root).unwrap();
        assert!(output.roots[0].children().is_empty());
    }

    #[test]
    fn test_escape_text_option() {
        let root = Node::text("*not emphasis*");
        let options = WalkOptions {
            escape_text: true,
            ..WalkOptions::default()
        };
        let output = walk(&Rules::default(), &options, &root).unwrap();
        assert_eq!(output.roots[0].children(), &[text("\\*not emphasis\\*")]);
    }

    #[test]
    fn test_node_count_without_relationships() {
        let root = Node::element("p").with_child(Node::text("a"));
        let options = WalkOptions {
            establish_relationships: false,
            verify_relationships: false,
            ..WalkOptions::default()
        };
        let output = walk(&Rules::default(), &options, &root).unwrap();
        assert_eq!(output.node_count, 3);
        assert_eq!(output.roots[0].kind(), NodeKind::Document);
        assert!(output.links.is_none());
    }

    #[test]
    fn test_establish_relationships_exposes_links() {
        let root = Node::element("ul").with_child(Node::element("li").with_child(Node::text("a")));
        let rules = Rules::default();
        let linked = walk(&rules, &WalkOptions::default(), &root).unwrap();
        let unlinked = walk(
            &rules,
            &WalkOptions {
                establish_relationships: false,
                ..WalkOptions::default()
            },
            &root,
        )
        .unwrap();

        assert_eq!(linked.roots, unlinked.roots);
        assert!(unlinked.links.is_none());
        let links = linked.links.unwrap();
        // document > list > item > "a"
        assert_eq!(links.len(), linked.node_count);
        assert_eq!(links.parent(NodeId(3)), Some(NodeId(2)));
        assert_eq!(links.ancestors(NodeId(3)).collect::<Vec<_>>(), vec![NodeId(2), NodeId(1), NodeId(0)]);
    }

    #[test]
    fn test_options_from_json() {
        let options: WalkOptions =
            serde_json::from_str(r#"{"strictRules": true, "establishRelationships": false}"#).unwrap();
        assert!(options.strict_rules);
        assert!(!options.establish_relationships);
        assert!(!options.preserve_html);
    }
}
