//! Per-walk state handed to every rule invocation.

use std::collections::HashMap;

use dommark_core::{Node as AstNode, NodeKind};
use smallvec::SmallVec;

use crate::node::Node;
use crate::rules::Rules;
use crate::walker::{walk_node, WalkOptions};
use crate::Result;

/// A value in the scratch store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScratchValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ScratchValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScratchValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScratchValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScratchValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ScratchValue {
    fn from(value: bool) -> Self {
        ScratchValue::Bool(value)
    }
}

impl From<i64> for ScratchValue {
    fn from(value: i64) -> Self {
        ScratchValue::Int(value)
    }
}

impl From<&str> for ScratchValue {
    fn from(value: &str) -> Self {
        ScratchValue::Text(value.to_string())
    }
}

impl From<String> for ScratchValue {
    fn from(value: String) -> Self {
        ScratchValue::Text(value)
    }
}

#[derive(Debug, Default)]
struct ScratchFrame {
    /// Lookups do not continue past an isolated frame
    isolated: bool,
    values: HashMap<String, ScratchValue>,
}

/// Rule context: ancestor stack, scratch store and walk-wide warnings.
///
/// One context exists per walk. It is not `Sync`-shared; concurrent
/// conversions each build their own through [`crate::Walker`].
pub struct RuleContext<'a> {
    rules: &'a Rules,
    options: &'a WalkOptions,
    /// DOM parent of the top-level nodes, if the walk root is a container
    root: Option<&'a Node>,
    ancestors: SmallVec<[&'a Node; 16]>,
    scratch: Vec<ScratchFrame>,
    warnings: Vec<String>,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(rules: &'a Rules, options: &'a WalkOptions, root: Option<&'a Node>) -> Self {
        Self {
            rules,
            options,
            root,
            ancestors: SmallVec::new(),
            scratch: vec![ScratchFrame {
                isolated: true,
                values: HashMap::new(),
            }],
            warnings: Vec::new(),
        }
    }

    pub fn rules(&self) -> &'a Rules {
        self.rules
    }

    pub fn options(&self) -> &'a WalkOptions {
        self.options
    }

    /// Walk the children of `node` with `node` pushed onto the ancestor
    /// stack, concatenating the per-child results.
    pub fn render_children_as_ast(&mut self, node: &'a Node) -> Result<Vec<AstNode>> {
        self.with_ancestor(node, |ctx| {
            let mut out = Vec::with_capacity(node.children.len());
            for child in &node.children {
                out.extend(walk_node(ctx, child)?);
            }
            Ok(out)
        })
    }

    /// Run `f` with `node` temporarily pushed onto the ancestor stack
    pub fn with_ancestor<R>(&mut self, node: &'a Node, f: impl FnOnce(&mut Self) -> R) -> R {
        self.ancestors.push(node);
        let result = f(self);
        self.ancestors.pop();
        result
    }

    /// True if any ancestor element has this tag (case-insensitive)
    pub fn is_inside(&self, tag: &str) -> bool {
        self.ancestors.iter().any(|a| a.is_tag(tag))
    }

    /// Nearest ancestor whose tag is one of `tags`
    pub fn closest(&self, tags: &[&str]) -> Option<&'a Node> {
        self.ancestors
            .iter()
            .rev()
            .copied()
            .find(|a| tags.iter().any(|t| a.is_tag(t)))
    }

    /// Number of enclosing UL/OL elements
    pub fn list_nesting_depth(&self) -> usize {
        self.ancestors
            .iter()
            .filter(|a| a.is_tag("UL") || a.is_tag("OL"))
            .count()
    }

    /// DOM parent of the element currently being dispatched
    pub fn parent_node(&self) -> Option<&'a Node> {
        self.ancestors.last().copied().or(self.root)
    }

    /// Number of ancestors on the stack
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Tag names from the outermost ancestor to the current parent
    pub fn tag_path(&self) -> Vec<&'a str> {
        self.ancestors
            .iter()
            .filter(|a| a.is_element())
            .map(|a| a.tag_name())
            .collect()
    }

    /// True if `node` has another element or non-blank text sibling in the
    /// original DOM
    pub fn has_siblings(&self, node: &Node) -> bool {
        self.significant_siblings(node)
            .is_some_and(|mut s| s.any(|c| !std::ptr::eq(c, node)))
    }

    pub fn is_first_child(&self, node: &Node) -> bool {
        self.significant_siblings(node)
            .and_then(|mut s| s.next())
            .is_some_and(|c| std::ptr::eq(c, node))
    }

    pub fn is_last_child(&self, node: &Node) -> bool {
        self.significant_siblings(node)
            .and_then(|s| s.last())
            .is_some_and(|c| std::ptr::eq(c, node))
    }

    /// Children of the current parent, if `node` is one of them
    fn significant_siblings(&self, node: &Node) -> Option<impl Iterator<Item = &'a Node>> {
        let parent = self.parent_node()?;
        if !parent.children.iter().any(|c| std::ptr::eq(c, node)) {
            return None;
        }
        Some(parent.children.iter().filter(|c| is_significant(c)))
    }

    /// Write a value into the innermost scratch frame
    pub fn store(&mut self, key: &str, value: impl Into<ScratchValue>) {
        if let Some(frame) = self.scratch.last_mut() {
            frame.values.insert(key.to_string(), value.into());
        }
    }

    /// Read a value, searching frames innermost-out up to the nearest
    /// isolated frame
    pub fn retrieve(&self, key: &str) -> Option<&ScratchValue> {
        for frame in self.scratch.iter().rev() {
            if let Some(value) = frame.values.get(key) {
                return Some(value);
            }
            if frame.isolated {
                break;
            }
        }
        None
    }

    /// Run `f` inside a fresh scratch frame; values stored inside are
    /// dropped afterwards. An isolated frame also hides outer values.
    pub fn with_scope<R>(&mut self, isolated: bool, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scratch.push(ScratchFrame {
            isolated,
            values: HashMap::new(),
        });
        let result = f(self);
        self.scratch.pop();
        result
    }

    /// True if `node` has an ancestor of `kind` within the constructed
    /// AST `forest`
    pub fn has_ast_ancestor(&self, forest: &[AstNode], node: &AstNode, kind: NodeKind) -> bool {
        ast_path(forest, node).is_some_and(|path| path.iter().any(|a| a.kind() == kind))
    }

    /// True if `node` shares its AST parent with another node in `forest`
    pub fn has_ast_siblings(&self, forest: &[AstNode], node: &AstNode) -> bool {
        match ast_path(forest, node) {
            Some(path) => match path.last() {
                Some(parent) => parent.children().len() > 1,
                None => forest.len() > 1,
            },
            None => false,
        }
    }

    /// Record a non-fatal problem; conversion continues
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(path = %self.tag_path().join(" > "), "{}", message);
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

/// Ancestors of `target` in `forest`, outermost first; `None` if absent.
/// Stops at the first match instead of indexing the whole forest.
fn ast_path<'f>(forest: &'f [AstNode], target: &AstNode) -> Option<Vec<&'f AstNode>> {
    let mut path: Vec<&AstNode> = Vec::new();
    let mut stack: Vec<(&AstNode, usize)> = forest.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        path.truncate(depth);
        if std::ptr::eq(node, target) {
            return Some(path);
        }
        path.push(node);
        stack.extend(node.children().iter().rev().map(|c| (c, depth + 1)));
    }
    None
}

fn is_significant(node: &Node) -> bool {
    node.is_element()
        || (node.is_text() && !node.node_value.as_deref().unwrap_or("").trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dommark_core::builder::{list, list_item, paragraph, text};

    struct Fixture {
        rules: Rules,
        options: WalkOptions,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                rules: Rules::builder().build(),
                options: WalkOptions::default(),
            }
        }

        fn context<'a>(&'a self, root: Option<&'a Node>) -> RuleContext<'a> {
            RuleContext::new(&self.rules, &self.options, root)
        }
    }

    #[test]
    fn test_ancestry_queries() {
        let ul = Node::element("ul");
        let li = Node::element("li");
        let ol = Node::element("OL");
        let fixture = Fixture::new();
        let mut ctx = fixture.context(None);
        ctx.with_ancestor(&ul, |ctx| {
            ctx.with_ancestor(&li, |ctx| {
                ctx.with_ancestor(&ol, |ctx| {
                    assert!(ctx.is_inside("ul"));
                    assert!(ctx.is_inside("Li"));
                    assert!(!ctx.is_inside("pre"));
                    assert_eq!(ctx.list_nesting_depth(), 2);
                    assert_eq!(ctx.depth(), 3);
                    assert_eq!(ctx.tag_path(), vec!["UL", "LI", "OL"]);
                    assert!(std::ptr::eq(ctx.parent_node().unwrap(), &ol));
                    assert!(std::ptr::eq(ctx.closest(&["UL", "LI"]).unwrap(), &li));
                })
            })
        });
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_sibling_queries_use_dom_parent() {
        let p = Node::element("p")
            .with_child(Node::text("  "))
            .with_child(Node::element("em"))
            .with_child(Node::text("middle"))
            .with_child(Node::element("strong"))
            .with_child(Node::text("\n"));
        let em = &p.children[1];
        let strong = &p.children[3];

        let fixture = Fixture::new();
        let mut ctx = fixture.context(None);
        ctx.with_ancestor(&p, |ctx| {
            assert!(ctx.is_first_child(em));
            assert!(!ctx.is_last_child(em));
            assert!(ctx.is_last_child(strong));
            assert!(ctx.has_siblings(strong));
        });
        // outside its parent the node is unknown
        assert!(!ctx.has_siblings(em));
    }

    #[test]
    fn test_root_acts_as_parent_of_top_level_nodes() {
        let root = Node::document_fragment().with_child(Node::element("hr"));
        let hr = &root.children[0];
        let fixture = Fixture::new();
        let ctx = fixture.context(Some(&root));
        assert!(ctx.is_first_child(hr));
        assert!(ctx.is_last_child(hr));
        assert!(!ctx.has_siblings(hr));
    }

    #[test]
    fn test_scratch_scopes() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context(None);
        ctx.store("outer", 1i64);
        ctx.with_scope(false, |ctx| {
            ctx.store("flag", true);
            assert_eq!(ctx.retrieve("outer").and_then(ScratchValue::as_int), Some(1));
            assert_eq!(ctx.retrieve("flag").and_then(ScratchValue::as_bool), Some(true));

            ctx.with_scope(true, |ctx| {
                assert!(ctx.retrieve("flag").is_none());
                assert!(ctx.retrieve("outer").is_none());
                ctx.store("flag", "inner");
                assert_eq!(ctx.retrieve("flag").and_then(ScratchValue::as_str), Some("inner"));
            });

            assert_eq!(ctx.retrieve("flag"), Some(&ScratchValue::Bool(true)));
        });
        assert!(ctx.retrieve("flag").is_none());
    }

    #[test]
    fn test_ast_queries() {
        let forest = vec![list(false, None, vec![list_item(vec![text("a"), text("b")])])];
        let item = &forest[0].children()[0];
        let leaf = &item.children()[0];
        let fixture = Fixture::new();
        let ctx = fixture.context(None);
        assert!(ctx.has_ast_ancestor(&forest, leaf, NodeKind::List));
        assert!(!ctx.has_ast_ancestor(&forest, leaf, NodeKind::Paragraph));
        assert!(ctx.has_ast_siblings(&forest, leaf));
        assert!(!ctx.has_ast_siblings(&forest, item));
        assert!(!ctx.has_ast_siblings(&forest, &paragraph(vec![])));
    }

    #[test]
    fn test_warn_records_message() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context(None);
        ctx.warn("missing src");
        assert_eq!(ctx.warnings(), ["missing src".to_string()]);
    }
}
