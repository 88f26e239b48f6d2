//! Rule type and rule results.

use std::fmt;

use dommark_core::Node as AstNode;
use smallvec::SmallVec;

use crate::context::RuleContext;
use crate::node::Node;

/// Error type a rule may raise; the walker wraps it with the tag name
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a rule invocation produces
pub type RuleResult = std::result::Result<RuleOutput, BoxError>;

/// Type alias for rule functions
pub type RuleFn = Box<dyn for<'a> Fn(&'a Node, &mut RuleContext<'a>) -> RuleResult + Send + Sync>;

/// Zero, one or many AST nodes emitted for one element
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RuleOutput {
    /// Suppress the element and its whole subtree
    #[default]
    Skip,
    Node(AstNode),
    Nodes(Vec<AstNode>),
}

impl RuleOutput {
    /// Normalize to a list, possibly empty
    pub fn into_nodes(self) -> SmallVec<[AstNode; 1]> {
        match self {
            RuleOutput::Skip => SmallVec::new(),
            RuleOutput::Node(node) => smallvec::smallvec![node],
            RuleOutput::Nodes(nodes) => SmallVec::from_vec(nodes),
        }
    }
}

impl From<AstNode> for RuleOutput {
    fn from(node: AstNode) -> Self {
        RuleOutput::Node(node)
    }
}

impl From<Vec<AstNode>> for RuleOutput {
    fn from(nodes: Vec<AstNode>) -> Self {
        RuleOutput::Nodes(nodes)
    }
}

impl From<Option<AstNode>> for RuleOutput {
    fn from(node: Option<AstNode>) -> Self {
        node.map_or(RuleOutput::Skip, RuleOutput::Node)
    }
}

/// A rule maps one DOM element to AST nodes.
///
/// Rules may read the DOM but never mutate it; the only state they can
/// touch is the context's scratch store.
pub struct Rule {
    name: String,
    apply: RuleFn,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(name: &str, apply: F) -> Self
    where
        F: for<'a> Fn(&'a Node, &mut RuleContext<'a>) -> RuleResult + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            apply: Box::new(apply),
        }
    }

    /// Name used in logs; aliases share one rule and therefore one name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply this rule to an element
    pub fn apply<'a>(&self, element: &'a Node, ctx: &mut RuleContext<'a>) -> RuleResult {
        (self.apply)(element, ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dommark_core::builder::text;

    #[test]
    fn test_output_normalizes_to_list() {
        assert!(RuleOutput::Skip.into_nodes().is_empty());
        assert_eq!(RuleOutput::from(text("a")).into_nodes().len(), 1);
        assert_eq!(
            RuleOutput::from(vec![text("a"), text("b")]).into_nodes().len(),
            2
        );
        assert_eq!(RuleOutput::from(None::<AstNode>), RuleOutput::Skip);
    }
}
