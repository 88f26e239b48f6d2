//! # dommark
//!
//! Convert DOM trees to CommonMark through an intermediate Markdown AST.
//!
//! Conversion runs in three phases:
//!
//! 1. A [`Walker`] visits the DOM and dispatches each element to the
//!    [`Rule`] registered for its tag in a [`Rules`] table. Rules emit AST
//!    nodes from [`dommark_core`].
//! 2. The resulting tree is wrapped in a Document root, and its parent and
//!    sibling relationships are established and optionally verified.
//! 3. The AST is rendered to Markdown according to [`RenderOptions`].
//!
//! The walker accepts a CDP-style [`Node`] tree, so any HTML parser (or a
//! live browser DOM) can feed it. With the default `html` feature, HTML
//! strings are parsed with scraper.
//!
//! ## Example (Node-based)
//!
//! ```rust
//! use dommark::{Converter, Node};
//!
//! let mut h1 = Node::element("h1");
//! h1.add_child(Node::text("Hello World"));
//!
//! let markdown = Converter::new().convert(&h1).unwrap();
//! assert_eq!(markdown, "# Hello World");
//! ```
//!
//! ## Example (custom rules)
//!
//! ```rust
//! use dommark::ast::builder::strong;
//! use dommark::{Converter, Node, Rule, RulesBuilder};
//!
//! let rules = RulesBuilder::commonmark()
//!     .rule(&["MARK"], Rule::new("mark", |el, ctx| {
//!         Ok(strong(ctx.render_children_as_ast(el)?).into())
//!     }))
//!     .build();
//!
//! let mark = Node::element("mark").with_child(Node::text("hot"));
//! let markdown = Converter::new().with_rules(rules).convert(&mark).unwrap();
//! assert_eq!(markdown, "**hot**");
//! ```

mod context;
#[cfg(feature = "html")]
pub mod html;
pub mod node;
mod rules;
mod service;
mod utilities;
mod walker;

/// The Markdown AST, its builders and the renderer
pub use dommark_core as ast;

pub use context::{RuleContext, ScratchValue};
pub use dommark_core::{RenderOptions, StructureError};
#[cfg(feature = "html")]
pub use html::parse_html;
pub use node::{Node, NodeType};
pub use rules::{BoxError, Rule, RuleFn, RuleOutput, RuleResult, Rules, RulesBuilder, HEADER_SECTION};
pub use service::{Conversion, ConversionMetrics, ConvertOptions, Converter};
pub use utilities::escape_markdown;
pub use walker::{WalkOptions, WalkOutput, Walker};

/// Error type for conversion
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A rule failed; the whole conversion is aborted
    #[error("Rule for <{tag}> failed: {source}")]
    Rule {
        tag: String,
        #[source]
        source: BoxError,
    },

    #[error("No rule for <{tag}> in strict mode")]
    UnmatchedTag { tag: String },

    #[error("Invalid AST structure: {0}")]
    Structure(#[from] StructureError),
}

impl ConvertError {
    /// True for errors raised by rule dispatch rather than verification
    pub fn is_rule_error(&self) -> bool {
        matches!(self, ConvertError::Rule { .. } | ConvertError::UnmatchedTag { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
