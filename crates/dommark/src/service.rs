//! Converter - the main entry point for DOM to Markdown conversion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dommark_core::{render_markdown, Node as AstNode, RenderOptions};
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::debug;

use crate::node::Node;
use crate::rules::Rules;
use crate::walker::{WalkOptions, WalkOutput, Walker};
use crate::Result;

/// The built-in rule table, built once and shared by default converters
static COMMONMARK_RULES: Lazy<Arc<Rules>> = Lazy::new(|| Arc::new(Rules::commonmark()));

/// All conversion options.
///
/// Deserializes from one flat object using the camelCase keys of both
/// halves, e.g. `{"headingStyle": "setext", "strictRules": true}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    #[serde(flatten)]
    pub walk: WalkOptions,
    #[serde(flatten)]
    pub render: RenderOptions,
}

/// Timings and counters for one conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionMetrics {
    /// HTML parsing; zero when the caller supplied a DOM
    pub parse: Duration,
    pub walk: Duration,
    pub render: Duration,
    /// AST nodes produced, the Document root included
    pub node_count: usize,
    /// Non-fatal problems, e.g. images without a URL
    pub warnings: Vec<String>,
}

/// Markdown output with optional metrics
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub markdown: String,
    /// Present when `collect_metrics` is enabled
    pub metrics: Option<ConversionMetrics>,
}

/// Converts DOM trees to CommonMark.
///
/// A converter is immutable once built and can be shared between threads;
/// each conversion allocates its own walk state.
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConvertOptions,
    rules: Arc<Rules>,
}

impl Converter {
    /// Create a converter with default options and the built-in rules
    pub fn new() -> Self {
        Self::with_options(ConvertOptions::default())
    }

    pub fn with_options(options: ConvertOptions) -> Self {
        Self {
            options,
            rules: Arc::clone(&COMMONMARK_RULES),
        }
    }

    /// Replace the rule table, e.g. one built from
    /// [`RulesBuilder::commonmark`](crate::RulesBuilder::commonmark) plus custom rules
    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Walk a DOM tree into `[Document]` without rendering
    pub fn to_ast(&self, node: &Node) -> Result<Vec<AstNode>> {
        Ok(self.walk(node)?.roots)
    }

    /// Convert a DOM tree to Markdown
    pub fn convert(&self, node: &Node) -> Result<String> {
        Ok(self.run(node, Duration::ZERO)?.markdown)
    }

    /// Convert a DOM tree, collecting metrics if enabled
    pub fn convert_with_metrics(&self, node: &Node) -> Result<Conversion> {
        self.run(node, Duration::ZERO)
    }

    /// Parse and convert an HTML fragment
    #[cfg(feature = "html")]
    pub fn convert_html(&self, html: &str) -> Result<String> {
        Ok(self.convert_html_with_metrics(html)?.markdown)
    }

    /// Parse and convert an HTML fragment, timing the parse as well
    #[cfg(feature = "html")]
    pub fn convert_html_with_metrics(&self, html: &str) -> Result<Conversion> {
        let start = Instant::now();
        let node = crate::html::parse_html(html);
        let parse = start.elapsed();
        self.run(&node, parse)
    }

    /// Escape Markdown punctuation in a string
    pub fn escape(&self, text: &str) -> String {
        crate::utilities::escape_markdown(text)
    }

    fn walk(&self, node: &Node) -> Result<WalkOutput> {
        Walker::new(&self.rules, &self.options.walk).walk(node)
    }

    fn run(&self, node: &Node, parse: Duration) -> Result<Conversion> {
        let start = Instant::now();
        let output = self.walk(node)?;
        let walk = start.elapsed();

        let start = Instant::now();
        let markdown = output
            .roots
            .iter()
            .map(|root| render_markdown(root, &self.options.render))
            .collect::<Vec<_>>()
            .join("\n\n");
        let render = start.elapsed();

        let metrics = self.options.walk.collect_metrics.then(|| {
            debug!(
                ?parse,
                ?walk,
                ?render,
                nodes = output.node_count,
                warnings = output.warnings.len(),
                "conversion finished"
            );
            ConversionMetrics {
                parse,
                walk,
                render,
                node_count: output.node_count,
                warnings: output.warnings,
            }
        });

        Ok(Conversion { markdown, metrics })
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, RulesBuilder};
    use dommark_core::builder::text;
    use dommark_core::{BulletMarker, HeadingStyle};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert_node() {
        let converter = Converter::new();
        let h1 = Node::element("h1").with_child(Node::text("Hello World"));
        assert_eq!(converter.convert(&h1).unwrap(), "# Hello World");
    }

    #[test]
    fn test_default_converters_share_rules() {
        let a = Converter::new();
        let b = Converter::default();
        assert!(std::ptr::eq(a.rules(), b.rules()));
    }

    #[test]
    fn test_with_rules() {
        let rules = RulesBuilder::commonmark()
            .rule(&["MARK"], Rule::new("mark", |el, _| Ok(text(format!("=={}==", el.text_content())).into())))
            .build();
        let converter = Converter::new().with_rules(rules);
        let p = Node::element("p")
            .with_child(Node::text("a "))
            .with_child(Node::element("mark").with_child(Node::text("b")));
        assert_eq!(converter.convert(&p).unwrap(), "a ==b==");
    }

    #[test]
    fn test_metrics_only_when_enabled() {
        let img = Node::element("img");

        let plain = Converter::new().convert_with_metrics(&img).unwrap();
        assert!(plain.metrics.is_none());

        let options = ConvertOptions {
            walk: WalkOptions {
                collect_metrics: true,
                ..WalkOptions::default()
            },
            ..ConvertOptions::default()
        };
        let measured = Converter::with_options(options)
            .convert_with_metrics(&img)
            .unwrap();
        let metrics = measured.metrics.unwrap();
        assert_eq!(measured.markdown, "");
        assert_eq!(metrics.node_count, 1);
        assert_eq!(metrics.warnings.len(), 1);
        assert_eq!(metrics.parse, Duration::ZERO);
    }

    #[test]
    fn test_options_from_flat_json() {
        let options: ConvertOptions = serde_json::from_str(
            r#"{"headingStyle": "setext", "bulletMarker": "*", "strictRules": true}"#,
        )
        .unwrap();
        assert_eq!(options.render.heading_style, HeadingStyle::Setext);
        assert_eq!(options.render.bullet_marker, BulletMarker::Asterisk);
        assert!(options.walk.strict_rules);
        assert!(options.walk.establish_relationships);
    }

    #[test]
    fn test_to_ast_wraps_in_document() {
        let ast = Converter::new().to_ast(&Node::text("x")).unwrap();
        assert_eq!(ast.len(), 1);
        assert_eq!(ast[0].children(), &[text("x")]);
    }
}
