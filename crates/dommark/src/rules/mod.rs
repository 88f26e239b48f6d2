//! Rule registry for DOM to Markdown AST conversion.

mod commonmark;
mod footnote;
mod rule;
mod table;

pub use rule::{BoxError, Rule, RuleFn, RuleOutput, RuleResult};
pub use table::HEADER_SECTION;

use std::sync::Arc;

use dommark_core::builder::html;
use indexmap::IndexMap;

/// Immutable lookup table from upper-cased tag name to rule.
///
/// Aliased tags share one [`Rule`]. Built through [`RulesBuilder`]; once
/// built it is only read, so one registry can back any number of
/// concurrent conversions.
#[derive(Debug)]
pub struct Rules {
    table: IndexMap<String, Arc<Rule>>,
    fallback: Option<Arc<Rule>>,
}

impl Rules {
    /// The built-in CommonMark rule set
    pub fn commonmark() -> Self {
        RulesBuilder::commonmark().build()
    }

    /// An empty builder, for registries without the built-in rules
    pub fn builder() -> RulesBuilder {
        RulesBuilder::new()
    }

    /// Find the rule for a tag name (case-insensitive)
    pub fn get(&self, tag: &str) -> Option<&Rule> {
        match self.table.get(tag) {
            Some(rule) => Some(rule.as_ref()),
            None if tag.bytes().any(|b| b.is_ascii_lowercase()) => {
                self.table.get(&tag.to_ascii_uppercase()).map(Arc::as_ref)
            }
            None => None,
        }
    }

    /// Rule applied to elements with no entry of their own
    pub fn fallback(&self) -> Option<&Rule> {
        self.fallback.as_deref()
    }

    /// Registered tag names in registration order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::commonmark()
    }
}

/// Builder for a [`Rules`] table.
///
/// Later registrations for the same tag replace earlier ones, so custom
/// rules layered on [`RulesBuilder::commonmark`] override the built-ins.
#[derive(Debug, Default)]
pub struct RulesBuilder {
    table: IndexMap<String, Arc<Rule>>,
    fallback: Option<Arc<Rule>>,
}

impl RulesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-filled with the built-in rules
    pub fn commonmark() -> Self {
        commonmark::register(Self::new())
    }

    /// Register `rule` for every tag in `tags`
    pub fn rule(mut self, tags: &[&str], rule: Rule) -> Self {
        let rule = Arc::new(rule);
        for tag in tags {
            self.table.insert(tag.to_ascii_uppercase(), Arc::clone(&rule));
        }
        self
    }

    /// Drop the rules for `tags`, leaving them to the fallback
    pub fn remove(mut self, tags: &[&str]) -> Self {
        for tag in tags {
            self.table.shift_remove(&tag.to_ascii_uppercase());
        }
        self
    }

    /// Suppress elements with these tags together with their content
    pub fn skip(self, tags: &[&str]) -> Self {
        self.rule(tags, Rule::new("skip", |_, _| Ok(RuleOutput::Skip)))
    }

    /// Emit elements with these tags as raw HTML
    pub fn keep(self, tags: &[&str]) -> Self {
        self.rule(
            tags,
            Rule::new("keep", |el, _| Ok(html(el.outer_html()).into())),
        )
    }

    /// Override the behavior for elements without a rule
    pub fn fallback(mut self, rule: Rule) -> Self {
        self.fallback = Some(Arc::new(rule));
        self
    }

    /// Apply a plugin: any function that extends the builder
    pub fn use_plugin<F>(self, plugin: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        plugin(self)
    }

    pub fn build(self) -> Rules {
        Rules {
            table: self.table,
            fallback: self.fallback,
        }
    }
}
