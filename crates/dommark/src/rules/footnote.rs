//! Footnote references and definitions as produced by common Markdown
//! renderers (`<sup><a href="#fn1">1</a></sup>` plus a `footnotes` list).

use dommark_core::builder::{footnote_definition, footnote_reference};
use dommark_core::Node as AstNode;

use super::commonmark::wrap_inline_runs;
use super::{Rule, RuleResult, RulesBuilder};
use crate::context::RuleContext;
use crate::node::Node;
use crate::Result;

pub(super) fn register(builder: RulesBuilder) -> RulesBuilder {
    builder.rule(&["SUP"], superscript_rule())
}

fn superscript_rule() -> Rule {
    Rule::new("superscript", |el, ctx| {
        if let Some(note) = reference(el) {
            return Ok(note.into());
        }
        Ok(ctx.render_children_as_ast(el)?.into())
    })
}

/// A `<sup>` holding exactly one in-page link to a footnote
fn reference(sup: &Node) -> Option<AstNode> {
    let mut elements = sup.element_children();
    let (Some(anchor), None) = (elements.next(), elements.next()) else {
        return None;
    };
    if !anchor.is_tag("A") {
        return None;
    }
    let fragment = anchor.get_attribute("href")?.trim().strip_prefix('#')?;
    let marked = sup.has_class("footnote-ref") || anchor.has_class("footnote-ref");
    if fragment.is_empty() || !(marked || (fragment.starts_with("fn") && !fragment.starts_with("fnref"))) {
        return None;
    }

    let text = anchor.text_content();
    let label = text
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    let label = (!label.is_empty()).then(|| label.to_string());
    Some(footnote_reference(fragment, label))
}

/// Container holding footnote definitions
pub(super) fn is_footnote_section(el: &Node) -> bool {
    el.has_class("footnotes")
}

/// Link pointing back from a definition to its reference
pub(super) fn is_backreference(el: &Node) -> bool {
    el.classes().any(|c| c.starts_with("footnote-back"))
        || el
            .get_attribute("href")
            .is_some_and(|h| h.trim().starts_with("#fnref"))
}

/// One definition per `<li id>` found in the section
pub(super) fn definitions<'a>(section: &'a Node, ctx: &mut RuleContext<'a>) -> RuleResult {
    let mut out = Vec::new();
    ctx.with_ancestor(section, |ctx| collect(section, ctx, &mut out))?;
    Ok(out.into())
}

fn collect<'a>(parent: &'a Node, ctx: &mut RuleContext<'a>, out: &mut Vec<AstNode>) -> Result<()> {
    for child in parent.element_children() {
        if child.is_tag("LI") {
            let Some(id) = child.get_attribute("id").map(str::trim).filter(|id| !id.is_empty()) else {
                continue;
            };
            let children = wrap_inline_runs(ctx.render_children_as_ast(child)?);
            out.push(footnote_definition(id, Some(label_from_id(id)), children));
        } else if child.is_tag("OL") || child.is_tag("UL") || child.is_tag("DIV") {
            ctx.with_ancestor(child, |ctx| collect(child, ctx, out))?;
        }
    }
    Ok(())
}

fn label_from_id(id: &str) -> String {
    let label = ["fn-", "fn:", "fn"]
        .iter()
        .find_map(|prefix| id.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(id);
    label.to_string()
}
