//! CommonMark rules for DOM to Markdown AST conversion.

use dommark_core::builder::{
    blockquote, code_block, emphasis, hard_break, heading, image, inline_code, link, list,
    list_item, paragraph, strikethrough, strong, text, thematic_break,
};
use dommark_core::{Node as AstNode, NodeKind};
use tracing::debug;

use super::{footnote, table, Rule, RuleOutput, RuleResult, RulesBuilder};
use crate::context::RuleContext;
use crate::node::Node;
use crate::utilities::{
    clean_attribute, clean_url, is_bold_style, is_italic_style, is_strike_style,
    language_from_classes,
};

/// Block containers; their inline runs become paragraphs
const CONTAINER_TAGS: &[&str] = &[
    "HTML", "BODY", "DIV", "SECTION", "ARTICLE", "MAIN", "HEADER", "FOOTER", "NAV", "ASIDE",
    "FIGURE", "FIGCAPTION", "ADDRESS", "FORM", "FIELDSET", "CENTER", "DL", "DT", "DD",
];

/// Elements whose subtree carries no document content
const DROPPED_TAGS: &[&str] = &[
    "SCRIPT", "STYLE", "NOSCRIPT", "TEMPLATE", "HEAD", "TITLE", "META", "LINK",
];

/// Register all CommonMark rules
pub(super) fn register(builder: RulesBuilder) -> RulesBuilder {
    builder
        .rule(CONTAINER_TAGS, container_rule())
        .skip(DROPPED_TAGS)
        .rule(&["P"], paragraph_rule())
        .rule(&["BR"], line_break_rule())
        .rule(&["H1", "H2", "H3", "H4", "H5", "H6"], heading_rule())
        .rule(&["BLOCKQUOTE"], blockquote_rule())
        .rule(&["UL", "OL"], list_rule())
        .rule(&["LI"], list_item_rule())
        .rule(&["PRE"], code_block_rule())
        .rule(&["HR"], horizontal_rule())
        .rule(&["A"], link_rule())
        .rule(&["IMG"], image_rule())
        .rule(&["EM", "I", "CITE", "DFN"], emphasis_rule())
        .rule(&["STRONG", "B"], strong_rule())
        .rule(&["DEL", "S", "STRIKE"], strikethrough_rule())
        .rule(&["CODE", "KBD", "SAMP", "TT"], code_rule())
        .rule(&["SPAN"], span_rule())
        .use_plugin(table::register)
        .use_plugin(footnote::register)
}

fn container_rule() -> Rule {
    Rule::new("container", |el, ctx| {
        if footnote::is_footnote_section(el) {
            return footnote::definitions(el, ctx);
        }
        let children = ctx.render_children_as_ast(el)?;
        Ok(wrap_inline_runs(children).into())
    })
}

/// Group consecutive inline nodes into paragraphs; whitespace-only runs
/// are dropped.
pub(super) fn wrap_inline_runs(children: Vec<AstNode>) -> Vec<AstNode> {
    let mut out = Vec::with_capacity(children.len());
    let mut run = Vec::new();

    for child in children {
        if child.is_block() {
            flush_run(&mut run, &mut out);
            out.push(child);
        } else {
            run.push(child);
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Vec<AstNode>, out: &mut Vec<AstNode>) {
    if run.iter().all(AstNode::is_blank) {
        run.clear();
        return;
    }
    out.push(paragraph(std::mem::take(run)));
}

fn paragraph_rule() -> Rule {
    Rule::new("paragraph", |el, ctx| {
        let children = ctx.render_children_as_ast(el)?;
        Ok(paragraph(children).into())
    })
}

fn line_break_rule() -> Rule {
    Rule::new("lineBreak", |_, _| Ok(hard_break().into()))
}

fn heading_rule() -> Rule {
    Rule::new("heading", |el, ctx| {
        let level = el
            .node_name
            .get(1..)
            .and_then(|n| n.parse::<u8>().ok())
            .unwrap_or(1);
        let children = ctx.render_children_as_ast(el)?;
        Ok(heading(level, children).into())
    })
}

fn blockquote_rule() -> Rule {
    Rule::new("blockquote", |el, ctx| {
        let children = ctx.render_children_as_ast(el)?;
        let has_block = children.iter().any(|c| {
            matches!(
                c.kind(),
                NodeKind::Paragraph
                    | NodeKind::Heading
                    | NodeKind::List
                    | NodeKind::CodeBlock
                    | NodeKind::ThematicBreak
                    | NodeKind::Blockquote
            )
        });
        let children = if has_block {
            children
        } else {
            vec![paragraph(children)]
        };
        Ok(blockquote(children).into())
    })
}

fn list_rule() -> Rule {
    Rule::new("list", |el, ctx| {
        if footnote::is_footnote_section(el) {
            return footnote::definitions(el, ctx);
        }
        let ordered = el.is_tag("OL");
        let start = if ordered {
            el.get_attribute("start")
                .and_then(|s| s.trim().parse::<u32>().ok())
        } else {
            None
        };

        let mut items: Vec<AstNode> = Vec::new();
        for child in ctx.render_children_as_ast(el)? {
            match child {
                AstNode::ListItem { .. } => items.push(child),
                _ if child.is_blank() => {}
                // stray content, e.g. a nested list written as a sibling of <li>
                _ => match items.last_mut() {
                    Some(AstNode::ListItem { children }) => children.push(child),
                    _ => items.push(list_item(vec![child])),
                },
            }
        }
        Ok(list(ordered, start, items).into())
    })
}

fn list_item_rule() -> Rule {
    Rule::new("listItem", |el, ctx| {
        let children = ctx.render_children_as_ast(el)?;
        Ok(list_item(children).into())
    })
}

fn code_block_rule() -> Rule {
    Rule::new("codeBlock", |el, _| {
        let code_el = el.element_children().find(|c| c.is_tag("CODE"));
        let code = code_el.unwrap_or(el).text_content();
        let language = code_el
            .and_then(|c| language_from_classes(c.classes()))
            .or_else(|| language_from_classes(el.classes()))
            .map(String::from);
        Ok(code_block(language, code).into())
    })
}

fn horizontal_rule() -> Rule {
    Rule::new("thematicBreak", |_, _| Ok(thematic_break().into()))
}

fn link_rule() -> Rule {
    Rule::new("link", |el, ctx| {
        if footnote::is_backreference(el) {
            return Ok(RuleOutput::Skip);
        }
        let children = ctx.render_children_as_ast(el)?;

        // an anchor without href is a plain named anchor
        let Some(href) = el.get_attribute("href") else {
            return Ok(paragraph(children).into());
        };

        let url = clean_url(href);
        let title = clean_attribute(el.get_attribute("title"));
        let children = if children.is_empty() {
            vec![text(url.clone())]
        } else {
            children
        };
        Ok(link(url, title, children).into())
    })
}

fn image_rule() -> Rule {
    Rule::new("image", |el, ctx| {
        let Some(src) = clean_attribute(el.get_attribute("src")) else {
            ctx.warn(format!("<{}> without a src URL was dropped", el.tag_name()));
            return Ok(RuleOutput::Skip);
        };
        let alt = el.get_attribute("alt").map(|a| a.trim().to_string());
        let title = clean_attribute(el.get_attribute("title"));
        Ok(image(clean_url(&src), alt, title).into())
    })
}

fn emphasis_rule() -> Rule {
    Rule::new("emphasis", |el, ctx| delimited(el, ctx, emphasis))
}

fn strong_rule() -> Rule {
    Rule::new("strong", |el, ctx| delimited(el, ctx, strong))
}

fn strikethrough_rule() -> Rule {
    Rule::new("strikethrough", |el, ctx| delimited(el, ctx, strikethrough))
}

/// Shared body of the delimiter rules.
///
/// Emits nothing when the element has no text or its children render to
/// nothing. Whitespace at either edge is moved outside the delimiters,
/// since `* hi *` does not parse as emphasis.
fn delimited<'a>(
    el: &'a Node,
    ctx: &mut RuleContext<'a>,
    build: fn(Vec<AstNode>) -> AstNode,
) -> RuleResult {
    if el.text_content().trim().is_empty() {
        debug!(tag = el.tag_name(), "suppressed element without text");
        return Ok(RuleOutput::Skip);
    }
    let mut children = ctx.render_children_as_ast(el)?;
    if children.is_empty() {
        debug!(tag = el.tag_name(), "suppressed element without content");
        return Ok(RuleOutput::Skip);
    }

    let leading = take_edge_whitespace(&mut children, Edge::Start);
    let trailing = take_edge_whitespace(&mut children, Edge::End);
    if !leading && !trailing {
        return Ok(build(children).into());
    }

    let mut out = Vec::with_capacity(3);
    if leading {
        out.push(text(" "));
    }
    out.push(build(children));
    if trailing {
        out.push(text(" "));
    }
    Ok(out.into())
}

#[derive(Clone, Copy)]
enum Edge {
    Start,
    End,
}

/// Trim whitespace off the text at one edge; true if any was removed
fn take_edge_whitespace(children: &mut Vec<AstNode>, edge: Edge) -> bool {
    let index = match edge {
        Edge::Start => 0,
        Edge::End => children.len().saturating_sub(1),
    };
    let Some(AstNode::Text { value }) = children.get_mut(index) else {
        return false;
    };

    let trimmed = match edge {
        Edge::Start => value.trim_start(),
        Edge::End => value.trim_end(),
    };
    if trimmed.len() == value.len() {
        return false;
    }
    if trimmed.is_empty() {
        children.remove(index);
    } else {
        *value = trimmed.to_string();
    }
    true
}

fn code_rule() -> Rule {
    Rule::new("inlineCode", |el, ctx| {
        // inside <pre> the code block rule already took the text
        if ctx.is_inside("PRE") {
            return Ok(ctx.render_children_as_ast(el)?.into());
        }
        let value = el.text_content();
        if value.is_empty() {
            return Ok(RuleOutput::Skip);
        }
        Ok(inline_code(value).into())
    })
}

fn span_rule() -> Rule {
    Rule::new("span", |el, ctx| {
        let mut children = ctx.render_children_as_ast(el)?;

        if el
            .get_attribute("role")
            .is_some_and(|r| r.trim().eq_ignore_ascii_case("heading"))
        {
            let level = el
                .get_attribute("aria-level")
                .and_then(|l| l.trim().parse::<i64>().ok())
                .unwrap_or(2)
                .clamp(1, 6);
            let level = u8::try_from(level).unwrap_or(2);
            return Ok(heading(level, children).into());
        }

        if children.is_empty() || el.text_content().trim().is_empty() {
            return Ok(children.into());
        }

        let style = el.get_attribute("style").unwrap_or("");
        if is_italic_style(style) {
            children = vec![emphasis(children)];
        }
        if is_bold_style(style) {
            children = vec![strong(children)];
        }
        if is_strike_style(style) {
            children = vec![strikethrough(children)];
        }
        Ok(children.into())
    })
}
