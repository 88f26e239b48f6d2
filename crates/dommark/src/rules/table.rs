//! Table rules.
//!
//! Header state travels through the scratch store: a table section stores
//! whether it is a header section in its own scope, and every table opens
//! an isolated scope so nested tables never see the outer table's flag.

use dommark_core::builder::{paragraph, table, table_cell, table_row};
use dommark_core::{Alignment, Node as AstNode};

use super::{Rule, RulesBuilder};
use crate::node::Node;
use crate::utilities::style_value;

/// Scratch key set while walking a header section
pub const HEADER_SECTION: &str = "table.headerSection";

const SECTION_TAGS: &[&str] = &["THEAD", "TBODY", "TFOOT", "TABLE"];

pub(super) fn register(builder: RulesBuilder) -> RulesBuilder {
    builder
        .rule(&["TABLE"], table_rule())
        .rule(&["THEAD", "TBODY", "TFOOT"], section_rule())
        .rule(&["TR"], row_rule())
        .rule(&["TH", "TD"], cell_rule())
        .rule(&["CAPTION"], caption_rule())
}

fn table_rule() -> Rule {
    Rule::new("table", |el, ctx| {
        let mut alignments = column_alignments(el);
        let children = ctx.with_scope(true, |ctx| ctx.render_children_as_ast(el))?;

        let mut out = Vec::new();
        let mut rows = Vec::new();
        for child in children {
            match child {
                AstNode::TableRow { .. } => rows.push(child),
                // captions
                AstNode::Paragraph { .. } => out.push(child),
                _ => {}
            }
        }
        if rows.is_empty() {
            return Ok(out.into());
        }

        // a header row found later (e.g. <tfoot> before <tbody>) moves first
        if let Some(i) = rows.iter().position(is_header_row) {
            if i > 0 {
                let header = rows.remove(i);
                rows.insert(0, header);
            }
        }

        let columns = rows.iter().map(|r| r.children().len()).max().unwrap_or(0);
        if alignments.len() < columns {
            alignments.resize(columns, Alignment::None);
        }
        out.push(table(alignments, rows));
        Ok(out.into())
    })
}

fn section_rule() -> Rule {
    Rule::new("tableSection", |el, ctx| {
        let is_head = el.is_tag("THEAD");
        let rows = ctx.with_scope(false, |ctx| {
            ctx.store(HEADER_SECTION, is_head);
            ctx.render_children_as_ast(el)
        })?;
        Ok(rows.into())
    })
}

fn row_rule() -> Rule {
    Rule::new("tableRow", |el, ctx| {
        let flagged = ctx
            .retrieve(HEADER_SECTION)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let in_thead = ctx
            .closest(SECTION_TAGS)
            .is_some_and(|section| section.is_tag("THEAD"));
        let has_th = el.element_children().any(|c| c.is_tag("TH"));

        let cells = ctx
            .render_children_as_ast(el)?
            .into_iter()
            .filter(|c| matches!(c, AstNode::TableCell { .. }))
            .collect();
        Ok(table_row(flagged || in_thead || has_th, cells).into())
    })
}

fn cell_rule() -> Rule {
    Rule::new("tableCell", |el, ctx| {
        let children = ctx.render_children_as_ast(el)?;
        Ok(table_cell(children).into())
    })
}

fn caption_rule() -> Rule {
    Rule::new("caption", |el, ctx| {
        let children = ctx.render_children_as_ast(el)?;
        Ok(paragraph(children).into())
    })
}

fn is_header_row(row: &AstNode) -> bool {
    matches!(row, AstNode::TableRow { is_header: true, .. })
}

/// Column alignments from the table's first header row, or its first row
/// when there is no header.
fn column_alignments(table: &Node) -> Vec<Alignment> {
    let rows = dom_rows(table);
    let header = rows
        .iter()
        .find(|(row, in_thead)| *in_thead || row.element_children().any(|c| c.is_tag("TH")))
        .or_else(|| rows.first());

    header
        .map(|(row, _)| {
            row.element_children()
                .filter(|c| c.is_tag("TH") || c.is_tag("TD"))
                .map(cell_alignment)
                .collect()
        })
        .unwrap_or_default()
}

/// Rows directly owned by `table`, flagged when inside <thead>
fn dom_rows(table: &Node) -> Vec<(&Node, bool)> {
    let mut rows = Vec::new();
    for child in table.element_children() {
        if child.is_tag("TR") {
            rows.push((child, false));
        } else if child.is_tag("THEAD") || child.is_tag("TBODY") || child.is_tag("TFOOT") {
            let in_thead = child.is_tag("THEAD");
            rows.extend(
                child
                    .element_children()
                    .filter(|r| r.is_tag("TR"))
                    .map(|r| (r, in_thead)),
            );
        }
    }
    rows
}

/// `align` attribute first, then the `text-align` style
fn cell_alignment(cell: &Node) -> Alignment {
    cell.get_attribute("align")
        .and_then(Alignment::parse)
        .or_else(|| {
            cell.get_attribute("style")
                .and_then(|style| style_value(style, "text-align"))
                .and_then(Alignment::parse)
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rules;
    use crate::walker::{WalkOptions, Walker};
    use dommark_core::builder::text;
    use pretty_assertions::assert_eq;

    fn cell(tag: &str, attrs: Vec<(&str, &str)>, value: &str) -> Node {
        Node::element_with_attrs(tag, attrs).with_child(Node::text(value))
    }

    fn row(cells: Vec<Node>) -> Node {
        cells.into_iter().fold(Node::element("tr"), Node::with_child)
    }

    fn walk(root: &Node) -> Vec<AstNode> {
        let rules = Rules::commonmark();
        let options = WalkOptions::default();
        let output = Walker::new(&rules, &options).walk(root).unwrap();
        output.roots[0].children().to_vec()
    }

    #[test]
    fn test_align_attribute_beats_style() {
        let th = cell("th", vec![("align", "left"), ("style", "text-align:right")], "a");
        assert_eq!(cell_alignment(&th), Alignment::Left);

        let styled = cell("td", vec![("style", "color: red; text-align: center")], "b");
        assert_eq!(cell_alignment(&styled), Alignment::Center);

        assert_eq!(cell_alignment(&cell("td", vec![], "c")), Alignment::None);
    }

    #[test]
    fn test_thead_rows_are_headers() {
        let table_el = Node::element("table")
            .with_child(Node::element("thead").with_child(row(vec![cell(
                "td",
                vec![("align", "right")],
                "H",
            )])))
            .with_child(Node::element("tbody").with_child(row(vec![cell("td", vec![], "v")])));

        assert_eq!(
            walk(&table_el),
            vec![table(
                vec![Alignment::Right],
                vec![
                    table_row(true, vec![table_cell(vec![text("H")])]),
                    table_row(false, vec![table_cell(vec![text("v")])]),
                ]
            )]
        );
    }

    #[test]
    fn test_th_marks_header_without_thead() {
        let table_el = Node::element("table")
            .with_child(row(vec![cell("td", vec![], "1")]))
            .with_child(row(vec![cell("th", vec![("align", "center")], "H")]));

        let ast = walk(&table_el);
        let AstNode::Table { alignments, children } = &ast[0] else {
            panic!("expected table, got {ast:?}");
        };
        assert_eq!(alignments, &vec![Alignment::Center]);
        assert!(is_header_row(&children[0]));
        assert!(!is_header_row(&children[1]));
    }

    #[test]
    fn test_nested_table_does_not_inherit_header_flag() {
        let inner = Node::element("table").with_child(row(vec![cell("td", vec![], "inner")]));
        let outer = Node::element("table").with_child(
            Node::element("thead").with_child(row(vec![Node::element("td").with_child(inner)])),
        );

        let ast = walk(&outer);
        let AstNode::Table { children: outer_rows, .. } = &ast[0] else {
            panic!("expected table");
        };
        assert!(is_header_row(&outer_rows[0]));

        let inner_table = &outer_rows[0].children()[0].children()[0];
        let AstNode::Table { children: inner_rows, .. } = inner_table else {
            panic!("expected nested table, got {inner_table:?}");
        };
        assert!(!is_header_row(&inner_rows[0]));
    }

    #[test]
    fn test_caption_precedes_table() {
        let table_el = Node::element("table")
            .with_child(Node::element("caption").with_child(Node::text("Totals")))
            .with_child(row(vec![cell("td", vec![], "1"), cell("td", vec![], "2")]));

        let ast = walk(&table_el);
        assert_eq!(ast.len(), 2);
        assert_eq!(ast[0], paragraph(vec![text("Totals")]));
        let AstNode::Table { alignments, .. } = &ast[1] else {
            panic!("expected table");
        };
        assert_eq!(alignments.len(), 2);
    }

    #[test]
    fn test_empty_table_emits_nothing() {
        assert!(walk(&Node::element("table")).is_empty());
    }
}
