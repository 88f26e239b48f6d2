//! Markdown rendering
//!
//! Converts AST nodes into CommonMark text. Rendering is a pure function of
//! the tree and the options; no escaping happens here, text nodes are
//! expected to arrive already safe for their position.

use unicode_width::UnicodeWidthStr;

use crate::ast::{Alignment, Node};
use crate::options::{HeadingStyle, RenderOptions, SoftBreak};

/// Render a node to a Markdown string.
///
/// A `Document` is trimmed of leading and trailing blank lines; any other
/// node is rendered exactly as its contract describes, so a hard line break
/// on its own yields `"  \n"`.
pub fn render_markdown(node: &Node, options: &RenderOptions) -> String {
    match node {
        Node::Document { children } => render_blocks(children, options, false)
            .trim_matches('\n')
            .to_string(),
        _ if node.is_block() => render_block(node, options),
        _ => {
            let mut out = String::new();
            render_inline(node, options, &mut out);
            out
        }
    }
}

/// One rendered block inside a container
struct Piece {
    text: String,
    /// A list that may interrupt a paragraph without a blank line
    interrupts: bool,
}

/// Render the children of a block container.
///
/// Consecutive inline children form one implicit paragraph. Blocks are
/// separated by a blank line; in `tight` mode (list items) a nested list
/// follows the previous block after a single newline. Any other block keeps
/// the blank line, or it would be read as a lazy paragraph continuation.
fn render_blocks(children: &[Node], options: &RenderOptions, tight: bool) -> String {
    let mut pieces: Vec<Piece> = Vec::new();
    let mut run: Vec<&Node> = Vec::new();

    for child in children {
        if child.is_block() {
            flush_inline_run(&mut run, options, &mut pieces);
            let text = render_block(child, options);
            let text = text.trim_end_matches('\n');
            if !text.trim().is_empty() {
                pieces.push(Piece {
                    text: text.to_string(),
                    interrupts: interrupts_paragraph(child),
                });
            }
        } else {
            run.push(child);
        }
    }
    flush_inline_run(&mut run, options, &mut pieces);

    let mut out = String::with_capacity(pieces.iter().map(|p| p.text.len() + 2).sum());
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            if tight && piece.interrupts {
                out.push('\n');
            } else {
                out.push_str("\n\n");
            }
        }
        out.push_str(&piece.text);
    }
    out
}

/// Bullet lists and ordered lists starting at 1 can follow a paragraph line
/// directly
fn interrupts_paragraph(node: &Node) -> bool {
    match node {
        Node::List { ordered: false, .. } => true,
        Node::List {
            ordered: true,
            start,
            ..
        } => matches!(start, None | Some(1)),
        _ => false,
    }
}

fn flush_inline_run(run: &mut Vec<&Node>, options: &RenderOptions, pieces: &mut Vec<Piece>) {
    if run.is_empty() {
        return;
    }
    let mut text = String::new();
    for node in run.drain(..) {
        render_inline(node, options, &mut text);
    }
    let text = text.trim();
    if !text.is_empty() {
        pieces.push(Piece {
            text: wrap_text(text, options.preferred_line_length),
            interrupts: false,
        });
    }
}

fn render_block(node: &Node, options: &RenderOptions) -> String {
    match node {
        Node::Document { children } => render_blocks(children, options, false),

        Node::Paragraph { children } => {
            let text = render_inlines(children, options);
            wrap_text(text.trim(), options.preferred_line_length)
        }

        Node::Heading { level, children } => render_heading(*level, children, options),

        Node::Blockquote { children } => {
            let content = render_blocks(children, options, false);
            if content.trim().is_empty() {
                return String::new();
            }
            let mut out = String::with_capacity(content.len() + 16);
            for (i, line) in content.lines().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push('>');
                if !line.is_empty() {
                    out.push(' ');
                    out.push_str(line);
                }
            }
            out
        }

        Node::List {
            ordered,
            start,
            children,
        } => render_list(*ordered, *start, children, options),

        Node::ListItem { .. } => render_list(false, None, std::slice::from_ref(node), options),

        Node::Table {
            alignments,
            children,
        } => render_table(alignments, children, options),

        Node::TableRow { children, .. } => children
            .iter()
            .map(|cell| render_cell(cell, options))
            .collect::<Vec<_>>()
            .join(" | "),

        Node::TableCell { .. } => render_cell(node, options),

        Node::CodeBlock { language, code } => render_code_block(language.as_deref(), code, options),

        Node::ThematicBreak => options.thematic_break_marker.as_str().to_string(),

        Node::FootnoteDefinition {
            identifier,
            label,
            children,
        } => render_footnote_definition(label.as_deref().unwrap_or(identifier), children, options),

        _ => {
            let mut out = String::new();
            render_inline(node, options, &mut out);
            out
        }
    }
}

fn render_heading(level: u8, children: &[Node], options: &RenderOptions) -> String {
    let text = render_inlines(children, options)
        .replace("  \n", " ")
        .replace('\n', " ");
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let hashes = "#".repeat(usize::from(level.clamp(1, 6)));
    match options.heading_style {
        HeadingStyle::Setext if level <= 2 => {
            let underline = if level == 1 { "=" } else { "-" };
            format!("{}\n{}", text, underline.repeat(UnicodeWidthStr::width(text)))
        }
        HeadingStyle::AtxClosed => format!("{} {} {}", hashes, text, hashes),
        _ => format!("{} {}", hashes, text),
    }
}

fn render_list(
    ordered: bool,
    start: Option<u32>,
    children: &[Node],
    options: &RenderOptions,
) -> String {
    let mut number = start.unwrap_or(1);
    let mut items: Vec<String> = Vec::with_capacity(children.len());

    for child in children {
        let content = match child {
            Node::ListItem { children } => render_blocks(children, options, true),
            // whitespace between <li> elements
            other if other.is_blank() => continue,
            other => render_blocks(std::slice::from_ref(other), options, true),
        };

        let marker = if ordered {
            format!("{}{}", number, options.ordered_marker.as_char())
        } else {
            options.bullet_marker.as_char().to_string()
        };
        number = number.saturating_add(1);

        let width = (marker.len() + 1).max(options.indent_size);
        items.push(indent_list_item(&marker, width, &content));
    }

    items.join("\n")
}

/// Put `marker` before the first line and indent continuation lines to `width`
fn indent_list_item(marker: &str, width: usize, content: &str) -> String {
    let padding = " ".repeat(width - marker.len());
    let indent = " ".repeat(width);

    let mut out = String::with_capacity(content.len() + width * 2);
    out.push_str(marker);
    for (i, line) in content.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        } else if !line.is_empty() {
            out.push_str(&padding);
        }
        out.push_str(line);
    }
    out
}

fn render_code_block(language: Option<&str>, code: &str, options: &RenderOptions) -> String {
    let fence_char = options.fenced_code_marker.as_char();

    // Longer fence when the code itself contains a run of the fence char
    let mut longest = 0usize;
    let mut current = 0usize;
    for ch in code.chars() {
        if ch == fence_char {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    let fence: String = std::iter::repeat(fence_char).take((longest + 1).max(3)).collect();

    let code = code.strip_suffix('\n').unwrap_or(code);
    let mut out = String::with_capacity(code.len() + fence.len() * 2 + 16);
    out.push_str(&fence);
    out.push_str(language.unwrap_or(""));
    out.push('\n');
    if !code.is_empty() {
        out.push_str(code);
        out.push('\n');
    }
    out.push_str(&fence);
    out
}

fn render_footnote_definition(label: &str, children: &[Node], options: &RenderOptions) -> String {
    let content = render_blocks(children, options, false);

    let mut out = format!("[^{}]: ", label);
    for (i, line) in content.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str("    ");
            }
        }
        out.push_str(line);
    }
    out.push_str("\n\n");
    out
}

fn render_table(alignments: &[Alignment], children: &[Node], options: &RenderOptions) -> String {
    let rows: Vec<(bool, Vec<String>)> = children
        .iter()
        .filter_map(|child| match child {
            Node::TableRow {
                is_header,
                children,
            } => Some((
                *is_header,
                children
                    .iter()
                    .filter(|c| matches!(c, Node::TableCell { .. }))
                    .map(|cell| render_cell(cell, options))
                    .collect(),
            )),
            _ => None,
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }

    let col_count = if alignments.is_empty() {
        rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0)
    } else {
        alignments.len()
    };
    if col_count == 0 {
        return String::new();
    }

    // Minimum width of 3 for the delimiter row
    let mut widths = vec![3usize; col_count];
    for (_, cells) in &rows {
        for (i, cell) in cells.iter().take(col_count).enumerate() {
            widths[i] = widths[i].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    // GFM needs the header first; without a header row the first row serves
    let header_index = rows.iter().position(|(is_header, _)| *is_header).unwrap_or(0);
    let align_of = |i: usize| alignments.get(i).copied().unwrap_or_default();

    let mut out = String::new();
    push_table_row(&rows[header_index].1, &widths, &align_of, &mut out);

    out.push('\n');
    out.push('|');
    for (i, &width) in widths.iter().enumerate() {
        out.push(' ');
        match align_of(i) {
            Alignment::Left => {
                out.push(':');
                out.push_str(&"-".repeat(width - 1));
            }
            Alignment::Right => {
                out.push_str(&"-".repeat(width - 1));
                out.push(':');
            }
            Alignment::Center => {
                out.push(':');
                out.push_str(&"-".repeat(width - 2));
                out.push(':');
            }
            Alignment::None => out.push_str(&"-".repeat(width)),
        }
        out.push_str(" |");
    }

    for (i, (_, cells)) in rows.iter().enumerate() {
        if i != header_index {
            out.push('\n');
            push_table_row(cells, &widths, &align_of, &mut out);
        }
    }

    out
}

fn push_table_row(
    cells: &[String],
    widths: &[usize],
    align_of: &dyn Fn(usize) -> Alignment,
    out: &mut String,
) {
    out.push('|');
    for (i, &width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let padding = width.saturating_sub(UnicodeWidthStr::width(cell));
        let (left, right) = match align_of(i) {
            Alignment::Right => (padding, 0),
            Alignment::Center => (padding / 2, padding - padding / 2),
            Alignment::Left | Alignment::None => (0, padding),
        };
        out.push(' ');
        out.push_str(&" ".repeat(left));
        out.push_str(cell);
        out.push_str(&" ".repeat(right));
        out.push_str(" |");
    }
}

fn render_cell(cell: &Node, options: &RenderOptions) -> String {
    let text = render_inlines(cell.children(), options).replace('\n', " ");
    let text = text.trim();
    if options.escape_pipe_in_tables {
        escape_pipes(text)
    } else {
        text.to_string()
    }
}

/// Escape `|` not already preceded by a backslash
fn escape_pipes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = '\0';
    for ch in text.chars() {
        if ch == '|' && prev != '\\' {
            out.push('\\');
        }
        out.push(ch);
        prev = ch;
    }
    out
}

fn render_inlines(nodes: &[Node], options: &RenderOptions) -> String {
    let mut out = String::new();
    for node in nodes {
        render_inline(node, options, &mut out);
    }
    out
}

fn render_inline(node: &Node, options: &RenderOptions, out: &mut String) {
    match node {
        Node::Text { value } => out.push_str(value),

        Node::Emphasis { children } => {
            wrap_inlines(options.emphasis_delimiter.as_str(), children, options, out)
        }

        Node::Strong { children } => {
            wrap_inlines(options.strong_delimiter.as_str(), children, options, out)
        }

        Node::Strikethrough { children } => wrap_inlines("~~", children, options, out),

        Node::InlineCode { value } => {
            if value.contains('`') {
                out.push_str("`` ");
                out.push_str(value);
                out.push_str(" ``");
            } else {
                out.push('`');
                out.push_str(value);
                out.push('`');
            }
        }

        Node::Link {
            url,
            title,
            children,
        } => {
            out.push('[');
            for child in children {
                render_inline(child, options, out);
            }
            out.push_str("](");
            out.push_str(url);
            push_title(title.as_deref(), out);
            out.push(')');
        }

        Node::Image { url, alt, title } => {
            out.push_str("![");
            out.push_str(alt.as_deref().unwrap_or(""));
            out.push_str("](");
            out.push_str(url);
            push_title(title.as_deref(), out);
            out.push(')');
        }

        Node::LineBreak { hard: true } => out.push_str("  \n"),

        Node::LineBreak { hard: false } => match options.soft_break {
            SoftBreak::Space => out.push(' '),
            SoftBreak::Newline => out.push('\n'),
        },

        Node::FootnoteReference { identifier, label } => {
            out.push_str("[^");
            out.push_str(label.as_deref().unwrap_or(identifier));
            out.push(']');
        }

        Node::Html { value } => out.push_str(value),

        // a paragraph inside a run keeps its edge spacing
        Node::Paragraph { children } => {
            for child in children {
                render_inline(child, options, out);
            }
        }

        // block content in an inline position keeps its own layout
        _ => out.push_str(&render_block(node, options)),
    }
}

fn wrap_inlines(delimiter: &str, children: &[Node], options: &RenderOptions, out: &mut String) {
    out.push_str(delimiter);
    for child in children {
        render_inline(child, options, out);
    }
    out.push_str(delimiter);
}

fn push_title(title: Option<&str>, out: &mut String) {
    if let Some(t) = title {
        out.push_str(" \"");
        out.push_str(&t.replace('"', "\\\""));
        out.push('"');
    }
}

/// Greedy word wrap at `width` columns; 0 disables wrapping.
///
/// Existing newlines are kept. A line ending in a hard break keeps its two
/// trailing spaces. Words that would open a block construct at the start of a
/// line (`#`, `>`, list markers) stay on the previous line.
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + text.len() / width.max(1));
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if UnicodeWidthStr::width(line) <= width {
            out.push_str(line);
            continue;
        }

        let hard_break = line.ends_with("  ");
        let mut column = 0usize;
        for (j, word) in line.split_whitespace().enumerate() {
            let len = UnicodeWidthStr::width(word);
            if j > 0 {
                if column + 1 + len > width && !opens_block(word) {
                    out.push('\n');
                    column = 0;
                } else {
                    out.push(' ');
                    column += 1;
                }
            }
            out.push_str(word);
            column += len;
        }
        if hard_break {
            out.push_str("  ");
        }
    }
    out
}

fn opens_block(word: &str) -> bool {
    if word.starts_with(['#', '>', '-', '+', '*', '=', '|']) {
        return true;
    }
    let digits = word.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && matches!(word[digits..].chars().next(), Some('.') | Some(')'))
}
