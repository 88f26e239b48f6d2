//! Text and attribute helpers shared by the built-in rules.

use once_cell::sync::Lazy;
use regex::Regex;

/// One `property: value` declaration of an inline style
static STYLE_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([a-z-]+)\s*:\s*([^;]*)").unwrap());

/// `language-rust` / `lang-rust` class names on code elements
static LANGUAGE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:language|lang)-(\S+)$").unwrap());

/// Escape Markdown punctuation in text.
///
/// Inline delimiters are escaped everywhere; block markers (`#`, `>`, `+`,
/// `-`, `=`, `1.`) only at the start of a line.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        let body = line.trim_start();
        result.push_str(&line[..line.len() - body.len()]);
        let rest = escape_line_start(body, &mut result);

        for c in rest.chars() {
            match c {
                '\\' | '`' | '*' | '_' | '[' | ']' | '<' => {
                    result.push('\\');
                    result.push(c);
                }
                _ => result.push(c),
            }
        }
    }

    result
}

fn escape_line_start<'t>(line: &'t str, out: &mut String) -> &'t str {
    if line.starts_with(['#', '>', '+', '-', '=']) {
        out.push('\\');
        out.push_str(&line[..1]);
        return &line[1..];
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && matches!(line.as_bytes().get(digits), Some(b'.' | b')')) {
        out.push_str(&line[..digits]);
        out.push('\\');
        out.push_str(&line[digits..=digits]);
        return &line[digits + 1..];
    }

    line
}

/// Trim a URL and percent-encode characters that end a link destination
pub fn clean_url(url: &str) -> String {
    url.trim()
        .replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}

/// Trimmed, non-empty attribute value
pub fn clean_attribute(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Value of the last `property` declaration in an inline style
pub fn style_value<'s>(style: &'s str, property: &str) -> Option<&'s str> {
    STYLE_DECLARATION
        .captures_iter(style)
        .filter(|caps| caps[1].eq_ignore_ascii_case(property))
        .filter_map(|caps| caps.get(2))
        .map(|m| {
            let value = m.as_str().trim();
            value
                .strip_suffix("!important")
                .map_or(value, str::trim_end)
        })
        .last()
}

pub fn is_bold_style(style: &str) -> bool {
    style_value(style, "font-weight").is_some_and(|w| {
        w.eq_ignore_ascii_case("bold")
            || w.eq_ignore_ascii_case("bolder")
            || w.parse::<u16>().is_ok_and(|n| (600..=900).contains(&n))
    })
}

pub fn is_italic_style(style: &str) -> bool {
    style_value(style, "font-style")
        .is_some_and(|s| s.eq_ignore_ascii_case("italic") || s.eq_ignore_ascii_case("oblique"))
}

pub fn is_strike_style(style: &str) -> bool {
    ["text-decoration", "text-decoration-line"].iter().any(|property| {
        style_value(style, property)
            .is_some_and(|d| d.to_ascii_lowercase().contains("line-through"))
    })
}

/// Language named by a `language-x` or `lang-x` class
pub fn language_from_classes<'c>(mut classes: impl Iterator<Item = &'c str>) -> Option<&'c str> {
    classes.find_map(|class| {
        LANGUAGE_CLASS
            .captures(class)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    })
}
