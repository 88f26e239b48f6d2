//! Configuration options for Markdown rendering

use serde::Deserialize;

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum HeadingStyle {
    /// Use ATX-style headings (prefixed with #)
    #[default]
    #[serde(rename = "atx")]
    Atx,
    /// ATX with a closing sequence: `## Title ##`
    #[serde(rename = "atx-closed")]
    AtxClosed,
    /// Use setext-style headings (underlined with = or -)
    /// Only works for h1 and h2, falls back to ATX for h3-h6
    #[serde(rename = "setext")]
    Setext,
}

/// Bullet list marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BulletMarker {
    #[default]
    #[serde(rename = "-")]
    Dash,
    #[serde(rename = "*")]
    Asterisk,
    #[serde(rename = "+")]
    Plus,
}

impl BulletMarker {
    pub fn as_char(self) -> char {
        match self {
            BulletMarker::Dash => '-',
            BulletMarker::Asterisk => '*',
            BulletMarker::Plus => '+',
        }
    }
}

/// Delimiter written after an ordered list number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum OrderedMarker {
    #[default]
    #[serde(rename = "1.")]
    Period,
    #[serde(rename = "1)")]
    Paren,
}

impl OrderedMarker {
    pub fn as_char(self) -> char {
        match self {
            OrderedMarker::Period => '.',
            OrderedMarker::Paren => ')',
        }
    }
}

/// What a soft line break renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftBreak {
    Space,
    #[default]
    Newline,
}

/// Emphasis delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum EmphasisDelimiter {
    #[default]
    #[serde(rename = "*")]
    Asterisk,
    #[serde(rename = "_")]
    Underscore,
}

impl EmphasisDelimiter {
    pub fn as_str(self) -> &'static str {
        match self {
            EmphasisDelimiter::Asterisk => "*",
            EmphasisDelimiter::Underscore => "_",
        }
    }
}

/// Strong delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum StrongDelimiter {
    #[default]
    #[serde(rename = "**")]
    Asterisks,
    #[serde(rename = "__")]
    Underscores,
}

impl StrongDelimiter {
    pub fn as_str(self) -> &'static str {
        match self {
            StrongDelimiter::Asterisks => "**",
            StrongDelimiter::Underscores => "__",
        }
    }
}

/// Fence for code blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum FenceMarker {
    #[default]
    #[serde(rename = "```")]
    Backticks,
    #[serde(rename = "~~~")]
    Tildes,
}

impl FenceMarker {
    pub fn as_char(self) -> char {
        match self {
            FenceMarker::Backticks => '`',
            FenceMarker::Tildes => '~',
        }
    }
}

/// Horizontal rule string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ThematicBreakMarker {
    #[default]
    #[serde(rename = "---")]
    Dashes,
    #[serde(rename = "***")]
    Asterisks,
    #[serde(rename = "___")]
    Underscores,
}

impl ThematicBreakMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            ThematicBreakMarker::Dashes => "---",
            ThematicBreakMarker::Asterisks => "***",
            ThematicBreakMarker::Underscores => "___",
        }
    }
}

/// Options for Markdown rendering
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Heading style (atx, atx-closed or setext)
    pub heading_style: HeadingStyle,

    /// Bullet list marker
    pub bullet_marker: BulletMarker,

    /// Ordered list delimiter
    pub ordered_marker: OrderedMarker,

    /// Minimum indent of list item content; the marker is padded up to it
    pub indent_size: usize,

    /// Escape `|` inside table cells
    pub escape_pipe_in_tables: bool,

    /// Rendering of soft line breaks
    pub soft_break: SoftBreak,

    /// Emphasis delimiter
    pub emphasis_delimiter: EmphasisDelimiter,

    /// Strong delimiter
    pub strong_delimiter: StrongDelimiter,

    /// Fence for code blocks
    pub fenced_code_marker: FenceMarker,

    /// Horizontal rule string
    pub thematic_break_marker: ThematicBreakMarker,

    /// Paragraph wrap width; 0 disables wrapping
    pub preferred_line_length: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            bullet_marker: BulletMarker::Dash,
            ordered_marker: OrderedMarker::Period,
            indent_size: 2,
            escape_pipe_in_tables: true,
            soft_break: SoftBreak::Newline,
            emphasis_delimiter: EmphasisDelimiter::Asterisk,
            strong_delimiter: StrongDelimiter::Asterisks,
            fenced_code_marker: FenceMarker::Backticks,
            thematic_break_marker: ThematicBreakMarker::Dashes,
            preferred_line_length: 0,
        }
    }
}
