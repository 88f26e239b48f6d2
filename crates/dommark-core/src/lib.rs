//! dommark-core - Markdown document model and rendering
//!
//! This crate provides the intermediate document tree that `dommark` builds
//! from a DOM, a relationship pass that wires parent/sibling links onto a
//! finished tree, and the CommonMark renderer.
//!
//! # Architecture
//!
//! ```text
//! DOM ──walker + rules──▶ ┌──────────────┐ ──relationships──▶ verified tree
//!                         │ Markdown AST │
//!                         └──────────────┘ ──render_markdown──▶ Markdown String
//! ```
//!
//! # Example
//!
//! ```rust
//! use dommark_core::builder::{document, heading, paragraph, strong, text};
//! use dommark_core::{render_markdown, RenderOptions};
//!
//! let ast = document(vec![
//!     heading(1, vec![text("Hello World")]),
//!     paragraph(vec![
//!         text("This is "),
//!         strong(vec![text("bold")]),
//!         text(" text."),
//!     ]),
//! ]);
//!
//! let markdown = render_markdown(&ast, &RenderOptions::default());
//! assert_eq!(markdown, "# Hello World\n\nThis is **bold** text.");
//! ```

mod ast;
pub mod builder;
mod options;
mod relations;
mod render;

pub use ast::{Alignment, Node, NodeKind};
pub use options::{
    BulletMarker, EmphasisDelimiter, FenceMarker, HeadingStyle, OrderedMarker, RenderOptions,
    SoftBreak, StrongDelimiter, ThematicBreakMarker,
};
pub use relations::{
    establish_relationships, verify_relationships, Links, NodeId, Relationships, StructureError,
};
pub use render::render_markdown;
