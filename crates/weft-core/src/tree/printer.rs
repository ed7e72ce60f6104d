//! Printer: replay a lossless tree back to text
//!
//! For any subtree untouched by a rewrite, the emitted text is byte-identical
//! to the original captured formatting. Replaced subtrees print with their
//! own formatting metadata; a synthetic statement-level node with no
//! formatting at all falls back to the file's dominant style (inferred once
//! at parse time) for its line break and indentation.

use std::sync::Arc;

use tracing::trace;

use super::style::SourceStyle;
use super::{Child, KindCategory, Node, NodeKind};

/// Prints trees, optionally filling in formatting for synthetic nodes from
/// the file's dominant style.
#[derive(Debug, Default, Clone)]
pub struct Printer {
    style: Option<SourceStyle>,
}

impl Printer {
    /// Printer that replays stored formatting only
    pub fn new() -> Self {
        Self::default()
    }

    /// Printer that applies `style` to synthetic nodes lacking formatting
    pub fn with_style(style: SourceStyle) -> Self {
        Self { style: Some(style) }
    }

    /// Produce the text of a tree
    pub fn print(&self, root: &Arc<Node>) -> String {
        let mut out = String::with_capacity(root.text_len());
        self.print_node(root, 0, &mut out);
        trace!(node = %root.id(), bytes = out.len(), "printed tree");
        out
    }

    fn print_node(&self, node: &Arc<Node>, depth: usize, out: &mut String) {
        let formatting = node.formatting();
        if formatting.prefix.is_empty()
            && formatting.is_synthetic()
            && !out.is_empty()
            && node.kind().category() == KindCategory::Statement
        {
            // Fresh statement inserted by a rewrite with no formatting of
            // its own: fall back to the file's dominant style.
            if let Some(style) = &self.style {
                out.push_str(style.line_ending.as_str());
                out.push_str(&style.indent_text(depth));
            }
        } else {
            out.push_str(&formatting.prefix);
        }

        let child_depth = depth + usize::from(node.kind() == NodeKind::Block);
        for child in node.children() {
            match child {
                Child::Tree(child_node) => self.print_node(child_node, child_depth, out),
                Child::Token(token) => {
                    out.push_str(&token.prefix);
                    out.push_str(&token.text);
                }
            }
        }

        out.push_str(&formatting.suffix);
    }
}

/// Print a tree replaying stored formatting only
pub fn print(root: &Arc<Node>) -> String {
    Printer::new().print(root)
}
