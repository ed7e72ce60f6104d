//! Lossless source tree
//!
//! This module implements the immutable, identity-bearing tree that the rest
//! of the engine operates on. Every node captures the formatting that
//! surrounded it in the original text (prefix whitespace and comments, an
//! optional suffix, the original byte span), which is what makes
//! source-to-source transformation lossless: printing an untouched subtree
//! reproduces its original bytes exactly.
//!
//! Nodes are immutable once constructed. A rewrite never mutates a node in
//! place; it produces a new node value, sharing unchanged children by
//! reference. Identity (`NodeId`) is minted from a process-wide counter and
//! is never derived from content, so two structurally identical nodes built
//! independently still have distinct ids.
//!
//! ## Example
//!
//! ```rust,ignore
//! use weft_core::tree::{NodeKind, TreeBuilder, print};
//!
//! let unit = TreeBuilder::new(NodeKind::CompilationUnit)
//!     .child(
//!         TreeBuilder::new(NodeKind::Import)
//!             .token("", "import")
//!             .token(" ", "a.b")
//!             .token("", ";")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(print(&unit), "import a.b;");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use biome_text_size::TextRange;
use serde::{Deserialize, Serialize};

use crate::error::WeftError;
use crate::result::Result;
use crate::types::TypeRef;

pub mod printer;
pub mod style;

pub use printer::{Printer, print};
pub use style::{IndentUnit, LineEnding, SourceStyle};

/// Process-unique, stable identifier for one program entity.
///
/// Ids survive rewrites that preserve the entity (the `with_*` methods keep
/// the id of the node they were called on); only `Node::new` mints a fresh id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    /// Mint a fresh, process-unique id
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for reporting
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The semantic shape of a node, as a closed set of tagged variants.
///
/// Per-language grammars map their constructs onto these tags; visitor
/// dispatch is pattern matching over the tag, and unhandled tags recurse
/// structurally with no output change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    CompilationUnit,
    Import,
    ClassDecl,
    MethodDecl,
    FieldDecl,
    Block,
    Statement,
    Expression,
    Identifier,
    Literal,
    Unknown,
}

/// Coarse grouping of node kinds used for substitution compatibility checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindCategory {
    Unit,
    Import,
    Declaration,
    Statement,
    Expression,
    Unknown,
}

impl NodeKind {
    /// The category this kind belongs to
    pub fn category(&self) -> KindCategory {
        match self {
            NodeKind::CompilationUnit => KindCategory::Unit,
            NodeKind::Import => KindCategory::Import,
            NodeKind::ClassDecl | NodeKind::MethodDecl | NodeKind::FieldDecl => {
                KindCategory::Declaration
            }
            NodeKind::Block | NodeKind::Statement => KindCategory::Statement,
            NodeKind::Expression | NodeKind::Identifier | NodeKind::Literal => {
                KindCategory::Expression
            }
            NodeKind::Unknown => KindCategory::Unknown,
        }
    }

    /// Whether a node of this kind may stand at a position originally held
    /// by a node of `other`'s kind. `Unknown` is compatible with anything.
    pub fn compatible_with(&self, other: NodeKind) -> bool {
        let (a, b) = (self.category(), other.category());
        a == KindCategory::Unknown || b == KindCategory::Unknown || a == b
    }
}

/// A leaf token: the token text plus the whitespace that preceded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Whitespace captured verbatim before the token
    pub prefix: String,
    /// The token text itself
    pub text: String,
}

impl Token {
    pub fn new(prefix: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            text: text.into(),
        }
    }

    /// Printed byte length of this token including its prefix
    pub fn text_len(&self) -> usize {
        self.prefix.len() + self.text.len()
    }
}

/// Formatting metadata attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Formatting {
    /// Whitespace and comments captured verbatim before the node's first token
    pub prefix: String,
    /// Trailing text after the node's last child (e.g. space before a closing token)
    pub suffix: String,
    /// Byte span in the original text; `None` for synthetic nodes
    pub span: Option<TextRange>,
}

impl Formatting {
    /// Formatting with only a prefix
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: String::new(),
            span: None,
        }
    }

    /// Formatting for a synthetic node that carries no original text
    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_span(mut self, span: TextRange) -> Self {
        self.span = Some(span);
        self
    }

    /// Whether this node was produced by a rewrite rather than a front end
    pub fn is_synthetic(&self) -> bool {
        self.span.is_none()
    }
}

/// One ordered child of a node: a subtree or a leaf token
#[derive(Debug, Clone)]
pub enum Child {
    Tree(Arc<Node>),
    Token(Token),
}

impl Child {
    /// Printed byte length of this child
    pub fn text_len(&self) -> usize {
        match self {
            Child::Tree(node) => node.text_len(),
            Child::Token(token) => token.text_len(),
        }
    }

    pub fn as_node(&self) -> Option<&Arc<Node>> {
        match self {
            Child::Tree(node) => Some(node),
            Child::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Child::Tree(_) => None,
            Child::Token(token) => Some(token),
        }
    }
}

/// An immutable node of the lossless tree.
///
/// Construction fails fast (panics) if the declared original span does not
/// cover the node's full printed text; a later print pass would otherwise
/// silently produce corrupted output.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    formatting: Formatting,
    children: Vec<Child>,
    /// Back-reference into the type attribution cache; present only on nodes
    /// that denote typed program entities.
    type_ref: Option<TypeRef>,
    /// Source path, meaningful on `CompilationUnit` nodes only. Never printed.
    path: Option<PathBuf>,
}

impl Node {
    /// Construct a node with a fresh id.
    ///
    /// # Panics
    ///
    /// Panics if `formatting.span` is present but its length does not equal
    /// the node's printed byte length.
    pub fn new(kind: NodeKind, formatting: Formatting, children: Vec<Child>) -> Arc<Self> {
        let node = Self {
            id: NodeId::fresh(),
            kind,
            formatting,
            children,
            type_ref: None,
            path: None,
        };
        node.assert_span_covers_text();
        Arc::new(node)
    }

    fn assert_span_covers_text(&self) {
        if let Some(span) = self.formatting.span {
            let printed = self.text_len();
            assert!(
                usize::from(span.len()) == printed,
                "formatting span of node {} ({:?}) covers {} bytes but the node prints {} bytes",
                self.id,
                self.kind,
                u32::from(span.len()),
                printed,
            );
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn formatting(&self) -> &Formatting {
        &self.formatting
    }

    /// Ordered children; insertion order is print order
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Iterate over subtree children only, skipping leaf tokens
    pub fn child_nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.children.iter().filter_map(Child::as_node)
    }

    pub fn type_ref(&self) -> Option<&TypeRef> {
        self.type_ref.as_ref()
    }

    /// Source path of a compilation unit, if the front end recorded one
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Printed byte length of this node including its formatting
    pub fn text_len(&self) -> usize {
        self.formatting.prefix.len()
            + self
                .children
                .iter()
                .map(Child::text_len)
                .sum::<usize>()
            + self.formatting.suffix.len()
    }

    fn clone_with(&self, mutate: impl FnOnce(&mut Node)) -> Arc<Node> {
        let mut node = Node {
            id: self.id,
            kind: self.kind,
            formatting: self.formatting.clone(),
            children: self.children.clone(),
            type_ref: self.type_ref.clone(),
            path: self.path.clone(),
        };
        mutate(&mut node);
        node.assert_span_covers_text();
        Arc::new(node)
    }

    /// New node with the child at position `k` replaced, sharing all other
    /// children by reference. The id is preserved: this is still the same
    /// program entity.
    ///
    /// # Panics
    ///
    /// Panics if `k` is out of bounds.
    pub fn with_child(&self, k: usize, replacement: Arc<Node>) -> Arc<Node> {
        self.clone_with(|node| {
            node.formatting.span = None;
            node.children[k] = Child::Tree(replacement);
        })
    }

    /// New node with the given children, id preserved
    pub fn with_children(&self, children: Vec<Child>) -> Arc<Node> {
        self.clone_with(|node| {
            node.formatting.span = None;
            node.children = children;
        })
    }

    /// New node with the given formatting, id preserved
    pub fn with_formatting(&self, formatting: Formatting) -> Arc<Node> {
        self.clone_with(|node| node.formatting = formatting)
    }

    /// New node with a type attribution attached, id preserved
    pub fn with_type(&self, type_ref: TypeRef) -> Arc<Node> {
        self.clone_with(|node| node.type_ref = Some(type_ref))
    }

    /// New node carrying a source path, id preserved
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Arc<Node> {
        self.clone_with(|node| node.path = Some(path.into()))
    }

    /// Identity comparison: is this the same program entity?
    pub fn same_node(&self, other: &Node) -> bool {
        self.id == other.id
    }

    /// Structural comparison: would the two nodes print the same output?
    ///
    /// Ignores ids, spans, type attributions, and markers; compares kinds,
    /// formatting text, and children recursively.
    pub fn content_eq(&self, other: &Node) -> bool {
        if self.kind != other.kind
            || self.formatting.prefix != other.formatting.prefix
            || self.formatting.suffix != other.formatting.suffix
            || self.children.len() != other.children.len()
        {
            return false;
        }
        self.children
            .iter()
            .zip(other.children.iter())
            .all(|(a, b)| match (a, b) {
                (Child::Tree(a), Child::Tree(b)) => a.content_eq(b),
                (Child::Token(a), Child::Token(b)) => a == b,
                _ => false,
            })
    }
}

/// Validate the span bookkeeping of a freshly parsed tree.
///
/// Front ends call this after handing over a root: every spanned node must
/// print exactly as many bytes as its span covers, child spans must lie
/// inside their parent's span, and the root span must cover the whole text.
/// This is the checked counterpart of the fail-fast constructor assertion.
pub fn validate_spans(root: &Arc<Node>, source_len: usize) -> Result<()> {
    if let Some(span) = root.formatting().span {
        if usize::from(span.start()) != 0 || usize::from(span.end()) != source_len {
            return Err(WeftError::invariant(
                root.id(),
                format!(
                    "root span {:?} does not cover the full source of {} bytes",
                    span, source_len
                ),
            ));
        }
    }
    validate_rec(root)
}

fn validate_rec(node: &Arc<Node>) -> Result<()> {
    if let Some(span) = node.formatting().span {
        if usize::from(span.len()) != node.text_len() {
            return Err(WeftError::invariant(
                node.id(),
                format!(
                    "span covers {} bytes but the node prints {} bytes",
                    u32::from(span.len()),
                    node.text_len()
                ),
            ));
        }
        for child in node.child_nodes() {
            if let Some(child_span) = child.formatting().span {
                if child_span.start() < span.start() || child_span.end() > span.end() {
                    return Err(WeftError::invariant(
                        child.id(),
                        format!("child span {:?} escapes parent span {:?}", child_span, span),
                    ));
                }
            }
        }
    }
    for child in node.child_nodes() {
        validate_rec(child)?;
    }
    Ok(())
}

/// Builder for assembling nodes while capturing formatting.
///
/// Front ends and tests use this instead of spelling out `Formatting` and
/// `Child` values by hand.
#[derive(Debug)]
pub struct TreeBuilder {
    kind: NodeKind,
    formatting: Formatting,
    children: Vec<Child>,
    path: Option<PathBuf>,
}

impl TreeBuilder {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            formatting: Formatting::default(),
            children: Vec::new(),
            path: None,
        }
    }

    /// Verbatim prefix text (whitespace and comments before the node)
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.formatting.prefix = prefix.into();
        self
    }

    /// Verbatim suffix text (after the node's last child)
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.formatting.suffix = suffix.into();
        self
    }

    /// Original byte span of the node
    pub fn span(mut self, span: TextRange) -> Self {
        self.formatting.span = Some(span);
        self
    }

    /// Append a leaf token with its leading whitespace
    pub fn token(mut self, prefix: impl Into<String>, text: impl Into<String>) -> Self {
        self.children.push(Child::Token(Token::new(prefix, text)));
        self
    }

    /// Append a subtree child
    pub fn child(mut self, node: Arc<Node>) -> Self {
        self.children.push(Child::Tree(node));
        self
    }

    /// Record the source path (compilation units)
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Construct the node, minting a fresh id.
    ///
    /// # Panics
    ///
    /// Panics under the same span-coverage rule as [`Node::new`].
    pub fn build(self) -> Arc<Node> {
        let node = Node::new(self.kind, self.formatting, self.children);
        match self.path {
            Some(path) => node.with_path(path),
            None => node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biome_text_size::TextSize;

    fn ident(prefix: &str, text: &str) -> Arc<Node> {
        TreeBuilder::new(NodeKind::Identifier)
            .token(prefix, text)
            .build()
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = ident("", "a");
        let b = ident("", "a");
        assert_ne!(a.id(), b.id());
        assert!(a.content_eq(&b));
        assert!(!a.same_node(&b));
    }

    #[test]
    fn with_child_shares_untouched_children() {
        let x = ident(" ", "x");
        let y = ident(" ", "y");
        let stmt = TreeBuilder::new(NodeKind::Statement)
            .child(x.clone())
            .child(y.clone())
            .build();

        let z = ident(" ", "z");
        let rewritten = stmt.with_child(1, z.clone());

        assert!(rewritten.same_node(&stmt));
        assert!(Arc::ptr_eq(
            rewritten.children()[0].as_node().unwrap(),
            &x
        ));
        assert!(Arc::ptr_eq(
            rewritten.children()[1].as_node().unwrap(),
            &z
        ));
        // original untouched
        assert!(Arc::ptr_eq(stmt.children()[1].as_node().unwrap(), &y));
    }

    #[test]
    fn content_eq_ignores_identity_but_not_formatting() {
        let a = ident("  ", "x");
        let b = ident("  ", "x");
        let c = ident(" ", "x");
        assert!(a.content_eq(&b));
        assert!(!a.content_eq(&c));
    }

    #[test]
    #[should_panic(expected = "formatting span")]
    fn span_shorter_than_text_fails_fast() {
        // token prints 3 bytes, span claims 2
        TreeBuilder::new(NodeKind::Identifier)
            .token(" ", "ab")
            .span(TextRange::new(TextSize::from(0), TextSize::from(2)))
            .build();
    }

    #[test]
    fn validate_spans_accepts_consistent_tree() {
        let inner = TreeBuilder::new(NodeKind::Identifier)
            .token("", "ab")
            .span(TextRange::new(TextSize::from(0), TextSize::from(2)))
            .build();
        let root = TreeBuilder::new(NodeKind::CompilationUnit)
            .child(inner)
            .suffix("\n")
            .span(TextRange::new(TextSize::from(0), TextSize::from(3)))
            .build();
        assert!(validate_spans(&root, 3).is_ok());
    }

    #[test]
    fn validate_spans_rejects_partial_root() {
        let root = TreeBuilder::new(NodeKind::CompilationUnit)
            .token("", "ab")
            .span(TextRange::new(TextSize::from(0), TextSize::from(2)))
            .build();
        let err = validate_spans(&root, 10).unwrap_err();
        assert!(err.to_string().contains("does not cover"));
    }

    #[test]
    fn kind_compatibility_groups_by_category() {
        assert!(NodeKind::Identifier.compatible_with(NodeKind::Literal));
        assert!(NodeKind::Block.compatible_with(NodeKind::Statement));
        assert!(!NodeKind::Expression.compatible_with(NodeKind::ClassDecl));
        assert!(NodeKind::Unknown.compatible_with(NodeKind::ClassDecl));
    }
}
