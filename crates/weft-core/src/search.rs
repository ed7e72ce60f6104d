//! Search visitors: pure finders that report hits as markers
//!
//! A search visitor never rewrites the tree. It records hits on the
//! [`MarkerBus`] carried as its traversal context and, where it can decide
//! its answer early, short-circuits the rest of the tree with
//! [`PreVisit::Stop`].

use std::sync::Arc;

use glob::{Pattern, PatternError};
use tracing::trace;

use crate::markers::MarkerBus;
use crate::tree::{Node, NodeKind};
use crate::visit::{Cursor, PreVisit, TreeVisitor};

/// Matches compilation units against a file glob.
///
/// The pattern is compiled once at construction; the visitor itself stays
/// stateless across trees. It only needs to look at the root compilation
/// unit to answer "is this the target file", so it stops in `pre_visit`
/// without walking the subtree either way.
#[derive(Debug, Clone)]
pub struct FindSourceFiles {
    pattern: Pattern,
}

impl FindSourceFiles {
    /// Compile a glob such as `src/**/*.java`
    pub fn new(pattern: &str) -> std::result::Result<Self, PatternError> {
        Ok(Self {
            pattern: Pattern::new(pattern)?,
        })
    }
}

impl TreeVisitor<MarkerBus> for FindSourceFiles {
    fn pre_visit(&mut self, node: &Arc<Node>, _cursor: &Cursor, markers: &mut MarkerBus) -> PreVisit {
        if node.kind() == NodeKind::CompilationUnit {
            if let Some(path) = node.path() {
                if self.pattern.matches_path(path) {
                    trace!(node = %node.id(), ?path, "source file matched");
                    markers.search(node, format!("matches {}", self.pattern));
                }
            }
            // matched or not, nothing deeper can change the answer
            return PreVisit::Stop;
        }
        PreVisit::Descend(Arc::clone(node))
    }
}

/// Marks every node of one kind
#[derive(Debug, Clone)]
pub struct FindKind {
    kind: NodeKind,
}

impl FindKind {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind }
    }
}

impl TreeVisitor<MarkerBus> for FindKind {
    fn pre_visit(&mut self, node: &Arc<Node>, _cursor: &Cursor, markers: &mut MarkerBus) -> PreVisit {
        if node.kind() == self.kind {
            markers.search(node, format!("kind {:?}", self.kind));
        }
        PreVisit::Descend(Arc::clone(node))
    }
}
