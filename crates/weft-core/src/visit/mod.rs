//! Cursor-based visitor framework
//!
//! A [`TreeVisitor`] specializes the generic recursive traversal by handling
//! only the node kinds it cares about; everything else passes through
//! structurally with no output change, which is what lets a single-purpose
//! visitor run safely over a whole multi-language tree.
//!
//! Control flow is declarative: [`PreVisit`] is a closed set of return
//! signals, not exceptions. `Descend` continues the default left-to-right
//! recursion, `Replace` substitutes a subtree without recursing into the
//! original children, and `Stop` halts the remainder of the traversal
//! (skipping `post_visit` for everything unvisited).
//!
//! Visitors compose by sequential application only: visitor A runs to
//! completion on a tree before visitor B sees A's output. Per-traversal
//! mutable state belongs on the context value threaded through every call;
//! a visitor instance carries only configuration fixed at construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::WeftError;
use crate::result::Result;
use crate::tree::{Child, Node};

pub mod cursor;

pub use cursor::Cursor;

/// Cooperative cancellation flag checked at node boundaries.
///
/// Cancellation is a control signal, not an error: a cancelled traversal
/// unwinds cleanly and the input tree is left untouched.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every traversal holding this token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Return signal of [`TreeVisitor::pre_visit`]
#[derive(Debug)]
pub enum PreVisit {
    /// Recurse into the node's children left-to-right, then `post_visit`.
    /// Returning the identical `Arc` is the structural pass-through.
    Descend(Arc<Node>),
    /// Substitute the node and do not recurse into the original children.
    /// A visitor wanting partial descent recurses explicitly via
    /// [`Cursor::child`] before returning.
    Replace(Arc<Node>),
    /// Halt the entire traversal here. Nothing deeper or later is visited
    /// and `post_visit` is skipped for the unvisited remainder.
    Stop,
}

/// A traversal strategy over the tagged node-kind set.
///
/// Both hooks default to structural pass-through, so an empty `impl` is a
/// no-op visitor that returns the input tree referentially intact.
pub trait TreeVisitor<C> {
    /// Invoked before descending into a node's children
    fn pre_visit(&mut self, node: &Arc<Node>, _cursor: &Cursor, _ctx: &mut C) -> PreVisit {
        PreVisit::Descend(Arc::clone(node))
    }

    /// Invoked after children have been visited and potentially replaced;
    /// used for bottom-up fix-ups
    fn post_visit(&mut self, node: Arc<Node>, _cursor: &Cursor, _ctx: &mut C) -> Arc<Node> {
        node
    }
}

/// Drives one visitor over one tree, owning the cursor chain for its
/// duration. `run` is synchronous and single-threaded per tree; independent
/// trees go through [`Traversal::run_batch`].
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    cancel: CancellationToken,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Traversal that checks `token` at every node boundary
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self { cancel: token }
    }

    /// Run `visitor` over `root`, returning the (possibly partially
    /// replaced) output tree. Untouched subtrees are returned by reference.
    pub fn run<C, V>(&self, root: &Arc<Node>, visitor: &mut V, ctx: &mut C) -> Result<Arc<Node>>
    where
        V: TreeVisitor<C> + ?Sized,
    {
        let mut stopped = false;
        let out = self.visit_node(root, None, visitor, ctx, &mut stopped)?;
        trace!(root = %root.id(), changed = !Arc::ptr_eq(root, &out), stopped, "traversal done");
        Ok(out)
    }

    /// Run several visitors in sequence: each runs to completion before the
    /// next sees its output. Two visitors never interleave within one
    /// traversal.
    pub fn pipeline<C>(
        &self,
        root: &Arc<Node>,
        visitors: &mut [&mut dyn TreeVisitor<C>],
        ctx: &mut C,
    ) -> Result<Arc<Node>> {
        let mut current = Arc::clone(root);
        for visitor in visitors.iter_mut() {
            current = self.run(&current, &mut **visitor, ctx)?;
        }
        Ok(current)
    }

    /// Visit independent trees concurrently. Each tree gets its own visitor
    /// and context from `factory`, so no mutable state is shared; per-tree
    /// sequential semantics are unchanged.
    pub fn run_batch<C, V, F>(&self, trees: &[Arc<Node>], factory: F) -> Result<Vec<Arc<Node>>>
    where
        V: TreeVisitor<C>,
        F: Fn() -> (V, C) + Sync,
    {
        trees
            .par_iter()
            .map(|tree| {
                let (mut visitor, mut ctx) = factory();
                self.run(tree, &mut visitor, &mut ctx)
            })
            .collect()
    }

    fn visit_node<C, V>(
        &self,
        node: &Arc<Node>,
        parent: Option<&Cursor>,
        visitor: &mut V,
        ctx: &mut C,
        stopped: &mut bool,
    ) -> Result<Arc<Node>>
    where
        V: TreeVisitor<C> + ?Sized,
    {
        if self.cancel.is_cancelled() {
            debug!(node = %node.id(), "traversal cancelled");
            return Err(WeftError::Cancelled);
        }

        let cursor = match parent {
            Some(parent) => parent.child(Arc::clone(node)),
            None => Cursor::root(Arc::clone(node)),
        };

        let entered = match visitor.pre_visit(node, &cursor, ctx) {
            PreVisit::Stop => {
                *stopped = true;
                return Ok(Arc::clone(node));
            }
            PreVisit::Replace(replacement) => {
                ensure_compatible(node, &replacement)?;
                return Ok(replacement);
            }
            PreVisit::Descend(entered) => {
                if !Arc::ptr_eq(node, &entered) {
                    ensure_compatible(node, &entered)?;
                }
                entered
            }
        };
        let cursor = if Arc::ptr_eq(node, &entered) {
            cursor
        } else {
            match parent {
                Some(parent) => parent.child(Arc::clone(&entered)),
                None => Cursor::root(Arc::clone(&entered)),
            }
        };

        // Copy-on-write recursion: children are re-collected only when one
        // of them actually changed, so a pass-through visit returns the
        // identical node.
        let mut new_children: Option<Vec<Child>> = None;
        for (idx, child) in entered.children().iter().enumerate() {
            if *stopped {
                break;
            }
            let Child::Tree(child_node) = child else {
                continue;
            };
            let visited = self.visit_node(child_node, Some(&cursor), visitor, ctx, stopped)?;
            if !Arc::ptr_eq(child_node, &visited) {
                ensure_compatible(child_node, &visited)?;
                new_children.get_or_insert_with(|| entered.children().to_vec())[idx] =
                    Child::Tree(visited);
            }
        }
        let current = match new_children {
            Some(children) => entered.with_children(children),
            None => entered,
        };

        if *stopped {
            return Ok(current);
        }

        // Child substitution rebuilt the node; the post_visit cursor must
        // agree with the node it is handed.
        let cursor = if Arc::ptr_eq(&current, cursor.node()) {
            cursor
        } else {
            match parent {
                Some(parent) => parent.child(Arc::clone(&current)),
                None => Cursor::root(Arc::clone(&current)),
            }
        };
        let result = visitor.post_visit(Arc::clone(&current), &cursor, ctx);
        if !Arc::ptr_eq(&current, &result) {
            ensure_compatible(node, &result)?;
        }
        Ok(result)
    }
}

/// Kind-compatibility contract check applied at substitution time
fn ensure_compatible(original: &Arc<Node>, replacement: &Arc<Node>) -> Result<()> {
    if replacement.kind().compatible_with(original.kind()) {
        Ok(())
    } else {
        Err(WeftError::contract(
            original.id(),
            original.kind(),
            replacement.kind(),
        ))
    }
}
