//! Cursor: transient ancestor path built during traversal
//!
//! The tree itself is a pure DAG of parent-unaware nodes; ancestry is
//! reconstructed during traversal as a singly linked chain of cursor frames.
//! Cursors for sibling subtrees never alias each other's state, and a cursor
//! is discarded when its traversal ends, never persisted.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use crate::tree::{Node, NodeKind};

struct Frame {
    node: Arc<Node>,
    parent: Option<Rc<Frame>>,
    /// Transient per-traversal key-value state scoped to this frame.
    /// Traversal is single-threaded per tree, so interior mutability via
    /// `RefCell` is sufficient.
    messages: RefCell<HashMap<String, Value>>,
}

/// A read-only path from the tree root to the node under visitation
#[derive(Clone)]
pub struct Cursor {
    frame: Rc<Frame>,
}

impl Cursor {
    /// Cursor positioned at a traversal root
    pub fn root(node: Arc<Node>) -> Self {
        Self {
            frame: Rc::new(Frame {
                node,
                parent: None,
                messages: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Extend the chain one level down. Used by the traversal driver and by
    /// visitors performing explicit partial descent.
    pub fn child(&self, node: Arc<Node>) -> Self {
        Self {
            frame: Rc::new(Frame {
                node,
                parent: Some(Rc::clone(&self.frame)),
                messages: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The node currently under visitation
    pub fn node(&self) -> &Arc<Node> {
        &self.frame.node
    }

    /// Cursor over the parent node, if any
    pub fn parent(&self) -> Option<Cursor> {
        self.frame.parent.as_ref().map(|frame| Cursor {
            frame: Rc::clone(frame),
        })
    }

    /// Number of ancestors above this cursor
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = &self.frame;
        while let Some(parent) = &frame.parent {
            depth += 1;
            frame = parent;
        }
        depth
    }

    /// Nodes from the current position up to the root, inclusive
    pub fn path(&self) -> Vec<Arc<Node>> {
        let mut nodes = Vec::new();
        let mut frame = Some(&self.frame);
        while let Some(current) = frame {
            nodes.push(Arc::clone(&current.node));
            frame = current.parent.as_ref();
        }
        nodes
    }

    /// Nearest node of kind `kind` on the path, including the current node
    pub fn first_enclosing(&self, kind: NodeKind) -> Option<Arc<Node>> {
        self.first_enclosing_where(|node| node.kind() == kind)
    }

    /// Nearest node on the path satisfying `pred`, including the current node
    pub fn first_enclosing_where(&self, pred: impl Fn(&Node) -> bool) -> Option<Arc<Node>> {
        let mut frame = Some(&self.frame);
        while let Some(current) = frame {
            if pred(&current.node) {
                return Some(Arc::clone(&current.node));
            }
            frame = current.parent.as_ref();
        }
        None
    }

    /// Store a message on this frame, visible to this frame and descendants
    /// via [`Cursor::nearest_message`]
    pub fn put_message(&self, key: impl Into<String>, value: Value) {
        self.frame.messages.borrow_mut().insert(key.into(), value);
    }

    /// Message stored on this frame only
    pub fn message(&self, key: &str) -> Option<Value> {
        self.frame.messages.borrow().get(key).cloned()
    }

    /// Nearest message for `key` walking from this frame toward the root
    pub fn nearest_message(&self, key: &str) -> Option<Value> {
        let mut frame = Some(&self.frame);
        while let Some(current) = frame {
            if let Some(value) = current.messages.borrow().get(key) {
                return Some(value.clone());
            }
            frame = current.parent.as_ref();
        }
        None
    }
}
