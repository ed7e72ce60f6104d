//! Error types and handling for tree transformation operations

use thiserror::Error;

use crate::tree::{NodeId, NodeKind};

/// Main error type for Weft engine operations
#[derive(Debug, Error)]
pub enum WeftError {
    /// A structural invariant of the lossless tree was violated.
    ///
    /// These are programming errors in a front end or a visitor; processing
    /// of the affected tree must abort rather than emit corrupted text.
    #[error("Structural invariant violated at node {node}: {message}")]
    InvariantViolation { node: NodeId, message: String },

    /// A visitor returned a node of an incompatible kind at a position.
    #[error(
        "Visitor contract violated at node {node}: cannot substitute {actual:?} for {expected:?}"
    )]
    ContractViolation {
        node: NodeId,
        expected: NodeKind,
        actual: NodeKind,
    },

    /// A traversal was cancelled cooperatively. This is a control signal,
    /// not a fault; the input tree is untouched.
    #[error("Traversal cancelled")]
    Cancelled,

    /// A type lookup was attempted against a resolution scope that has
    /// already been closed.
    #[error("Resolution scope {scope} is closed")]
    ScopeClosed { scope: u64 },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Invariant,
    Contract,
    Cancelled,
    Scope,
}

impl WeftError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeftError::InvariantViolation { .. } => ErrorKind::Invariant,
            WeftError::ContractViolation { .. } => ErrorKind::Contract,
            WeftError::Cancelled => ErrorKind::Cancelled,
            WeftError::ScopeClosed { .. } => ErrorKind::Scope,
        }
    }

    /// Check if this error is recoverable (can continue processing other trees)
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cancelled | ErrorKind::Scope)
    }

    /// Check if this error is the cooperative-cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WeftError::Cancelled)
    }

    /// Create an invariant violation for a node
    pub fn invariant(node: NodeId, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            node,
            message: message.into(),
        }
    }

    /// Create a contract violation for an incompatible substitution
    pub fn contract(node: NodeId, expected: NodeKind, actual: NodeKind) -> Self {
        Self::ContractViolation {
            node,
            expected,
            actual,
        }
    }
}
