//! Weft Core
//!
//! Core engine for lossless source-to-source transformation. This crate
//! provides the tree data model that preserves every byte of original
//! formatting, the cursor-based visitor framework that queries and rewrites
//! trees, scoped type attribution with referential identity, markers for
//! search and diagnostics, and the printer that re-emits text byte-identical
//! wherever no semantic change was made.
//!
//! Per-language front ends, CLI tooling, and recipe distribution live
//! outside this crate: a front end hands in a root node plus the original
//! text, transformation authors implement [`TreeVisitor`], and collaborators
//! read markers back out after a traversal.

pub mod error;
pub mod markers;
pub mod result;
pub mod search;
pub mod tree; // Lossless tree, printer, and source style
pub mod types; // Semantic types and the scoped attribution cache
pub mod visit; // Cursor chains and the visitor traversal driver

// Re-export commonly used types
pub use error::{ErrorKind, WeftError};
pub use markers::{Marker, MarkerBus};
pub use result::{Result, ResultExt};
pub use search::{FindKind, FindSourceFiles};
pub use tree::{
    Child, Formatting, IndentUnit, KindCategory, LineEnding, Node, NodeId, NodeKind, Printer,
    SourceStyle, Token, TreeBuilder, print, validate_spans,
};
pub use types::{
    Member, RawType, ResolutionScope, SemType, TypeCache, TypeRef, TypeSignature, TypeSource,
};
pub use visit::{CancellationToken, Cursor, PreVisit, Traversal, TreeVisitor};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
