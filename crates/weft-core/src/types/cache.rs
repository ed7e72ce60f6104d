//! Type attribution cache with explicit resolution scopes
//!
//! A [`ResolutionScope`] bounds the lifetime within which type identity is
//! canonical: `resolve` is idempotent per scope, and closing the scope
//! discards every entry, so a new scope over the same signatures produces
//! fresh objects. Scopes are created and discarded explicitly (and close
//! themselves on `Drop`); there is no ambient process-wide cache.
//!
//! The interning table is a `DashMap`, so a scope intentionally shared
//! across files (a classpath-wide scope) is safe under concurrent lookup:
//! readers never block each other, and a race on first creation of a
//! signature resolves to a single winning canonical object, with losers
//! discarding their redundant construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::{Member, SemType, TypeRef, TypeSignature};
use crate::error::WeftError;
use crate::result::Result;

/// Raw metadata for one type, as supplied by a language-specific classpath
/// or module collaborator. The cache treats this as an opaque data source.
#[derive(Debug, Clone)]
pub struct RawType {
    pub fqn: String,
    pub primitive: bool,
    pub supertype: Option<TypeSignature>,
    /// Member name and member type signature pairs
    pub members: Vec<(String, TypeSignature)>,
}

/// Collaborator that describes signatures from classpath-like metadata
pub trait TypeSource: Send + Sync {
    /// Describe a signature, or `None` if it is unknown to this source
    fn describe(&self, signature: &TypeSignature) -> Option<RawType>;
}

/// Factory for resolution scopes
#[derive(Debug, Default)]
pub struct TypeCache {
    next_scope_id: AtomicU64,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new resolution scope backed by `source`
    pub fn new_scope(&self, source: Arc<dyn TypeSource>) -> ResolutionScope {
        let id = self.next_scope_id.fetch_add(1, Ordering::Relaxed);
        debug!(scope = id, "opened resolution scope");
        ResolutionScope {
            id,
            entries: DashMap::new(),
            source,
            closed: AtomicBool::new(false),
        }
    }

    /// Close a scope, discarding its entries. Equivalent to dropping it.
    pub fn close_scope(&self, scope: ResolutionScope) {
        scope.close();
    }
}

/// One resolution unit's interning table
pub struct ResolutionScope {
    id: u64,
    entries: DashMap<String, TypeRef>,
    source: Arc<dyn TypeSource>,
    closed: AtomicBool,
}

impl ResolutionScope {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolve a signature to its canonical type object for this scope.
    ///
    /// Idempotent: repeated calls with an equal signature return the
    /// identical object. Compound signatures resolve their components first,
    /// so referential equality is transitive. An unknown signature yields
    /// the unresolved sentinel (cached per signature like any other entry).
    pub fn resolve(&self, signature: &TypeSignature) -> Result<TypeRef> {
        if self.is_closed() {
            return Err(WeftError::ScopeClosed { scope: self.id });
        }
        let mut in_flight = Vec::new();
        Ok(self.resolve_inner(signature, &mut in_flight))
    }

    fn resolve_inner(&self, signature: &TypeSignature, in_flight: &mut Vec<String>) -> TypeRef {
        let key = signature.to_string();
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit.value());
        }
        if in_flight.contains(&key) {
            // cyclic supertype metadata; break the cycle without publishing
            debug!(scope = self.id, %key, "cyclic type metadata");
            return Arc::new(SemType::Unresolved {
                signature: signature.clone(),
            });
        }
        in_flight.push(key.clone());

        // Components are fully resolved before this signature is published,
        // and no map lock is held across the recursion.
        let built = if signature.is_parameterized() {
            let base = self.resolve_inner(&signature.base(), in_flight);
            let args = signature
                .args
                .iter()
                .map(|arg| self.resolve_inner(arg, in_flight))
                .collect();
            SemType::Parameterized { base, args }
        } else {
            match self.source.describe(signature) {
                Some(raw) if raw.primitive => SemType::Primitive { name: raw.fqn },
                Some(raw) => {
                    let supertype = raw
                        .supertype
                        .as_ref()
                        .map(|sig| self.resolve_inner(sig, in_flight));
                    let members = raw
                        .members
                        .into_iter()
                        .map(|(name, signature)| Member { name, signature })
                        .collect();
                    SemType::Class {
                        fqn: raw.fqn,
                        members,
                        supertype,
                    }
                }
                None => {
                    trace!(scope = self.id, %key, "unresolved signature");
                    SemType::Unresolved {
                        signature: signature.clone(),
                    }
                }
            }
        };
        in_flight.pop();

        // First creation races resolve to a single winner; losers discard
        // their construction rather than publishing a second instance.
        Arc::clone(
            self.entries
                .entry(key)
                .or_insert_with(|| Arc::new(built))
                .value(),
        )
    }

    /// Number of canonical entries currently interned
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the scope and discard its entries. Further lookups fail with
    /// [`WeftError::ScopeClosed`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.entries.clear();
            debug!(scope = self.id, "closed resolution scope");
        }
    }
}

impl Drop for ResolutionScope {
    fn drop(&mut self) {
        self.close();
    }
}
