//! Semantic type model
//!
//! Canonical type objects live behind [`TypeRef`] (`Arc`), and within one
//! resolution scope two occurrences of the same signature resolve to the
//! identical object, so "same type" is an O(1) pointer comparison instead of
//! a structural one. The scope machinery lives in [`cache`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod cache;

pub use cache::{RawType, ResolutionScope, TypeCache, TypeSource};

/// Structural signature of a type: a fully qualified name plus ordered type
/// arguments. `List<String>` is `parameterized("List", [of("String")])`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSignature {
    pub fqn: String,
    pub args: Vec<TypeSignature>,
}

impl TypeSignature {
    /// Signature of a plain (non-parameterized) type
    pub fn of(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            args: Vec::new(),
        }
    }

    /// Signature of a parameterized type
    pub fn parameterized(fqn: impl Into<String>, args: Vec<TypeSignature>) -> Self {
        Self {
            fqn: fqn.into(),
            args,
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    /// The base signature with type arguments erased
    pub fn base(&self) -> TypeSignature {
        TypeSignature::of(self.fqn.clone())
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// A member of a class-like type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub signature: TypeSignature,
}

/// Reference to a canonical type object within a resolution scope
pub type TypeRef = Arc<SemType>;

/// Canonical representation of one semantic type.
///
/// Compound types reference their canonical components, so referential
/// equality is transitive: the `String` inside `List<String>` is the same
/// object as a bare `String` resolved in the same scope.
#[derive(Debug)]
pub enum SemType {
    /// A class-like declared type with members and an optional supertype
    Class {
        fqn: String,
        members: Vec<Member>,
        supertype: Option<TypeRef>,
    },
    /// A built-in primitive
    Primitive { name: String },
    /// A parameterized type over canonical components
    Parameterized { base: TypeRef, args: Vec<TypeRef> },
    /// Resolution failed; propagated as data, never as a fault.
    ///
    /// Unresolved is a distinct, always-unequal kind: a sameness check
    /// involving any unresolved side answers `false`, including against
    /// itself.
    Unresolved { signature: TypeSignature },
}

impl SemType {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, SemType::Unresolved { .. })
    }

    /// Fully qualified name, where the shape has one
    pub fn fqn(&self) -> Option<&str> {
        match self {
            SemType::Class { fqn, .. } => Some(fqn),
            SemType::Primitive { name } => Some(name),
            SemType::Parameterized { base, .. } => base.fqn(),
            SemType::Unresolved { .. } => None,
        }
    }

    /// O(1) sameness check for canonical types.
    ///
    /// Within one scope this is exact for resolved types; any unresolved
    /// side makes the answer `false`.
    pub fn is_same_type(a: &TypeRef, b: &TypeRef) -> bool {
        if a.is_unresolved() || b.is_unresolved() {
            return false;
        }
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::Class { fqn, .. } => write!(f, "{fqn}"),
            SemType::Primitive { name } => write!(f, "{name}"),
            SemType::Parameterized { base, args } => {
                write!(f, "{base}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            SemType::Unresolved { signature } => write!(f, "unresolved:{signature}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_display_round_trips_shape() {
        let sig = TypeSignature::parameterized(
            "java.util.Map",
            vec![
                TypeSignature::of("java.lang.String"),
                TypeSignature::parameterized("java.util.List", vec![TypeSignature::of("T")]),
            ],
        );
        assert_eq!(
            sig.to_string(),
            "java.util.Map<java.lang.String, java.util.List<T>>"
        );
        assert_eq!(sig.base().to_string(), "java.util.Map");
    }

    #[test]
    fn unresolved_is_always_unequal() {
        let unresolved: TypeRef = Arc::new(SemType::Unresolved {
            signature: TypeSignature::of("Missing"),
        });
        let class: TypeRef = Arc::new(SemType::Primitive {
            name: "int".into(),
        });
        assert!(!SemType::is_same_type(&unresolved, &unresolved));
        assert!(!SemType::is_same_type(&unresolved, &class));
        assert!(SemType::is_same_type(&class, &class));
    }
}
