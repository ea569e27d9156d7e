//! Semantic types as understood by the rewrite engine.
//!
//! The engine never re-derives types itself (it has no type checker of
//! its own — that is the loader's job, out of scope per spec §1); these
//! are the shapes the host's type-checker snapshot is expected to
//! report through [`crate::oracle::TypeInfo`].

use serde::{Deserialize, Serialize};

/// A fully qualified type name, e.g. `mypkg.Message` or `mypkg.Message_builder`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeName(pub String);

impl TypeName {
    pub fn new(s: impl Into<String>) -> Self {
        TypeName(s.into())
    }

    /// The short (unqualified) name, for analytics `Expression` records.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn long_name(&self) -> &str {
        &self.0
    }
}

/// The generated-message API edition a record type was declared under.
///
/// `isMessage` (spec §3) excludes `OpenV1`: pre-opaque-migration legacy
/// types that were never meant to gain accessor methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edition {
    OpenV1,
    Proto2,
    Proto3,
    Edition2023Plus,
}

impl Edition {
    /// Scalars have *explicit* presence (spec §4.2) under proto2, under
    /// `optional` proto3 fields, or under edition ≥ 2023 — the `optional`
    /// flag is tracked per field, not per edition, so this only encodes
    /// "this edition always has explicit presence for scalars".
    pub fn always_explicit_presence(self) -> bool {
        matches!(self, Edition::Proto2 | Edition::Edition2023Plus)
    }
}

/// A semantic type, as reported by the host's type-checker snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemType {
    Named(TypeName),
    Pointer(Box<SemType>),
    Slice(Box<SemType>),
    Map(Box<SemType>, Box<SemType>),
    /// A one-of discriminator interface (spec §3 `isOneOf`).
    OneofInterface(TypeName),
    Scalar(ScalarKind),
    Bytes,
    /// Explicit "no type information" marker (spec §3 TypeInfo
    /// invariant): distinct from an unset map entry, which is a
    /// programming error.
    Invalid,
}

impl SemType {
    /// The type `T` a pointer points to, or the type itself if it is
    /// not a pointer — `isMessage`/`isEligible` look through exactly one
    /// level of pointer indirection (spec §3: "`T` (or its element when
    /// `T` is a pointer)").
    pub fn pointee_or_self(&self) -> &SemType {
        match self {
            SemType::Pointer(inner) => inner,
            other => other,
        }
    }

    pub fn as_named(&self) -> Option<&TypeName> {
        match self.pointee_or_self() {
            SemType::Named(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    Bool,
    String,
}

/// Whether an expression may have its address taken (spec §3: "Expressions
/// may carry an 'addressable' property queried from the type oracle.").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueCategory {
    RValue,
    Addressable,
}
