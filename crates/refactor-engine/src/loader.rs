//! The `Loader` boundary (spec §6 "Inputs consumed from collaborators"):
//! "produces, per package, a list of files, each with (a) a
//! position-bearing parse tree, (b) a DST with trivia, (c) a
//! bidirectional node map between the two, (d) an imports table, and (e)
//! a full type-checker snapshot exposing 'type of expression', 'object
//! of identifier,' and scope lookups."
//!
//! (a) is the host's own parse tree and never enters this crate (spec
//! §1: parsing/loading is out of scope); (c) is carried inside the
//! `TypeInfo` snapshot's node↔position map, not as a separate field.
//! Mirrors how `tsz-checker` takes `tsz_binder::BinderState` as an
//! already-built collaborator rather than constructing one itself.

use refactor_ast::{Arena, NodeId};
use refactor_cursor::ImportTable;
use refactor_scope::ScopeTree;
use refactor_types::TypeInfo;

/// One file's loaded state, ready for the driver.
pub struct LoadedFile {
    pub name: String,
    pub arena: Arena,
    pub roots: Vec<NodeId>,
    pub imports: ImportTable,
}

/// One package's loaded state: every file plus the package-wide oracle
/// snapshots the driver borrows for the whole run.
pub struct LoadedPackage {
    pub name: String,
    pub files: Vec<LoadedFile>,
    pub types: TypeInfo,
    pub scopes: ScopeTree,
}

/// A host-supplied collaborator that produces a [`LoadedPackage`] for a
/// given package name. Fallible because loading genuinely can fail (the
/// package doesn't exist, the host's own type-checker run errored) —
/// the one place in this facade where `anyhow` propagation, rather than
/// a panic or a FAIL analytics record, is the right shape (spec §7
/// lists panics for invariant violations and FAIL records for missing
/// per-node type info; neither fits "the package could not be loaded at
/// all").
pub trait Loader {
    fn load_package(&self, package: &str) -> anyhow::Result<LoadedPackage>;
}
