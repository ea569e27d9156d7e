//! One file's per-file driver state (spec §3 "Lifecycle": "helper-name
//! reservations persist across passes within a file").

use refactor_ast::{Arena, NodeId};
use refactor_cursor::{ImportTable, UnsafeReasonCounters};
use refactor_scope::helper_names::HelperNameAllocator;

/// A single file within a package run: its tree, the function-decl (or
/// other top-level) roots rules traverse from, and the per-file state a
/// [`refactor_rules::RewriteContext`] borrows for the duration of one
/// pass invocation.
///
/// Per-package state (the type oracle, the message-shape oracle, the
/// scope tree, the eligibility inputs, the unsafe-reason counters) lives
/// one level up, in [`crate::package::PackageInputs`] — only the things
/// spec §3 calls out as file-scoped (the helper-name set, the import
/// table) live here.
pub struct FileUnit {
    pub name: String,
    pub arena: Arena,
    pub roots: Vec<NodeId>,
    pub helper_names: HelperNameAllocator,
    pub imports: ImportTable,
}

impl FileUnit {
    pub fn new(name: impl Into<String>, arena: Arena, roots: Vec<NodeId>) -> Self {
        FileUnit {
            name: name.into(),
            arena,
            roots,
            helper_names: HelperNameAllocator::new(),
            imports: ImportTable::new(),
        }
    }
}
