//! `RewriteContext` — the shared handles every pass closes over for one
//! file at one confidence level (spec §4.1, §5: "within a package, files
//! are processed sequentially").

use refactor_ast::{Arena, NodeId};
use refactor_common::ConfidenceLevel;
use refactor_cursor::{Cursor, ImportTable, UnsafeReasonCounters};
use refactor_scope::helper_names::HelperNameAllocator;
use refactor_scope::scope::{ScopeId, ScopeTree};
use refactor_types::{EligibilityInputs, MessageShapeOracle, TypeInfo};

pub struct RewriteContext<'a> {
    pub arena: &'a mut Arena,
    pub types: &'a mut TypeInfo,
    pub shapes: &'a MessageShapeOracle<'a>,
    pub eligibility: &'a EligibilityInputs,
    pub scopes: &'a mut ScopeTree,
    /// The scope new helper names are allocated into. Real hosts resolve
    /// the scope at each insertion point via `TypeInfo::position_of`
    /// (spec §9); fixtures built directly through `refactor-ast` model
    /// one flat per-file scope, so every allocation in this crate's own
    /// tests targets `package_scope`.
    pub package_scope: ScopeId,
    pub helper_names: &'a mut HelperNameAllocator,
    pub imports: &'a mut ImportTable,
    pub counters: &'a mut UnsafeReasonCounters,
    pub file: &'a str,
    pub level: ConfidenceLevel,
}

impl<'a> RewriteContext<'a> {
    /// Build a [`Cursor`] focused on `node` (with `parent` as its link),
    /// reborrowing this context's fields. Every in-place rewrite in this
    /// crate goes through a cursor constructed here so `ReplaceUnsafe`
    /// stays the single call site bumping the unsafe-reason counter
    /// (spec §3).
    pub fn cursor_at(&mut self, node: NodeId, parent: NodeId) -> Cursor<'_> {
        Cursor::new(
            self.arena,
            node,
            parent,
            self.file,
            self.level,
            self.imports,
            self.helper_names,
            self.counters,
        )
    }
}
