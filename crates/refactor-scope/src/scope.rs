//! Package scope tree (spec §3 "Package scope tree"): lexical scopes
//! nested by lexical region, rooted at the package.
//!
//! The allocator that consumes this tree must "consult the underlying
//! type-checker's scope structure at the *position* of the insertion
//! point, not the DST, because DST has no positions" (spec §9). This
//! crate models that scope structure directly; callers look up the
//! right [`ScopeId`] for an insertion point through the host's position
//! map (`refactor_types::TypeInfo::position_of`) before calling in.

use rustc_hash::FxHashSet;

use refactor_common::limits::MAX_SCOPE_WALK_DEPTH;

/// A lexical scope's stable id within one package's [`ScopeTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

struct ScopeNode {
    parent: ScopeId,
    names: FxHashSet<String>,
}

/// Lexical scopes nested by lexical region, rooted at the package.
pub struct ScopeTree {
    scopes: Vec<ScopeNode>,
    package_scope: ScopeId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut tree = ScopeTree { scopes: Vec::new(), package_scope: ScopeId::NONE };
        let root = tree.new_scope(ScopeId::NONE);
        tree.package_scope = root;
        tree
    }

    pub fn package_scope(&self) -> ScopeId {
        self.package_scope
    }

    pub fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeNode { parent, names: FxHashSet::default() });
        id
    }

    pub fn bind(&mut self, scope: ScopeId, name: impl Into<String>) {
        if let Some(node) = self.scopes.get_mut(scope.0 as usize) {
            node.names.insert(name.into());
        }
    }

    /// Whether `name` is bound in `scope` or any of its lexical
    /// ancestors up to the package scope.
    pub fn is_bound_in_enclosing(&self, scope: ScopeId, name: &str) -> bool {
        let mut current = scope;
        let mut depth = 0;
        while !current.is_none() {
            depth += 1;
            if depth > MAX_SCOPE_WALK_DEPTH {
                return true; // treat runaway walks as "assume bound" — fail safe, never shadow
            }
            let Some(node) = self.scopes.get(current.0 as usize) else { break };
            if node.names.contains(name) {
                return true;
            }
            current = node.parent;
        }
        false
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        ScopeTree::new()
    }
}
