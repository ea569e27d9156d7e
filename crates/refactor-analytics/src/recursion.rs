//! The cycle-safe message-dependency walker (spec §7 failure 4, §9
//! "Cycle-safe type recursion"): "a cache entry is seeded to a sentinel
//! before recursing into a type's members; a second visit while the
//! sentinel is present returns 'no proto dependency' to break cycles.
//! Two separate caches (with vs. without pointer traversal) are kept."
//!
//! Grounded on the seed-before-recurse sentinel idiom `tsz-solver`'s own
//! recursion guard uses for type evaluation, generalized from subtype
//! recursion to message-field-dependency recursion.

use rustc_hash::FxHashMap;

use refactor_types::{DescriptorOracle, TypeName};

/// One cache's state for a type currently or previously visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecursionState {
    /// Seeded before recursing into this type's fields; a re-entry while
    /// this is the cached value means a cycle was found.
    InProgress,
    /// The final, cycle-safe answer computed for this type.
    Resolved(bool),
}

/// Whether traversal should follow pointer-typed message fields when
/// asking "does this type depend on a tracked message type". The two
/// caches spec §7.4 requires are keyed by this distinction: a type can
/// be cyclic only through a pointer indirection, so the non-pointer
/// cache alone would loop forever on a self-referential record, while
/// the pointer-aware cache is what callers actually want for reachability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum TraversalMode {
    ExcludePointers,
    IncludePointers,
}

/// Answers "does `ty` transitively depend on a message type satisfying
/// `predicate`", safe against self-referential and mutually-recursive
/// message graphs.
///
/// One instance is scoped to a single analytics run over a package; its
/// two caches persist across calls so repeated queries against shared
/// substructure (e.g. two sibling fields pointing at the same nested
/// message type) don't redo work.
pub struct MessageDependencyWalker<'a> {
    descriptors: &'a dyn DescriptorOracle,
    without_pointers: FxHashMap<String, RecursionState>,
    with_pointers: FxHashMap<String, RecursionState>,
}

impl<'a> MessageDependencyWalker<'a> {
    pub fn new(descriptors: &'a dyn DescriptorOracle) -> Self {
        MessageDependencyWalker {
            descriptors,
            without_pointers: FxHashMap::default(),
            with_pointers: FxHashMap::default(),
        }
    }

    /// Whether `ty` or any message type reachable from its fields
    /// (optionally through pointer indirection, per `include_pointers`)
    /// satisfies `predicate`.
    pub fn depends_on(&mut self, ty: &TypeName, include_pointers: bool, predicate: &dyn Fn(&TypeName) -> bool) -> bool {
        let mode = if include_pointers { TraversalMode::IncludePointers } else { TraversalMode::ExcludePointers };
        self.visit(ty, mode, predicate)
    }

    fn visit(&mut self, ty: &TypeName, mode: TraversalMode, predicate: &dyn Fn(&TypeName) -> bool) -> bool {
        if predicate(ty) {
            return true;
        }
        let cache = match mode {
            TraversalMode::ExcludePointers => &mut self.without_pointers,
            TraversalMode::IncludePointers => &mut self.with_pointers,
        };
        match cache.get(ty.long_name()) {
            // Cycle: we're already inside a `visit` for this type on this
            // traversal. No new dependency is learned by recursing again,
            // so report "no proto dependency" for this edge (spec §7.4).
            Some(RecursionState::InProgress) => return false,
            Some(RecursionState::Resolved(answer)) => return *answer,
            None => {}
        }
        cache.insert(ty.long_name().to_string(), RecursionState::InProgress);

        let mut found = false;
        for field in self.descriptors.field_names(ty) {
            let Some((field_ty, is_pointer)) = self.descriptors.message_field_type(ty, &field) else { continue };
            if is_pointer && mode == TraversalMode::ExcludePointers {
                continue;
            }
            if self.visit(&field_ty, mode, predicate) {
                found = true;
                break;
            }
        }

        let cache = match mode {
            TraversalMode::ExcludePointers => &mut self.without_pointers,
            TraversalMode::IncludePointers => &mut self.with_pointers,
        };
        cache.insert(ty.long_name().to_string(), RecursionState::Resolved(found));
        found
    }
}
