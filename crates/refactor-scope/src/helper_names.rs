//! Fresh helper-name allocation (spec §3 "Package scope tree"): the
//! mechanism every lifted composite literal (§4.4) and hoisted receiver
//! (§4.6) goes through to name its helper variable without shadowing.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::scope::{ScopeId, ScopeTree};

/// Allocates fresh helper names for one file, and remembers which names
/// it minted so later passes can tell "our" helpers apart from user
/// code (spec §3: "Newly minted names are inserted into the scope... are
/// also tracked in a per-file set").
#[derive(Default)]
pub struct HelperNameAllocator {
    file_helpers: FxHashSet<String>,
}

impl HelperNameAllocator {
    pub fn new() -> Self {
        HelperNameAllocator::default()
    }

    /// Names this allocator has minted in the current file so far.
    pub fn minted_names(&self) -> &FxHashSet<String> {
        &self.file_helpers
    }

    pub fn is_engine_helper(&self, name: &str) -> bool {
        self.file_helpers.contains(name)
    }

    /// Allocate a fresh name derived from `base_prefix`, walking outward
    /// from `at` to find one unbound in any enclosing scope. The first
    /// candidate is the prefix itself; collisions append a numeric
    /// suffix, with an `h` interposed when the prefix already ends in a
    /// digit (spec §3: "appending numeric suffixes with an interposed
    /// `h` if the prefix already ends in a digit").
    pub fn allocate(&mut self, scopes: &mut ScopeTree, at: ScopeId, base_prefix: &str) -> String {
        let interpose_h = base_prefix.chars().next_back().is_some_and(|c| c.is_ascii_digit());
        let mut candidate = base_prefix.to_string();
        let mut suffix = 2u32;
        while scopes.is_bound_in_enclosing(at, &candidate) || self.file_helpers.contains(&candidate) {
            candidate = if interpose_h {
                format!("{base_prefix}h{suffix}")
            } else {
                format!("{base_prefix}{suffix}")
            };
            suffix += 1;
        }
        scopes.bind(at, candidate.clone());
        self.file_helpers.insert(candidate.clone());
        debug!(name = %candidate, prefix = base_prefix, "allocated fresh helper name");
        candidate
    }
}
