//! Eligibility inputs — the other external collaborator input named in
//! spec §6: which types may be migrated at all, and which must use the
//! builder form of composite-literal rewriting.

use rustc_hash::FxHashSet;

use crate::sem_type::TypeName;

/// `BuilderUseType` (spec §6): the global policy selecting how
/// aggressively the composite-literal rule reaches for builder mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuilderUseType {
    #[default]
    BuildersDefault,
    BuildersTestsOnly,
    BuildersEverywhere,
}

/// The full set of host-supplied eligibility and builder-policy inputs
/// (spec §6 "Eligibility inputs").
#[derive(Clone, Debug, Default)]
pub struct EligibilityInputs {
    /// Fully qualified type names to migrate; empty means "all eligible"
    /// (spec §3 `isEligible`).
    pub eligible_types: FxHashSet<String>,
    /// Types that must always use builder-mode composite literals.
    pub forced_builder_types: FxHashSet<String>,
    /// File path globs that must always use builder mode.
    pub forced_builder_file_globs: Vec<String>,
    pub builder_use: BuilderUseType,
}

impl EligibilityInputs {
    pub fn is_eligible(&self, ty: &TypeName) -> bool {
        self.eligible_types.is_empty() || self.eligible_types.contains(ty.long_name())
    }

    pub fn is_forced_builder_type(&self, ty: &TypeName) -> bool {
        self.forced_builder_types.contains(ty.long_name())
    }

    /// Matches a file path against the forced-builder glob set. Globs
    /// are host-relative; this engine only needs simple `*`/`**`
    /// wildcard matching, not a full glob-crate dependency, since the
    /// set is small and evaluated once per file.
    pub fn file_forces_builder(&self, file_path: &str) -> bool {
        self.forced_builder_file_globs.iter().any(|pat| glob_match(pat, file_path))
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    fn helper(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                (0..=t.len()).any(|i| helper(&p[1..], &t[i..]))
            }
            (Some(pc), Some(tc)) if pc == tc => helper(&p[1..], &t[1..]),
            _ => false,
        }
    }
    helper(pattern.as_bytes(), text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_eligible_set_means_all() {
        let inputs = EligibilityInputs::default();
        assert!(inputs.is_eligible(&TypeName::new("pkg.T")));
    }

    #[test]
    fn nonempty_set_restricts() {
        let mut inputs = EligibilityInputs::default();
        inputs.eligible_types.insert("pkg.T".to_string());
        assert!(inputs.is_eligible(&TypeName::new("pkg.T")));
        assert!(!inputs.is_eligible(&TypeName::new("pkg.Other")));
    }

    #[test]
    fn glob_matches_wildcards() {
        assert!(glob_match("*_test.go", "foo_test.go"));
        assert!(!glob_match("*_test.go", "foo.go"));
        assert!(glob_match("pkg/**/*.go", "pkg/sub/dir/file.go"));
    }
}
