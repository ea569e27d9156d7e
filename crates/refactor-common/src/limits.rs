//! Centralized limits and thresholds for the rewrite engine.
//!
//! Mirrors `tsz_common::limits`: a single place to tune recursion depths
//! and iteration counts so bounds do not drift between call sites.

/// Maximum depth walked when climbing from a node to the package scope
/// while allocating a fresh helper name (spec §3 "Package scope tree").
pub const MAX_SCOPE_WALK_DEPTH: usize = 256;

/// Maximum number of passes run at a single confidence level before the
/// driver gives up on reaching a fixed point and treats it as an internal
/// invariant failure (spec §7.2: rules are supposed to converge because
/// later passes only rewrite sites earlier passes produced).
pub const MAX_FIXED_POINT_ITERATIONS: usize = 64;

/// Maximum nesting depth explored by the two-cache cycle-safe type
/// recursion used by the analytics emitter's message-dependency walk
/// (spec §7.4) before it is treated as a cycle rather than legitimate
/// depth.
pub const MAX_TYPE_RECURSION_DEPTH: usize = 512;

/// Threshold for "nesting depth of the enclosing literal" in the
/// composite-literal builder-mode selection rule (spec §4.4).
pub const BUILDER_MODE_NESTING_THRESHOLD: usize = 4;

/// Threshold for "number of message-typed literals transitively
/// contained" in the same rule.
pub const BUILDER_MODE_MESSAGE_COUNT_THRESHOLD: usize = 4;
