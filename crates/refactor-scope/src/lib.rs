//! Package scope tree and fresh helper-name allocator (spec §3).

pub mod helper_names;
pub mod scope;

pub use helper_names::HelperNameAllocator;
pub use scope::{ScopeId, ScopeTree};
