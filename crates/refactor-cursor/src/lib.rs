//! The traversal cursor (spec §4.1): node mutation ops, the per-run
//! unsafe-reason counters, the import table, and the side-effect
//! analysis (spec §4.6) rules consult before deciding whether to
//! duplicate or hoist a receiver expression.

pub mod counters;
pub mod cursor;
pub mod imports;
pub mod mutations;
pub mod side_effect;

pub use counters::UnsafeReasonCounters;
pub use cursor::Cursor;
pub use imports::ImportTable;
pub use mutations::{StmtListLoc, stmt_list_mut};
pub use side_effect::{ReceiverPlan, is_side_effect_free, plan_receiver_reuse};
