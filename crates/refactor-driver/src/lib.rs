//! The level × pass × file fixed-point driver (spec §4.1 "Driver", §5
//! "Concurrency & Resource Model").
//!
//! A package is rewritten by iterating [`refactor_common::ConfidenceLevel::RUN_ORDER`]
//! outermost, files sequentially within a level (so helper-name
//! allocations in one file observe reservations made while rewriting an
//! earlier file of the same package), and the six [`refactor_rules::Pass`]es
//! innermost, run to a fixed point before the next level begins. A
//! package's rewrite closure shares no mutable state with any other
//! package's, so [`run_packages_in_parallel`] fans packages out across
//! threads with no locking.

pub mod cancel;
pub mod file;
pub mod package;
pub mod parallel;

pub use cancel::CancellationToken;
pub use file::FileUnit;
pub use package::{DriverReport, PackageInputs, run_package};
pub use parallel::run_packages_in_parallel;
