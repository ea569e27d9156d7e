//! Per-package driving (spec §4.1 "Driver", §5): levels outermost,
//! files sequential within a level, the six passes run to a fixed point
//! before the next level begins.

use refactor_common::{ConfidenceLevel, limits::MAX_FIXED_POINT_ITERATIONS};
use refactor_cursor::UnsafeReasonCounters;
use refactor_rules::{Pass, RewriteContext};
use refactor_scope::scope::{ScopeId, ScopeTree};
use refactor_types::{EligibilityInputs, MessageShapeOracle, TypeInfo};
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::file::FileUnit;

/// The per-package handles a driver run needs alongside each
/// [`FileUnit`]'s own per-file state (spec §5 "Shared resources within
/// a package: the type oracle..., the helper-name set..., and the
/// unsafe-reason counter").
pub struct PackageInputs<'a> {
    pub types: &'a mut TypeInfo,
    pub shapes: &'a MessageShapeOracle<'a>,
    pub eligibility: &'a EligibilityInputs,
    pub scopes: &'a mut ScopeTree,
    pub package_scope: ScopeId,
    pub counters: &'a mut UnsafeReasonCounters,
}

/// What one [`run_package`] call accomplished: which levels it finished,
/// whether it was cut short by cancellation, and whether anything
/// changed at all (the hook [`run_package`]'s own idempotence test uses:
/// running it a second time over its own output must report `changed:
/// false`, spec §8 "Idempotence").
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DriverReport {
    pub levels_completed: Vec<ConfidenceLevel>,
    pub cancelled: bool,
    pub changed: bool,
}

/// Run every file in `files` up through `max_level` (inclusive),
/// returning once either every level through `max_level` has reached a
/// fixed point or `cancel` is observed between files/passes.
///
/// `max_level` must be one of [`ConfidenceLevel::RUN_ORDER`]'s members
/// (`Green`, `Yellow`, or `Red`); `None` is the pre-rewrite snapshot and
/// is never a level the driver runs rules *at* (spec §3).
pub fn run_package(
    inputs: &mut PackageInputs<'_>,
    files: &mut [FileUnit],
    max_level: ConfidenceLevel,
    cancel: &CancellationToken,
) -> DriverReport {
    let mut report = DriverReport::default();
    for level in ConfidenceLevel::RUN_ORDER {
        if level > max_level {
            break;
        }
        if cancel.is_cancelled() {
            report.cancelled = true;
            return report;
        }
        info!(level = level.as_str(), file_count = files.len(), "starting level");
        for file in files.iter_mut() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return report;
            }
            if run_file_to_fixed_point(inputs, file, level, cancel) {
                report.changed = true;
            }
            if cancel.is_cancelled() {
                report.cancelled = true;
                return report;
            }
        }
        report.levels_completed.push(level);
    }
    report
}

/// Run the six passes over one file, repeating the full sweep until a
/// pass of the sweep makes no change (spec §4.1: "Each pass runs to a
/// fixed point at the current level before the next level begins" —
/// read together with §4.1's own "declared order", a fixed point of the
/// *whole ordered pass list* is what guarantees later passes see
/// everything earlier passes produced). Returns whether anything
/// changed in this file at this level.
fn run_file_to_fixed_point(
    inputs: &mut PackageInputs<'_>,
    file: &mut FileUnit,
    level: ConfidenceLevel,
    cancel: &CancellationToken,
) -> bool {
    let mut file_changed = false;
    for iteration in 0..MAX_FIXED_POINT_ITERATIONS {
        if cancel.is_cancelled() {
            return file_changed;
        }
        let mut sweep_changed = false;
        {
            let mut ctx = RewriteContext {
                arena: &mut file.arena,
                types: inputs.types,
                shapes: inputs.shapes,
                eligibility: inputs.eligibility,
                scopes: inputs.scopes,
                package_scope: inputs.package_scope,
                helper_names: &mut file.helper_names,
                imports: &mut file.imports,
                counters: inputs.counters,
                file: &file.name,
                level,
            };
            for pass in Pass::ORDER {
                if cancel.is_cancelled() {
                    break;
                }
                let pass_changed = pass.run(&mut ctx, &file.roots);
                sweep_changed |= pass_changed;
                debug!(file = %file.name, level = level.as_str(), pass = pass.name(), changed = pass_changed, "ran pass");
            }
        }
        if !sweep_changed {
            return file_changed;
        }
        file_changed = true;
        if iteration + 1 == MAX_FIXED_POINT_ITERATIONS {
            unreachable!(
                "pass set for {} at {} did not reach a fixed point within {} iterations — a rule is almost certainly flip-flopping",
                file.name,
                level.as_str(),
                MAX_FIXED_POINT_ITERATIONS
            );
        }
    }
    file_changed
}
