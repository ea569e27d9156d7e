//! `rewrite_package` — the single entry point a host calls per package
//! (spec §6), wiring the descriptor/eligibility inputs, the oracle and
//! scope crates, the driver, and the analytics emitter together.

use refactor_analytics::{AnalyticsEmitter, AnalyticsContext, Entry, observe_file, observe_type_switch_assertions};
use refactor_common::ConfidenceLevel;
use refactor_cursor::UnsafeReasonCounters;
use refactor_driver::{CancellationToken, DriverReport, FileUnit, PackageInputs, run_package};
use refactor_types::{DescriptorOracle, EligibilityInputs, MessageShapeOracle};
use tracing::info;

use crate::loader::{LoadedPackage, Loader};

/// The descriptor/eligibility/confidence-level inputs a host supplies
/// alongside the [`Loader`] (spec §6 "Descriptor oracle", "Eligibility
/// inputs"). Borrowed for the duration of one `rewrite_package` call.
pub struct EngineInputs<'a> {
    pub descriptors: &'a dyn DescriptorOracle,
    pub eligibility: &'a EligibilityInputs,
    pub max_level: ConfidenceLevel,
}

/// Everything one `rewrite_package` call produces: the rewritten files,
/// what the driver accomplished, the analytics records, and the
/// unsafe-rewrite tally (spec §6 "Outputs produced for collaborators").
pub struct PackageRewrite {
    pub files: Vec<FileUnit>,
    pub driver_report: DriverReport,
    pub analytics: Vec<Entry>,
    pub unsafe_counts: UnsafeReasonCounters,
}

/// Load `package` through `loader`, run the six-pass driver up through
/// `inputs.max_level`, and observe the (possibly rewritten) result for
/// analytics. Returns an error only if `loader` itself fails (spec §6's
/// external-interface boundary); anything the rewrite engine itself
/// finds wrong surfaces as a FAIL analytics record or a panic, per spec
/// §7, never as an `Err` here.
pub fn rewrite_package(loader: &dyn Loader, package: &str, inputs: &EngineInputs<'_>, cancel: &CancellationToken) -> anyhow::Result<PackageRewrite> {
    let LoadedPackage { name: _, files: loaded_files, mut types, mut scopes } = loader.load_package(package)?;
    info!(package, file_count = loaded_files.len(), max_level = inputs.max_level.as_str(), "loaded package");

    let shapes = MessageShapeOracle::new(inputs.descriptors, inputs.eligibility);
    let package_scope = scopes.package_scope();
    let mut counters = UnsafeReasonCounters::new();

    let mut files: Vec<FileUnit> = loaded_files
        .into_iter()
        .map(|f| {
            let mut unit = FileUnit::new(f.name, f.arena, f.roots);
            unit.imports = f.imports;
            unit
        })
        .collect();

    let driver_report = {
        let mut package_inputs = PackageInputs {
            types: &mut types,
            shapes: &shapes,
            eligibility: inputs.eligibility,
            scopes: &mut scopes,
            package_scope,
            counters: &mut counters,
        };
        run_package(&mut package_inputs, &mut files, inputs.max_level, cancel)
    };

    let mut emitter = AnalyticsEmitter::new();
    for file in &files {
        let ctx = AnalyticsContext {
            arena: &file.arena,
            types: &types,
            shapes: &shapes,
            package,
            file: &file.name,
            level: inputs.max_level,
            positions: None,
            line_map: None,
        };
        emitter.extend(observe_file(&ctx, &file.roots));
        emitter.extend(observe_type_switch_assertions(&ctx, &file.roots));
    }

    Ok(PackageRewrite { files, driver_report, analytics: emitter.into_entries(), unsafe_counts: counters })
}
