//! Facade crate: the single `rewrite_package` entry point a host calls
//! per package (spec §6 "External interfaces"), wiring together the
//! oracle, scope, cursor, rules, driver, and analytics crates behind one
//! `Loader` boundary. Mirrors how `tsz-cli` sits atop `tsz-checker`,
//! `tsz-binder`, and the rest of the `tsz-*` workspace as a thin
//! composition layer rather than re-implementing any of it.

pub mod loader;
pub mod package_rewrite;

pub use loader::{LoadedFile, LoadedPackage, Loader};
pub use package_rewrite::{EngineInputs, PackageRewrite, rewrite_package};
