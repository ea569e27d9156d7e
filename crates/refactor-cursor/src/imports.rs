//! Import table (spec §3 "Cursor": "the current node... and an import
//! table"). Rules that synthesize calls to scalar-wrapper helpers (e.g.
//! `proto.Int32(e)` in builder mode, spec §4.4) record the package they
//! need here; the host is responsible for actually adding the import
//! statement to the file when serializing.

use rustc_hash::FxHashSet;

#[derive(Debug, Default)]
pub struct ImportTable {
    required: FxHashSet<String>,
}

impl ImportTable {
    pub fn new() -> Self {
        ImportTable::default()
    }

    pub fn require(&mut self, package: impl Into<String>) {
        self.required.insert(package.into());
    }

    pub fn is_required(&self, package: &str) -> bool {
        self.required.contains(package)
    }

    pub fn required(&self) -> impl Iterator<Item = &String> {
        self.required.iter()
    }
}
