//! `AnalyticsEmitter` — the accumulator a package run appends `Entry`
//! records to (spec §6: "a list of `Entry` analytics records" per file).

use crate::entry::Entry;

/// Collects analytics entries across however many files/levels one
/// package run observes. Append-only, matching the driver's own
/// append-only unsafe-reason counter (spec §5): nothing here is ever
/// removed once recorded.
#[derive(Debug, Default)]
pub struct AnalyticsEmitter {
    entries: Vec<Entry>,
}

impl AnalyticsEmitter {
    pub fn new() -> Self {
        AnalyticsEmitter::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = Entry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn fail_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_fail()).count()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{ConstructorShape, Expression, Status, TypeRef, Use};
    use refactor_common::{ConfidenceLevel, LineColumn, Location};

    fn loc() -> Location {
        Location::new("pkg", "f.go", LineColumn::new(0, 0), LineColumn::new(0, 1))
    }

    #[test]
    fn counts_only_fail_entries() {
        let mut emitter = AnalyticsEmitter::new();
        emitter.push(Entry::observed(
            loc(),
            ConfidenceLevel::Green,
            TypeRef::new("pkg.T"),
            Expression::new("CompositeLit", None),
            Use::Constructor { shape: ConstructorShape::Empty },
        ));
        emitter.push(Entry::missing_type(loc(), ConfidenceLevel::Green, Expression::new("Selector", None)));
        assert_eq!(emitter.entries().len(), 2);
        assert_eq!(emitter.fail_count(), 1);
        assert_eq!(emitter.entries()[1].status, Status::missing_type_info());
    }
}
