//! Cross-package parallel fan-out (spec §5: "A driver may fan out
//! across packages in parallel, but each package's rewrite closure does
//! not share mutable state with any other.").
//!
//! One package is rewritten at a time on its own thread via a plain
//! scoped-thread work queue — no shared locks are needed because, per
//! spec §5, nothing a package's closure touches is shared with any
//! other package's.

use crate::cancel::CancellationToken;

/// Run each `(name, job)` pair to completion on its own scoped thread,
/// giving each job a fresh [`CancellationToken`] it can consult (and the
/// caller could flip from elsewhere, though this helper does not expose
/// that — callers needing cross-thread cancellation should hold onto
/// the tokens themselves and call a variant that accepts them).
///
/// Returns results in the same order `jobs` were given, once every job
/// has finished.
pub fn run_packages_in_parallel<T, F>(jobs: Vec<(String, F)>) -> Vec<(String, T)>
where
    F: FnOnce(&CancellationToken) -> T + Send,
    T: Send,
{
    std::thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(name, job)| {
                let token = CancellationToken::new();
                scope.spawn(move || {
                    let result = job(&token);
                    (name, result)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("package rewrite thread panicked"))
            .collect()
    })
}
