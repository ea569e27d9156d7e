//! Shared test-only tracing init, mirroring the `tracing_subscriber::fmt()`
//! setup `tsz-conformance`'s binary entry point does at startup, scaled
//! down to a test harness: a test writer instead of stdout, and
//! `try_init` so running many tests in one process only installs it once.

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "refactor_driver=debug".to_string()))
        .try_init();
}
