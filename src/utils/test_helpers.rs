use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Installs a test-writer tracing subscriber exactly once per test binary.
///
/// Respects `RUST_LOG`, so `RUST_LOG=material_vault=debug cargo test` shows
/// which project marker matched, which files were skipped, and so on.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Returns true when the current process runs as root (UID 0).
/// Permission-based tests are skipped then, since root ignores file modes.
#[cfg(test)]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and no side effects.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
