use tracing_subscriber::EnvFilter;

/// Crates whose events are captured at full verbosity.
const CRATE_NAMES: &[&str] = &["kvtrace", "kvtrace_generator"];

/// Initializes a logger for tests.
///
/// Events go to the output captured by the Rust test runner, so they only show up for failing
/// tests or with `--nocapture`. By default only kvtrace crates are logged (at `TRACE`), everything
/// else is limited to `ERROR`. Setting `RUST_LOG` replaces the default filter entirely.
///
/// Repeated calls are no-ops, so every test can call this first thing.
///
/// # Example
///
/// ```
/// kvtrace_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}

fn default_filter() -> EnvFilter {
    CRATE_NAMES
        .iter()
        .fold(EnvFilter::new("ERROR"), |filter, name| {
            filter.add_directive(format!("{name}=TRACE").parse().unwrap())
        })
}
