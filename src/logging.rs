use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "revena=info";
const VERBOSE_FILTER: &str = "revena=debug";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Logs go to stderr so report XML on stdout stays clean. Calling this twice
/// is harmless.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
