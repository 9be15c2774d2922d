use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "scoreboard_server=debug,rocket=info,sqlx=warn,info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Rocket's `log` records are forwarded into the same subscriber.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // Already installed when several instances are built in one process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}
