use tracing_subscriber::EnvFilter;

/// Directive for a verbosity count when `RUST_LOG` is not set.
fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        // -vvv: Include russh debug logs for SSH troubleshooting
        3 => "debug",
        _ => "trace",
    }
}

/// Create an environment filter: `-q` silences everything, otherwise
/// `RUST_LOG` wins over the verbosity count.
pub fn create_env_filter(verbosity: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("off");
    }

    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(verbosity_directive(verbosity))
    }
}

/// Install the process-wide subscriber. Logs go to stderr so the report on
/// stdout stays parseable.
pub fn init_logging(verbosity: u8, quiet: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(create_env_filter(verbosity, quiet))
        .with_writer(std::io::stderr)
        .init();
}
