use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging for the binary. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "conflict_democracy=debug"
    } else {
        "conflict_democracy=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
