//! Subscriber setup.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use conceptdb_core::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Install the global subscriber once.
///
/// `CONCEPTDB_LOG` wins over `config.log_level`, using the usual directive
/// syntax (`CONCEPTDB_LOG=conceptdb_propagation=trace,info`). Logs go to
/// stderr so command output on stdout stays clean.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("CONCEPTDB_LOG")
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(filter);
        if config.json_logs {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
