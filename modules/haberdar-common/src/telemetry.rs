use tracing_subscriber::EnvFilter;

/// Initialize logging for binaries embedding the ingest core.
/// `RUST_LOG` overrides the default `haberdar=info` directive.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("haberdar=info".parse().expect("valid directive")),
        )
        .init();
}
