/// Initialize the tracing subscriber once. `RUST_LOG` wins over `default_level`.
/// Output goes to stderr; stdout carries the protocol.
pub fn init(default_level: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Simple helper to log a metrics-like line until a real sink/exporter is added.
pub fn log_metric(tool: &str, metric: &str, value: f64) {
    tracing::info!(tool = tool, metric = metric, value = value, "metric");
}
