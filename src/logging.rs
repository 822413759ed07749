use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber. `RUST_LOG` takes precedence over `level`.
/// Later calls are ignored so tests can call it freely.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing("debug");
        init_tracing("info");
        tracing::info!("still logging");
    }
}
