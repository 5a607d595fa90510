//! Log output for hosts that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "glp_study_core=info";

/// Install a formatted subscriber. `RUST_LOG` wins over `filter`.
///
/// Returns false when a global subscriber is already set.
pub fn init_logging(filter: Option<&str>) -> bool {
    let fallback = filter.unwrap_or(DEFAULT_LOG_FILTER);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_logging(Some("debug"));
        assert!(!init_logging(None));
    }
}
