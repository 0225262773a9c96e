//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Install a global fmt subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `default_directive`
/// (e.g. `"vthrottle_core=debug"`). Returns an error if a global subscriber
/// is already installed, which callers that may initialise twice can ignore.
pub fn init_tracing(default_directive: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = init_tracing("warn");
        assert!(init_tracing("warn").is_err());
    }
}
