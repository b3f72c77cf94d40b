use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

fn level_from(name: &str) -> Level {
    match name.to_uppercase().as_str() {
        "DEBUG" => Level::DEBUG,
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Sets up the global tracing subscriber.
///
/// Environment variables:
/// - LOGLEVEL: Sets the log level (DEBUG, INFO, WARN, ERROR, TRACE)
pub fn setup_logger() -> Result<(), Box<dyn std::error::Error>> {
    INIT.call_once(|| {
        let level = level_from(&env::var("LOGLEVEL").unwrap_or_else(|_| "INFO".to_string()));

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true),
            )
            .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
            .init();

        tracing::debug!("Log level set to: {}", level);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(level_from("DEBUG"), Level::DEBUG);
        assert_eq!(level_from("INFO"), Level::INFO);
        assert_eq!(level_from("WARN"), Level::WARN);
        assert_eq!(level_from("ERROR"), Level::ERROR);
        assert_eq!(level_from("TRACE"), Level::TRACE);
    }

    #[test]
    fn test_level_parsing_is_case_insensitive() {
        assert_eq!(level_from("debug"), Level::DEBUG);
        assert_eq!(level_from("Trace"), Level::TRACE);
    }

    #[test]
    fn test_invalid_level_defaults_to_info() {
        assert_eq!(level_from("VERBOSE"), Level::INFO);
        assert_eq!(level_from(""), Level::INFO);
    }

    #[test]
    fn test_setup_logger_is_idempotent() {
        assert!(setup_logger().is_ok());
        assert!(setup_logger().is_ok());
    }
}
