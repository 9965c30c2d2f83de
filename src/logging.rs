use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use crate::model::config::LogConfig;

/// Install the global `tracing` subscriber, writing compact lines to stderr.
///
/// `RUST_LOG` wins over the configured filter when it is set. Calling this
/// again after a subscriber is installed does nothing.
pub fn init(config: &LogConfig) -> Result<(), ParseError> {
    let filter = build_filter(config, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

fn build_filter(config: &LogConfig, env: Option<String>) -> Result<EnvFilter, ParseError> {
    match env {
        Some(directives) if !directives.trim().is_empty() => {
            Ok(EnvFilter::builder().parse_lossy(directives))
        }
        _ => EnvFilter::builder().parse(&config.filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_filter_used_without_env() {
        let config = LogConfig {
            filter: "taskdeck=debug".into(),
        };
        let filter = build_filter(&config, None).unwrap();
        assert_eq!(filter.to_string(), "taskdeck=debug");
    }

    #[test]
    fn test_env_overrides_config() {
        let config = LogConfig {
            filter: "not a [valid filter".into(),
        };
        let filter = build_filter(&config, Some("warn".into())).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_invalid_config_filter() {
        let config = LogConfig {
            filter: "taskdeck=loudest".into(),
        };
        assert!(build_filter(&config, None).is_err());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LogConfig::default();
        assert!(init(&config).is_ok());
        assert!(init(&config).is_ok());
    }
}
