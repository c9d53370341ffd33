use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Concurrency limit and attempt bound are at least 1
/// - Pacing range is not inverted
/// - At least one proxy port is allowed
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Orchestrator validation
    if config.orchestrator.max_concurrent_tasks == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_concurrent_tasks must be at least 1".to_string(),
        ));
    }
    if config.orchestrator.pacing_min_ms > config.orchestrator.pacing_max_ms {
        return Err(ConfigError::ValidationError(format!(
            "orchestrator.pacing_min_ms ({}) exceeds pacing_max_ms ({})",
            config.orchestrator.pacing_min_ms, config.orchestrator.pacing_max_ms
        )));
    }

    // Retrieval validation
    if config.retrieval.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retrieval.max_attempts must be at least 1".to_string(),
        ));
    }

    // Proxy validation
    if config.proxies.allowed_ports.is_empty() {
        return Err(ConfigError::ValidationError(
            "proxies.allowed_ports cannot be empty".to_string(),
        ));
    }

    Ok(())
}
