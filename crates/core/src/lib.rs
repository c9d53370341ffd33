pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod platform;
pub mod proxy;
pub mod relay;
pub mod retrieval;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ProxyConfig,
    SanitizedConfig, ServerConfig,
};
pub use orchestrator::{
    BatchReport, BatchRequest, DownloadTask, Orchestrator, OrchestratorConfig, OrchestratorError,
    OrchestratorStatus, TaskError, TaskOutcome,
};
pub use platform::{resolve_platform, Platform, PlatformError};
pub use proxy::{ProxyEntry, ProxyError, ProxyPool};
pub use relay::{CloudinaryRelay, Relay, RelayConfig, RelayError, RelayedAsset};
pub use retrieval::{
    ProcessRunner, RetrievalConfig, RetrievalDriver, RetrievalError, ToolRunner,
};
