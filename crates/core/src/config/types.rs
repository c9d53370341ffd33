use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::proxy::DEFAULT_ALLOWED_PORTS;
use crate::relay::RelayConfig;
use crate::retrieval::RetrievalConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub proxies: ProxyConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

/// Proxy source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Line-oriented proxy list, read once at startup.
    #[serde(default = "default_proxy_path")]
    pub path: PathBuf,
    /// Ports a proxy must use to be accepted.
    #[serde(default = "default_allowed_ports")]
    pub allowed_ports: Vec<u16>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            path: default_proxy_path(),
            allowed_ports: default_allowed_ports(),
        }
    }
}

fn default_proxy_path() -> PathBuf {
    PathBuf::from("proxies.txt")
}

fn default_allowed_ports() -> Vec<u16> {
    DEFAULT_ALLOWED_PORTS.to_vec()
}

/// Sanitized config for API responses (relay credential redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub orchestrator: OrchestratorConfig,
    pub retrieval: RetrievalConfig,
    pub proxies: ProxyConfig,
    pub relay: SanitizedRelayConfig,
}

/// Sanitized relay config (credential hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRelayConfig {
    pub credential_configured: bool,
    pub timeout_secs: u64,
    pub api_base: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            orchestrator: config.orchestrator.clone(),
            retrieval: config.retrieval.clone(),
            proxies: config.proxies.clone(),
            relay: SanitizedRelayConfig {
                credential_configured: config
                    .relay
                    .cloudinary_url
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty()),
                timeout_secs: config.relay.timeout_secs,
                api_base: config.relay.api_base.clone(),
            },
        }
    }
}
