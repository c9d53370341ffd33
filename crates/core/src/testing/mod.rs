//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborator
//! traits, allowing batch runs without real tools, proxies, or network.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediarelay_core::testing::{fixtures, MockRelay, MockToolRunner};
//!
//! let runner = Arc::new(MockToolRunner::new());
//! let relay = Arc::new(MockRelay::new());
//! let orchestrator = fixtures::orchestrator(runner.clone(), relay.clone());
//!
//! let report = orchestrator.run_batch(request).await?;
//! ```

mod mock_relay;
mod mock_tool_runner;

pub use mock_relay::MockRelay;
pub use mock_tool_runner::MockToolRunner;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{MockRelay, MockToolRunner};
    use crate::orchestrator::{Orchestrator, OrchestratorConfig};
    use crate::proxy::{ProxyPool, DEFAULT_ALLOWED_PORTS};
    use crate::relay::Relay;
    use crate::retrieval::{RetrievalConfig, RetrievalDriver, ToolRunner};

    /// A small pool with three allowed-port proxies.
    pub fn proxy_pool() -> ProxyPool {
        ProxyPool::from_lines(
            "10.0.0.1:8080\n10.0.0.2:3128\n10.0.0.3:8888\n",
            DEFAULT_ALLOWED_PORTS,
        )
        .unwrap_or_else(|e| panic!("fixture proxy pool: {}", e))
    }

    /// Retrieval settings with no retry pause and a near-instant ticker.
    pub fn fast_retrieval_config() -> RetrievalConfig {
        RetrievalConfig::default()
            .with_retry_delay(Duration::ZERO)
            .with_progress(1, Duration::from_millis(1))
    }

    /// Orchestrator settings with no pacing and hidden progress bars.
    pub fn fast_orchestrator_config() -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_pacing(Duration::ZERO, Duration::ZERO)
            .with_progress(false)
    }

    /// An orchestrator wired to the given mocks with fast settings.
    pub fn orchestrator(runner: Arc<MockToolRunner>, relay: Arc<MockRelay>) -> Orchestrator {
        orchestrator_with(fast_orchestrator_config(), runner, relay)
    }

    /// An orchestrator wired to the given mocks with custom settings.
    pub fn orchestrator_with(
        config: OrchestratorConfig,
        runner: Arc<MockToolRunner>,
        relay: Arc<MockRelay>,
    ) -> Orchestrator {
        let driver = RetrievalDriver::new(
            fast_retrieval_config(),
            Arc::new(proxy_pool()),
            runner as Arc<dyn ToolRunner>,
        );
        Orchestrator::new(config, driver, relay as Arc<dyn Relay>)
    }
}
