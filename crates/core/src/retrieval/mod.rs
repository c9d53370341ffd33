//! Retrieval of remote media through an external fetch tool.
//!
//! The [`RetrievalDriver`] turns one task URL into a local file. Telegram
//! links get a single direct fetch; every other platform is fetched with the
//! retrieval tool, routed through a random proxy from the [`ProxyPool`] on
//! each attempt except the last, which goes direct.
//!
//! The external process is hidden behind the [`ToolRunner`] trait so the
//! attempt policy can be exercised without spawning anything.
//!
//! # Example
//!
//! ```ignore
//! use mediarelay_core::retrieval::{ProcessRunner, RetrievalConfig, RetrievalDriver};
//!
//! let driver = RetrievalDriver::new(
//!     RetrievalConfig::default(),
//!     Arc::new(proxy_pool),
//!     Arc::new(ProcessRunner::new()),
//! );
//!
//! let file = driver
//!     .retrieve("https://youtu.be/abc", Platform::YouTube, Path::new("/tmp"), &ProgressBar::hidden())
//!     .await?;
//! println!("fetched {} after {} attempt(s)", file.path.display(), file.attempts);
//! ```
//!
//! [`ProxyPool`]: crate::proxy::ProxyPool

mod config;
mod driver;
mod error;
mod process;
mod traits;
mod types;

pub use config::RetrievalConfig;
pub use driver::RetrievalDriver;
pub use error::RetrievalError;
pub use process::ProcessRunner;
pub use traits::ToolRunner;
pub use types::{AttemptFailure, AttemptRoute, RetrievedFile, ToolInvocation, ToolOutput};
