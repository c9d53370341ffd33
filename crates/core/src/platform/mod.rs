//! Platform resolution for source URLs.
//!
//! Every download task targets one of a closed set of platforms. The platform
//! decides how the media is fetched: Telegram links go through a plain direct
//! fetch, everything else goes through the proxy-aware retrieval tool.

mod resolver;
mod types;

pub use resolver::{resolve_platform, HOST_PATTERNS};
pub use types::{Platform, PlatformError};
