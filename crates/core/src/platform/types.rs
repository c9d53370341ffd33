//! Platform types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Source platform of a download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Telegram,
    TikTok,
    YouTube,
    Facebook,
    X,
    /// A caller-supplied label outside the known set. Fetched with the
    /// retrieval tool, never inferred from a hostname.
    Other,
}

impl Platform {
    /// All platforms that can be named or inferred.
    pub const ALL: [Platform; 5] = [
        Platform::Telegram,
        Platform::TikTok,
        Platform::YouTube,
        Platform::Facebook,
        Platform::X,
    ];

    /// Display name, also used as the label in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Telegram => "Telegram",
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
            Platform::Facebook => "Facebook",
            Platform::X => "X",
            Platform::Other => "Other",
        }
    }

    /// Whether media from this platform is fetched through the retrieval
    /// tool (and is therefore eligible for proxy routing).
    pub fn uses_retrieval_tool(&self) -> bool {
        !matches!(self, Platform::Telegram)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    /// Parses a caller-supplied label. Matching is case-insensitive and
    /// accepts `twitter` as an alias for X.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "telegram" => Ok(Platform::Telegram),
            "tiktok" => Ok(Platform::TikTok),
            "youtube" => Ok(Platform::YouTube),
            "facebook" => Ok(Platform::Facebook),
            "x" | "twitter" => Ok(Platform::X),
            _ => Err(PlatformError::UnknownPlatform {
                subject: label.to_string(),
            }),
        }
    }
}

/// Errors raised while determining a task's platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The URL could not be parsed or carries no hostname.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Neither the hostname nor the supplied label maps to a known platform.
    #[error("unknown platform for {subject}")]
    UnknownPlatform { subject: String },
}

impl PlatformError {
    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "InvalidURL",
            Self::UnknownPlatform { .. } => "UnknownPlatform",
        }
    }
}
