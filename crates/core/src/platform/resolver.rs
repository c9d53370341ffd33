//! Hostname based platform inference.

use url::Url;

use super::types::{Platform, PlatformError};

/// Hostname substrings and the platform they identify.
///
/// The table is scanned in order and the first match wins. A host can contain
/// more than one pattern (`x.com` is a suffix of many unrelated domains), so
/// the order is the tie-break: more specific platforms come first and X, whose
/// pattern is the loosest, comes last.
pub const HOST_PATTERNS: &[(&str, Platform)] = &[
    ("t.me", Platform::Telegram),
    ("telegram", Platform::Telegram),
    ("youtube", Platform::YouTube),
    ("youtu.be", Platform::YouTube),
    ("tiktok", Platform::TikTok),
    ("facebook", Platform::Facebook),
    ("fb.watch", Platform::Facebook),
    ("twitter", Platform::X),
    ("x.com", Platform::X),
];

/// Resolves the platform of a media URL from its hostname.
pub fn resolve_platform(link: &str) -> Result<Platform, PlatformError> {
    let parsed = Url::parse(link.trim()).map_err(|e| PlatformError::InvalidUrl {
        url: link.to_string(),
        reason: e.to_string(),
    })?;

    let host = parsed
        .host_str()
        .ok_or_else(|| PlatformError::InvalidUrl {
            url: link.to_string(),
            reason: "missing hostname".to_string(),
        })?
        .to_ascii_lowercase();

    HOST_PATTERNS
        .iter()
        .find(|(pattern, _)| host.contains(pattern))
        .map(|(_, platform)| *platform)
        .ok_or(PlatformError::UnknownPlatform { subject: host })
}
