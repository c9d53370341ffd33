//! Relay module for handing fetched media to a remote asset service.
//!
//! A relay takes a local file path and returns a durable reference location
//! (typically a public URL). The production implementation uploads to
//! Cloudinary; tests substitute `testing::MockRelay`.

mod cloudinary;
mod config;
mod error;
mod traits;
mod types;

pub use cloudinary::{CloudinaryCredential, CloudinaryRelay, CLOUDINARY_URL_ENV};
pub use config::RelayConfig;
pub use error::RelayError;
pub use traits::Relay;
pub use types::RelayedAsset;
