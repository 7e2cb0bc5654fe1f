//! Image codec collaborator contract.
//!
//! The raw image container work (chunk layout, pixel data) lives behind this
//! trait; the core only deals in the decoded payload and the envelope handed
//! back for encoding.

use async_trait::async_trait;

use crate::card::{CardEnvelope, RawCard};
use crate::error::Result;

/// The payload a codec extracts from an image byte stream.
#[derive(Debug, Clone)]
pub struct DecodedCard {
    /// The raw, partial card payload. Normalization is the caller's job.
    pub card: RawCard,
    /// The source image as a data URL, used as the avatar preview and as the
    /// container for re-export.
    pub avatar: Option<String>,
    /// Spec tag found in (or inferred from) the embedded metadata.
    pub spec: String,
    pub spec_version: String,
}

/// An abstract metadata codec over image byte streams.
///
/// Implementations decode the embedded card payload out of a supported image
/// container and re-embed an envelope into one. Decode failures (unsupported
/// container, missing metadata, malformed payload) surface as
/// [`CardError::Decode`](crate::CardError::Decode); they are never retried.
#[async_trait]
pub trait CardCodec: Send + Sync {
    /// Extracts the embedded card payload from an image byte stream.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the bytes are not a supported image
    /// container or carry no card metadata.
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedCard>;

    /// Produces an exportable image byte stream embedding `envelope`.
    ///
    /// # Arguments
    ///
    /// * `envelope` - The complete card envelope to embed
    /// * `avatar` - The avatar image as a data URL; implementations fall back
    ///   to a placeholder container when absent
    async fn encode(&self, envelope: &CardEnvelope, avatar: Option<&str>) -> Result<Vec<u8>>;
}
