//! The embedder blob: the single artifact both parties exchange.
//!
//! Layout: a four-byte magic prefix, a little-endian `u16` blob version,
//! then a zstd-compressed bincode payload holding the config, the feature
//! factory, and the optional SCM matrix. The compression matters once a
//! trained SCM matrix is on board (`m × m` floats); the header makes the
//! artifact self-describing so a stale or foreign file is rejected with a
//! clear error instead of deserializing into garbage.
//!
//! Training state (the frequency tables) deliberately stays local: the blob
//! carries the embedding space, not the fitting history.

use serde::{Deserialize, Serialize};

use features::FeatureFactory;

use crate::config::EmbedderConfig;
use crate::embedder::Embedder;
use crate::error::{EmbedderError, SerializationError};
use crate::scm::ScmMatrix;

/// Magic prefix identifying an embedder blob.
pub const BLOB_MAGIC: [u8; 4] = *b"BLNK";
/// Current blob format version.
pub const BLOB_VERSION: u16 = 1;

const ZSTD_LEVEL: i32 = 3;

#[derive(Serialize, Deserialize)]
struct BlobPayload {
    config: EmbedderConfig,
    factory: FeatureFactory,
    scm: Option<ScmMatrix>,
}

impl Embedder {
    /// Serialize this embedder into the exchange blob.
    pub fn to_blob(&self) -> Result<Vec<u8>, SerializationError> {
        let payload = BlobPayload {
            config: self.config().clone(),
            factory: self.factory().clone(),
            scm: self.scm().cloned(),
        };
        let encoded = bincode::serialize(&payload)
            .map_err(|e| SerializationError::Payload(e.to_string()))?;
        let compressed = zstd::stream::encode_all(&encoded[..], ZSTD_LEVEL)?;

        let mut out = Vec::with_capacity(compressed.len() + 6);
        out.extend_from_slice(&BLOB_MAGIC);
        out.extend_from_slice(&BLOB_VERSION.to_le_bytes());
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    /// Reconstruct an embedder from a blob produced by
    /// [`to_blob`](Self::to_blob).
    ///
    /// The loaded config and SCM matrix are re-validated, and the checksum
    /// is recomputed from the payload, so both parties end up with the same
    /// embedding-space identity.
    pub fn from_blob(bytes: &[u8]) -> Result<Embedder, EmbedderError> {
        if bytes.len() < 6 || bytes[0..4] != BLOB_MAGIC {
            return Err(SerializationError::BadMagic.into());
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != BLOB_VERSION {
            return Err(SerializationError::UnsupportedBlobVersion {
                found: version,
                expected: BLOB_VERSION,
            }
            .into());
        }

        let decompressed =
            zstd::stream::decode_all(&bytes[6..]).map_err(SerializationError::Io)?;
        let payload: BlobPayload = bincode::deserialize(&decompressed)
            .map_err(|e| SerializationError::Payload(e.to_string()))?;

        match payload.scm {
            Some(scm) => Embedder::with_scm(payload.config, payload.factory, scm),
            None => Embedder::new(payload.config, payload.factory),
        }
    }
}
