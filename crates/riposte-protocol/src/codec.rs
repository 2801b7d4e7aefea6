//! Codec trait and the default JSON implementation.
//!
//! A codec converts between frame values and raw bytes. Nothing above the
//! transport cares which format is in use; the server is generic over
//! [`Codec`], and swapping JSON for a binary format is a one-line change
//! at the builder.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task. The methods are generic over the value type: the same
/// codec handles [`ClientFrame`](crate::ClientFrame), lobby pushes, and
/// whatever command and view types a game defines, as long as they carry
/// the serde derives.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] when the value cannot be represented in
    /// the codec's format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] when the bytes are malformed or do not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// The default [`Codec`], speaking JSON via `serde_json`.
///
/// Human-readable frames make development painless: every message can be
/// read straight out of browser DevTools or a tcpdump. Behind the `json`
/// feature flag (on by default) so deployments with a binary codec can
/// drop the dependency.
///
/// ## Example
///
/// ```rust
/// use riposte_protocol::{ChallengeId, ClientFrame, Codec, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let frame = ClientFrame::Accept {
///     challenge_id: ChallengeId("ch_01".into()),
///     deck: vec!["drake".into()],
/// };
///
/// let bytes = codec.encode(&frame).unwrap();
/// let decoded: ClientFrame = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
