//! Error types for the protocol layer.
//!
//! Every Riposte crate defines its own error enum, so a `ProtocolError`
//! always means "the bytes were wrong", never "the network failed" or
//! "the lobby refused".

/// Errors produced while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Turning a frame into bytes failed. Rare in practice: it takes a
    /// value JSON cannot represent (for the default codec, e.g. a map
    /// with non-string keys inside a game's view type).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Turning bytes into a frame failed: malformed JSON, an unknown
    /// `type` tag, a missing field, or a truncated message.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but breaks a protocol rule, such as a hello
    /// carrying an unsupported version.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
