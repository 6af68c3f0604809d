//! Error types for the protocol layer.
//!
//! Every Shadowhunt crate owns its own error enum. A `ProtocolError`
//! always means "bytes didn't turn into a message (or back)", never "the
//! session rejected you": that is a `SessionError`, and a refused gameplay
//! action is an `ActionError`. The facade wraps all three in one enum, so
//! callers that don't care which layer failed can use `?` throughout.

/// Errors that can occur while encoding or decoding protocol messages.
///
/// `thiserror` derives `std::error::Error` and `Display`. The `#[error]`
/// attribute on each variant is the message that shows up in logs.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    ///
    /// Rare for the types in this crate: every field is JSON-representable.
    /// The inner error is kept as-is so the log line says what serde_json
    /// choked on.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes → Rust value).
    ///
    /// Usually malformed JSON, a missing field, a wrong type, or an unknown
    /// request tag such as `{"type":"Teleport"}`. The connection that sent
    /// it gets the error back; the session never sees the frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule.
    ///
    /// Today that means a position or direction that isn't finite. The
    /// string names the offending field.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
