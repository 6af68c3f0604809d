//! Codec trait and implementations for requests and notifications.
//!
//! A codec turns protocol values into bytes and back. The session layer
//! never touches bytes: a transport hands it a decoded
//! [`Request`](crate::Request) and receives
//! [`Notification`](crate::Notification)s back, and whichever [`Codec`] the
//! transport picked does the conversion at the edge.
//!
//! [`JsonCodec`] is the only implementation today. A compact binary codec
//! can sit next to it later; nothing above this module names a concrete
//! codec except the facade's default type parameter.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ProtocolError, Request};

/// Converts serializable values to bytes and back.
///
/// ## Trait bounds
///
/// - `Send + Sync`: one codec is shared by every connection, and Tokio may
///   poll those connections on any worker thread.
/// - `'static`: the codec owns everything it needs, so it can live inside
///   the server state for as long as the server runs.
///
/// ## Generic methods
///
/// `encode` and `decode` work for any serde type, not just [`Request`].
/// The same codec decodes incoming requests and encodes outgoing
/// [`Notification`](crate::Notification)s.
///
/// `decode` asks for `DeserializeOwned` rather than `Deserialize<'de>`: the
/// decoded value never borrows from the frame, so the transport can reuse
/// its read buffer as soon as `decode` returns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] when the value can't be represented
    /// in this format, e.g. a map whose keys aren't strings under JSON.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] for malformed or truncated input,
    /// or bytes that describe a different type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes a client request, then checks it.
    ///
    /// Decoding only proves the frame has the right shape. A `Move` whose
    /// position is NaN decodes fine, and one such value would poison every
    /// distance test in the match, so [`Request::validate`] runs before the
    /// request goes anywhere near the session.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] for bad bytes,
    /// [`ProtocolError::InvalidMessage`] for a well-formed request that
    /// breaks a protocol rule.
    fn decode_request(&self, data: &[u8]) -> Result<Request, ProtocolError> {
        let request: Request = self.decode(data)?;
        request.validate()?;
        Ok(request)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON is human-readable, so request logs can be read as-is while
/// play-testing and a browser client can speak it without extra tooling.
/// The cost is size: a `Move` is several times larger than it would be in a
/// binary format, which adds up when every player sends one per tick.
///
/// Behind the `json` feature (on by default). Hosts that bring their own
/// codec can turn it off and drop the `serde_json` dependency.
///
/// ```rust
/// use shadowhunt_protocol::{Codec, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Request::SetReady { ready: true }).unwrap();
/// let back: Request = codec.decode(&bytes).unwrap();
/// assert_eq!(back, Request::SetReady { ready: true });
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
