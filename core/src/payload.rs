use std::fmt::{Debug, Formatter};
use std::io::{Read, Seek};

use bytes::Bytes;
use futures::stream::BoxStream;

/// A synchronous payload source that can be read more than once.
///
/// The signer reads the payload once to compute its checksum and then
/// restores the read position, since the surrounding client may replay the
/// same payload when it retries the request.
pub trait ReplayRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReplayRead for T {}

/// The request payload as seen by the signer.
///
/// Signing itself never sends the payload anywhere. It only reads it when a
/// payload checksum is required, and hands it back untouched otherwise.
#[derive(Default)]
pub enum SigningPayload {
    /// No payload.
    #[default]
    Empty,
    /// A payload that is already in memory.
    Bytes(Bytes),
    /// A synchronous payload that supports replay.
    Reader(Box<dyn ReplayRead>),
    /// An asynchronous byte stream.
    ///
    /// The stream is consumed at most once. When the signer has to hash it,
    /// the stream is drained into memory and this variant is replaced with
    /// [`SigningPayload::Bytes`] so the request body can still be sent.
    Stream(BoxStream<'static, std::io::Result<Bytes>>),
}

impl SigningPayload {
    /// Create a payload from in-memory bytes.
    pub fn from_bytes(bs: impl Into<Bytes>) -> Self {
        Self::Bytes(bs.into())
    }

    /// Create a payload from a re-readable synchronous reader.
    pub fn from_reader(r: impl ReplayRead + 'static) -> Self {
        Self::Reader(Box::new(r))
    }

    /// Create a payload from an asynchronous byte stream.
    pub fn from_stream(s: BoxStream<'static, std::io::Result<Bytes>>) -> Self {
        Self::Stream(s)
    }

    /// Return true if there is no payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl Debug for SigningPayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("SigningPayload::Empty"),
            Self::Bytes(bs) => write!(f, "SigningPayload::Bytes({} bytes)", bs.len()),
            Self::Reader(_) => f.write_str("SigningPayload::Reader"),
            Self::Stream(_) => f.write_str("SigningPayload::Stream"),
        }
    }
}

impl From<Bytes> for SigningPayload {
    fn from(bs: Bytes) -> Self {
        Self::Bytes(bs)
    }
}

impl From<Vec<u8>> for SigningPayload {
    fn from(bs: Vec<u8>) -> Self {
        Self::Bytes(bs.into())
    }
}

impl From<&'static str> for SigningPayload {
    fn from(s: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(SigningPayload::default().is_empty());
        assert!(!SigningPayload::from_bytes("abc").is_empty());
    }

    #[test]
    fn test_debug_does_not_expose_content() {
        let p = SigningPayload::from_bytes("secret-body");
        assert_eq!(format!("{p:?}"), "SigningPayload::Bytes(11 bytes)");
    }
}
