use std::io::{Read, Seek, SeekFrom};
use std::mem;

use awsign_core::hash::base64_encode;
use awsign_core::{Error, Result, SigningPayload};
use bytes::BytesMut;
use futures::TryStreamExt;
use sha2::Digest;

use crate::constants::{EMPTY_STRING_SHA256, STREAMING_PAYLOAD, UNSIGNED_PAYLOAD};
use crate::settings::SigningSettings;

/// Additional checksum algorithms AWS services accept alongside the SigV4
/// payload hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// CRC32 (IEEE).
    Crc32,
    /// CRC32C (Castagnoli).
    Crc32c,
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
}

impl ChecksumAlgorithm {
    /// Base64 encoded digest of `content`, the format checksum headers carry.
    pub fn base64_digest(&self, content: &[u8]) -> String {
        let mut d = self.digester();
        d.update(content);
        base64_encode(&d.finish())
    }

    fn digester(&self) -> Digester {
        match self {
            Self::Crc32 => Digester::Crc32(crc32fast::Hasher::new()),
            Self::Crc32c => Digester::Crc32c(0),
            Self::Sha1 => Digester::Sha1(sha1::Sha1::new()),
            Self::Sha256 => Digester::Sha256(sha2::Sha256::new()),
        }
    }
}

enum Digester {
    Crc32(crc32fast::Hasher),
    Crc32c(u32),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
}

impl Digester {
    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Crc32(h) => h.update(chunk),
            Self::Crc32c(state) => *state = crc32c::crc32c_append(*state, chunk),
            Self::Sha1(h) => h.update(chunk),
            Self::Sha256(h) => h.update(chunk),
        }
    }

    fn finish(self) -> Vec<u8> {
        match self {
            Self::Crc32(h) => h.finalize().to_be_bytes().to_vec(),
            Self::Crc32c(state) => state.to_be_bytes().to_vec(),
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
        }
    }
}

/// The resolved payload checksum used during canonicalization.
#[derive(Debug, Clone)]
pub struct ContentChecksum {
    /// The payload hash: hex encoded SHA256, or one of the sentinels.
    pub content_hash: String,
    /// An additional checksum destined for a header, as
    /// `(header name, base64 value)`.
    pub extra_header: Option<(String, String)>,
}

impl ContentChecksum {
    fn streaming() -> Self {
        Self {
            content_hash: STREAMING_PAYLOAD.to_string(),
            extra_header: None,
        }
    }

    fn unsigned() -> Self {
        Self {
            content_hash: UNSIGNED_PAYLOAD.to_string(),
            extra_header: None,
        }
    }
}

/// Whether resolution has to read payload bytes for these settings.
fn needs_payload_bytes(settings: &SigningSettings) -> bool {
    !settings.chunked_encoding
        && (settings.payload_signing || settings.content_checksum.is_some())
}

/// Resolve the payload checksum, draining an async stream payload if its
/// bytes are needed. The drained stream is replaced with the buffered bytes
/// so the body can still be sent afterwards.
pub(crate) async fn resolve(
    payload: &mut SigningPayload,
    settings: &SigningSettings,
    presigned: bool,
) -> Result<ContentChecksum> {
    if matches!(payload, SigningPayload::Stream(_)) && needs_payload_bytes(settings) {
        let SigningPayload::Stream(mut stream) = mem::take(payload) else {
            unreachable!("payload variant checked above")
        };

        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        *payload = SigningPayload::Bytes(buf.freeze());
    }

    resolve_buffered(payload, settings, presigned)
}

/// Synchronous resolution. Stream payloads that would have to be read are
/// rejected; they only work through the async entry point.
pub(crate) fn resolve_sync(
    payload: &mut SigningPayload,
    settings: &SigningSettings,
    presigned: bool,
) -> Result<ContentChecksum> {
    if matches!(payload, SigningPayload::Stream(_)) && needs_payload_bytes(settings) {
        return Err(Error::request_invalid(
            "stream payload must be signed through the async entry point",
        ));
    }

    resolve_buffered(payload, settings, presigned)
}

fn resolve_buffered(
    payload: &mut SigningPayload,
    settings: &SigningSettings,
    presigned: bool,
) -> Result<ContentChecksum> {
    if settings.chunked_encoding {
        return Ok(ContentChecksum::streaming());
    }

    let spec = settings.content_checksum.as_ref();

    match payload {
        SigningPayload::Empty => {
            // Presigned URLs without payload signing advertise the payload
            // as unsigned; everything else uses the digest of zero bytes.
            let content_hash = if presigned && !settings.payload_signing {
                UNSIGNED_PAYLOAD.to_string()
            } else {
                EMPTY_STRING_SHA256.to_string()
            };
            Ok(ContentChecksum {
                content_hash,
                extra_header: spec
                    .map(|s| (s.header_name.clone(), s.algorithm.base64_digest(&[]))),
            })
        }
        _ if !needs_payload_bytes(settings) => Ok(ContentChecksum::unsigned()),
        SigningPayload::Bytes(bs) => {
            let mut digest = PayloadDigest::new(settings);
            digest.update(bs);
            Ok(digest.finish())
        }
        SigningPayload::Reader(r) => {
            let start = r.stream_position()?;

            let mut digest = PayloadDigest::new(settings);
            let mut buf = [0u8; 8192];
            loop {
                let n = r.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                digest.update(&buf[..n]);
            }

            r.seek(SeekFrom::Start(start))?;
            Ok(digest.finish())
        }
        SigningPayload::Stream(_) => Err(Error::request_invalid(
            "stream payload must be signed through the async entry point",
        )),
    }
}

/// Feeds payload chunks through the SHA256 hasher and the optional
/// additional checksum in one pass.
struct PayloadDigest {
    sha256: Option<sha2::Sha256>,
    extra: Option<(String, Digester)>,
}

impl PayloadDigest {
    fn new(settings: &SigningSettings) -> Self {
        Self {
            sha256: settings.payload_signing.then(sha2::Sha256::new),
            extra: settings
                .content_checksum
                .as_ref()
                .map(|s| (s.header_name.clone(), s.algorithm.digester())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        if let Some(h) = self.sha256.as_mut() {
            h.update(chunk);
        }
        if let Some((_, d)) = self.extra.as_mut() {
            d.update(chunk);
        }
    }

    fn finish(self) -> ContentChecksum {
        ContentChecksum {
            content_hash: match self.sha256 {
                Some(h) => hex::encode(h.finalize()),
                None => UNSIGNED_PAYLOAD.to_string(),
            },
            extra_header: self
                .extra
                .map(|(name, d)| (name, base64_encode(&d.finish()))),
        }
    }
}
