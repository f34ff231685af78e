use awsign_core::time::DateTime;
use awsign_core::{Error, Result};

use crate::checksum::ChecksumAlgorithm;

/// Per-call configuration of the SigV4 signing process.
///
/// `service` and `region` are the only required values; everything else has
/// the default AWS services expect. Services with different encoding
/// expectations (S3 most notably) must say so explicitly rather than rely
/// on the signer guessing from the service name.
#[derive(Debug, Clone)]
pub struct SigningSettings {
    pub(crate) service: String,
    pub(crate) region: String,

    pub(crate) time: Option<DateTime>,
    pub(crate) double_uri_encode: bool,
    pub(crate) normalize_uri_path: bool,
    pub(crate) payload_signing: bool,
    pub(crate) content_sha256_header: bool,
    pub(crate) chunked_encoding: bool,
    pub(crate) content_checksum: Option<ChecksumSpec>,
}

/// A request for an additional payload checksum header.
///
/// The header name and the algorithm travel together so that one can never
/// be configured without the other.
#[derive(Debug, Clone)]
pub struct ChecksumSpec {
    pub(crate) header_name: String,
    pub(crate) algorithm: ChecksumAlgorithm,
}

impl ChecksumSpec {
    /// Create a checksum spec for the given header and algorithm.
    pub fn new(header_name: &str, algorithm: ChecksumAlgorithm) -> Self {
        Self {
            header_name: header_name.to_lowercase(),
            algorithm,
        }
    }
}

impl SigningSettings {
    /// Create settings for the given service and region, e.g. `("s3", "us-east-1")`.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.to_string(),
            region: region.to_string(),

            time: None,
            double_uri_encode: true,
            normalize_uri_path: true,
            payload_signing: false,
            content_sha256_header: false,
            chunked_encoding: false,
            content_checksum: None,
        }
    }

    /// Pin the signing clock.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Control whether percent-encoded triplets in the path are encoded
    /// again during canonicalization.
    ///
    /// Most AWS services expect `true` (the default); S3 expects `false`.
    pub fn with_double_uri_encode(mut self, enable: bool) -> Self {
        self.double_uri_encode = enable;
        self
    }

    /// Control whether `.`/`..` segments and duplicate slashes in the path
    /// are resolved before canonicalization. Defaults to `true`; S3 treats
    /// such paths as distinct object keys and expects `false`.
    pub fn with_normalize_uri_path(mut self, enable: bool) -> Self {
        self.normalize_uri_path = enable;
        self
    }

    /// Control whether the payload is hashed into the signature. Defaults
    /// to `false`, which signs the request with the `UNSIGNED-PAYLOAD`
    /// sentinel instead of reading the body.
    pub fn with_payload_signing(mut self, enable: bool) -> Self {
        self.payload_signing = enable;
        self
    }

    /// Control whether the resolved payload hash is also placed in the
    /// `x-amz-content-sha256` header, as S3 requires. Defaults to `false`.
    pub fn with_content_sha256_header(mut self, enable: bool) -> Self {
        self.content_sha256_header = enable;
        self
    }

    /// Sign for an `aws-chunked` encoded payload. The payload hash becomes
    /// the streaming sentinel; the chunk framing itself is applied by the
    /// transport layer.
    pub fn with_chunked_encoding(mut self, enable: bool) -> Self {
        self.chunked_encoding = enable;
        self
    }

    /// Request an additional payload checksum header, e.g.
    /// `x-amz-checksum-crc32`.
    pub fn with_content_checksum(mut self, spec: ChecksumSpec) -> Self {
        self.content_checksum = Some(spec);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.service.is_empty() {
            return Err(Error::config_invalid("service name is required for signing"));
        }
        if self.region.is_empty() {
            return Err(Error::config_invalid("region is required for signing"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsign_core::ErrorKind;

    #[test]
    fn test_defaults() {
        let settings = SigningSettings::new("s3", "us-east-1");
        assert!(settings.double_uri_encode);
        assert!(settings.normalize_uri_path);
        assert!(!settings.payload_signing);
        assert!(!settings.content_sha256_header);
        assert!(!settings.chunked_encoding);
        assert!(settings.content_checksum.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_service_and_region() {
        let err = SigningSettings::new("", "us-east-1")
            .validate()
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = SigningSettings::new("s3", "")
            .validate()
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_checksum_spec_lowercases_header() {
        let spec = ChecksumSpec::new("X-Amz-Checksum-Crc32", ChecksumAlgorithm::Crc32);
        assert_eq!(spec.header_name, "x-amz-checksum-crc32");
    }
}
