//! AWS Signature Version 4 request signing.
//!
//! This crate implements the SigV4 signing process on top of
//! [`awsign_core`]: canonicalization, credential scoping, signing key
//! derivation, payload checksum resolution, and both header-based and
//! query-based (presigned) signature placement.
//!
//! - [Signature Version 4 signing process](https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_aws-signing.html)

mod constants;

mod credential;
pub use credential::Credential;

mod settings;
pub use settings::{ChecksumSpec, SigningSettings};

mod checksum;
pub use checksum::{ChecksumAlgorithm, ContentChecksum};

mod canonical;
pub use canonical::{CanonicalRequest, CredentialScope};

mod signing_key;

mod sign_request;
pub use sign_request::RequestSigner;
