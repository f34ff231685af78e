//! Core components for signing API requests.
//!
//! This crate provides the foundational types and traits for the awsign
//! ecosystem. It defines the scheme-independent pieces of request signing:
//! the mutable request view that signers canonicalize and mutate, the
//! payload abstraction that checksums are resolved from, and the traits
//! that concrete signing schemes implement.
//!
//! ## Overview
//!
//! - [`SigningRequest`]: a detached, mutable view of an HTTP request.
//!   Signers stage all mutations on it and apply them back in one step, so
//!   a failed signing attempt never leaves a half-signed request behind.
//! - [`SigningPayload`]: the request body as seen by the signer. It can be
//!   empty, in-memory bytes, a re-readable synchronous reader, or an
//!   asynchronous byte stream.
//! - [`SignRequest`]: the trait a signing scheme implements.
//! - [`Signer`]: the entry point that validates the credential and drives
//!   the scheme implementation.
//!
//! ## Example
//!
//! ```no_run
//! use awsign_core::{Result, SignRequest, Signer, SigningCredential, SigningPayload};
//! use async_trait::async_trait;
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//!     secret: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty() && !self.secret.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyScheme;
//!
//! #[async_trait]
//! impl SignRequest for MyScheme {
//!     type Credential = MyCredential;
//!
//!     async fn sign_request(
//!         &self,
//!         _req: &mut http::request::Parts,
//!         _payload: &mut SigningPayload,
//!         _credential: Option<&Self::Credential>,
//!         _expires_in: Option<Duration>,
//!     ) -> Result<()> {
//!         todo!()
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(MyScheme);
//!
//! let (mut parts, _) = http::Request::builder()
//!     .method("GET")
//!     .uri("https://example.com")
//!     .body(())
//!     .expect("request must be valid")
//!     .into_parts();
//! let mut payload = SigningPayload::Empty;
//!
//! let cred = MyCredential {
//!     key: "my-access-key".to_string(),
//!     secret: "my-secret-key".to_string(),
//! };
//! signer.sign(&mut parts, &mut payload, Some(&cred), None).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{SignRequest, SigningCredential};
mod payload;
pub use payload::{ReplayRead, SigningPayload};
mod request;
pub use request::SigningRequest;
mod signer;
pub use signer::Signer;
