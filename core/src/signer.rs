use crate::{Error, Result, SignRequest, SigningCredential, SigningPayload};
use std::sync::Arc;
use std::time::Duration;

/// Signer is the entry point used to sign requests.
///
/// It pairs a signing scheme implementation with the credential handed in
/// per call. Signing a request is a self-contained computation: the signer
/// holds no mutable state and can be shared freely across tasks.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    scheme: Arc<dyn SignRequest<Credential = K>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer from a scheme implementation.
    pub fn new(scheme: impl SignRequest<Credential = K>) -> Self {
        Self {
            scheme: Arc::new(scheme),
        }
    }

    /// Sign the request in place.
    ///
    /// Passing `credential: None` signs nothing: the request is returned
    /// unmodified and the payload is never read. A credential that reports
    /// itself invalid (for example, expired) is rejected before any work
    /// happens.
    pub async fn sign(
        &self,
        req: &mut http::request::Parts,
        payload: &mut SigningPayload,
        credential: Option<&K>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        if let Some(cred) = credential {
            if !cred.is_valid() {
                return Err(Error::credential_invalid(
                    "credential is expired or incomplete",
                ));
            }
        }

        self.scheme
            .sign_request(req, payload, credential, expires_in)
            .await
    }

    /// Produce a presigned request valid for `expires_in`.
    ///
    /// This is query-based signing: the signature and its expiration end up
    /// in the query string rather than in an `Authorization` header, which
    /// makes the resulting URL shareable until it expires.
    pub async fn presign(
        &self,
        req: &mut http::request::Parts,
        credential: Option<&K>,
        expires_in: Duration,
    ) -> Result<()> {
        let mut payload = SigningPayload::Empty;
        self.sign(req, &mut payload, credential, Some(expires_in))
            .await
    }
}
