use crate::{Result, SigningPayload};
use std::fmt::Debug;
use std::time::Duration;

/// SigningCredential is implemented by the credential types that signing
/// schemes consume.
///
/// Services require different material to sign requests, for example AWS
/// requires an access key and a secret key. The credential is resolved by an
/// external loader and handed to the signer fully formed.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is still usable for signing.
    fn is_valid(&self) -> bool;
}

/// SignRequest is the trait a signing scheme implements.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + 'static {
    /// Credential type consumed by this scheme.
    type Credential: SigningCredential;

    /// Sign the request in place.
    ///
    /// ## Credential
    ///
    /// `None` means an anonymous identity: the implementation MUST return
    /// without touching the request or the payload.
    ///
    /// ## Expires In
    ///
    /// `None` requests header-based signing. `Some(duration)` requests
    /// query-based signing (a presigned request) valid for that duration;
    /// schemes that don't support expiring signatures should return an
    /// error.
    async fn sign_request(
        &self,
        req: &mut http::request::Parts,
        payload: &mut SigningPayload,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()>;
}
