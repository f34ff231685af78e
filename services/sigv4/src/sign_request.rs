// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::str::FromStr;
use std::time::Duration;

use awsign_core::hash::hex_hmac_sha256;
use awsign_core::time::{format_iso8601, now, DateTime};
use awsign_core::{Error, Result, SignRequest, SigningCredential, SigningPayload, SigningRequest};
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, HOST};
use log::debug;

use crate::canonical::{
    encode_query_in_place, signed_header_names, string_to_sign, CanonicalRequest, CredentialScope,
};
use crate::checksum::{self, ContentChecksum};
use crate::constants::{
    AWS4_HMAC_SHA256, MAX_EXPIRES_IN_SECS, X_AMZ_ALGORITHM, X_AMZ_CONTENT_SHA_256,
    X_AMZ_CREDENTIAL, X_AMZ_DATE, X_AMZ_DATE_QUERY, X_AMZ_EXPIRES, X_AMZ_SECURITY_TOKEN,
    X_AMZ_SECURITY_TOKEN_QUERY, X_AMZ_SIGNATURE, X_AMZ_SIGNED_HEADERS,
};
use crate::credential::Credential;
use crate::settings::SigningSettings;
use crate::signing_key::SigningKeyCache;

/// The SigV4 signing scheme.
///
/// Signs requests in place, either into the `Authorization` header or, when
/// an expiry is given, into the query string as a presigned request.
///
/// # Examples
///
/// ```no_run
/// use awsign_core::{Signer, SigningPayload};
/// use awsign_sigv4::{Credential, RequestSigner, SigningSettings};
///
/// # async fn example() -> awsign_core::Result<()> {
/// let signer = Signer::new(RequestSigner::new(SigningSettings::new("s3", "us-east-1")));
/// let cred = Credential::new("access_key_id", "secret_access_key");
///
/// let (mut parts, _) = http::Request::builder()
///     .uri("https://s3.amazonaws.com/testbucket")
///     .body(())
///     .unwrap()
///     .into_parts();
/// let mut payload = SigningPayload::Empty;
///
/// signer.sign(&mut parts, &mut payload, Some(&cred), None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RequestSigner {
    settings: SigningSettings,
    key_cache: SigningKeyCache,
}

impl RequestSigner {
    /// Create a signing scheme from settings.
    pub fn new(settings: SigningSettings) -> Self {
        Self {
            settings,
            key_cache: SigningKeyCache::default(),
        }
    }

    /// Sign the request without going through an async runtime.
    ///
    /// Behaves exactly like the async entry point except that a
    /// [`SigningPayload::Stream`] payload whose bytes are needed is
    /// rejected instead of drained.
    pub fn sign_request_sync(
        &self,
        parts: &mut http::request::Parts,
        payload: &mut SigningPayload,
        credential: Option<&Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };
        if !cred.is_valid() {
            return Err(Error::credential_invalid(
                "credential is expired or incomplete",
            ));
        }
        self.settings.validate()?;

        let checksum = checksum::resolve_sync(payload, &self.settings, expires_in.is_some())?;
        self.finish(parts, cred, checksum, expires_in)
    }

    /// The shared tail of both entry points: canonicalize, derive, sign,
    /// and write the result back into the request.
    fn finish(
        &self,
        parts: &mut http::request::Parts,
        cred: &Credential,
        checksum: ContentChecksum,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        // Captured once so every component of the signature sees the same
        // instant, even across a midnight boundary.
        let now = self.settings.time.unwrap_or_else(now);
        let scope = CredentialScope::new(now, &self.settings);

        let mut req = SigningRequest::build(parts)?;
        self.add_prerequisites(&mut req, cred, &checksum, now, &scope, expires_in)?;

        // A payload hash the caller already placed in the header wins over
        // the resolved one.
        let payload_hash = match req.headers.get(X_AMZ_CONTENT_SHA_256) {
            Some(v) => v.to_str()?.to_string(),
            None => checksum.content_hash.clone(),
        };

        let creq = CanonicalRequest::build(&req, &self.settings, &payload_hash)?;
        debug!("calculated canonical request: {creq}");

        let string_to_sign = string_to_sign(now, &scope, &creq.to_string())?;
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = self.key_cache.get(cred, &scope);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        self.add_signature(&mut req, cred, &scope, &creq, &signature, expires_in)?;
        req.apply(parts)
    }

    /// Stage everything that has to be in place before canonicalization:
    /// normalized header values, the `host` header, the checksum header,
    /// and the date along with the rest of the auth-location specific
    /// parameters.
    fn add_prerequisites(
        &self,
        req: &mut SigningRequest,
        cred: &Credential,
        checksum: &ContentChecksum,
        now: DateTime,
        scope: &CredentialScope,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        for v in req.headers.values_mut() {
            SigningRequest::header_value_normalize(v);
        }

        if !req.headers.contains_key(HOST) {
            req.headers
                .insert(HOST, HeaderValue::from_str(req.authority.as_str())?);
        }

        if let Some((name, value)) = &checksum.extra_header {
            let name = HeaderName::from_str(name)?;
            if !req.headers.contains_key(&name) {
                req.headers.insert(name, HeaderValue::from_str(value)?);
            }
        }

        match expires_in {
            None => {
                // Header-based signing. The date always reflects this
                // signing operation, never a stale caller-provided one.
                req.headers.insert(
                    HeaderName::from_static(X_AMZ_DATE),
                    HeaderValue::from_str(&format_iso8601(now))?,
                );

                if self.settings.content_sha256_header
                    && !req.headers.contains_key(X_AMZ_CONTENT_SHA_256)
                {
                    req.headers.insert(
                        HeaderName::from_static(X_AMZ_CONTENT_SHA_256),
                        HeaderValue::from_str(&checksum.content_hash)?,
                    );
                }

                if let Some(token) = &cred.session_token {
                    let mut value = HeaderValue::from_str(token)?;
                    // Token is configured to be sensitive, not to be printed in logs.
                    value.set_sensitive(true);
                    req.headers
                        .insert(HeaderName::from_static(X_AMZ_SECURITY_TOKEN), value);
                }
            }
            Some(expires) => {
                // Query-based signing. All auth parameters become query
                // parameters and are covered by the signature themselves.
                let secs = expires.as_secs();
                if secs == 0 || secs > MAX_EXPIRES_IN_SECS {
                    return Err(Error::config_invalid(
                        "expires_in must be between 1 second and 7 days",
                    ));
                }

                req.query_push(X_AMZ_ALGORITHM, AWS4_HMAC_SHA256);
                req.query_push(
                    X_AMZ_CREDENTIAL,
                    format!("{}/{scope}", cred.access_key_id),
                );
                req.query_push(X_AMZ_DATE_QUERY, format_iso8601(now));
                req.query_push(X_AMZ_EXPIRES, secs.to_string());
                req.query_push(X_AMZ_SIGNED_HEADERS, signed_header_names(req).join(";"));

                if let Some(token) = &cred.session_token {
                    req.query_push(X_AMZ_SECURITY_TOKEN_QUERY, token.clone());
                }
            }
        }

        Ok(())
    }

    /// Attach the computed signature and make the view wire-ready.
    fn add_signature(
        &self,
        req: &mut SigningRequest,
        cred: &Credential,
        scope: &CredentialScope,
        creq: &CanonicalRequest,
        signature: &str,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        encode_query_in_place(req);

        match expires_in {
            None => {
                let mut value = HeaderValue::from_str(&format!(
                    "{AWS4_HMAC_SHA256} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
                    cred.access_key_id,
                    creq.signed_headers_string(),
                ))?;
                value.set_sensitive(true);
                req.headers.insert(AUTHORIZATION, value);
            }
            Some(_) => {
                // The signature itself is hex and needs no encoding; it
                // goes in after the sort since it covers all the other
                // parameters.
                req.query_push(X_AMZ_SIGNATURE, signature);
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        parts: &mut http::request::Parts,
        payload: &mut SigningPayload,
        credential: Option<&Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };
        self.settings.validate()?;

        let checksum = checksum::resolve(payload, &self.settings, expires_in.is_some()).await?;
        self.finish(parts, cred, checksum, expires_in)
    }
}
