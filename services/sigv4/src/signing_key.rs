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

use std::sync::Mutex;

use awsign_core::hash::{hex_sha256, hmac_sha256};

use crate::canonical::CredentialScope;
use crate::constants::AWS4_REQUEST;
use crate::credential::Credential;

/// Derive the signing key for a secret key and scope.
///
/// ```text
/// kSecret = "AWS4" + secret access key
/// kDate = HMAC(kSecret, date)
/// kRegion = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
pub(crate) fn generate_signing_key(secret_access_key: &str, scope: &CredentialScope) -> Vec<u8> {
    let k_secret = format!("AWS4{secret_access_key}");

    let k_date = hmac_sha256(k_secret.as_bytes(), scope.date.as_bytes());
    let k_region = hmac_sha256(&k_date, scope.region.as_bytes());
    let k_service = hmac_sha256(&k_region, scope.service.as_bytes());
    hmac_sha256(&k_service, AWS4_REQUEST.as_bytes())
}

/// Cache of the most recently derived signing key.
///
/// The key only depends on the credential scope and the credential, so
/// within one day of signing against one service the derivation chain runs
/// once. A fingerprint of the secret stands in for the secret itself so the
/// cache never stores key material in a comparable form.
#[derive(Debug, Default)]
pub(crate) struct SigningKeyCache {
    entry: Mutex<Option<CacheEntry>>,
}

#[derive(Clone)]
struct CacheEntry {
    access_key_id: String,
    secret_fingerprint: String,
    scope: CredentialScope,
    signing_key: Vec<u8>,
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("access_key_id", &self.access_key_id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl SigningKeyCache {
    /// Get the signing key for this credential and scope, deriving and
    /// caching it on a miss.
    pub fn get(&self, cred: &Credential, scope: &CredentialScope) -> Vec<u8> {
        let fingerprint = hex_sha256(cred.secret_access_key.as_bytes());

        let mut entry = self.entry.lock().unwrap_or_else(|poison| {
            // The guarded value is a plain cache entry; a panic while it
            // was held cannot leave it torn.
            poison.into_inner()
        });
        if let Some(cached) = entry.as_ref() {
            if cached.access_key_id == cred.access_key_id
                && cached.secret_fingerprint == fingerprint
                && cached.scope == *scope
            {
                return cached.signing_key.clone();
            }
        }

        let signing_key = generate_signing_key(&cred.secret_access_key, scope);
        *entry = Some(CacheEntry {
            access_key_id: cred.access_key_id.clone(),
            secret_fingerprint: fingerprint,
            scope: scope.clone(),
            signing_key: signing_key.clone(),
        });

        signing_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(date: &str, region: &str, service: &str) -> CredentialScope {
        CredentialScope {
            date: date.to_string(),
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    #[test]
    fn test_signing_key_derivation() {
        // From the AWS signature v4 documentation example.
        let key = generate_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            &scope("20150830", "us-east-1", "iam"),
        );
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_cache_hit_and_invalidation() {
        let cache = SigningKeyCache::default();
        let cred = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");

        let s1 = scope("20150830", "us-east-1", "iam");
        let k1 = cache.get(&cred, &s1);
        assert_eq!(k1, cache.get(&cred, &s1));

        // A new day means a new key.
        let s2 = scope("20150831", "us-east-1", "iam");
        let k2 = cache.get(&cred, &s2);
        assert_ne!(k1, k2);

        // A rotated secret under the same access key means a new key.
        let rotated = Credential::new("AKIDEXAMPLE", "another-secret");
        assert_ne!(k2, cache.get(&rotated, &s2));
    }

    #[test]
    fn test_debug_does_not_leak_key_material() {
        let cache = SigningKeyCache::default();
        let cred = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
        let key = cache.get(&cred, &scope("20150830", "us-east-1", "iam"));

        let out = format!("{cache:?}");
        assert!(!out.contains(&hex::encode(&key)));
        assert!(!out.contains("wJalrXUtnFEMI"));
    }
}
