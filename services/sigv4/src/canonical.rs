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

use std::fmt;
use std::fmt::Display;
use std::fmt::Write;

use awsign_core::hash::hex_sha256;
use awsign_core::time::{format_date, format_iso8601, DateTime};
use awsign_core::{Error, Result, SigningRequest};
use percent_encoding::{percent_decode_str, utf8_percent_encode};

use crate::constants::{
    AWS4_HMAC_SHA256, AWS4_REQUEST, AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, EXCLUDED_HEADERS,
};
use crate::settings::SigningSettings;

/// The scope a signature is valid for: one day, one region, one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// Signing date, formatted as `YYYYMMDD`.
    pub date: String,
    /// Target region.
    pub region: String,
    /// Target service.
    pub service: String,
}

impl CredentialScope {
    pub(crate) fn new(now: DateTime, settings: &SigningSettings) -> Self {
        Self {
            date: format_date(now),
            region: settings.region.clone(),
            service: settings.service.clone(),
        }
    }
}

impl Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{AWS4_REQUEST}",
            self.date, self.region, self.service
        )
    }
}

/// The canonical form of a request, the exact text covered by the
/// signature.
#[derive(Debug)]
pub struct CanonicalRequest {
    /// The signed header names, lowercase and sorted.
    pub signed_headers: Vec<String>,
    content: String,
}

impl CanonicalRequest {
    /// Derive the canonical request from a signing view.
    ///
    /// The view's query must still hold decoded values; encoding for the
    /// wire happens after the signature is computed.
    pub(crate) fn build(
        req: &SigningRequest,
        settings: &SigningSettings,
        payload_hash: &str,
    ) -> Result<Self> {
        let signed_headers = signed_header_names(req);

        let mut content = String::with_capacity(256);
        writeln!(content, "{}", req.method)?;
        writeln!(content, "{}", canonical_uri(req, settings)?)?;
        writeln!(content, "{}", canonical_query(&req.query))?;
        for name in &signed_headers {
            let value = req
                .headers
                .get_all(name.as_str())
                .iter()
                .map(|v| {
                    std::str::from_utf8(v.as_bytes())
                        .map(str::trim)
                        .map_err(|_| Error::request_invalid("header value is not valid utf-8"))
                })
                .collect::<Result<Vec<_>>>()?
                .join(",");
            writeln!(content, "{name}:{value}")?;
        }
        writeln!(content)?;
        writeln!(content, "{}", signed_headers.join(";"))?;
        write!(content, "{payload_hash}")?;

        Ok(Self {
            signed_headers,
            content,
        })
    }

    /// The signed header names joined with `;`, as the `SignedHeaders`
    /// component carries them.
    pub fn signed_headers_string(&self) -> String {
        self.signed_headers.join(";")
    }
}

impl Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Build the string to sign from the canonical request.
pub(crate) fn string_to_sign(
    now: DateTime,
    scope: &CredentialScope,
    canonical_request: &str,
) -> Result<String> {
    let mut s = String::new();
    writeln!(s, "{AWS4_HMAC_SHA256}")?;
    writeln!(s, "{}", format_iso8601(now))?;
    writeln!(s, "{scope}")?;
    write!(s, "{}", hex_sha256(canonical_request.as_bytes()))?;

    Ok(s)
}

/// Percent-encode the query pairs in place and sort them, making the view
/// ready for [`SigningRequest::apply`].
pub(crate) fn encode_query_in_place(req: &mut SigningRequest) {
    for (k, v) in req.query.iter_mut() {
        *k = utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string();
        *v = utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string();
    }
    req.query.sort();
}

/// Header names that participate in the signature, lowercase and sorted.
pub(crate) fn signed_header_names(req: &SigningRequest) -> Vec<String> {
    let mut names: Vec<String> = req
        .headers
        .keys()
        .map(|name| name.as_str().to_string())
        .filter(|name| !EXCLUDED_HEADERS.contains(&name.as_str()))
        .collect();
    names.sort();
    names
}

fn canonical_uri(req: &SigningRequest, settings: &SigningSettings) -> Result<String> {
    let path = if settings.normalize_uri_path {
        normalize_uri_path(&req.path)
    } else if req.path.is_empty() {
        "/".to_string()
    } else {
        req.path.clone()
    };

    if settings.double_uri_encode {
        // The stored path is already percent-encoded once from the wire;
        // encoding it again yields the double-encoded canonical form.
        Ok(utf8_percent_encode(&path, &AWS_URI_ENCODE_SET).to_string())
    } else {
        // Services like S3 sign against the singly-encoded path. Decode
        // whatever encoding the caller used and re-encode once so the
        // canonical form does not depend on their encoding choices.
        let decoded = percent_decode_str(&path)
            .decode_utf8()
            .map_err(|_| Error::request_invalid("request path is not valid utf-8"))?;
        Ok(utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
    }
}

/// Resolve `.` and `..` segments and collapse duplicate slashes, keeping a
/// trailing slash if the input had one.
fn normalize_uri_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(path.len());
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    if path.ends_with('/') && !out.ends_with('/') {
        out.push('/');
    }

    out
}

fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    pairs.sort();

    let mut out = String::with_capacity(pairs.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }

    out
}
