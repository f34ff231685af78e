use std::mem;

use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, HeaderValue, Method, Uri};
use std::str::FromStr;

use crate::{Error, Result};

/// A detached, mutable view of the request under signing.
///
/// The view is taken out of `http::request::Parts` at the start of a
/// signing operation and written back with [`SigningRequest::apply`] once
/// the signature is computed. If signing fails in between, the original
/// request parts are left without any of the staged mutations applied as a
/// whole; a partial signature is never attached.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as it appeared on the wire (possibly percent-encoded).
    pub path: String,
    /// HTTP query parameters, decoded, in their original order.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing view from `http::request::Parts`.
    pub fn build(parts: &http::request::Parts) -> Result<Self> {
        let uri = parts.uri.clone().into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            // A query parameter without `=` parses as a key with an empty
            // value.
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers: parts.headers.clone(),
        })
    }

    /// Apply the signing view back to `http::request::Parts`.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        let query_size = self.query_size();

        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if query_size == 0 {
                    self.path
                } else {
                    let mut s = self.path;
                    s.reserve(query_size + 1);

                    s.push('?');
                    for (i, (k, v)) in self.query.iter().enumerate() {
                        if i > 0 {
                            s.push('&');
                        }

                        s.push_str(k);
                        if !v.is_empty() {
                            s.push('=');
                            s.push_str(v);
                        }
                    }

                    s
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Push a new query pair into the query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Get the total size of all query keys and values.
    #[inline]
    pub fn query_size(&self) -> usize {
        self.query
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
    }

    /// Trim leading and trailing spaces from a header value.
    ///
    /// Interior whitespace is kept as-is, per the canonicalization rules of
    /// the signing schemes this crate serves.
    pub fn header_value_normalize(v: &mut HeaderValue) {
        let bs = v.as_bytes();

        let starting_index = bs.iter().position(|b| *b != b' ').unwrap_or(0);
        let ending_offset = bs.iter().rev().position(|b| *b != b' ').unwrap_or(0);
        let ending_index = bs.len() - ending_offset;

        // This can't fail because we started with a valid HeaderValue and then only trimmed spaces
        *v = HeaderValue::from_bytes(&bs[starting_index..ending_index])
            .expect("invalid header value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(uri: &'static str) -> http::request::Parts {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(())
            .expect("request must be valid")
            .into_parts()
            .0
    }

    #[test]
    fn test_build_splits_uri() {
        let p = parts("https://example.amazonaws.com/foo/bar?a=1&b=&c");
        let req = SigningRequest::build(&p).expect("build must succeed");

        assert_eq!(req.path, "/foo/bar");
        assert_eq!(
            req.query,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "".to_string()),
                ("c".to_string(), "".to_string()),
            ]
        );
        assert_eq!(req.authority.as_str(), "example.amazonaws.com");
    }

    #[test]
    fn test_build_without_authority_fails() {
        let (mut p, _) = http::Request::builder()
            .method(Method::GET)
            .uri("/relative")
            .body(())
            .expect("request must be valid")
            .into_parts();
        p.uri = Uri::from_static("/relative");

        let err = SigningRequest::build(&p).expect_err("must fail");
        assert_eq!(err.kind(), crate::ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_apply_round_trips() {
        let mut p = parts("http://127.0.0.1:9000/hello?list-type=2");
        let mut req = SigningRequest::build(&p).expect("build must succeed");
        req.query_push("marker", "abc");
        req.apply(&mut p).expect("apply must succeed");

        assert_eq!(
            p.uri.to_string(),
            "http://127.0.0.1:9000/hello?list-type=2&marker=abc"
        );
    }

    #[test]
    fn test_header_value_normalize() {
        let mut v = HeaderValue::from_static("  a  b  ");
        SigningRequest::header_value_normalize(&mut v);
        assert_eq!(v.as_bytes(), b"a  b");
    }
}
