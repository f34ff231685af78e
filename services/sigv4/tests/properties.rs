//! Behavioral properties of the signing process that hold for any input:
//! determinism, order invariance, and the anonymous bypass.

use std::time::Duration;

use anyhow::Result;
use awsign_core::{Signer, SigningPayload};
use awsign_sigv4::{Credential, RequestSigner, SigningSettings};
use chrono::{TimeZone, Utc};
use http::header::{HeaderValue, AUTHORIZATION};
use http::Method;
use pretty_assertions::assert_eq;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parts(uri: &str) -> http::request::Parts {
    http::Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(())
        .expect("request must be valid")
        .into_parts()
        .0
}

fn pinned_signer() -> Signer<Credential> {
    let time = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
    Signer::new(RequestSigner::new(
        SigningSettings::new("service", "us-east-1").with_time(time),
    ))
}

fn credential() -> Credential {
    Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
}

async fn signed_authorization(uri: &str) -> Result<String> {
    let signer = pinned_signer();
    let mut p = parts(uri);
    let mut payload = SigningPayload::Empty;
    signer
        .sign(&mut p, &mut payload, Some(&credential()), None)
        .await?;
    Ok(p.headers[AUTHORIZATION].to_str()?.to_string())
}

#[tokio::test]
async fn test_signing_is_deterministic() -> Result<()> {
    init_logger();

    let one = signed_authorization("https://example.amazonaws.com/path?a=1").await?;
    let two = signed_authorization("https://example.amazonaws.com/path?a=1").await?;
    assert_eq!(one, two);

    Ok(())
}

#[tokio::test]
async fn test_query_order_does_not_affect_signature() -> Result<()> {
    init_logger();

    let one = signed_authorization("https://example.amazonaws.com/?b=2&a=1&a=0").await?;
    let two = signed_authorization("https://example.amazonaws.com/?a=0&a=1&b=2").await?;
    assert_eq!(one, two);

    Ok(())
}

#[tokio::test]
async fn test_header_order_does_not_affect_signature() -> Result<()> {
    init_logger();

    let signer = pinned_signer();
    let cred = credential();

    let mut p1 = parts("https://example.amazonaws.com/");
    p1.headers
        .insert("x-custom-a", HeaderValue::from_static("1"));
    p1.headers
        .insert("x-custom-b", HeaderValue::from_static("2"));

    let mut p2 = parts("https://example.amazonaws.com/");
    p2.headers
        .insert("x-custom-b", HeaderValue::from_static("2"));
    p2.headers
        .insert("x-custom-a", HeaderValue::from_static("1"));

    let mut payload = SigningPayload::Empty;
    signer.sign(&mut p1, &mut payload, Some(&cred), None).await?;
    let mut payload = SigningPayload::Empty;
    signer.sign(&mut p2, &mut payload, Some(&cred), None).await?;

    assert_eq!(
        p1.headers[AUTHORIZATION].to_str()?,
        p2.headers[AUTHORIZATION].to_str()?
    );

    Ok(())
}

#[tokio::test]
async fn test_tampering_changes_the_signature() -> Result<()> {
    init_logger();

    let base = signed_authorization("https://example.amazonaws.com/a").await?;
    let other_path = signed_authorization("https://example.amazonaws.com/b").await?;
    let other_query = signed_authorization("https://example.amazonaws.com/a?x=1").await?;

    assert_ne!(base, other_path);
    assert_ne!(base, other_query);

    Ok(())
}

#[tokio::test]
async fn test_secret_and_time_feed_into_the_signature() -> Result<()> {
    init_logger();

    async fn sign_with(time_secs: u32, secret: &str) -> Result<String> {
        let time = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, time_secs).unwrap();
        let signer = Signer::new(RequestSigner::new(
            SigningSettings::new("service", "us-east-1").with_time(time),
        ));
        let cred = Credential::new("AKIDEXAMPLE", secret);

        let mut p = parts("https://example.amazonaws.com/");
        let mut payload = SigningPayload::Empty;
        signer.sign(&mut p, &mut payload, Some(&cred), None).await?;
        Ok(p.headers[AUTHORIZATION].to_str()?.to_string())
    }

    let base = sign_with(0, "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").await?;
    let other_secret = sign_with(0, "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEX").await?;
    let other_time = sign_with(1, "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").await?;

    assert_ne!(base, other_secret);
    assert_ne!(base, other_time);

    Ok(())
}

#[tokio::test]
async fn test_anonymous_identity_bypasses_signing() -> Result<()> {
    init_logger();

    let signer = pinned_signer();
    let mut p = parts("https://example.amazonaws.com/?b=2&a=1");
    let before_uri = p.uri.to_string();

    // A stream payload proves the payload is never read: draining it would
    // change the variant.
    let stream = futures::stream::iter(vec![Ok(bytes::Bytes::from_static(b"body"))]);
    let mut payload = SigningPayload::from_stream(Box::pin(stream));

    signer.sign(&mut p, &mut payload, None, None).await?;

    assert_eq!(p.uri.to_string(), before_uri);
    assert!(p.headers.is_empty());
    assert!(matches!(payload, SigningPayload::Stream(_)));

    Ok(())
}

#[tokio::test]
async fn test_sync_and_async_entry_points_agree() -> Result<()> {
    init_logger();

    let time = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
    let scheme = RequestSigner::new(
        SigningSettings::new("service", "us-east-1")
            .with_time(time)
            .with_payload_signing(true),
    );
    let cred = credential();

    let mut p_sync = parts("https://example.amazonaws.com/path?a=1");
    let mut payload = SigningPayload::from_bytes("hello world");
    scheme.sign_request_sync(&mut p_sync, &mut payload, Some(&cred), None)?;

    let signer = Signer::new(scheme);
    let mut p_async = parts("https://example.amazonaws.com/path?a=1");
    let mut payload = SigningPayload::from_bytes("hello world");
    signer
        .sign(&mut p_async, &mut payload, Some(&cred), None)
        .await?;

    assert_eq!(p_sync.uri.to_string(), p_async.uri.to_string());
    assert_eq!(
        p_sync.headers[AUTHORIZATION].to_str()?,
        p_async.headers[AUTHORIZATION].to_str()?
    );

    Ok(())
}

#[tokio::test]
async fn test_reader_payload_signs_like_bytes() -> Result<()> {
    init_logger();

    let time = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
    let settings = SigningSettings::new("service", "us-east-1")
        .with_time(time)
        .with_payload_signing(true);
    let signer = Signer::new(RequestSigner::new(settings));
    let cred = credential();

    let mut p_bytes = parts("https://example.amazonaws.com/upload");
    let mut payload = SigningPayload::from_bytes("file contents");
    signer
        .sign(&mut p_bytes, &mut payload, Some(&cred), None)
        .await?;

    let mut p_reader = parts("https://example.amazonaws.com/upload");
    let mut payload = SigningPayload::from_reader(std::io::Cursor::new(b"file contents".to_vec()));
    signer
        .sign(&mut p_reader, &mut payload, Some(&cred), None)
        .await?;

    assert_eq!(
        p_bytes.headers[AUTHORIZATION].to_str()?,
        p_reader.headers[AUTHORIZATION].to_str()?
    );

    Ok(())
}

#[tokio::test]
async fn test_signing_twice_replaces_the_signature() -> Result<()> {
    init_logger();

    let signer = pinned_signer();
    let cred = credential();

    let mut p = parts("https://example.amazonaws.com/");
    let mut payload = SigningPayload::Empty;
    signer.sign(&mut p, &mut payload, Some(&cred), None).await?;
    let first = p.headers[AUTHORIZATION].to_str()?.to_string();

    // Re-signing overwrites the previous signature instead of stacking;
    // the old authorization header is excluded from the new canonical form.
    signer.sign(&mut p, &mut payload, Some(&cred), None).await?;
    assert_eq!(p.headers[AUTHORIZATION].to_str()?, first);
    assert_eq!(p.headers.get_all(AUTHORIZATION).iter().count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_presign_and_header_signatures_differ() -> Result<()> {
    init_logger();

    let signer = pinned_signer();
    let cred = credential();

    let mut p_header = parts("https://example.amazonaws.com/");
    let mut payload = SigningPayload::Empty;
    signer
        .sign(&mut p_header, &mut payload, Some(&cred), None)
        .await?;

    let mut p_query = parts("https://example.amazonaws.com/");
    signer
        .presign(&mut p_query, Some(&cred), Duration::from_secs(3600))
        .await?;

    let header_sig = p_header.headers[AUTHORIZATION]
        .to_str()?
        .rsplit("Signature=")
        .next()
        .unwrap_or_default()
        .to_string();
    let query = p_query.uri.query().unwrap_or_default();
    assert!(!query.contains(&header_sig));

    Ok(())
}
