//! Unit tests for API authentication extractor

use axum::extract::FromRequestParts;
use axum::http::{Request, StatusCode};
use time_tracker_bot::api::ExtractUser;

#[tokio::test]
async fn test_extract_user_valid_id() {
    let req = Request::builder()
        .header("X-User-ID", "123456789")
        .body(())
        .unwrap();

    let (mut parts, _) = req.into_parts();
    let result = ExtractUser::from_request_parts(&mut parts, &()).await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap().0, 123456789);
}

#[tokio::test]
async fn test_extract_user_missing_header() {
    let req = Request::builder().body(()).unwrap();

    let (mut parts, _) = req.into_parts();
    let result = ExtractUser::from_request_parts(&mut parts, &()).await;

    assert!(result.is_err());
    let (status, message) = result.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.contains("missing"));
}

#[tokio::test]
async fn test_extract_user_invalid_id() {
    let req = Request::builder()
        .header("X-User-ID", "not-a-number")
        .body(())
        .unwrap();

    let (mut parts, _) = req.into_parts();
    let result = ExtractUser::from_request_parts(&mut parts, &()).await;

    assert!(result.is_err());
    let (status, message) = result.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.contains("invalid"));
}

#[tokio::test]
async fn test_extract_user_invalid_utf8() {
    use axum::http::HeaderValue;

    let mut req = Request::builder().body(()).unwrap();
    req.headers_mut()
        .insert("X-User-ID", HeaderValue::from_bytes(&[0xFF, 0xFE]).unwrap());

    let (mut parts, _) = req.into_parts();
    let result = ExtractUser::from_request_parts(&mut parts, &()).await;

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().0, StatusCode::BAD_REQUEST);
}
