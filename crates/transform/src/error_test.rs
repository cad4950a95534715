//! Tests for transform error types

use super::*;

#[test]
fn test_error_creation() {
    let err = TransformError::decode("expected value at line 1 column 1");
    assert!(matches!(err, TransformError::DecodeError(_)));
    assert_eq!(err.kind(), "decode");

    let err = TransformError::uri("no-slash", "relative URL without a base");
    assert!(matches!(err, TransformError::UriError { .. }));
    assert_eq!(err.kind(), "uri");

    let err = TransformError::LineTooShort { marker_len: 32 };
    assert_eq!(err.kind(), "decode");
}

#[test]
fn test_error_display() {
    let err = TransformError::decode("bad data");
    assert_eq!(err.to_string(), "failed to decode envelope: bad data");

    let err = TransformError::uri("%%", "invalid");
    assert_eq!(err.to_string(), "invalid request target '%%': invalid");

    let err = TransformError::LineTooShort { marker_len: 32 };
    assert_eq!(
        err.to_string(),
        "line shorter than the 32-byte envelope marker"
    );
}

#[test]
fn test_geo_error_conversion() {
    let geo = GeoError::Lookup {
        addr: "8.8.8.8".into(),
        message: "corrupt".into(),
    };
    let err: TransformError = geo.into();
    assert!(matches!(err, TransformError::Geo(_)));
    assert_eq!(err.kind(), "geo");
    assert!(err.to_string().contains("8.8.8.8"));
}
