use std::error::Error as StdError;
use std::io;

use hostprobe_core::error::{Error, Result};

#[test]
fn test_error_creation() {
    let unavailable_err = Error::unavailable("provider query failed");
    let config_err = Error::Config("invalid config".to_string());
    let validation_err = Error::Validation("validation failed".to_string());

    assert!(matches!(unavailable_err, Error::Unavailable(_)));
    assert!(matches!(config_err, Error::Config(_)));
    assert!(matches!(validation_err, Error::Validation(_)));
}

#[test]
fn test_error_conversion() {
    // Test IO error conversion
    let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "io error");
    let converted: Error = io_err.into();
    assert!(matches!(converted, Error::Io(_)));

    // Test config error conversion
    let config_err = config::ConfigError::NotFound("key".to_string());
    let converted: Error = config_err.into();
    assert!(matches!(converted, Error::Config(_)));
}

#[test]
fn test_error_messages() {
    let err = Error::Config("test config error".to_string());
    assert_eq!(err.to_string(), "Configuration error: test config error");

    let err = Error::Validation("test validation error".to_string());
    assert_eq!(err.to_string(), "Validation error: test validation error");
}

#[test]
fn test_unavailable_preserves_cause() {
    let cause = io::Error::new(io::ErrorKind::PermissionDenied, "denied by the kernel");
    let err = Error::unavailable(cause);

    let source = err.source().expect("cause should be preserved");
    assert_eq!(source.to_string(), "denied by the kernel");
}

#[test]
fn test_result_type() {
    fn returns_ok() -> Result<()> {
        Ok(())
    }

    fn returns_err() -> Result<()> {
        Err(Error::Validation("test error".to_string()))
    }

    assert!(returns_ok().is_ok());
    assert!(returns_err().is_err());
}
