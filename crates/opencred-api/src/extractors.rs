//! # Custom Extractors
//!
//! Validated JSON body extraction. Handlers accept
//! `Result<Json<T>, JsonRejection>` and call [`extract_validated_json`]
//! at the point in their flow where the original functions parsed the
//! body, so authorization failures keep precedence over malformed
//! bodies.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request types that carry their own field-level validation.
pub trait Validate {
    /// Check field constraints, returning a client-facing message on
    /// failure.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body and run its validation, mapping both failure modes
/// to 400 responses.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Probe {
        ok: bool,
    }

    impl Validate for Probe {
        fn validate(&self) -> Result<(), String> {
            if self.ok {
                Ok(())
            } else {
                Err("probe rejected".to_string())
            }
        }
    }

    #[test]
    fn valid_body_passes_through() {
        let extracted = extract_validated_json(Ok(Json(Probe { ok: true })));
        assert!(extracted.is_ok());
    }

    #[test]
    fn failed_validation_becomes_400() {
        let err = extract_validated_json(Ok(Json(Probe { ok: false }))).unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "probe rejected"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
