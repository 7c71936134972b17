pub mod comments;
pub mod feed;
pub mod friends;
pub mod health;
pub mod posts;
pub mod profile;

use kith_shared::errors::{AppError, ErrorCode};
use validator::ValidationErrors;

/// Maps validator output onto a validation error that carries the
/// per-field messages in its details.
pub(crate) fn form_error(errors: ValidationErrors) -> AppError {
    let details = serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null);
    AppError::with_details(ErrorCode::ValidationError, "invalid form submission", details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use validator::ValidationError;

    #[test]
    fn form_error_carries_field_names() {
        let mut errors = ValidationErrors::new();
        errors.add("display_name", ValidationError::new("length"));

        let response = form_error(errors).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
