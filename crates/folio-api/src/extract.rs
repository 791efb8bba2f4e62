use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// `Json` whose rejections come back as 400 with a JSON message.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections come back as 400 with a JSON message.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Reject if any required text field is blank.
pub fn require_fields(fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::Validation("All fields are required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        assert!(require_fields(&["alice", "secret"]).is_ok());
        assert!(require_fields(&["alice", ""]).is_err());
        assert!(require_fields(&["   ", "secret"]).is_err());
    }
}
