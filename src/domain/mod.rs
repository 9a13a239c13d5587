pub mod new_subscriber;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_name;

/// Rejection reasons for a subscription submission. Each variant carries a stable
/// machine-readable code surfaced in the HTTP error body.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required and must be a non-empty string")]
    MissingName,
    #[error("Email is required and must be a non-empty string")]
    MissingEmail,
    #[error("Invalid email format")]
    InvalidEmailFormat,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingName => "MISSING_NAME",
            ValidationError::MissingEmail => "MISSING_EMAIL",
            ValidationError::InvalidEmailFormat => "INVALID_EMAIL_FORMAT",
        }
    }
}
