use crate::domain::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberName(String);

impl SubscriberName {
    /// Trims surrounding whitespace; case is preserved. The only hard requirement
    /// is that something non-empty remains.
    pub fn parse(name: &str) -> Result<SubscriberName, ValidationError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::MissingName);
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
