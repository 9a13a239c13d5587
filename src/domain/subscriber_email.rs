use crate::domain::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Normalizes (trims surrounding whitespace, lower-cases) and validates the
    /// address shape. Emails are compared and stored in this normalized form.
    pub fn parse(email: &str) -> Result<SubscriberEmail, ValidationError> {
        let normalized = email.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ValidationError::MissingEmail);
        }

        if !has_address_shape(&normalized) {
            return Err(ValidationError::InvalidEmailFormat);
        }

        Ok(Self(normalized))
    }
}

/// Checks the candidate against `^[^\s@]+@[^\s@]+\.[^\s@]+$`: a single `@`, no
/// whitespace anywhere, and a dot with something on both sides after the `@`.
/// Deliberately permissive (`a@b.c` passes, `a@b` does not) rather than a full
/// RFC 5322 validation, to keep accepting everything the signup form accepted.
fn has_address_shape(email: &str) -> bool {
    if email.chars().any(|c| c.is_whitespace()) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
