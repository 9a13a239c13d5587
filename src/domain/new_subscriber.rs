use serde::Deserialize;
use serde_json::Value;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::ValidationError;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: SubscriberName,
}

/// Raw `POST /newsletter` body. Fields are kept as JSON values so that a missing
/// field and a non-string field both coerce to an empty string and surface as the
/// matching MISSING_* code instead of a deserialization failure.
#[derive(Deserialize)]
pub struct SubscriptionPayload {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub email: Value,
}

impl TryFrom<SubscriptionPayload> for NewSubscriber {
    type Error = ValidationError;

    fn try_from(payload: SubscriptionPayload) -> Result<Self, Self::Error> {
        // Name is checked before email, so a payload missing both reports MISSING_NAME
        let name = SubscriberName::parse(payload.name.as_str().unwrap_or_default())?;
        let email = SubscriberEmail::parse(payload.email.as_str().unwrap_or_default())?;

        Ok(NewSubscriber { email, name })
    }
}
