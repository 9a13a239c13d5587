use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;

/// A persisted newsletter sign-up. Immutable after creation: no update or delete
/// operation is exposed by the API.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub name: SubscriberName,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
}
