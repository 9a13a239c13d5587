use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    domain::{
        new_subscriber::{NewSubscriber, SubscriptionPayload},
        subscriber::Subscriber,
        subscriber_email::SubscriberEmail,
        subscriber_name::SubscriberName,
        ValidationError,
    },
    email_client::EmailClient,
    routes::error_chain_fmt,
};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

// Upper bound on the fire-and-forget welcome email dispatch, so a stalled email
// provider cannot keep the task alive indefinitely.
const WELCOME_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error)]
pub enum NewsletterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Email address is already subscribed")]
    DuplicateEmail,
    // The generic message is deliberate: internal detail is logged, never surfaced
    #[error("Internal server error")]
    Database(#[from] sqlx::Error),
}

impl NewsletterError {
    pub fn code(&self) -> &'static str {
        match self {
            NewsletterError::Validation(err) => err.code(),
            NewsletterError::DuplicateEmail => "DUPLICATE_EMAIL",
            NewsletterError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl std::fmt::Debug for NewsletterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ResponseError for NewsletterError {
    fn status_code(&self) -> StatusCode {
        match self {
            NewsletterError::Validation(_) => StatusCode::BAD_REQUEST,
            NewsletterError::DuplicateEmail => StatusCode::CONFLICT,
            NewsletterError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            code: self.code(),
        })
    }
}

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(body, db_pool, email_client),
    fields(
        subscriber_email = %body.email,
        subscriber_name = %body.name
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<SubscriptionPayload>,
    db_pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, NewsletterError> {
    let new_subscriber: NewSubscriber = body.into_inner().try_into()?;

    if find_subscriber_by_email(&db_pool, &new_subscriber.email)
        .await?
        .is_some()
    {
        return Err(NewsletterError::DuplicateEmail);
    }

    // Two requests can pass the pre-check with the same email; the unique
    // constraint on the email column settles the race at insert time.
    let subscriber = insert_subscriber(&db_pool, &new_subscriber)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                NewsletterError::DuplicateEmail
            } else {
                NewsletterError::Database(err)
            }
        })?;

    spawn_welcome_email(
        email_client.into_inner(),
        subscriber.email.clone(),
        subscriber.name.clone(),
    );

    Ok(HttpResponse::Created().json(subscriber))
}

#[tracing::instrument(name = "Listing subscribers handler", skip(query, db_pool))]
pub async fn handle_list_subscriptions(
    query: web::Query<ListQuery>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let page = query.into_inner().sanitize();
    let subscribers = fetch_subscribers_page(&db_pool, &page).await?;

    Ok(HttpResponse::Ok().json(subscribers))
}

/// Raw query string of `GET /newsletter`. Values are kept as strings and parsed
/// leniently: a non-numeric `limit` or `offset` falls back to its default instead
/// of rejecting the request.
#[derive(Debug, serde::Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SubscribersPage {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn sanitize(self) -> SubscribersPage {
        let limit = self
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|value| value.clamp(1, MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = self
            .offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|value| value.max(0))
            .unwrap_or(0);
        let search = self
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());

        SubscribersPage {
            limit,
            offset,
            search,
        }
    }
}

#[tracing::instrument(
    name = "Find a subscriber by normalized email",
    skip(db_pool, email)
)]
async fn find_subscriber_by_email(
    db_pool: &PgPool,
    email: &SubscriberEmail,
) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT id, email, name, subscribed_at, is_active
        FROM subscribers
        WHERE email = $1
        "#,
    )
    .bind(email.as_ref())
    .map(map_subscriber_row)
    .fetch_optional(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

#[tracing::instrument(
    name = "Insert a new subscriber into the database",
    skip(new_subscriber, db_pool)
)]
async fn insert_subscriber(
    db_pool: &PgPool,
    new_subscriber: &NewSubscriber,
) -> Result<Subscriber, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, name, subscribed_at, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id, email, name, subscribed_at, is_active
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.name.as_ref())
    .bind(Utc::now())
    .map(map_subscriber_row)
    .fetch_one(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

#[tracing::instrument(name = "Fetch a page of subscribers", skip(db_pool))]
async fn fetch_subscribers_page(
    db_pool: &PgPool,
    page: &SubscribersPage,
) -> Result<Vec<Subscriber>, sqlx::Error> {
    let query = match &page.search {
        Some(term) => sqlx::query(
            r#"
            SELECT id, email, name, subscribed_at, is_active
            FROM subscribers
            WHERE name ILIKE $1 OR email ILIKE $1
            ORDER BY subscribed_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(format!("%{}%", term))
        .bind(page.limit)
        .bind(page.offset),
        None => sqlx::query(
            r#"
            SELECT id, email, name, subscribed_at, is_active
            FROM subscribers
            ORDER BY subscribed_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset),
    };

    query
        .map(map_subscriber_row)
        .fetch_all(db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })
}

fn map_subscriber_row(row: PgRow) -> Subscriber {
    Subscriber {
        id: row.get("id"),
        email: SubscriberEmail::parse(row.get("email")).unwrap(),
        name: SubscriberName::parse(row.get("name")).unwrap(),
        subscribed_at: row.get("subscribed_at"),
        is_active: row.get("is_active"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Dispatches the welcome email on a detached task. Delivery is best-effort:
/// failures and timeouts are logged and swallowed, the subscription response
/// never waits on the provider.
fn spawn_welcome_email(
    email_client: Arc<EmailClient>,
    subscriber_email: SubscriberEmail,
    subscriber_name: SubscriberName,
) {
    let span = tracing::info_span!(
        "Send a welcome email to a new subscriber",
        subscriber_email = %subscriber_email
    );

    tokio::spawn(
        async move {
            let send = send_welcome_email(&email_client, &subscriber_email, &subscriber_name);

            match tokio::time::timeout(WELCOME_DISPATCH_TIMEOUT, send).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!("Failed to send welcome email: {:?}", err);
                }
                Err(_) => {
                    tracing::warn!("Welcome email dispatch timed out");
                }
            }
        }
        .instrument(span),
    );
}

async fn send_welcome_email(
    email_client: &EmailClient,
    subscriber_email: &SubscriberEmail,
    subscriber_name: &SubscriberName,
) -> Result<(), reqwest::Error> {
    let html_body = format!(
        r#"
            <div>
                <h1>Welcome aboard, {}!</h1>
                <p>You are officially on the list. Expect weekly AI insights, research breakdowns and practical takeaways from Artilect.</p>
            </div>
        "#,
        subscriber_name.as_ref()
    );

    email_client
        .send_email(
            subscriber_email,
            "Welcome to the Artilect newsletter",
            html_body.as_str(),
        )
        .await
}
