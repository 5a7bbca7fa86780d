use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Core Application Schemas (Mapped to Database) ---

/// Bundle
///
/// A row of the `bundle` table. Not `Serialize`: the admin token must only
/// ever leave the server through [`CreatedBundle`], so responses go through [`BundleView`].
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct Bundle {
    pub id: Uuid,
    pub title: Option<String>,
    // Unique, immutable after creation.
    pub slug: String,
    pub public_url: Option<String>,
    // Unique shared secret granting write access.
    pub admin_token: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bundle {
    /// Exact comparison of a presented bearer credential against the stored token.
    pub fn token_matches(&self, presented: &str) -> bool {
        self.admin_token.to_string() == presented
    }
}

/// Link
///
/// A row of the `links` table. Owned by exactly one bundle; removed with it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Link {
    pub id: Uuid,
    pub url: String,
    pub note: Option<String>,
    pub label: Option<String>,
    pub bundle_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NewBundle
///
/// Everything the handler generates before the insert: identifiers, slug, token, URL.
#[derive(Debug, Clone)]
pub struct NewBundle {
    pub id: Uuid,
    pub title: Option<String>,
    pub slug: String,
    pub public_url: String,
    pub admin_token: Uuid,
}

// --- Request Payloads (Input Schemas) ---

// Column widths from the schema.
pub const MAX_TITLE_LEN: u64 = 255;
pub const MAX_LABEL_LEN: u64 = 255;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("url is required".into()));
    }
    Ok(())
}

// Present-but-null is allowed, an absent key is not.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

/// LinkInput
///
/// Body of `POST /api/bundle/{slug}/links` and `PUT /api/bundle/{slug}/links/{link_id}`,
/// and the element type of `CreateBundleRequest::links`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default, PartialEq)]
#[ts(export)]
pub struct LinkInput {
    #[schema(example = "https://www.rust-lang.org")]
    #[validate(custom(function = "not_blank"))]
    pub url: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_LABEL_LEN, message = "label must be at most 255 characters"))]
    pub label: Option<String>,
}

/// CreateBundleRequest
///
/// Input payload for `POST /api/bundle`. Links are optional and inserted atomically
/// with the bundle.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateBundleRequest {
    #[serde(default)]
    #[schema(example = "My Links")]
    #[validate(length(max = MAX_TITLE_LEN, message = "title must be at most 255 characters"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub links: Option<Vec<LinkInput>>,
}

/// UpdateBundleRequest
///
/// Input payload for `PUT /api/bundle/{slug}`. The `title` key is required; `null` clears
/// the title. The slug and public URL never change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateBundleRequest {
    #[serde(deserialize_with = "required_nullable")]
    #[validate(length(max = MAX_TITLE_LEN, message = "title must be at most 255 characters"))]
    pub title: Option<String>,
}

// --- Response Schemas (Output) ---

/// BundleView
///
/// A bundle with its links, safe for any reader: the admin token is absent by construction.
/// Used by the public read, the admin read, and the title update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BundleView {
    pub id: Uuid,
    pub title: Option<String>,
    pub slug: String,
    pub public_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub links: Vec<Link>,
}

impl BundleView {
    pub fn new(bundle: Bundle, links: Vec<Link>) -> Self {
        Self {
            id: bundle.id,
            title: bundle.title,
            slug: bundle.slug,
            public_url: bundle.public_url,
            created_at: bundle.created_at,
            updated_at: bundle.updated_at,
            links,
        }
    }
}

/// PublicBundleResponse
///
/// Envelope of `GET /api/bundle/{slug}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PublicBundleResponse {
    pub bundle: BundleView,
}

/// CreatedBundle
///
/// Output of `POST /api/bundle`, the single response that carries the admin token.
/// The creator must keep it; there is no way to recover it later.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreatedBundle {
    pub id: Uuid,
    pub title: Option<String>,
    pub slug: String,
    pub public_url: Option<String>,
    pub admin_token: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub links: Vec<Link>,
}

impl CreatedBundle {
    pub fn new(bundle: Bundle, links: Vec<Link>) -> Self {
        Self {
            id: bundle.id,
            title: bundle.title,
            slug: bundle.slug,
            public_url: bundle.public_url,
            admin_token: bundle.admin_token,
            created_at: bundle.created_at,
            updated_at: bundle.updated_at,
            links,
        }
    }
}

/// MessageResponse
///
/// Confirmation body for deletions.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// HealthResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
}
