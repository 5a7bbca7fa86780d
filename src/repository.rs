use crate::error::RepoError;
use crate::models::{Bundle, Link, LinkInput, NewBundle};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers and the admin guard only
/// ever see `Arc<dyn Repository>`, so Postgres and the in-memory tables are interchangeable.
///
/// Ownership rules (a link belongs to exactly one bundle, links die with their bundle,
/// slugs and admin tokens are unique) are enforced here, not by callers.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Bundles ---
    /// Inserts the bundle and all of its links as one atomic unit.
    async fn create_bundle(
        &self,
        bundle: NewBundle,
        links: Vec<LinkInput>,
    ) -> Result<(Bundle, Vec<Link>), RepoError>;
    async fn find_bundle_by_slug(&self, slug: &str) -> Result<Option<Bundle>, RepoError>;
    // Title only. Slug and public URL are immutable.
    async fn update_bundle_title(
        &self,
        bundle_id: Uuid,
        title: Option<String>,
    ) -> Result<Option<Bundle>, RepoError>;
    // Cascades to every owned link. Returns false when nothing was deleted.
    async fn delete_bundle(&self, bundle_id: Uuid) -> Result<bool, RepoError>;

    // --- Links ---
    async fn list_links(&self, bundle_id: Uuid) -> Result<Vec<Link>, RepoError>;
    async fn find_link(&self, link_id: Uuid) -> Result<Option<Link>, RepoError>;
    async fn insert_link(&self, bundle_id: Uuid, link: LinkInput) -> Result<Link, RepoError>;
    // Both mutations only touch the row when it is owned by `bundle_id`.
    async fn update_link(
        &self,
        link_id: Uuid,
        bundle_id: Uuid,
        link: LinkInput,
    ) -> Result<Option<Link>, RepoError>;
    async fn delete_link(&self, link_id: Uuid, bundle_id: Uuid) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by a PostgreSQL pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// create_bundle
    ///
    /// Runs both inserts in one transaction. If any link insert fails the transaction is
    /// dropped uncommitted, so the bundle row never becomes visible without its links.
    /// Link timestamps use `clock_timestamp()` so they keep request order within the
    /// transaction (where `NOW()` is constant).
    async fn create_bundle(
        &self,
        bundle: NewBundle,
        links: Vec<LinkInput>,
    ) -> Result<(Bundle, Vec<Link>), RepoError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Bundle>(
            r#"
            INSERT INTO bundle (id, title, slug, public_url, admin_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING id, title, slug, public_url, admin_token, created_at, updated_at
            "#,
        )
        .bind(bundle.id)
        .bind(bundle.title)
        .bind(bundle.slug)
        .bind(bundle.public_url)
        .bind(bundle.admin_token)
        .fetch_one(&mut *tx)
        .await?;

        let mut inserted = Vec::with_capacity(links.len());
        for link in links {
            let row = sqlx::query_as::<_, Link>(
                r#"
                INSERT INTO links (id, url, note, label, bundle_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, clock_timestamp(), clock_timestamp())
                RETURNING id, url, note, label, bundle_id, created_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(link.url)
            .bind(link.note)
            .bind(link.label)
            .bind(created.id)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok((created, inserted))
    }

    async fn find_bundle_by_slug(&self, slug: &str) -> Result<Option<Bundle>, RepoError> {
        let bundle = sqlx::query_as::<_, Bundle>(
            r#"SELECT id, title, slug, public_url, admin_token, created_at, updated_at
               FROM bundle
               WHERE slug = $1"#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bundle)
    }

    async fn update_bundle_title(
        &self,
        bundle_id: Uuid,
        title: Option<String>,
    ) -> Result<Option<Bundle>, RepoError> {
        let bundle = sqlx::query_as::<_, Bundle>(
            r#"UPDATE bundle
               SET title = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING id, title, slug, public_url, admin_token, created_at, updated_at"#,
        )
        .bind(bundle_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bundle)
    }

    /// delete_bundle
    ///
    /// The `ON DELETE CASCADE` foreign key on `links.bundle_id` removes the owned links.
    async fn delete_bundle(&self, bundle_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM bundle WHERE id = $1")
            .bind(bundle_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_links(&self, bundle_id: Uuid) -> Result<Vec<Link>, RepoError> {
        let links = sqlx::query_as::<_, Link>(
            r#"SELECT id, url, note, label, bundle_id, created_at, updated_at
               FROM links
               WHERE bundle_id = $1
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(bundle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn find_link(&self, link_id: Uuid) -> Result<Option<Link>, RepoError> {
        let link = sqlx::query_as::<_, Link>(
            r#"SELECT id, url, note, label, bundle_id, created_at, updated_at
               FROM links
               WHERE id = $1"#,
        )
        .bind(link_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    /// insert_link
    ///
    /// A bundle deleted concurrently makes the foreign key fail, which surfaces as
    /// `RepoError::MissingParent`.
    async fn insert_link(&self, bundle_id: Uuid, link: LinkInput) -> Result<Link, RepoError> {
        let link = sqlx::query_as::<_, Link>(
            r#"INSERT INTO links (id, url, note, label, bundle_id, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
               RETURNING id, url, note, label, bundle_id, created_at, updated_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(link.url)
        .bind(link.note)
        .bind(link.label)
        .bind(bundle_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(link)
    }

    async fn update_link(
        &self,
        link_id: Uuid,
        bundle_id: Uuid,
        link: LinkInput,
    ) -> Result<Option<Link>, RepoError> {
        let link = sqlx::query_as::<_, Link>(
            r#"UPDATE links
               SET url = $3, note = $4, label = $5, updated_at = NOW()
               WHERE id = $1 AND bundle_id = $2
               RETURNING id, url, note, label, bundle_id, created_at, updated_at"#,
        )
        .bind(link_id)
        .bind(bundle_id)
        .bind(link.url)
        .bind(link.note)
        .bind(link.label)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    async fn delete_link(&self, link_id: Uuid, bundle_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND bundle_id = $2")
            .bind(link_id)
            .bind(bundle_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// MemoryRepository
///
/// In-process implementation of `Repository` used by the test suites and local experiments.
/// It mirrors the Postgres schema's guarantees: unique slugs and admin tokens, a foreign key
/// from links to bundles, and cascading deletes. Every operation takes the write or read
/// lock once, so each call is atomic just like a single statement or transaction.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<MemoryTables>,
}

#[derive(Default)]
struct MemoryTables {
    bundles: Vec<Bundle>,
    links: Vec<Link>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_link(bundle_id: Uuid, input: LinkInput) -> Link {
    let now = Utc::now();
    Link {
        id: Uuid::new_v4(),
        url: input.url,
        note: input.note,
        label: input.label,
        bundle_id,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_bundle(
        &self,
        bundle: NewBundle,
        links: Vec<LinkInput>,
    ) -> Result<(Bundle, Vec<Link>), RepoError> {
        let mut tables = self.tables.write().await;

        if tables.bundles.iter().any(|b| b.slug == bundle.slug) {
            return Err(RepoError::Conflict("bundle_slug_unique".into()));
        }
        if tables.bundles.iter().any(|b| b.id == bundle.id) {
            return Err(RepoError::Conflict("bundle_pkey".into()));
        }
        if tables
            .bundles
            .iter()
            .any(|b| b.admin_token == bundle.admin_token)
        {
            return Err(RepoError::Conflict("bundle_admin_token_unique".into()));
        }

        let now = Utc::now();
        let created = Bundle {
            id: bundle.id,
            title: bundle.title,
            slug: bundle.slug,
            public_url: Some(bundle.public_url),
            admin_token: bundle.admin_token,
            created_at: now,
            updated_at: now,
        };
        let inserted: Vec<Link> = links
            .into_iter()
            .map(|input| new_link(created.id, input))
            .collect();

        tables.bundles.push(created.clone());
        tables.links.extend(inserted.iter().cloned());
        Ok((created, inserted))
    }

    async fn find_bundle_by_slug(&self, slug: &str) -> Result<Option<Bundle>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.bundles.iter().find(|b| b.slug == slug).cloned())
    }

    async fn update_bundle_title(
        &self,
        bundle_id: Uuid,
        title: Option<String>,
    ) -> Result<Option<Bundle>, RepoError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .bundles
            .iter_mut()
            .find(|b| b.id == bundle_id)
            .map(|bundle| {
                bundle.title = title;
                bundle.updated_at = Utc::now();
                bundle.clone()
            }))
    }

    async fn delete_bundle(&self, bundle_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.bundles.len();
        tables.bundles.retain(|b| b.id != bundle_id);
        let deleted = tables.bundles.len() < before;
        if deleted {
            // ON DELETE CASCADE
            tables.links.retain(|l| l.bundle_id != bundle_id);
        }
        Ok(deleted)
    }

    async fn list_links(&self, bundle_id: Uuid) -> Result<Vec<Link>, RepoError> {
        let tables = self.tables.read().await;
        let mut links: Vec<Link> = tables
            .links
            .iter()
            .filter(|l| l.bundle_id == bundle_id)
            .cloned()
            .collect();
        // Stable: ties keep insertion order.
        links.sort_by_key(|l| l.created_at);
        Ok(links)
    }

    async fn find_link(&self, link_id: Uuid) -> Result<Option<Link>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.links.iter().find(|l| l.id == link_id).cloned())
    }

    async fn insert_link(&self, bundle_id: Uuid, link: LinkInput) -> Result<Link, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.bundles.iter().any(|b| b.id == bundle_id) {
            return Err(RepoError::MissingParent);
        }
        let link = new_link(bundle_id, link);
        tables.links.push(link.clone());
        Ok(link)
    }

    async fn update_link(
        &self,
        link_id: Uuid,
        bundle_id: Uuid,
        link: LinkInput,
    ) -> Result<Option<Link>, RepoError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .links
            .iter_mut()
            .find(|l| l.id == link_id && l.bundle_id == bundle_id)
            .map(|row| {
                row.url = link.url;
                row.note = link.note;
                row.label = link.label;
                row.updated_at = Utc::now();
                row.clone()
            }))
    }

    async fn delete_link(&self, link_id: Uuid, bundle_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.links.len();
        tables
            .links
            .retain(|l| !(l.id == link_id && l.bundle_id == bundle_id));
        Ok(tables.links.len() < before)
    }
}
