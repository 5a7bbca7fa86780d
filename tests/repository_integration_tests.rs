use linkbundle::{
    RepoError,
    models::{LinkInput, NewBundle},
    repository::{PostgresRepository, Repository},
    slug::{generate_admin_token, generate_slug},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// These tests talk to a real database. Run them with
// `DATABASE_URL=postgres://... cargo test -- --ignored`.

// --- Test Context and Setup ---

/// Holds the pool for one test; every test creates its own uniquely-slugged bundles.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }

    async fn count_links(&self, bundle_id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links WHERE bundle_id = $1")
            .bind(bundle_id)
            .fetch_one(&self.pool)
            .await
            .expect("count query failed")
    }
}

// --- Test Data Helpers ---

fn new_bundle(title: &str) -> NewBundle {
    let slug = generate_slug(Some(title));
    NewBundle {
        id: Uuid::new_v4(),
        title: Some(title.to_string()),
        public_url: format!("http://localhost:5173/bundle/{}", slug),
        slug,
        admin_token: generate_admin_token(),
    }
}

fn link(url: &str) -> LinkInput {
    LinkInput {
        url: url.to_string(),
        note: Some("note".into()),
        label: None,
    }
}

// --- Tests ---

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_create_bundle_persists_links_in_order() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let input = new_bundle("Repo Create");
    let (bundle, links) = repo
        .create_bundle(input.clone(), vec![link("http://1"), link("http://2"), link("http://3")])
        .await
        .expect("create failed");

    assert_eq!(bundle.slug, input.slug);
    assert_eq!(bundle.public_url.as_deref(), Some(input.public_url.as_str()));
    assert_eq!(links.len(), 3);

    let listed = repo.list_links(bundle.id).await.unwrap();
    let urls: Vec<&str> = listed.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(urls, ["http://1", "http://2", "http://3"]);

    let found = repo.find_bundle_by_slug(&input.slug).await.unwrap().unwrap();
    assert_eq!(found.admin_token, input.admin_token);

    repo.delete_bundle(bundle.id).await.unwrap();
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_duplicate_slug_is_conflict_and_rolls_back() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let first = new_bundle("Repo Dup");
    let (original, _) = repo.create_bundle(first.clone(), vec![]).await.unwrap();

    let clash = NewBundle {
        id: Uuid::new_v4(),
        admin_token: generate_admin_token(),
        ..first.clone()
    };
    let clash_id = clash.id;
    let err = repo
        .create_bundle(clash, vec![link("http://never")])
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::Conflict(_)), "got {:?}", err);
    assert_eq!(ctx.count_links(clash_id).await, 0);

    repo.delete_bundle(original.id).await.unwrap();
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_delete_bundle_cascades_to_links() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let (bundle, _) = repo
        .create_bundle(new_bundle("Repo Cascade"), vec![link("http://a"), link("http://b")])
        .await
        .unwrap();
    assert_eq!(ctx.count_links(bundle.id).await, 2);

    assert!(repo.delete_bundle(bundle.id).await.unwrap());
    assert_eq!(ctx.count_links(bundle.id).await, 0);
    assert!(repo.find_bundle_by_slug(&bundle.slug).await.unwrap().is_none());

    // Second delete affects nothing.
    assert!(!repo.delete_bundle(bundle.id).await.unwrap());
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_link_mutations_are_scoped_to_owning_bundle() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let (owner, links) = repo
        .create_bundle(new_bundle("Repo Owner"), vec![link("http://owned")])
        .await
        .unwrap();
    let (other, _) = repo.create_bundle(new_bundle("Repo Other"), vec![]).await.unwrap();
    let link_id = links[0].id;

    let foreign_update = repo
        .update_link(link_id, other.id, link("http://hijacked"))
        .await
        .unwrap();
    assert!(foreign_update.is_none());
    assert!(!repo.delete_link(link_id, other.id).await.unwrap());

    let stored = repo.find_link(link_id).await.unwrap().unwrap();
    assert_eq!(stored.url, "http://owned");

    let updated = repo
        .update_link(link_id, owner.id, link("http://renamed"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.url, "http://renamed");
    assert!(updated.updated_at >= stored.updated_at);

    assert!(repo.delete_link(link_id, owner.id).await.unwrap());
    assert!(repo.find_link(link_id).await.unwrap().is_none());

    repo.delete_bundle(owner.id).await.unwrap();
    repo.delete_bundle(other.id).await.unwrap();
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_update_title_keeps_slug_and_public_url() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let (bundle, _) = repo.create_bundle(new_bundle("Repo Title"), vec![]).await.unwrap();

    let updated = repo
        .update_bundle_title(bundle.id, Some("Renamed".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("Renamed"));
    assert_eq!(updated.slug, bundle.slug);
    assert_eq!(updated.public_url, bundle.public_url);

    let cleared = repo.update_bundle_title(bundle.id, None).await.unwrap().unwrap();
    assert!(cleared.title.is_none());

    repo.delete_bundle(bundle.id).await.unwrap();
    assert!(repo.update_bundle_title(bundle.id, None).await.unwrap().is_none());
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_insert_link_into_deleted_bundle_is_missing_parent() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let (bundle, _) = repo.create_bundle(new_bundle("Repo Gone"), vec![]).await.unwrap();
    repo.delete_bundle(bundle.id).await.unwrap();

    let err = repo.insert_link(bundle.id, link("http://late")).await.unwrap_err();
    assert_eq!(err, RepoError::MissingParent);
}
