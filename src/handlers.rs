use crate::{
    AppState,
    auth::AdminBundle,
    error::{ApiError, ApiJson, ApiPath},
    models::{
        BundleView, CreateBundleRequest, CreatedBundle, HealthResponse, Link, LinkInput,
        MessageResponse, NewBundle, PublicBundleResponse, UpdateBundleRequest,
    },
    slug::{generate_admin_token, generate_slug},
};
use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
};
use uuid::Uuid;

// --- Public Handlers ---

/// health
///
/// [Public Route] Liveness probe for load balancers and monitoring.
#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// create_bundle
///
/// [Public Route] Creates a bundle and its initial links in one atomic write.
///
/// Generates the slug from the title, a fresh admin token, and the public URL. A slug or
/// token collision comes back from storage as 409 and is not retried. This is the only
/// response that ever carries the admin token.
#[utoipa::path(
    post,
    path = "/api/bundle",
    request_body = CreateBundleRequest,
    responses(
        (status = 201, description = "Created", body = CreatedBundle),
        (status = 400, description = "Invalid body"),
        (status = 409, description = "Identifier collision")
    )
)]
pub async fn create_bundle(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateBundleRequest>,
) -> Result<(StatusCode, Json<CreatedBundle>), ApiError> {
    let slug = generate_slug(payload.title.as_deref());
    let new_bundle = NewBundle {
        id: Uuid::new_v4(),
        public_url: state.config.public_url(&slug),
        title: payload.title,
        slug,
        admin_token: generate_admin_token(),
    };

    let (bundle, links) = state
        .repo
        .create_bundle(new_bundle, payload.links.unwrap_or_default())
        .await?;

    tracing::info!(
        bundle_id = %bundle.id,
        slug = %bundle.slug,
        links = links.len(),
        "bundle created"
    );

    Ok((StatusCode::CREATED, Json(CreatedBundle::new(bundle, links))))
}

/// get_bundle
///
/// [Public Route] Resolves a bundle by slug together with its links. The admin token is
/// not part of `BundleView`, so it cannot leak through this path.
#[utoipa::path(
    get,
    path = "/api/bundle/{slug}",
    params(("slug" = String, Path, description = "Bundle slug")),
    responses(
        (status = 200, description = "Found", body = PublicBundleResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_bundle(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<PublicBundleResponse>, ApiError> {
    let bundle = state
        .repo
        .find_bundle_by_slug(&slug)
        .await?
        .ok_or_else(ApiError::bundle_not_found)?;
    let links = state.repo.list_links(bundle.id).await?;

    Ok(Json(PublicBundleResponse {
        bundle: BundleView::new(bundle, links),
    }))
}

// --- Admin Handlers ---
// Every handler below runs behind `auth::require_admin_token`; the `AdminBundle`
// argument is the bundle the guard resolved and authorized.

/// get_admin_bundle
///
/// [Admin Route] The full bundle for its administrator. The token is still omitted: the
/// caller has just proven they know it.
#[utoipa::path(
    get,
    path = "/api/bundle/{slug}/admin",
    params(("slug" = String, Path, description = "Bundle slug")),
    security(("admin_token" = [])),
    responses(
        (status = 200, description = "Found", body = BundleView),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Wrong token"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_admin_bundle(
    AdminBundle(bundle): AdminBundle,
    State(state): State<AppState>,
) -> Result<Json<BundleView>, ApiError> {
    let links = state.repo.list_links(bundle.id).await?;
    Ok(Json(BundleView::new(bundle, links)))
}

/// update_bundle
///
/// [Admin Route] Replaces the title and refreshes `updatedAt`. The slug and public URL
/// stay as they were minted.
#[utoipa::path(
    put,
    path = "/api/bundle/{slug}",
    params(("slug" = String, Path, description = "Bundle slug")),
    request_body = UpdateBundleRequest,
    security(("admin_token" = [])),
    responses(
        (status = 200, description = "Updated", body = BundleView),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Wrong token"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_bundle(
    AdminBundle(bundle): AdminBundle,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateBundleRequest>,
) -> Result<Json<BundleView>, ApiError> {
    // None here means the bundle vanished between the guard's read and this write.
    let updated = state
        .repo
        .update_bundle_title(bundle.id, payload.title)
        .await?
        .ok_or_else(ApiError::bundle_not_found)?;
    let links = state.repo.list_links(updated.id).await?;

    Ok(Json(BundleView::new(updated, links)))
}

/// delete_bundle
///
/// [Admin Route] Deletes the bundle; storage cascades the delete to its links. Repeating
/// the call yields 404 from the guard.
#[utoipa::path(
    delete,
    path = "/api/bundle/{slug}",
    params(("slug" = String, Path, description = "Bundle slug")),
    security(("admin_token" = [])),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Wrong token"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_bundle(
    AdminBundle(bundle): AdminBundle,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.delete_bundle(bundle.id).await? {
        return Err(ApiError::bundle_not_found());
    }

    tracing::info!(bundle_id = %bundle.id, slug = %bundle.slug, "bundle deleted");
    Ok(Json(MessageResponse::new("Bundle deleted")))
}

/// add_link
///
/// [Admin Route] Appends a link to the authorized bundle.
#[utoipa::path(
    post,
    path = "/api/bundle/{slug}/links",
    params(("slug" = String, Path, description = "Bundle slug")),
    request_body = LinkInput,
    security(("admin_token" = [])),
    responses(
        (status = 201, description = "Created", body = Link),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Wrong token"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn add_link(
    AdminBundle(bundle): AdminBundle,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LinkInput>,
) -> Result<(StatusCode, Json<Link>), ApiError> {
    let link = state.repo.insert_link(bundle.id, payload).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// update_link
///
/// [Admin Route] Replaces a link's url, note and label.
///
/// *Ownership*: the link is re-fetched and must belong to the authorized bundle. A link
/// from another bundle is reported as 404, exactly like a missing one, so a valid token
/// for bundle B can never touch bundle A's links.
#[utoipa::path(
    put,
    path = "/api/bundle/{slug}/links/{link_id}",
    params(
        ("slug" = String, Path, description = "Bundle slug"),
        ("link_id" = Uuid, Path, description = "Link ID")
    ),
    request_body = LinkInput,
    security(("admin_token" = [])),
    responses(
        (status = 200, description = "Updated", body = Link),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Wrong token"),
        (status = 404, description = "Bundle or link not found")
    )
)]
pub async fn update_link(
    AdminBundle(bundle): AdminBundle,
    State(state): State<AppState>,
    LinkId(link_id): LinkId,
    ApiJson(payload): ApiJson<LinkInput>,
) -> Result<Json<Link>, ApiError> {
    owned_link(&state, &bundle.id, link_id).await?;

    let link = state
        .repo
        .update_link(link_id, bundle.id, payload)
        .await?
        .ok_or_else(ApiError::link_not_found)?;
    Ok(Json(link))
}

/// delete_link
///
/// [Admin Route] Removes a link, with the same ownership check as `update_link`.
#[utoipa::path(
    delete,
    path = "/api/bundle/{slug}/links/{link_id}",
    params(
        ("slug" = String, Path, description = "Bundle slug"),
        ("link_id" = Uuid, Path, description = "Link ID")
    ),
    security(("admin_token" = [])),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Wrong token"),
        (status = 404, description = "Bundle or link not found")
    )
)]
pub async fn delete_link(
    AdminBundle(bundle): AdminBundle,
    State(state): State<AppState>,
    LinkId(link_id): LinkId,
) -> Result<Json<MessageResponse>, ApiError> {
    owned_link(&state, &bundle.id, link_id).await?;

    if !state.repo.delete_link(link_id, bundle.id).await? {
        return Err(ApiError::link_not_found());
    }
    Ok(Json(MessageResponse::new("Link deleted")))
}

/// LinkId
///
/// The `{link_id}` segment of the link routes. A segment that is not valid UTF-8 or not a
/// UUID cannot name any link, so every failure here is a 404.
#[derive(Debug, Clone, Copy)]
pub struct LinkId(pub Uuid);

impl<S> FromRequestParts<S> for LinkId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // The admin guard already decoded the slug, so a failure here is the link id.
        let Path((_slug, raw)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::link_not_found())?;
        Uuid::parse_str(&raw)
            .map(LinkId)
            .map_err(|_| ApiError::link_not_found())
    }
}

/// Fetches a link and checks it belongs to `bundle_id`; anything else is a 404.
async fn owned_link(state: &AppState, bundle_id: &Uuid, link_id: Uuid) -> Result<Link, ApiError> {
    state
        .repo
        .find_link(link_id)
        .await?
        .filter(|link| link.bundle_id == *bundle_id)
        .ok_or_else(ApiError::link_not_found)
}
