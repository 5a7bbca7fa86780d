use axum::{
    extract::{FromRequestParts, MatchedPath, RawPathParams, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    error::ApiError,
    models::Bundle,
    repository::{Repository, RepositoryState},
};

/// AdminBundle
///
/// The authorized context produced by the admin guard: the bundle resolved from the path
/// slug, already proven to match the presented admin token. Handlers take it as an
/// argument instead of looking the bundle up a second time.
#[derive(Debug, Clone)]
pub struct AdminBundle(pub Bundle);

/// bearer_token
///
/// Extracts `<token>` from `Authorization: Bearer <token>`. Any other shape, or an empty
/// token, counts as no credential at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// authorize
///
/// The admin guard itself, independent of the transport:
/// 1. No bearer credential: `Unauthorized`, and the repository is never touched.
/// 2. No slug: `BadRequest`.
/// 3. Unknown slug: `NotFound`.
/// 4. Token differs from the bundle's admin token: `Forbidden`.
///
/// Performs exactly one read on success.
pub async fn authorize(
    repo: &dyn Repository,
    headers: &HeaderMap,
    slug: Option<&str>,
) -> Result<Bundle, ApiError> {
    let token = bearer_token(headers).ok_or_else(ApiError::missing_token)?;

    let slug = slug
        .filter(|s| !s.is_empty())
        .ok_or_else(ApiError::missing_slug)?;

    let bundle = repo
        .find_bundle_by_slug(slug)
        .await?
        .ok_or_else(ApiError::bundle_not_found)?;

    if !bundle.token_matches(token) {
        return Err(ApiError::invalid_token());
    }

    Ok(bundle)
}

/// require_admin_token
///
/// Middleware composed in front of every admin route (via `route_layer`). Runs
/// [`authorize`] against the `slug` path parameter and, on success, stores the bundle in
/// the request extensions for the [`AdminBundle`] extractor. On failure the handler never
/// runs.
pub async fn require_admin_token(
    State(repo): State<RepositoryState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let slug = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(params) => params
            .iter()
            .find(|(key, _)| *key == "slug")
            .map(|(_, value)| value.to_string()),
        Err(rejection) => match raw_slug_segment(&parts) {
            // Another parameter failed to decode; a segment without escapes is its own decoding.
            Some(raw) if !raw.contains('%') => Some(raw.to_string()),
            _ => {
                tracing::debug!("admin guard rejected request: {}", rejection.body_text());
                bearer_token(&parts.headers).ok_or_else(ApiError::missing_token)?;
                return Err(ApiError::invalid_slug());
            }
        },
    };

    let bundle = match authorize(repo.as_ref(), &parts.headers, slug.as_deref()).await {
        Ok(bundle) => bundle,
        Err(e) => {
            tracing::debug!(slug = ?slug, "admin guard rejected request: {}", e);
            return Err(e);
        }
    };

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(AdminBundle(bundle));
    Ok(next.run(request).await)
}

/// The undecoded `{slug}` segment, found by lining the URI up with the matched route.
fn raw_slug_segment(parts: &Parts) -> Option<&str> {
    let template = parts.extensions.get::<MatchedPath>()?.as_str();
    template
        .split('/')
        .zip(parts.uri.path().split('/'))
        .find(|(pattern, _)| *pattern == "{slug}")
        .map(|(_, raw)| raw)
}

/// AdminBundle Extractor Implementation
///
/// Reads the bundle placed by [`require_admin_token`]. A handler mounted without the guard
/// fails closed with an internal error rather than running unauthorized.
impl<S> FromRequestParts<S> for AdminBundle
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminBundle>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("admin guard missing from route".into()))
    }
}
