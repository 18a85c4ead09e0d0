//! Router configuration for the Web API.

use axum::extract::DefaultBodyLimit;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    create_group, delete_group, direct_upload, download_all, download_file, issue_upload_token,
    list_groups, serve_blob, upload, upload_to_group, AppState,
};

/// Create the main API router.
///
/// The body limit must cover a whole multipart batch; axum's 2 MB default
/// would reject any real upload. Per-file size is enforced in the upload
/// handler.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let limits = &app_state.upload_config;
    let body_limit = (limits.max_file_size_bytes as usize).saturating_mul(limits.max_files);

    // "/upload/token" is a literal segment, so the router matches it before
    // the ":group_id" capture.
    let api_routes = Router::new()
        .route("/groups", get(list_groups))
        .route("/groups/create", post(create_group))
        .route("/groups/:group_id", delete(delete_group))
        .route("/upload", post(upload))
        .route("/upload/token", post(issue_upload_token))
        .route("/upload/:group_id", post(upload_to_group))
        .route("/download/:group_id/:filename", get(download_file))
        .route("/download-all/:group_id", get(download_all));

    Router::new()
        .nest("/api", api_routes)
        .route("/blob/*pathname", get(serve_blob).put(direct_upload))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}

/// Create a CORS layer from configuration.
///
/// With no configured origins the API is open to any origin; otherwise only
/// the listed origins are allowed.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let parsed_origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([CONTENT_TYPE, ACCEPT])
            .allow_origin(parsed_origins)
    }
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// OpenAPI documentation of the Web API.
#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::groups::list_groups,
        super::handlers::groups::create_group,
        super::handlers::groups::delete_group,
        super::handlers::upload::upload,
        super::handlers::upload::upload_to_group,
        super::handlers::upload::issue_upload_token,
        super::handlers::download::download_file,
        super::handlers::download::download_all,
        super::handlers::blob::serve_blob,
        super::handlers::blob::direct_upload,
    ),
    components(schemas(
        crate::group::Group,
        crate::group::FileRecord,
        super::dto::DirectFileDescriptor,
        super::dto::CreateGroupRequest,
        super::dto::UploadTokenRequest,
        super::dto::FileSummary,
        super::dto::GroupSummary,
        super::dto::GroupsResponse,
        super::dto::GroupResponse,
        super::dto::DeleteResponse,
        super::dto::UploadTokenResponse,
        super::dto::DirectUploadResponse,
    )),
    tags(
        (name = "groups", description = "Group listing and management"),
        (name = "upload", description = "Multipart and direct uploads"),
        (name = "download", description = "Single-file and ZIP downloads"),
        (name = "blob", description = "Blob serving and direct PUT")
    )
)]
struct ApiDoc;

/// Create the Swagger UI router.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }

    #[test]
    fn test_create_cors_layer_empty_origins() {
        let _layer = create_cors_layer(&[]);
        // Should not panic
    }

    #[test]
    fn test_create_cors_layer_with_origins() {
        let origins = vec!["http://localhost:5173".to_string()];
        let _layer = create_cors_layer(&origins);
        // Should not panic
    }

    #[test]
    fn test_openapi_doc_builds() {
        let doc = ApiDoc::openapi();
        assert!(!doc.paths.paths.is_empty());
    }
}
