//! # API REST
//!
//! REST API implementation for the MDR.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, error responses, CORS)
//!
//! Uses `api-shared` for request and response models and `mdr-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod items;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::items::{item_routes, ItemEndpoint};
use api_shared::{
    CreateItemReq, CreateLibraryReq, EditItemReq, ErrorRes, HealthRes, HealthService,
    LibraryItemRes, LibraryRes, NewVersionReq, PageRes, VersionRes,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mdr_core::entities::{
    ActivityGroupVO, ActivityVO, CtTermAttributesVO, OdmFormVO, SyntaxTemplateVO,
};
use mdr_core::MdrServices;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    pub services: MdrServices,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_libraries,
        create_library,
        items::list_items,
        items::create_item,
        items::audit_trail,
        items::get_item,
        items::edit_item,
        items::delete_item,
        items::version_history,
        items::new_version,
        items::approve_item,
        items::inactivate_item,
        items::reactivate_item,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        LibraryRes,
        CreateLibraryReq,
        LibraryItemRes,
        VersionRes,
        PageRes,
        CreateItemReq,
        EditItemReq,
        NewVersionReq,
    )),
)]
pub struct ApiDoc;

fn nest_kind<V: ItemEndpoint>(router: Router<AppState>) -> Router<AppState> {
    router.nest(&format!("/{}", V::KIND.route_name()), item_routes::<V>())
}

/// Build the REST application around `services`.
pub fn router(services: MdrServices) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/libraries", get(list_libraries).post(create_library));
    app = nest_kind::<ActivityVO>(app);
    app = nest_kind::<ActivityGroupVO>(app);
    app = nest_kind::<CtTermAttributesVO>(app);
    app = nest_kind::<OdmFormVO>(app);
    app = nest_kind::<SyntaxTemplateVO>(app);

    app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { services })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// This endpoint is used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/libraries",
    responses(
        (status = 200, description = "All libraries, sorted by name", body = Vec<LibraryRes>)
    )
)]
/// List the content libraries
async fn list_libraries(State(state): State<AppState>) -> ApiResult<Json<Vec<LibraryRes>>> {
    let libraries = state.services.libraries.list()?;
    Ok(Json(libraries.into_iter().map(LibraryRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/libraries",
    request_body = CreateLibraryReq,
    responses(
        (status = 201, description = "Library created", body = LibraryRes),
        (status = 409, description = "Library already exists", body = ErrorRes)
    )
)]
/// Create a content library
async fn create_library(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateLibraryReq>,
) -> ApiResult<(StatusCode, Json<LibraryRes>)> {
    let record = state.services.libraries.create(&req.name, req.is_editable)?;
    Ok((StatusCode::CREATED, Json(LibraryRes::from(record))))
}

#[cfg(test)]
mod tests;
