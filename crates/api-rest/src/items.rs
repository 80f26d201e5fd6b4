//! Library item endpoints, one route tree per item kind.
//!
//! The handlers are generic over the value type. [`ItemEndpoint`] picks the matching service
//! out of the shared state.

use crate::error::ApiResult;
use crate::extract::{ApiJson, OptionalJson, RequestAuthor};
use crate::AppState;
use api_shared::{
    AuditTrailQuery, CreateItemReq, EditItemReq, ErrorRes, LibraryItemRes, ListQuery,
    NewVersionReq, PageRes, VersionQuery, VersionRes,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mdr_core::entities::{
    ActivityGroupVO, ActivityVO, CtTermAttributesVO, OdmFormVO, SyntaxTemplateVO,
};
use mdr_core::{LibraryItemService, LibraryItemValue, MdrResult, MdrServices};

pub trait ItemEndpoint: LibraryItemValue {
    fn service(services: &MdrServices) -> &LibraryItemService<Self>;
}

impl ItemEndpoint for ActivityVO {
    fn service(services: &MdrServices) -> &LibraryItemService<Self> {
        &services.activities
    }
}

impl ItemEndpoint for ActivityGroupVO {
    fn service(services: &MdrServices) -> &LibraryItemService<Self> {
        &services.activity_groups
    }
}

impl ItemEndpoint for CtTermAttributesVO {
    fn service(services: &MdrServices) -> &LibraryItemService<Self> {
        &services.ct_terms
    }
}

impl ItemEndpoint for OdmFormVO {
    fn service(services: &MdrServices) -> &LibraryItemService<Self> {
        &services.odm_forms
    }
}

impl ItemEndpoint for SyntaxTemplateVO {
    fn service(services: &MdrServices) -> &LibraryItemService<Self> {
        &services.syntax_templates
    }
}

/// Routes of one kind, to be nested under `/<route_name>`.
pub fn item_routes<V: ItemEndpoint>() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items::<V>).post(create_item::<V>))
        .route("/audit-trail", get(audit_trail::<V>))
        .route(
            "/:uid",
            get(get_item::<V>)
                .patch(edit_item::<V>)
                .delete(delete_item::<V>),
        )
        .route(
            "/:uid/versions",
            get(version_history::<V>).post(new_version::<V>),
        )
        .route("/:uid/approvals", post(approve_item::<V>))
        .route(
            "/:uid/activations",
            post(reactivate_item::<V>).delete(inactivate_item::<V>),
        )
}

fn item_json<V: LibraryItemValue>(item: MdrResult<mdr_core::LibraryItem<V>>) -> ApiResult<Json<LibraryItemRes>> {
    Ok(Json(LibraryItemRes::from_item(&item?)?))
}

#[utoipa::path(
    get,
    path = "/{kind}",
    params(
        ("kind" = String, Path, description = "activities, activity-groups, ct-terms, odm-forms or syntax-templates"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Latest versions of matching items", body = PageRes),
        (status = 422, description = "Invalid query", body = ErrorRes)
    )
)]
/// List the latest version of every item of a kind
pub(crate) async fn list_items<V: ItemEndpoint>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PageRes>> {
    let page = V::service(&state.services).get_all(&query.to_filter()?)?;
    Ok(Json(PageRes::from_page(&page)?))
}

#[utoipa::path(
    post,
    path = "/{kind}",
    params(("kind" = String, Path, description = "Item kind")),
    request_body = CreateItemReq,
    responses(
        (status = 201, description = "Item created as draft 0.1", body = LibraryItemRes),
        (status = 400, description = "Unknown or non-editable library", body = ErrorRes),
        (status = 409, description = "A unique field is already used", body = ErrorRes),
        (status = 422, description = "Invalid body", body = ErrorRes)
    )
)]
/// Create a new item
pub(crate) async fn create_item<V: ItemEndpoint>(
    State(state): State<AppState>,
    RequestAuthor(author): RequestAuthor,
    ApiJson(req): ApiJson<CreateItemReq>,
) -> ApiResult<(StatusCode, Json<LibraryItemRes>)> {
    let item = V::service(&state.services).create(&req.library_name, req.fields, &author)?;
    tracing::info!(kind = %V::KIND, uid = item.uid().unwrap_or_default(), "created via REST");
    Ok((StatusCode::CREATED, Json(LibraryItemRes::from_item(&item)?)))
}

#[utoipa::path(
    get,
    path = "/{kind}/audit-trail",
    params(("kind" = String, Path, description = "Item kind"), AuditTrailQuery),
    responses(
        (status = 200, description = "Every version of every item, newest first", body = PageRes)
    )
)]
/// Audit trail of a kind
pub(crate) async fn audit_trail<V: ItemEndpoint>(
    State(state): State<AppState>,
    Query(query): Query<AuditTrailQuery>,
) -> ApiResult<Json<PageRes>> {
    let (page_number, page_size, total_count) = query.paging();
    let page = V::service(&state.services).get_audit_trail(page_number, page_size, total_count)?;
    Ok(Json(PageRes::from_page(&page)?))
}

#[utoipa::path(
    get,
    path = "/{kind}/{uid}",
    params(
        ("kind" = String, Path, description = "Item kind"),
        ("uid" = String, Path, description = "Item uid"),
        VersionQuery
    ),
    responses(
        (status = 200, description = "The selected version", body = LibraryItemRes),
        (status = 404, description = "No such item or version", body = ErrorRes)
    )
)]
/// Get one version of an item; the latest unless a selector is given
pub(crate) async fn get_item<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Query(query): Query<VersionQuery>,
) -> ApiResult<Json<LibraryItemRes>> {
    let selector = query.to_selector()?;
    item_json(V::service(&state.services).get_by_uid(&uid, &selector))
}

#[utoipa::path(
    patch,
    path = "/{kind}/{uid}",
    params(("kind" = String, Path, description = "Item kind"), ("uid" = String, Path, description = "Item uid")),
    request_body = EditItemReq,
    responses(
        (status = 200, description = "Draft edited", body = LibraryItemRes),
        (status = 400, description = "Item is not a draft", body = ErrorRes),
        (status = 404, description = "No such item", body = ErrorRes)
    )
)]
/// Edit the current draft
pub(crate) async fn edit_item<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    RequestAuthor(author): RequestAuthor,
    ApiJson(req): ApiJson<EditItemReq>,
) -> ApiResult<Json<LibraryItemRes>> {
    item_json(V::service(&state.services).edit_draft(
        &uid,
        req.fields,
        &req.change_description,
        &author,
    ))
}

#[utoipa::path(
    delete,
    path = "/{kind}/{uid}",
    params(("kind" = String, Path, description = "Item kind"), ("uid" = String, Path, description = "Item uid")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 400, description = "Item was approved before", body = ErrorRes),
        (status = 404, description = "No such item", body = ErrorRes)
    )
)]
/// Soft delete an item that was never approved
pub(crate) async fn delete_item<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    RequestAuthor(author): RequestAuthor,
) -> ApiResult<StatusCode> {
    V::service(&state.services).soft_delete(&uid, &author)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{kind}/{uid}/versions",
    params(("kind" = String, Path, description = "Item kind"), ("uid" = String, Path, description = "Item uid")),
    responses(
        (status = 200, description = "All versions, oldest first", body = Vec<VersionRes>),
        (status = 404, description = "No such item", body = ErrorRes)
    )
)]
/// Version history with the fields each version changed
pub(crate) async fn version_history<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Vec<VersionRes>>> {
    let history = V::service(&state.services).get_version_history(&uid)?;
    let versions = history
        .iter()
        .map(VersionRes::from_entry)
        .collect::<MdrResult<_>>()?;
    Ok(Json(versions))
}

#[utoipa::path(
    post,
    path = "/{kind}/{uid}/versions",
    params(("kind" = String, Path, description = "Item kind"), ("uid" = String, Path, description = "Item uid")),
    request_body = NewVersionReq,
    responses(
        (status = 201, description = "New draft created", body = LibraryItemRes),
        (status = 400, description = "Item is not final", body = ErrorRes),
        (status = 422, description = "Body is not valid JSON", body = ErrorRes)
    )
)]
/// Start a new draft from the final version
pub(crate) async fn new_version<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    RequestAuthor(author): RequestAuthor,
    OptionalJson(body): OptionalJson<NewVersionReq>,
) -> ApiResult<(StatusCode, Json<LibraryItemRes>)> {
    let req = body.unwrap_or_default();
    let item = V::service(&state.services).create_new_version(
        &uid,
        req.change_description.as_deref(),
        Some(req.fields),
        &author,
    )?;
    Ok((StatusCode::CREATED, Json(LibraryItemRes::from_item(&item)?)))
}

#[utoipa::path(
    post,
    path = "/{kind}/{uid}/approvals",
    params(("kind" = String, Path, description = "Item kind"), ("uid" = String, Path, description = "Item uid")),
    responses(
        (status = 201, description = "Draft approved", body = LibraryItemRes),
        (status = 400, description = "Item is not a draft", body = ErrorRes)
    )
)]
/// Approve the current draft
pub(crate) async fn approve_item<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    RequestAuthor(author): RequestAuthor,
) -> ApiResult<(StatusCode, Json<LibraryItemRes>)> {
    let item = V::service(&state.services).approve(&uid, &author)?;
    Ok((StatusCode::CREATED, Json(LibraryItemRes::from_item(&item)?)))
}

#[utoipa::path(
    delete,
    path = "/{kind}/{uid}/activations",
    params(("kind" = String, Path, description = "Item kind"), ("uid" = String, Path, description = "Item uid")),
    responses(
        (status = 200, description = "Final version retired", body = LibraryItemRes),
        (status = 400, description = "Item is not final", body = ErrorRes)
    )
)]
/// Retire the final version
pub(crate) async fn inactivate_item<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    RequestAuthor(author): RequestAuthor,
) -> ApiResult<Json<LibraryItemRes>> {
    item_json(V::service(&state.services).inactivate_final(&uid, &author))
}

#[utoipa::path(
    post,
    path = "/{kind}/{uid}/activations",
    params(("kind" = String, Path, description = "Item kind"), ("uid" = String, Path, description = "Item uid")),
    responses(
        (status = 200, description = "Retired version reactivated", body = LibraryItemRes),
        (status = 400, description = "Item is not retired", body = ErrorRes)
    )
)]
/// Reactivate a retired version
pub(crate) async fn reactivate_item<V: ItemEndpoint>(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    RequestAuthor(author): RequestAuthor,
) -> ApiResult<Json<LibraryItemRes>> {
    item_json(V::service(&state.services).reactivate_retired(&uid, &author))
}
