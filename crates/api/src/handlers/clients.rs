//! Handlers for `/clients` and their brands.

use ashley_core::audit::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE};
use ashley_core::client::{
    normalize_brand_code, validate_brand_code, validate_deletable, DELETE_BLOCKING_ORDER_STATUSES,
    RECENT_ORDERS_LIMIT,
};
use ashley_core::pagination;
use ashley_core::types::DbId;
use ashley_db::models::client::{
    Brand, Client, ClientListItem, ClientQuery, CreateBrand, CreateClient, UpdateClient,
};
use ashley_db::models::order::Order;
use ashley_db::repositories::{BrandRepo, ClientRepo, OrderRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub brands: Vec<Brand>,
    pub recent_orders: Vec<Order>,
}

/// GET /api/v1/clients
pub async fn list_clients(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ClientQuery>,
) -> AppResult<Json<PaginatedResponse<ClientListItem>>> {
    let (page, limit, offset) = pagination::resolve(params.page, params.limit);
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let clients = ClientRepo::list(
        &state.pool,
        auth.workspace_id,
        search,
        params.is_active,
        limit,
        offset,
    )
    .await?;
    let total = ClientRepo::count(&state.pool, auth.workspace_id, search, params.is_active).await?;

    Ok(Json(PaginatedResponse::new(clients, page, limit, total)))
}

/// GET /api/v1/clients/{id}
pub async fn get_client(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ClientDetail>>> {
    let client = ClientRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Client", id))?;
    let brands = BrandRepo::list_by_client(&state.pool, id).await?;
    let recent_orders = OrderRepo::recent_for_client(&state.pool, id, RECENT_ORDERS_LIMIT).await?;

    Ok(Json(DataResponse {
        data: ClientDetail {
            client,
            brands,
            recent_orders,
        },
    }))
}

/// POST /api/v1/clients
pub async fn create_client(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateClient>,
) -> AppResult<(StatusCode, Json<DataResponse<Client>>)> {
    input.validate()?;
    let client = ClientRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(client_id = client.id, user_id = auth.user_id, "Client created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "client",
            resource_id: client.id,
            event_type: "client.created",
        },
        serde_json::json!({ "name": client.name }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: client })))
}

/// PUT /api/v1/clients/{id}
pub async fn update_client(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateClient>,
) -> AppResult<Json<DataResponse<Client>>> {
    input.validate()?;
    let client = ClientRepo::update(&state.pool, auth.workspace_id, id, &input)
        .await?
        .ok_or_else(|| not_found("Client", id))?;

    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_UPDATE,
            resource: "client",
            resource_id: id,
            event_type: "client.updated",
        },
        serde_json::json!({ "name": client.name, "is_active": client.is_active }),
    )
    .await;

    Ok(Json(DataResponse { data: client }))
}

/// DELETE /api/v1/clients/{id}
///
/// Soft delete. Refused while the client has open orders.
pub async fn delete_client(
    RequireManager(auth): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ClientRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Client", id))?;

    let open =
        ClientRepo::count_orders_in_status(&state.pool, id, DELETE_BLOCKING_ORDER_STATUSES).await?;
    validate_deletable(open).map_err(AppError::BadRequest)?;

    ClientRepo::soft_delete(&state.pool, auth.workspace_id, id).await?;

    tracing::info!(client_id = id, user_id = auth.user_id, "Client deactivated");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_DELETE,
            resource: "client",
            resource_id: id,
            event_type: "client.deleted",
        },
        serde_json::json!({ "is_active": false }),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/clients/{id}/brands
pub async fn list_brands(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Brand>>>> {
    ClientRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Client", id))?;
    let brands = BrandRepo::list_by_client(&state.pool, id).await?;
    Ok(Json(DataResponse { data: brands }))
}

/// POST /api/v1/clients/{id}/brands
pub async fn create_brand(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateBrand>,
) -> AppResult<(StatusCode, Json<DataResponse<Brand>>)> {
    input.validate()?;
    let code = normalize_brand_code(input.code.as_deref());
    if let Some(code) = code.as_deref() {
        validate_brand_code(code).map_err(AppError::BadRequest)?;
    }

    ClientRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Client", id))?;

    let brand = BrandRepo::create(&state.pool, auth.workspace_id, id, &input, code.as_deref()).await?;

    tracing::info!(brand_id = brand.id, client_id = id, "Brand created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "brand",
            resource_id: brand.id,
            event_type: "brand.created",
        },
        serde_json::json!({ "client_id": id, "name": brand.name, "code": brand.code }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: brand })))
}
