//! Handlers for `/orders` and their routing steps.

use ashley_core::audit::{ACTION_CREATE, ACTION_STATUS_CHANGE, ACTION_UPDATE};
use ashley_core::order::{self, state_machine, DEFAULT_CURRENCY, DEFAULT_DEPOSIT_PERCENTAGE, DEFAULT_PAYMENT_TERMS};
use ashley_core::pagination;
use ashley_core::routing::generate_steps;
use ashley_core::types::DbId;
use ashley_db::models::client::{Brand, Client};
use ashley_db::models::order::{
    CreateOrder, NewOrder, Order, OrderLineItem, OrderListItem, OrderQuery, RoutingStep,
    UpdateOrder,
};
use ashley_db::repositories::{BrandRepo, ClientRepo, OrderRepo, RoutingStepRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Serialize;
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub client: Option<Client>,
    pub brand: Option<Brand>,
    pub line_items: Vec<OrderLineItem>,
}

fn bad(msg: String) -> AppError {
    AppError::BadRequest(msg)
}

/// GET /api/v1/orders
pub async fn list_orders(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<OrderQuery>,
) -> AppResult<Json<PaginatedResponse<OrderListItem>>> {
    if let Some(status) = params.status.as_deref() {
        order::validate_status(status).map_err(bad)?;
    }
    let (page, limit, offset) = pagination::resolve(params.page, params.limit);
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let status = params.status.as_deref();

    let orders = OrderRepo::list(
        &state.pool,
        auth.workspace_id,
        status,
        params.client_id,
        search,
        limit,
        offset,
    )
    .await?;
    let total =
        OrderRepo::count(&state.pool, auth.workspace_id, status, params.client_id, search).await?;

    Ok(Json(PaginatedResponse::new(orders, page, limit, total)))
}

/// GET /api/v1/orders/{id}
pub async fn get_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    let order = OrderRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;
    let client = ClientRepo::find_by_id(&state.pool, auth.workspace_id, order.client_id).await?;
    let brand = BrandRepo::find_by_id(&state.pool, auth.workspace_id, order.brand_id).await?;
    let line_items = OrderRepo::line_items(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: OrderDetail {
            order,
            client,
            brand,
            line_items,
        },
    }))
}

/// POST /api/v1/orders
pub async fn create_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<Order>>)> {
    input.validate()?;
    for line in &input.line_items {
        order::validate_product_type(&line.product_type).map_err(bad)?;
        order::validate_printing_method(&line.printing_method).map_err(bad)?;
        order::validate_line_item(line.quantity, line.unit_price).map_err(bad)?;
    }
    if let Some(channel) = input.channel.as_deref() {
        order::validate_channel(channel).map_err(bad)?;
    }
    if let Some(route) = input.production_route.as_deref() {
        order::validate_production_route(route).map_err(bad)?;
    }
    let currency = input.currency.clone().unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    order::validate_currency(&currency).map_err(bad)?;
    let payment_terms = input
        .payment_terms
        .clone()
        .unwrap_or_else(|| DEFAULT_PAYMENT_TERMS.to_string());
    order::validate_payment_terms(&payment_terms).map_err(bad)?;
    let deposit_percentage = input.deposit_percentage.unwrap_or(DEFAULT_DEPOSIT_PERCENTAGE);
    order::validate_deposit_percentage(deposit_percentage).map_err(bad)?;

    let client = ClientRepo::find_by_id(&state.pool, auth.workspace_id, input.client_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| not_found("Client", input.client_id))?;
    let brand = BrandRepo::find_by_id(&state.pool, auth.workspace_id, input.brand_id)
        .await?
        .filter(|b| b.is_active && b.client_id == client.id)
        .ok_or_else(|| not_found("Brand", input.brand_id))?;

    let line_items: Vec<_> = input
        .line_items
        .iter()
        .map(|l| (l.clone(), order::line_total(l.unit_price, l.quantity)))
        .collect();
    let total_amount =
        order::order_total(input.line_items.iter().map(|l| (l.unit_price, l.quantity)));

    let created = OrderRepo::create(
        &state.pool,
        &NewOrder {
            workspace_id: auth.workspace_id,
            client_id: client.id,
            brand_id: brand.id,
            brand_code: brand.code.clone(),
            year: Utc::now().year(),
            total_amount,
            currency,
            channel: input.channel.clone(),
            payment_terms,
            deposit_percentage,
            tax_inclusive: input.tax_inclusive.unwrap_or(true),
            production_route: input.production_route.clone(),
            delivery_date: input.delivery_date,
            notes: input.notes.clone(),
            created_by: auth.user_id,
            line_items,
        },
    )
    .await?;

    tracing::info!(
        order_id = created.id,
        order_number = %created.order_number,
        user_id = auth.user_id,
        "Order created"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "order",
            resource_id: created.id,
            event_type: "order.created",
        },
        serde_json::json!({
            "order_number": created.order_number,
            "total_amount": created.total_amount,
            "status": created.status,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /api/v1/orders/{id}
pub async fn update_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrder>,
) -> AppResult<Json<DataResponse<Order>>> {
    input.validate()?;
    let existing = OrderRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;

    if order::is_locked(&existing.status) {
        return Err(bad(format!(
            "Cannot modify an order in status '{}'",
            existing.status
        )));
    }
    let status_change = input
        .status
        .as_deref()
        .filter(|s| *s != existing.status.as_str());
    if let Some(to) = status_change {
        order::validate_status(to).map_err(bad)?;
        state_machine::validate_transition(&existing.status, to).map_err(bad)?;
    }
    if let Some(channel) = input.channel.as_deref() {
        order::validate_channel(channel).map_err(bad)?;
    }
    if let Some(terms) = input.payment_terms.as_deref() {
        order::validate_payment_terms(terms).map_err(bad)?;
    }
    if let Some(route) = input.production_route.as_deref() {
        order::validate_production_route(route).map_err(bad)?;
    }

    let updated = OrderRepo::update(&state.pool, auth.workspace_id, id, &existing.status, &input)
        .await?
        .ok_or_else(|| status_changed("Order", id, &existing.status))?;

    let (action, event_type) = match status_change {
        Some(_) => (ACTION_STATUS_CHANGE, "order.status_changed"),
        None => (ACTION_UPDATE, "order.updated"),
    };
    tracing::info!(order_id = id, from = %existing.status, to = %updated.status, "Order updated");
    activity::record(
        &state,
        &auth,
        Activity {
            action,
            resource: "order",
            resource_id: id,
            event_type,
        },
        serde_json::json!({ "from_status": existing.status, "status": updated.status }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/orders/{id}/routing
///
/// One-shot: an order that already has steps is refused.
pub async fn generate_routing(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<RoutingStep>>>)> {
    OrderRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;

    let methods = OrderRepo::printing_methods(&state.pool, id).await?;
    let templates = generate_steps(methods.iter().map(String::as_str));

    let steps = RoutingStepRepo::create_for_order(&state.pool, id, &templates)
        .await?
        .ok_or_else(|| bad("Routing steps already exist for this order".to_string()))?;

    tracing::info!(order_id = id, steps = steps.len(), "Routing generated");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "routing",
            resource_id: id,
            event_type: "order.routing_generated",
        },
        serde_json::json!({ "steps": steps.len(), "printing_methods": methods }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: steps })))
}

/// GET /api/v1/orders/{id}/routing
pub async fn list_routing(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<RoutingStep>>>> {
    OrderRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;
    let steps = RoutingStepRepo::list_by_order(&state.pool, id).await?;
    Ok(Json(DataResponse { data: steps }))
}
