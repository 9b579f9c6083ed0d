//! Handlers for `/cutting`: fabric stock, lays and bundle creation.

use std::collections::HashMap;

use ashley_core::audit::ACTION_CREATE;
use ashley_core::cutting::{plan_bundles, validate_lay, validate_uom, CuttingSummary};
use ashley_core::error::CoreError;
use ashley_core::types::DbId;
use ashley_db::models::cutting::{
    CreateBundles, CreateCutLay, CreateFabricBatch, CreateFabricIssue, CutLayOutput, CutLayWithOutputs,
    FabricBatch, FabricIssue, LayQuery,
};
use ashley_db::models::production::Bundle;
use ashley_db::repositories::{BundleRepo, CutLayRepo, FabricRepo, IssueOutcome, OrderRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/cutting/fabric-batches
pub async fn create_batch(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateFabricBatch>,
) -> AppResult<(StatusCode, Json<DataResponse<FabricBatch>>)> {
    input.validate()?;
    validate_uom(&input.uom).map_err(AppError::BadRequest)?;

    let batch = FabricRepo::create_batch(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(batch_id = batch.id, lot_no = %batch.lot_no, "Fabric batch received");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "fabric_batch",
            resource_id: batch.id,
            event_type: "fabric_batch.created",
        },
        serde_json::json!({ "lot_no": batch.lot_no, "qty_on_hand": batch.qty_on_hand, "uom": batch.uom }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: batch })))
}

/// GET /api/v1/cutting/fabric-batches
pub async fn list_batches(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<FabricBatch>>>> {
    let batches = FabricRepo::list_batches(&state.pool, auth.workspace_id).await?;
    Ok(Json(DataResponse { data: batches }))
}

/// POST /api/v1/cutting/fabric-issues
pub async fn issue_fabric(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateFabricIssue>,
) -> AppResult<(StatusCode, Json<DataResponse<FabricIssue>>)> {
    input.validate()?;
    OrderRepo::find_by_id(&state.pool, auth.workspace_id, input.order_id)
        .await?
        .ok_or_else(|| not_found("Order", input.order_id))?;

    let issue = match FabricRepo::issue(&state.pool, auth.workspace_id, &input, auth.user_id).await? {
        IssueOutcome::Issued(issue) => issue,
        IssueOutcome::BatchNotFound => return Err(not_found("FabricBatch", input.batch_id)),
        IssueOutcome::UomMismatch { batch_uom } => {
            return Err(AppError::BadRequest(format!(
                "Issue uom '{}' does not match batch uom '{batch_uom}'",
                input.uom
            )))
        }
        IssueOutcome::Insufficient { on_hand } => {
            return Err(AppError::Core(CoreError::InvalidState(format!(
                "Insufficient fabric: {on_hand} on hand, {} requested",
                input.qty
            ))))
        }
    };

    tracing::info!(
        batch_id = input.batch_id,
        order_id = input.order_id,
        qty = issue.qty_issued,
        "Fabric issued"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "fabric_issue",
            resource_id: issue.id,
            event_type: "fabric.issued",
        },
        serde_json::json!({
            "batch_id": issue.batch_id,
            "order_id": issue.order_id,
            "qty_issued": issue.qty_issued,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: issue })))
}

/// POST /api/v1/cutting/lays
pub async fn create_lay(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCutLay>,
) -> AppResult<(StatusCode, Json<DataResponse<CutLayWithOutputs>>)> {
    input.validate()?;
    validate_uom(&input.uom).map_err(AppError::BadRequest)?;
    validate_lay(input.plies, input.gross_used, input.offcuts, input.defects)
        .map_err(AppError::BadRequest)?;
    OrderRepo::find_by_id(&state.pool, auth.workspace_id, input.order_id)
        .await?
        .ok_or_else(|| not_found("Order", input.order_id))?;

    let (lay, outputs) = CutLayRepo::create(&state.pool, auth.workspace_id, &input, auth.user_id).await?;
    let pieces: i32 = outputs.iter().map(|o| o.qty).sum();

    tracing::info!(lay_id = lay.id, order_id = lay.order_id, pieces, "Cut lay recorded");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "cut_lay",
            resource_id: lay.id,
            event_type: "cut_lay.created",
        },
        serde_json::json!({ "order_id": lay.order_id, "plies": lay.plies, "pieces": pieces }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CutLayWithOutputs { lay, outputs },
        }),
    ))
}

/// GET /api/v1/cutting/lays?order_id=
pub async fn list_lays(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<LayQuery>,
) -> AppResult<Json<DataResponse<Vec<CutLayWithOutputs>>>> {
    let lays = CutLayRepo::list(&state.pool, auth.workspace_id, params.order_id).await?;
    let ids: Vec<DbId> = lays.iter().map(|l| l.id).collect();
    let mut by_lay: HashMap<DbId, Vec<CutLayOutput>> = HashMap::new();
    for output in CutLayRepo::outputs_for(&state.pool, &ids).await? {
        by_lay.entry(output.lay_id).or_default().push(output);
    }

    let data = lays
        .into_iter()
        .map(|lay| {
            let outputs = by_lay.remove(&lay.id).unwrap_or_default();
            CutLayWithOutputs { lay, outputs }
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/cutting/lays/{id}/bundles
pub async fn create_bundles(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateBundles>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<Bundle>>>)> {
    let lay = CutLayRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("CutLay", id))?;
    let order = OrderRepo::find_by_id(&state.pool, auth.workspace_id, lay.order_id)
        .await?
        .ok_or_else(|| not_found("Order", lay.order_id))?;

    let outputs = CutLayRepo::outputs_for(&state.pool, &[lay.id]).await?;
    let pairs: Vec<(String, i32)> = outputs.into_iter().map(|o| (o.size_code, o.qty)).collect();
    let plan = plan_bundles(&pairs, &input.bundle_size_per_size);
    if plan.is_empty() {
        return Err(AppError::BadRequest(
            "No bundle sizes match the lay outputs".to_string(),
        ));
    }

    let bundles = BundleRepo::create_for_lay(
        &state.pool,
        auth.workspace_id,
        order.id,
        &order.order_number,
        lay.id,
        &plan,
    )
    .await?
    .ok_or_else(|| AppError::BadRequest("Bundles already created for this lay".to_string()))?;

    tracing::info!(lay_id = id, order_id = order.id, bundles = bundles.len(), "Bundles created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "bundle",
            resource_id: lay.id,
            event_type: "bundles.created",
        },
        serde_json::json!({
            "lay_id": lay.id,
            "order_id": order.id,
            "count": bundles.len(),
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: bundles })))
}

/// GET /api/v1/cutting/orders/{id}/summary
pub async fn order_summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CuttingSummary>>> {
    OrderRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Order", id))?;
    let t = CutLayRepo::totals_for_order(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: CuttingSummary::new(
            t.total_fabric_issued,
            t.total_gross_used,
            t.total_pieces_cut,
            t.total_bundles,
        ),
    }))
}
