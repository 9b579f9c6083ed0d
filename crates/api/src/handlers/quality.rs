//! Handlers for `/quality`: defect codes, checklists, AQL inspections and
//! the standalone AQL calculators.

use ashley_core::aql::{
    evaluate, sample_plan, validate_aql, Evaluation, SamplePlan, SeverityLimits,
    DEFAULT_AQL_CRITICAL, DEFAULT_AQL_MAJOR, DEFAULT_AQL_MINOR, RESULT_REJECT,
};
use ashley_core::audit::{ACTION_CREATE, ACTION_STATUS_CHANGE};
use ashley_core::capa::{PRIORITY_CRITICAL, SOURCE_QC_INSPECTION};
use ashley_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use ashley_core::quality::{
    self, state_machine, validate_can_record_defect, AUTO_CAPA_DUE_DAYS, INSPECTION_COMPLETED,
    INSPECTION_IN_PROGRESS,
};
use ashley_core::types::DbId;
use ashley_db::models::capa::{CapaTask, CreateCapa};
use ashley_db::models::quality::{
    Checklist, CompleteInspection, CreateChecklist, CreateDefect, CreateDefectCode,
    CreateInspection, Defect, DefectCode, EvaluateRequest, Inspection, InspectionDetail,
    InspectionQuery, NewInspection, SampleSizeRequest,
};
use ashley_db::repositories::{
    BundleRepo, ChecklistRepo, DefectCodeRepo, InspectionRepo, OrderRepo,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChecklistQuery {
    pub checklist_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InspectionCompletion {
    pub inspection: Inspection,
    pub evaluation: Evaluation,
    pub capa: Option<CapaTask>,
}

#[derive(Debug, Serialize)]
pub struct SampleSizeResponse {
    #[serde(flatten)]
    pub plan: SamplePlan,
    pub limits: SeverityLimits,
}

struct AqlValues {
    critical: f64,
    major: f64,
    minor: f64,
}

fn resolve_aql(critical: Option<f64>, major: Option<f64>, minor: Option<f64>) -> AppResult<AqlValues> {
    let values = AqlValues {
        critical: critical.unwrap_or(DEFAULT_AQL_CRITICAL),
        major: major.unwrap_or(DEFAULT_AQL_MAJOR),
        minor: minor.unwrap_or(DEFAULT_AQL_MINOR),
    };
    for v in [values.critical, values.major, values.minor] {
        validate_aql(v).map_err(AppError::BadRequest)?;
    }
    Ok(values)
}

async fn load_inspection(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<Inspection> {
    InspectionRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Inspection", id))
}

// ---------------------------------------------------------------------------
// Defect codes and checklists
// ---------------------------------------------------------------------------

/// POST /api/v1/quality/defect-codes
pub async fn create_defect_code(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateDefectCode>,
) -> AppResult<(StatusCode, Json<DataResponse<DefectCode>>)> {
    input.validate()?;
    input.code = input.code.trim().to_uppercase();
    quality::validate_defect_category(&input.category).map_err(AppError::BadRequest)?;
    quality::validate_severity(&input.severity).map_err(AppError::BadRequest)?;

    let code = DefectCodeRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(code_id = code.id, code = %code.code, "Defect code created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "defect_code",
            resource_id: code.id,
            event_type: "defect_code.created",
        },
        serde_json::json!({ "code": code.code, "severity": code.severity }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: code })))
}

/// GET /api/v1/quality/defect-codes
pub async fn list_defect_codes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DefectCode>>>> {
    let codes = DefectCodeRepo::list(&state.pool, auth.workspace_id).await?;
    Ok(Json(DataResponse { data: codes }))
}

/// POST /api/v1/quality/checklists
pub async fn create_checklist(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateChecklist>,
) -> AppResult<(StatusCode, Json<DataResponse<Checklist>>)> {
    input.validate()?;
    quality::validate_checklist_type(&input.checklist_type).map_err(AppError::BadRequest)?;
    if !(input.items.is_null() || input.items.is_array()) {
        return Err(AppError::BadRequest("items must be a JSON array".to_string()));
    }

    let checklist = ChecklistRepo::create(&state.pool, auth.workspace_id, &input).await?;
    tracing::info!(checklist_id = checklist.id, "Checklist created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: checklist })))
}

/// GET /api/v1/quality/checklists?checklist_type=
pub async fn list_checklists(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ChecklistQuery>,
) -> AppResult<Json<DataResponse<Vec<Checklist>>>> {
    let lists =
        ChecklistRepo::list(&state.pool, auth.workspace_id, params.checklist_type.as_deref()).await?;
    Ok(Json(DataResponse { data: lists }))
}

// ---------------------------------------------------------------------------
// Inspections
// ---------------------------------------------------------------------------

/// POST /api/v1/quality/inspections
///
/// Sample size comes from the lot size. The stored acceptance and rejection
/// numbers are the major-defect limits.
pub async fn create_inspection(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateInspection>,
) -> AppResult<(StatusCode, Json<DataResponse<Inspection>>)> {
    input.validate()?;
    quality::validate_lot_size(i64::from(input.lot_size)).map_err(AppError::BadRequest)?;
    quality::validate_checklist_type(&input.inspection_type).map_err(AppError::BadRequest)?;
    let aql = resolve_aql(input.aql_critical, input.aql_major, input.aql_minor)?;

    OrderRepo::find_by_id(&state.pool, auth.workspace_id, input.order_id)
        .await?
        .ok_or_else(|| not_found("Order", input.order_id))?;
    if let Some(bundle_id) = input.bundle_id {
        BundleRepo::find_by_id(&state.pool, auth.workspace_id, bundle_id)
            .await?
            .ok_or_else(|| not_found("Bundle", bundle_id))?;
    }

    let plan = sample_plan(i64::from(input.lot_size));
    let limits = SeverityLimits::new(plan.sample_size, aql.critical, aql.major, aql.minor);
    let new = NewInspection {
        sample_size: plan.sample_size,
        aql_critical: aql.critical,
        aql_major: aql.major,
        aql_minor: aql.minor,
        acceptance_number: limits.major.0,
        rejection_number: limits.major.1,
    };

    let inspection =
        InspectionRepo::create(&state.pool, auth.workspace_id, &input, &new, auth.user_id).await?;

    tracing::info!(
        inspection_id = inspection.id,
        order_id = inspection.order_id,
        sample_size = inspection.sample_size,
        "Inspection created"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "inspection",
            resource_id: inspection.id,
            event_type: "inspection.created",
        },
        serde_json::json!({
            "order_id": inspection.order_id,
            "lot_size": inspection.lot_size,
            "sample_size": inspection.sample_size,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: inspection })))
}

/// GET /api/v1/quality/inspections
pub async fn list_inspections(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<InspectionQuery>,
) -> AppResult<Json<DataResponse<Vec<Inspection>>>> {
    let inspections = InspectionRepo::list(
        &state.pool,
        auth.workspace_id,
        params.status.as_deref(),
        params.result.as_deref(),
        params.order_id,
        clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: inspections }))
}

/// GET /api/v1/quality/inspections/{id}
pub async fn get_inspection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InspectionDetail>>> {
    let inspection = load_inspection(&state, auth.workspace_id, id).await?;
    let defects = InspectionRepo::defects(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: InspectionDetail { inspection, defects },
    }))
}

/// POST /api/v1/quality/inspections/{id}/start
pub async fn start_inspection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Inspection>>> {
    let inspection = load_inspection(&state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&inspection.status, INSPECTION_IN_PROGRESS)
        .map_err(AppError::BadRequest)?;

    let started = InspectionRepo::start(&state.pool, id)
        .await?
        .ok_or_else(|| status_changed("Inspection", id, &inspection.status))?;

    tracing::info!(inspection_id = id, "Inspection started");
    Ok(Json(DataResponse { data: started }))
}

/// POST /api/v1/quality/inspections/{id}/defects
pub async fn record_defect(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateDefect>,
) -> AppResult<(StatusCode, Json<DataResponse<Defect>>)> {
    input.validate()?;
    let inspection = load_inspection(&state, auth.workspace_id, id).await?;
    validate_can_record_defect(&inspection.status).map_err(AppError::BadRequest)?;

    let code = DefectCodeRepo::find_by_id(&state.pool, auth.workspace_id, input.defect_code_id)
        .await?
        .ok_or_else(|| not_found("DefectCode", input.defect_code_id))?;

    let defect = InspectionRepo::record_defect(&state.pool, id, &code.severity, &input)
        .await?
        .ok_or_else(|| status_changed("Inspection", id, &inspection.status))?;

    tracing::info!(
        inspection_id = id,
        code = %code.code,
        severity = %code.severity,
        quantity = defect.quantity,
        "Defect recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: defect })))
}

/// POST /api/v1/quality/inspections/{id}/complete
///
/// Rejected lots with critical defects open a corrective CAPA task in the
/// same transaction.
pub async fn complete_inspection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<CompleteInspection>>,
) -> AppResult<Json<DataResponse<InspectionCompletion>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let inspection = load_inspection(&state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&inspection.status, INSPECTION_COMPLETED)
        .map_err(AppError::BadRequest)?;

    let limits = SeverityLimits::new(
        inspection.sample_size,
        inspection.aql_critical,
        inspection.aql_major,
        inspection.aql_minor,
    );
    let evaluation = evaluate(
        &limits,
        inspection.critical_found,
        inspection.major_found,
        inspection.minor_found,
    );

    let now = Utc::now();
    let follow_up = (evaluation.result == RESULT_REJECT && inspection.critical_found > 0).then(|| {
        CreateCapa {
            title: format!("Critical defects in inspection #{}", inspection.id),
            description: Some(format!(
                "Lot of {} rejected with {} critical, {} major and {} minor defects",
                inspection.lot_size,
                inspection.critical_found,
                inspection.major_found,
                inspection.minor_found
            )),
            capa_type: "CORRECTIVE".to_string(),
            priority: Some(PRIORITY_CRITICAL.to_string()),
            source: Some(SOURCE_QC_INSPECTION.to_string()),
            root_cause: None,
            corrective_action: None,
            preventive_action: None,
            assigned_to: None,
            due_date: Some((now + Duration::days(AUTO_CAPA_DUE_DAYS)).date_naive()),
            inspection_id: Some(inspection.id),
            order_id: Some(inspection.order_id),
        }
    });

    let (completed, capa) = InspectionRepo::complete(
        &state.pool,
        auth.workspace_id,
        &inspection,
        evaluation.result,
        input.notes.as_deref(),
        follow_up.as_ref().map(|c| (now.year(), c)),
        auth.user_id,
    )
    .await?
    .ok_or_else(|| status_changed("Inspection", id, &inspection.status))?;

    tracing::info!(inspection_id = id, result = evaluation.result, capa = capa.is_some(), "Inspection completed");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "inspection",
            resource_id: id,
            event_type: "inspection.completed",
        },
        serde_json::json!({
            "result": evaluation.result,
            "critical_found": completed.critical_found,
            "major_found": completed.major_found,
            "minor_found": completed.minor_found,
        }),
    )
    .await;

    if let Some(task) = &capa {
        tracing::warn!(inspection_id = id, capa_number = %task.capa_number, "CAPA opened from rejected inspection");
        activity::record(
            &state,
            &auth,
            Activity {
                action: ACTION_CREATE,
                resource: "capa",
                resource_id: task.id,
                event_type: "capa.created",
            },
            serde_json::json!({ "capa_number": task.capa_number, "source": task.source }),
        )
        .await;
    }

    Ok(Json(DataResponse {
        data: InspectionCompletion {
            inspection: completed,
            evaluation,
            capa,
        },
    }))
}

// ---------------------------------------------------------------------------
// AQL calculators
// ---------------------------------------------------------------------------

/// POST /api/v1/quality/aql/calculate-sample-size
pub async fn calculate_sample_size(
    _auth: AuthUser,
    Json(input): Json<SampleSizeRequest>,
) -> AppResult<Json<DataResponse<SampleSizeResponse>>> {
    input.validate()?;
    let aql = resolve_aql(input.aql_critical, input.aql_major, input.aql_minor)?;
    let plan = sample_plan(input.lot_size);
    let limits = SeverityLimits::new(plan.sample_size, aql.critical, aql.major, aql.minor);
    Ok(Json(DataResponse {
        data: SampleSizeResponse { plan, limits },
    }))
}

/// POST /api/v1/quality/aql/evaluate-result
pub async fn evaluate_result(
    _auth: AuthUser,
    Json(input): Json<EvaluateRequest>,
) -> AppResult<Json<DataResponse<Evaluation>>> {
    input.validate()?;
    let aql = resolve_aql(input.aql_critical, input.aql_major, input.aql_minor)?;
    let limits = SeverityLimits::new(input.sample_size, aql.critical, aql.major, aql.minor);
    Ok(Json(DataResponse {
        data: evaluate(&limits, input.critical_found, input.major_found, input.minor_found),
    }))
}
