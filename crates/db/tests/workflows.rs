//! Repository tests for the numbered, transactional and tenant-scoped
//! operations.

mod common;

use std::collections::{BTreeMap, HashMap};

use assert_matches::assert_matches;
use ashley_core::cutting::plan_bundles;
use ashley_core::routing::generate_steps;
use ashley_db::models::cutting::{CreateCutLay, CreateFabricBatch, CreateFabricIssue, CreateLayOutput};
use ashley_db::models::finance::{CreatePayment, NewInvoice};
use ashley_db::models::inventory::{
    CreateMaterial, CreateSupplier, NewPurchaseOrder, NewPurchaseOrderItem,
};
use ashley_db::models::maintenance::{CreateAsset, CreateSchedule, NewWorkOrder};
use ashley_db::models::quality::{CreateDefect, CreateDefectCode, CreateInspection, NewInspection};
use ashley_db::repositories::{
    AssetRepo, BundleRepo, CutLayRepo, DefectCodeRepo, FabricRepo, InspectionRepo, InvoiceRepo,
    IssueOutcome, MaterialRepo, OrderRepo, PaymentOutcome, PaymentRepo, PurchaseOrderRepo,
    RoutingStepRepo, ScheduleDeleteOutcome, ScheduleRepo, SupplierRepo, WorkOrderRepo,
};
use chrono::{Datelike, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_numbers_are_sequential_per_workspace(pool: PgPool) {
    let f = common::fixture(&pool, "seq").await;
    let year = Utc::now().year();
    assert_eq!(f.order.order_number, format!("ACM-{year}-000001"));
    assert_eq!(f.order.status, "draft");
    assert_eq!(f.order.total_amount, 25000.0);

    let second = common::order(&pool, f.workspace.id, &f.client, &f.brand, f.user.id).await;
    assert_eq!(second.order_number, format!("ACM-{year}-000002"));

    // A different workspace starts its own sequence.
    let other = common::fixture(&pool, "other").await;
    assert_eq!(other.order.order_number, format!("ACM-{year}-000001"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_sequence_year_is_utc_regardless_of_session_zone(pool: PgPool) {
    let ws = common::workspace(&pool, "newyear").await;
    let user = common::user(&pool, ws.id, "admin@newyear.test").await;
    let (client, brand) = common::client_with_brand(&pool, ws.id, Some("ACM")).await;

    // 23:30 UTC on New Year's Eve is already the next year in Kiritimati (UTC+14).
    let late = common::order_in_year(&pool, ws.id, &client, &brand, user.id, 2025).await;
    sqlx::query("UPDATE orders SET created_at = '2025-12-31 23:30:00+00' WHERE id = $1")
        .bind(late.id)
        .execute(&pool)
        .await
        .unwrap();

    let shifted_opts = (*pool.connect_options())
        .clone()
        .options([("timezone", "Pacific/Kiritimati")]);
    let shifted = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(shifted_opts)
        .await
        .unwrap();

    let first = common::order_in_year(&shifted, ws.id, &client, &brand, user.id, 2026).await;
    assert_eq!(first.order_number, "ACM-2026-000001");
    assert_eq!(late.order_number, "ACM-2025-000001");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_lookup_is_workspace_scoped(pool: PgPool) {
    let a = common::fixture(&pool, "tenant-a").await;
    let b = common::workspace(&pool, "tenant-b").await;

    assert!(OrderRepo::find_by_id(&pool, a.workspace.id, a.order.id).await.unwrap().is_some());
    assert!(OrderRepo::find_by_id(&pool, b.id, a.order.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn routing_is_generated_once(pool: PgPool) {
    let f = common::fixture(&pool, "routing").await;
    let methods = OrderRepo::printing_methods(&pool, f.order.id).await.unwrap();
    let steps = generate_steps(methods.iter().map(String::as_str));

    let created = RoutingStepRepo::create_for_order(&pool, f.order.id, &steps)
        .await
        .unwrap()
        .expect("first generation creates steps");
    assert_eq!(created.len(), 6);
    assert_eq!(created[2].name, "Silkscreen Printing");
    assert!(created.iter().all(|s| s.status == "pending"));

    let again = RoutingStepRepo::create_for_order(&pool, f.order.id, &steps).await.unwrap();
    assert!(again.is_none());
}

// ---------------------------------------------------------------------------
// Cutting
// ---------------------------------------------------------------------------

fn batch(qty: f64) -> CreateFabricBatch {
    CreateFabricBatch {
        lot_no: "LOT-1".to_string(),
        fabric_type: "Cotton jersey".to_string(),
        color: Some("Black".to_string()),
        gsm: Some(180),
        width_cm: Some(150.0),
        uom: "KG".to_string(),
        qty_on_hand: qty,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fabric_issue_decrements_and_refuses_overdraw(pool: PgPool) {
    let f = common::fixture(&pool, "fabric").await;
    let b = FabricRepo::create_batch(&pool, f.workspace.id, &batch(50.0)).await.unwrap();

    let issue = |qty: f64, uom: &str| CreateFabricIssue {
        batch_id: b.id,
        order_id: f.order.id,
        qty,
        uom: uom.to_string(),
    };

    let outcome = FabricRepo::issue(&pool, f.workspace.id, &issue(20.0, "KG"), f.user.id)
        .await
        .unwrap();
    assert_matches!(outcome, IssueOutcome::Issued(i) if i.qty_issued == 20.0);

    let outcome = FabricRepo::issue(&pool, f.workspace.id, &issue(40.0, "KG"), f.user.id)
        .await
        .unwrap();
    assert_matches!(outcome, IssueOutcome::Insufficient { on_hand } if on_hand == 30.0);

    let outcome = FabricRepo::issue(&pool, f.workspace.id, &issue(1.0, "M"), f.user.id)
        .await
        .unwrap();
    assert_matches!(outcome, IssueOutcome::UomMismatch { .. });

    let batches = FabricRepo::list_batches(&pool, f.workspace.id).await.unwrap();
    assert_eq!(batches[0].qty_on_hand, 30.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bundles_from_lay_are_numbered_and_created_once(pool: PgPool) {
    let f = common::fixture(&pool, "bundles").await;
    let lay_input = CreateCutLay {
        order_id: f.order.id,
        marker_name: None,
        marker_width_cm: None,
        lay_length_m: 6.0,
        plies: 20,
        gross_used: 18.5,
        offcuts: 0.5,
        defects: 0.0,
        uom: "KG".to_string(),
        outputs: vec![
            CreateLayOutput { size_code: "M".to_string(), qty: 25 },
            CreateLayOutput { size_code: "L".to_string(), qty: 10 },
        ],
    };
    let (lay, outputs) = CutLayRepo::create(&pool, f.workspace.id, &lay_input, f.user.id)
        .await
        .unwrap();
    assert_eq!(outputs.len(), 2);

    let sizes = BTreeMap::from([("M".to_string(), 10)]);
    let pairs: Vec<(String, i32)> = outputs.iter().map(|o| (o.size_code.clone(), o.qty)).collect();
    let plan = plan_bundles(&pairs, &sizes);

    let bundles = BundleRepo::create_for_lay(
        &pool,
        f.workspace.id,
        f.order.id,
        &f.order.order_number,
        lay.id,
        &plan,
    )
    .await
    .unwrap()
    .expect("bundles created");
    let qtys: Vec<i32> = bundles.iter().map(|b| b.qty).collect();
    assert_eq!(qtys, vec![10, 10, 5]);
    assert_eq!(bundles[2].bundle_no, 3);
    assert_eq!(
        bundles[0].qr_code,
        format!("ash://bundle/{}/0001", f.order.order_number)
    );

    let again = BundleRepo::create_for_lay(
        &pool,
        f.workspace.id,
        f.order.id,
        &f.order.order_number,
        lay.id,
        &plan,
    )
    .await
    .unwrap();
    assert!(again.is_none());

    let totals = CutLayRepo::totals_for_order(&pool, f.order.id).await.unwrap();
    assert_eq!(totals.total_pieces_cut, 35);
    assert_eq!(totals.total_bundles, 3);
}

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn defects_increment_severity_counter(pool: PgPool) {
    let f = common::fixture(&pool, "qc").await;
    let code = DefectCodeRepo::create(
        &pool,
        f.workspace.id,
        &CreateDefectCode {
            code: "SEW-01".to_string(),
            name: "Skipped stitch".to_string(),
            category: "SEWING".to_string(),
            severity: "MAJOR".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    let inspection = InspectionRepo::create(
        &pool,
        f.workspace.id,
        &CreateInspection {
            order_id: f.order.id,
            bundle_id: None,
            checklist_id: None,
            inspection_type: "FINAL".to_string(),
            lot_size: 100,
            aql_critical: None,
            aql_major: None,
            aql_minor: None,
            notes: None,
        },
        &NewInspection {
            sample_size: 20,
            aql_critical: 0.0,
            aql_major: 2.5,
            aql_minor: 4.0,
            acceptance_number: 0,
            rejection_number: 1,
        },
        f.user.id,
    )
    .await
    .unwrap();
    let defect = CreateDefect {
        defect_code_id: code.id,
        quantity: 3,
        location: None,
        photo_url: None,
        notes: None,
    };
    // Pending inspections take no defects.
    let early = InspectionRepo::record_defect(&pool, inspection.id, &code.severity, &defect)
        .await
        .unwrap();
    assert!(early.is_none());

    assert!(InspectionRepo::start(&pool, inspection.id).await.unwrap().is_some());
    assert!(InspectionRepo::start(&pool, inspection.id).await.unwrap().is_none());

    let recorded = InspectionRepo::record_defect(&pool, inspection.id, &code.severity, &defect)
        .await
        .unwrap();
    assert!(recorded.is_some());

    let reloaded = InspectionRepo::find_by_id(&pool, f.workspace.id, inspection.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.major_found, 3);
    assert_eq!(reloaded.critical_found, 0);
    assert_eq!(InspectionRepo::defects(&pool, inspection.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inspection_completes_once_from_current_counts(pool: PgPool) {
    let f = common::fixture(&pool, "qcdone").await;
    let code = DefectCodeRepo::create(
        &pool,
        f.workspace.id,
        &CreateDefectCode {
            code: "PRT-02".to_string(),
            name: "Misregistration".to_string(),
            category: "PRINTING".to_string(),
            severity: "MINOR".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    let inspection = InspectionRepo::create(
        &pool,
        f.workspace.id,
        &CreateInspection {
            order_id: f.order.id,
            bundle_id: None,
            checklist_id: None,
            inspection_type: "FINAL".to_string(),
            lot_size: 100,
            aql_critical: None,
            aql_major: None,
            aql_minor: None,
            notes: None,
        },
        &NewInspection {
            sample_size: 20,
            aql_critical: 0.0,
            aql_major: 2.5,
            aql_minor: 4.0,
            acceptance_number: 1,
            rejection_number: 2,
        },
        f.user.id,
    )
    .await
    .unwrap();
    let snapshot = InspectionRepo::start(&pool, inspection.id).await.unwrap().unwrap();

    // A defect lands after the result was evaluated: the stale completion is refused.
    let defect = CreateDefect {
        defect_code_id: code.id,
        quantity: 1,
        location: None,
        photo_url: None,
        notes: None,
    };
    InspectionRepo::record_defect(&pool, inspection.id, &code.severity, &defect)
        .await
        .unwrap()
        .unwrap();
    let stale = InspectionRepo::complete(&pool, f.workspace.id, &snapshot, "ACCEPT", None, None, f.user.id)
        .await
        .unwrap();
    assert!(stale.is_none());

    let current = InspectionRepo::find_by_id(&pool, f.workspace.id, inspection.id)
        .await
        .unwrap()
        .unwrap();
    let (done, capa) =
        InspectionRepo::complete(&pool, f.workspace.id, &current, "ACCEPT", None, None, f.user.id)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(done.status, "COMPLETED");
    assert!(capa.is_none());

    let again =
        InspectionRepo::complete(&pool, f.workspace.id, &current, "ACCEPT", None, None, f.user.id)
            .await
            .unwrap();
    assert!(again.is_none());
}

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn payments_move_invoice_to_partial_then_paid(pool: PgPool) {
    let f = common::fixture(&pool, "finance").await;
    let today = Utc::now().date_naive();
    let invoice = InvoiceRepo::create(
        &pool,
        &NewInvoice {
            workspace_id: f.workspace.id,
            order_id: f.order.id,
            client_id: f.client.id,
            issue_date: today,
            due_date: today + Duration::days(30),
            subtotal: 1000.0,
            tax_rate: 0.12,
            tax_amount: 120.0,
            total_amount: 1120.0,
            notes: None,
            created_by: f.user.id,
            line_items: vec![],
        },
    )
    .await
    .unwrap();
    assert_eq!(invoice.invoice_number, "INV-000001");
    assert_eq!(invoice.status, "pending");

    let pay = |amount: f64| CreatePayment {
        invoice_id: invoice.id,
        amount,
        method: "cash".to_string(),
        reference: None,
    };

    let first = PaymentRepo::record(&pool, f.workspace.id, &pay(500.0), f.user.id)
        .await
        .unwrap();
    assert_matches!(first, PaymentOutcome::Recorded { invoice, .. } if invoice.status == "partial");

    let over = PaymentRepo::record(&pool, f.workspace.id, &pay(1000.0), f.user.id)
        .await
        .unwrap();
    assert_matches!(over, PaymentOutcome::Rejected(_));

    let rest = PaymentRepo::record(&pool, f.workspace.id, &pay(620.0), f.user.id)
        .await
        .unwrap();
    assert_matches!(
        rest,
        PaymentOutcome::Recorded { invoice, .. } if invoice.status == "paid" && invoice.paid_at.is_some()
    );

    assert!(InvoiceRepo::exists_for_order(&pool, f.order.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_scheduled_work_order_advances_schedule(pool: PgPool) {
    let f = common::fixture(&pool, "maint").await;
    let asset = AssetRepo::create(
        &pool,
        f.workspace.id,
        &CreateAsset {
            asset_number: "SEW-001".to_string(),
            name: "Juki lockstitch".to_string(),
            asset_type: "sewing_machine".to_string(),
            location: None,
            status: None,
            purchase_date: None,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(asset.status, "ACTIVE");

    let today = Utc::now().date_naive();
    let schedule = ScheduleRepo::create(
        &pool,
        f.workspace.id,
        &CreateSchedule {
            asset_id: asset.id,
            name: "Oil and clean".to_string(),
            description: None,
            maintenance_type: "PREVENTIVE".to_string(),
            frequency_type: "WEEKLY".to_string(),
            frequency_value: Some(2),
            priority: None,
            estimated_duration: None,
            assigned_to: None,
            next_due_date: None,
        },
        2,
        "MEDIUM",
        today,
    )
    .await
    .unwrap();

    let wo = WorkOrderRepo::create(
        &pool,
        &NewWorkOrder {
            workspace_id: f.workspace.id,
            asset_id: asset.id,
            schedule_id: Some(schedule.id),
            title: "Oil and clean".to_string(),
            description: None,
            priority: "MEDIUM".to_string(),
            assigned_to: None,
            scheduled_date: None,
            created_by: f.user.id,
        },
        today.year(),
    )
    .await
    .unwrap();
    assert_eq!(wo.wo_number, format!("WO-{}-0001", today.year()));

    // An open work order blocks deleting its schedule.
    let blocked = ScheduleRepo::delete(&pool, f.workspace.id, schedule.id).await.unwrap();
    assert_eq!(blocked, ScheduleDeleteOutcome::Blocked(1));

    let (done, advanced) = WorkOrderRepo::complete(&pool, wo.id, &wo.status, Some("Done"), today)
        .await
        .unwrap()
        .expect("open work order completes");
    assert_eq!(done.status, "COMPLETED");
    let advanced = advanced.expect("schedule advanced");
    assert_eq!(advanced.last_completed_date, Some(today));
    assert_eq!(advanced.next_due_date, today + Duration::days(14));

    // A second completion from the stale status neither matches nor advances the schedule again.
    let again = WorkOrderRepo::complete(&pool, wo.id, &wo.status, None, today).await.unwrap();
    assert!(again.is_none());
    let schedule = ScheduleRepo::find_by_id(&pool, f.workspace.id, schedule.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(schedule.next_due_date, today + Duration::days(14));

    let deleted = ScheduleRepo::delete(&pool, f.workspace.id, schedule.id).await.unwrap();
    assert_eq!(deleted, ScheduleDeleteOutcome::Deleted);
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

async fn thread_material(pool: &PgPool, workspace_id: i64, supplier_id: i64) -> ashley_db::models::inventory::Material {
    MaterialRepo::create(
        pool,
        workspace_id,
        &CreateMaterial {
            sku: "THR-BLK".to_string(),
            name: "Black poly thread".to_string(),
            category: "THREAD".to_string(),
            unit_of_measure: "PIECES".to_string(),
            current_stock: 12.0,
            reorder_point: 10.0,
            reorder_qty: None,
            max_stock_level: None,
            unit_cost: 1.5,
            supplier_id: Some(supplier_id),
            location: None,
            barcode: None,
            auto_reorder: true,
        },
    )
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stock_movements_refuse_overdraw_and_reorder_once(pool: PgPool) {
    let f = common::fixture(&pool, "stock").await;
    let supplier = SupplierRepo::create(
        &pool,
        f.workspace.id,
        &CreateSupplier {
            name: "Spool House".to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            payment_terms: None,
            lead_time_days: Some(3),
            rating: None,
        },
    )
    .await
    .unwrap();
    let m = thread_material(&pool, f.workspace.id, supplier.id).await;

    let (after, movement) =
        MaterialRepo::record_movement(&pool, f.workspace.id, m.id, "USAGE", -8.0, None, f.user.id)
            .await
            .unwrap()
            .expect("stock covers usage");
    assert_eq!(after.current_stock, 4.0);
    assert_eq!(movement.balance_after, 4.0);

    let refused =
        MaterialRepo::record_movement(&pool, f.workspace.id, m.id, "USAGE", -5.0, None, f.user.id)
            .await
            .unwrap();
    assert!(refused.is_none());

    let today = Utc::now().date_naive();
    let (po, items) = PurchaseOrderRepo::auto_reorder(&pool, f.workspace.id, m.id, today, today.year())
        .await
        .unwrap()
        .expect("low stock drafts a reorder");
    assert!(po.is_auto);
    assert_eq!(po.status, "DRAFT");
    assert_eq!(po.expected_delivery, Some(today + Duration::days(3)));
    assert_eq!(items[0].quantity, 16.0);
    assert_eq!(po.total_amount, 24.0);

    // The open draft covers the material.
    let again = PurchaseOrderRepo::auto_reorder(&pool, f.workspace.id, m.id, today, today.year())
        .await
        .unwrap();
    assert!(again.is_none());

    let other = common::workspace(&pool, "stock-other").await;
    let foreign =
        MaterialRepo::record_movement(&pool, other.id, m.id, "PURCHASE", 5.0, None, f.user.id)
            .await
            .unwrap();
    assert!(foreign.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_order_receipt_restocks_once(pool: PgPool) {
    let f = common::fixture(&pool, "receive").await;
    let supplier = SupplierRepo::create(
        &pool,
        f.workspace.id,
        &CreateSupplier {
            name: "Spool House".to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            payment_terms: None,
            lead_time_days: None,
            rating: Some(4.5),
        },
    )
    .await
    .unwrap();
    assert_eq!(supplier.lead_time_days, 7);
    let m = thread_material(&pool, f.workspace.id, supplier.id).await;

    let year = Utc::now().year();
    let new = NewPurchaseOrder {
        workspace_id: f.workspace.id,
        supplier_id: supplier.id,
        expected_delivery: None,
        notes: None,
        is_auto: false,
        created_by: Some(f.user.id),
        items: vec![NewPurchaseOrderItem {
            material_id: m.id,
            quantity: 30.0,
            unit_price: 1.5,
            total_price: 45.0,
        }],
    };
    let (po, items) = PurchaseOrderRepo::create(&pool, &new, year).await.unwrap();
    assert_eq!(po.po_number, format!("PO-{year}-0001"));
    let (second, _) = PurchaseOrderRepo::create(&pool, &new, year).await.unwrap();
    assert_eq!(second.po_number, format!("PO-{year}-0002"));

    // Receiving needs an approved order.
    let today = Utc::now().date_naive();
    let early = PurchaseOrderRepo::receive(&pool, po.id, &HashMap::new(), today, f.user.id)
        .await
        .unwrap();
    assert!(early.is_none());

    let submitted = PurchaseOrderRepo::set_status(&pool, po.id, "DRAFT", "SUBMITTED", f.user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(submitted.approved_by.is_none());
    let approved = PurchaseOrderRepo::set_status(&pool, po.id, "SUBMITTED", "APPROVED", f.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approved.approved_by, Some(f.user.id));
    assert!(approved.approved_at.is_some());

    let short = HashMap::from([(items[0].id, 28.0)]);
    let (received, restocked) = PurchaseOrderRepo::receive(&pool, po.id, &short, today, f.user.id)
        .await
        .unwrap()
        .expect("approved order receives");
    assert_eq!(received.status, "RECEIVED");
    assert_eq!(received.actual_delivery, Some(today));
    assert_eq!(restocked[0].current_stock, 40.0);
    assert!(restocked[0].last_restocked.is_some());

    let twice = PurchaseOrderRepo::receive(&pool, po.id, &short, today, f.user.id)
        .await
        .unwrap();
    assert!(twice.is_none());

    let lines = PurchaseOrderRepo::items(&pool, po.id).await.unwrap();
    assert_eq!(lines[0].received_qty, Some(28.0));
    let movements = MaterialRepo::movements(&pool, m.id, 10).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, "PURCHASE");
    assert_eq!(movements[0].purchase_order_id, Some(po.id));
    assert_eq!(movements[0].balance_after, 40.0);
}
