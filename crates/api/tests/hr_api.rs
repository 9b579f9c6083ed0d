//! Employees, attendance and payroll over HTTP.

mod common;

use axum::http::{header, StatusCode};
use common::{
    body_text, expect_json, get_auth, post_json_auth, put_json_auth, register, user_with_role,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn payroll_from_attendance_and_export(pool: PgPool) {
    let app = common::build_test_app(pool);
    let admin = register(&app, "payroll").await;
    let staff = user_with_role(&app, &admin, "clerk@payroll.test", "staff").await;

    let employee = expect_json(
        post_json_auth(
            &app,
            "/api/v1/hr/employees",
            &admin.token,
            json!({
                "first_name": "Lia",
                "last_name": "Cruz",
                "position": "Sewer",
                "department": "Sewing",
                "salary_type": "DAILY",
                "base_salary": 600.0,
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let employee_id = employee["data"]["id"].as_i64().unwrap();

    // A long day with two hours of overtime, then a day with no punches.
    for (date, time_in, time_out) in [
        ("2026-03-02", Some("08:00:00"), Some("18:00:00")),
        ("2026-03-03", None, None),
    ] {
        expect_json(
            post_json_auth(
                &app,
                "/api/v1/hr/attendance",
                &admin.token,
                json!({
                    "employee_id": employee_id,
                    "date": date,
                    "status": "PRESENT",
                    "time_in": time_in,
                    "time_out": time_out,
                }),
            )
            .await,
            StatusCode::OK,
        )
        .await;
    }

    let response = post_json_auth(
        &app,
        "/api/v1/hr/attendance",
        &admin.token,
        json!({
            "employee_id": employee_id,
            "date": "2026-03-04",
            "status": "PRESENT",
            "time_in": "17:00:00",
            "time_out": "08:00:00",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let period = expect_json(
        post_json_auth(
            &app,
            "/api/v1/hr/payroll",
            &admin.token,
            json!({ "period_start": "2026-03-01", "period_end": "2026-03-15", "cutoff_type": "1-15" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(period["data"]["status"], "DRAFT");
    assert_eq!(period["data"]["employee_count"], 1);
    assert_eq!(period["data"]["total_gross"], 1387.5);
    let payroll_id = period["data"]["id"].as_i64().unwrap();

    let detail = expect_json(
        get_auth(&app, &format!("/api/v1/hr/payroll/{payroll_id}"), &admin.token).await,
        StatusCode::OK,
    )
    .await;
    let item = &detail["data"]["items"][0];
    assert_eq!(item["days_worked"], 2.0);
    assert_eq!(item["overtime_hours"], 2.0);
    assert_eq!(item["overtime_pay"], 187.5);
    assert_eq!(item["employee_name"], "Lia Cruz");

    // Approval needs a manager.
    let uri = format!("/api/v1/hr/payroll/{payroll_id}");
    let response = put_json_auth(&app, &uri, &staff, json!({ "status": "APPROVED" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let approved = expect_json(
        put_json_auth(&app, &uri, &admin.token, json!({ "status": "APPROVED", "approval_notes": "ok" })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(approved["data"]["status"], "APPROVED");
    assert_eq!(approved["data"]["approved_by"], admin.user_id);

    let response = put_json_auth(&app, &uri, &admin.token, json!({ "status": "DRAFT" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get_auth(&app, &format!("{uri}/export"), &admin.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"payroll_2026-03-01_2026-03-15.csv\""
    );
    let csv = body_text(response).await;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Employee Name,Position,Department,Regular Hours,Overtime Hours,Piece Count,Gross Pay,Deductions,Net Pay")
    );
    assert!(lines.next().unwrap().starts_with("Lia Cruz,Sewer,Sewing,16.00,2.00,0,1387.50,"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn employee_validation(pool: PgPool) {
    let app = common::build_test_app(pool);
    let admin = register(&app, "employees").await;

    let response = post_json_auth(
        &app,
        "/api/v1/hr/employees",
        &admin.token,
        json!({
            "first_name": "A",
            "last_name": "B",
            "position": "Cutter",
            "department": "Cutting",
            "salary_type": "HOURLY",
            "base_salary": 100.0,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        &app,
        "/api/v1/hr/payroll",
        &admin.token,
        json!({ "period_start": "2026-03-15", "period_end": "2026-03-01", "cutoff_type": "1-15" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let list = expect_json(get_auth(&app, "/api/v1/hr/employees", &admin.token).await, StatusCode::OK).await;
    assert_eq!(list["pagination"]["total"], 0);
}
