//! Repository for payroll runs and items.

use ashley_core::payroll::{STATUS_APPROVED, STATUS_PAID};
use ashley_core::money::round2;
use ashley_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::hr::AttendanceLog;
use crate::models::payroll::{
    CreatePayroll, NewPayrollItem, PayrollItemWithEmployee, PayrollPeriod, PieceTotals,
};

const COLUMNS: &str = "id, workspace_id, period_start, period_end, cutoff_type, status, total_gross, \
                       total_deductions, total_net, employee_count, approval_notes, approved_by, \
                       approved_at, created_by, created_at, updated_at";

pub struct PayrollRepo;

impl PayrollRepo {
    /// Insert a run and its items, with run totals summed from the items.
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreatePayroll,
        items: &[NewPayrollItem],
        created_by: DbId,
    ) -> Result<PayrollPeriod, sqlx::Error> {
        let total_gross = round2(items.iter().map(|i| i.calc.gross_pay).sum());
        let total_deductions = round2(items.iter().map(|i| i.calc.deductions.total).sum());
        let total_net = round2(items.iter().map(|i| i.calc.net_pay).sum());

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO payroll_periods
                (workspace_id, period_start, period_end, cutoff_type, total_gross,
                 total_deductions, total_net, employee_count, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let period = sqlx::query_as::<_, PayrollPeriod>(&query)
            .bind(workspace_id)
            .bind(input.period_start)
            .bind(input.period_end)
            .bind(&input.cutoff_type)
            .bind(total_gross)
            .bind(total_deductions)
            .bind(total_net)
            .bind(items.len() as i32)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        for item in items {
            let c = &item.calc;
            sqlx::query(
                "INSERT INTO payroll_items
                    (payroll_id, employee_id, days_worked, regular_hours, overtime_hours,
                     piece_count, base_pay, piece_pay, overtime_pay, gross_pay, sss, philhealth,
                     pagibig, withholding_tax, total_deductions, net_pay)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
            )
            .bind(period.id)
            .bind(item.employee_id)
            .bind(c.days_worked)
            .bind(c.regular_hours)
            .bind(c.overtime_hours)
            .bind(c.piece_count)
            .bind(c.base_pay)
            .bind(c.piece_pay)
            .bind(c.overtime_pay)
            .bind(c.gross_pay)
            .bind(c.deductions.sss)
            .bind(c.deductions.philhealth)
            .bind(c.deductions.pagibig)
            .bind(c.deductions.withholding_tax)
            .bind(c.deductions.total)
            .bind(c.net_pay)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(period)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<PayrollPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payroll_periods WHERE id = $1 AND workspace_id = $2"
        );
        sqlx::query_as::<_, PayrollPeriod>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        year: Option<i32>,
    ) -> Result<Vec<PayrollPeriod>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payroll_periods
             WHERE workspace_id = $1
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::INT IS NULL OR EXTRACT(YEAR FROM period_start)::INT = $3)
             ORDER BY period_start DESC, id DESC"
        );
        sqlx::query_as::<_, PayrollPeriod>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(year)
            .fetch_all(pool)
            .await
    }

    pub async fn items(
        pool: &PgPool,
        payroll_id: DbId,
    ) -> Result<Vec<PayrollItemWithEmployee>, sqlx::Error> {
        sqlx::query_as::<_, PayrollItemWithEmployee>(
            "SELECT pi.id, pi.payroll_id, pi.employee_id, pi.days_worked, pi.regular_hours,
                    pi.overtime_hours, pi.piece_count, pi.base_pay, pi.piece_pay, pi.overtime_pay,
                    pi.gross_pay, pi.sss, pi.philhealth, pi.pagibig, pi.withholding_tax,
                    pi.total_deductions, pi.net_pay, pi.created_at,
                    e.first_name || ' ' || e.last_name AS employee_name,
                    e.employee_number, e.position, e.department
             FROM payroll_items pi
             JOIN employees e ON e.id = pi.employee_id
             WHERE pi.payroll_id = $1
             ORDER BY e.last_name, e.first_name",
        )
        .bind(payroll_id)
        .fetch_all(pool)
        .await
    }

    /// Move a period from `from` to `status`. Approval stamps the approver;
    /// moving to `PAID` keeps the original approval stamp.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        from: &str,
        status: &str,
        approval_notes: Option<&str>,
        actor: DbId,
    ) -> Result<Option<PayrollPeriod>, sqlx::Error> {
        let query = format!(
            "UPDATE payroll_periods SET
                status = $2,
                approval_notes = COALESCE($3, approval_notes),
                approved_by = CASE WHEN $2 IN ($5, $6) THEN COALESCE(approved_by, $4) ELSE approved_by END,
                approved_at = CASE WHEN $2 IN ($5, $6) THEN COALESCE(approved_at, NOW()) ELSE approved_at END
             WHERE id = $1 AND status = $7
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PayrollPeriod>(&query)
            .bind(id)
            .bind(status)
            .bind(approval_notes)
            .bind(actor)
            .bind(STATUS_APPROVED)
            .bind(STATUS_PAID)
            .bind(from)
            .fetch_optional(pool)
            .await
    }

    /// Piece counts and earnings from done sewing runs ended in the period.
    pub async fn piece_totals(
        pool: &PgPool,
        workspace_id: DbId,
        start: Date,
        end: Date,
    ) -> Result<Vec<PieceTotals>, sqlx::Error> {
        sqlx::query_as::<_, PieceTotals>(
            "SELECT operator_id AS employee_id,
                    COALESCE(SUM(qty_good), 0)::BIGINT AS piece_count,
                    COALESCE(SUM(piece_rate_pay), 0)::FLOAT8 AS piece_earnings
             FROM sewing_runs
             WHERE workspace_id = $1 AND status = 'DONE'
               AND (ended_at AT TIME ZONE 'UTC')::DATE BETWEEN $2 AND $3
             GROUP BY operator_id",
        )
        .bind(workspace_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// All attendance in the workspace within the period.
    pub async fn attendance(
        pool: &PgPool,
        workspace_id: DbId,
        start: Date,
        end: Date,
    ) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceLog>(
            "SELECT id, workspace_id, employee_id, date, status, time_in, time_out, notes,
                    created_at, updated_at
             FROM attendance_logs
             WHERE workspace_id = $1 AND date BETWEEN $2 AND $3
             ORDER BY employee_id, date",
        )
        .bind(workspace_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }
}
