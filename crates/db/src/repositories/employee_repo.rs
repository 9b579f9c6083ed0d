//! Repositories for employees and attendance.

use ashley_core::hr::format_employee_number;
use ashley_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::hr::{AttendanceCounts, AttendanceLog, CreateEmployee, Employee, UpdateEmployee, UpsertAttendance};

const COLUMNS: &str = "id, workspace_id, employee_number, first_name, last_name, email, position, \
                       department, salary_type, base_salary, piece_rate, hire_date, is_active, \
                       created_at, updated_at";

const ATTENDANCE_COLUMNS: &str = "id, workspace_id, employee_id, date, status, time_in, time_out, \
                                  notes, created_at, updated_at";

/// `$1` workspace, `$2` department, `$3` position, `$4` active flag, `$5` search.
const LIST_FILTER: &str = "workspace_id = $1
    AND ($2::TEXT IS NULL OR department = $2)
    AND ($3::TEXT IS NULL OR position = $3)
    AND ($4::BOOLEAN IS NULL OR is_active = $4)
    AND ($5::TEXT IS NULL
         OR first_name ILIKE '%' || $5 || '%'
         OR last_name ILIKE '%' || $5 || '%'
         OR employee_number ILIKE '%' || $5 || '%')";

pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Create an employee with the next `EMP-NNN` number for the workspace.
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateEmployee,
    ) -> Result<Employee, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO employees
                (workspace_id, employee_number, first_name, last_name, email, position,
                 department, salary_type, base_salary, piece_rate, hire_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        let employee = sqlx::query_as::<_, Employee>(&query)
            .bind(workspace_id)
            .bind(format_employee_number(existing + 1))
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.position)
            .bind(&input.department)
            .bind(&input.salary_type)
            .bind(input.base_salary)
            .bind(input.piece_rate)
            .bind(input.hire_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(employee)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        department: Option<&str>,
        position: Option<&str>,
        is_active: Option<bool>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees
             WHERE {LIST_FILTER}
             ORDER BY employee_number
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(workspace_id)
            .bind(department)
            .bind(position)
            .bind(is_active)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        workspace_id: DbId,
        department: Option<&str>,
        position: Option<&str>,
        is_active: Option<bool>,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM employees WHERE {LIST_FILTER}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(workspace_id)
            .bind(department)
            .bind(position)
            .bind(is_active)
            .bind(search)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn list_active(pool: &PgPool, workspace_id: DbId) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees
             WHERE workspace_id = $1 AND is_active
             ORDER BY employee_number"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
        input: &UpdateEmployee,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!(
            "UPDATE employees SET
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                email = COALESCE($5, email),
                position = COALESCE($6, position),
                department = COALESCE($7, department),
                salary_type = COALESCE($8, salary_type),
                base_salary = COALESCE($9, base_salary),
                piece_rate = COALESCE($10, piece_rate),
                hire_date = COALESCE($11, hire_date),
                is_active = COALESCE($12, is_active)
             WHERE id = $1 AND workspace_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(workspace_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.position)
            .bind(&input.department)
            .bind(&input.salary_type)
            .bind(input.base_salary)
            .bind(input.piece_rate)
            .bind(input.hire_date)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }
}

pub struct AttendanceRepo;

impl AttendanceRepo {
    /// Insert or replace the record for `(employee, date)`.
    pub async fn upsert(
        pool: &PgPool,
        workspace_id: DbId,
        input: &UpsertAttendance,
    ) -> Result<AttendanceLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO attendance_logs (workspace_id, employee_id, date, status, time_in, time_out, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (employee_id, date) DO UPDATE SET
                status = EXCLUDED.status,
                time_in = EXCLUDED.time_in,
                time_out = EXCLUDED.time_out,
                notes = EXCLUDED.notes
             RETURNING {ATTENDANCE_COLUMNS}"
        );
        sqlx::query_as::<_, AttendanceLog>(&query)
            .bind(workspace_id)
            .bind(input.employee_id)
            .bind(input.date)
            .bind(&input.status)
            .bind(input.time_in)
            .bind(input.time_out)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        employee_id: Option<DbId>,
        date_from: Option<Date>,
        date_to: Option<Date>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        let query = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_logs
             WHERE workspace_id = $1
               AND ($2::BIGINT IS NULL OR employee_id = $2)
               AND ($3::DATE IS NULL OR date >= $3)
               AND ($4::DATE IS NULL OR date <= $4)
             ORDER BY date DESC, employee_id
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, AttendanceLog>(&query)
            .bind(workspace_id)
            .bind(employee_id)
            .bind(date_from)
            .bind(date_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts per status from `from` onwards, optionally for one employee.
    pub async fn counts_since(
        pool: &PgPool,
        workspace_id: DbId,
        employee_id: Option<DbId>,
        from: Date,
    ) -> Result<AttendanceCounts, sqlx::Error> {
        sqlx::query_as::<_, AttendanceCounts>(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'PRESENT') AS present,
                COUNT(*) FILTER (WHERE status = 'ABSENT') AS absent,
                COUNT(*) FILTER (WHERE status = 'LATE') AS late,
                COUNT(*) FILTER (WHERE status = 'HALF_DAY') AS half_day,
                COUNT(*) AS total
             FROM attendance_logs
             WHERE workspace_id = $1
               AND ($2::BIGINT IS NULL OR employee_id = $2)
               AND date >= $3",
        )
        .bind(workspace_id)
        .bind(employee_id)
        .bind(from)
        .fetch_one(pool)
        .await
    }
}
