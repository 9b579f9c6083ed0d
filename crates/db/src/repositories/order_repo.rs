//! Repositories for orders, their line items and routing steps.

use ashley_core::order::format_order_number;
use ashley_core::routing::StepTemplate;
use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::order::{
    NewOrder, Order, OrderLineItem, OrderListItem, RoutingStep, UpdateOrder, UpdateRoutingStep,
};

const COLUMNS: &str = "id, workspace_id, client_id, brand_id, order_number, status, total_amount, \
                       currency, channel, payment_terms, deposit_percentage, tax_inclusive, \
                       production_route, delivery_date, notes, created_by, created_at, updated_at";

const PREFIXED_COLUMNS: &str = "o.id, o.workspace_id, o.client_id, o.brand_id, o.order_number, \
                                o.status, o.total_amount, o.currency, o.channel, o.payment_terms, \
                                o.deposit_percentage, o.tax_inclusive, o.production_route, \
                                o.delivery_date, o.notes, o.created_by, o.created_at, o.updated_at";

const LINE_COLUMNS: &str = "id, order_id, description, product_type, printing_method, quantity, \
                            unit_price, total_price, size_breakdown, created_at";

/// `$1` workspace, `$2` status, `$3` client, `$4` order number search.
const LIST_FILTER: &str = "o.workspace_id = $1
    AND ($2::TEXT IS NULL OR o.status = $2)
    AND ($3::BIGINT IS NULL OR o.client_id = $3)
    AND ($4::TEXT IS NULL OR o.order_number ILIKE '%' || $4 || '%')";

pub struct OrderRepo;

impl OrderRepo {
    /// Create an order with its line items in one transaction.
    ///
    /// The workspace row is locked while the next sequence number for the
    /// year is taken, so concurrent creates cannot collide.
    pub async fn create(pool: &PgPool, input: &NewOrder) -> Result<Order, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
            .bind(input.workspace_id)
            .execute(&mut *tx)
            .await?;

        let (existing,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders
             WHERE workspace_id = $1 AND EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT = $2",
        )
        .bind(input.workspace_id)
        .bind(input.year)
        .fetch_one(&mut *tx)
        .await?;
        let order_number = format_order_number(input.brand_code.as_deref(), input.year, existing + 1);

        let query = format!(
            "INSERT INTO orders
                (workspace_id, client_id, brand_id, order_number, total_amount, currency,
                 channel, payment_terms, deposit_percentage, tax_inclusive, production_route,
                 delivery_date, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(input.workspace_id)
            .bind(input.client_id)
            .bind(input.brand_id)
            .bind(&order_number)
            .bind(input.total_amount)
            .bind(&input.currency)
            .bind(&input.channel)
            .bind(&input.payment_terms)
            .bind(input.deposit_percentage)
            .bind(input.tax_inclusive)
            .bind(&input.production_route)
            .bind(input.delivery_date)
            .bind(&input.notes)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        for (line, total) in &input.line_items {
            sqlx::query(
                "INSERT INTO order_line_items
                    (order_id, description, product_type, printing_method, quantity,
                     unit_price, total_price, size_breakdown)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(order.id)
            .bind(&line.description)
            .bind(&line.product_type)
            .bind(&line.printing_method)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(total)
            .bind(&line.size_breakdown)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        client_id: Option<DbId>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {PREFIXED_COLUMNS},
                    c.name AS client_name,
                    b.name AS brand_name,
                    (SELECT COUNT(*) FROM order_line_items li WHERE li.order_id = o.id)
                        AS line_item_count
             FROM orders o
             JOIN clients c ON c.id = o.client_id
             JOIN brands b ON b.id = o.brand_id
             WHERE {LIST_FILTER}
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, OrderListItem>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(client_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        client_id: Option<DbId>,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM orders o WHERE {LIST_FILTER}");
        let (total,): (i64,) = sqlx::query_as(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(client_id)
            .bind(search)
            .fetch_one(pool)
            .await?;
        Ok(total)
    }

    /// Most recent orders of a client.
    pub async fn recent_for_client(
        pool: &PgPool,
        client_id: DbId,
        limit: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders WHERE client_id = $1
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(client_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn line_items(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderLineItem>, sqlx::Error> {
        let query =
            format!("SELECT {LINE_COLUMNS} FROM order_line_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderLineItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Distinct printing methods across an order's line items, in first-seen order.
    pub async fn printing_methods(pool: &PgPool, order_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT printing_method FROM order_line_items
             WHERE order_id = $1
             GROUP BY printing_method
             ORDER BY MIN(id)",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(m,)| m).collect())
    }

    /// Partial update of an order still in `expected_status`. The new
    /// status, if given, must already be validated against it.
    pub async fn update(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
        expected_status: &str,
        input: &UpdateOrder,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET
                status = COALESCE($3, status),
                channel = COALESCE($4, channel),
                payment_terms = COALESCE($5, payment_terms),
                deposit_percentage = COALESCE($6, deposit_percentage),
                tax_inclusive = COALESCE($7, tax_inclusive),
                production_route = COALESCE($8, production_route),
                delivery_date = COALESCE($9, delivery_date),
                notes = COALESCE($10, notes)
             WHERE id = $1 AND workspace_id = $2 AND status = $11
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(workspace_id)
            .bind(&input.status)
            .bind(&input.channel)
            .bind(&input.payment_terms)
            .bind(input.deposit_percentage)
            .bind(input.tax_inclusive)
            .bind(&input.production_route)
            .bind(input.delivery_date)
            .bind(&input.notes)
            .bind(expected_status)
            .fetch_optional(pool)
            .await
    }
}

const STEP_COLUMNS: &str = "id, order_id, step_number, name, department, estimated_hours, \
                            requires_qc, status, assigned_employee_id, notes, started_at, \
                            completed_at, created_at, updated_at";

pub struct RoutingStepRepo;

impl RoutingStepRepo {
    /// Insert generated steps. Returns `None` when the order already has steps.
    pub async fn create_for_order(
        pool: &PgPool,
        order_id: DbId,
        steps: &[StepTemplate],
    ) -> Result<Option<Vec<RoutingStep>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        let (existing,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM routing_steps WHERE order_id = $1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
        if existing > 0 {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO routing_steps
                (order_id, step_number, name, department, estimated_hours, requires_qc)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {STEP_COLUMNS}"
        );
        let mut created = Vec::with_capacity(steps.len());
        for step in steps {
            let row = sqlx::query_as::<_, RoutingStep>(&query)
                .bind(order_id)
                .bind(step.step_number)
                .bind(&step.name)
                .bind(step.department)
                .bind(step.estimated_hours)
                .bind(step.requires_qc)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(Some(created))
    }

    pub async fn list_by_order(pool: &PgPool, order_id: DbId) -> Result<Vec<RoutingStep>, sqlx::Error> {
        let query = format!(
            "SELECT {STEP_COLUMNS} FROM routing_steps WHERE order_id = $1 ORDER BY step_number"
        );
        sqlx::query_as::<_, RoutingStep>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Find a step whose order belongs to the workspace.
    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<RoutingStep>, sqlx::Error> {
        let query = format!(
            "SELECT {STEP_COLUMNS} FROM routing_steps
             WHERE id = $1
               AND order_id IN (SELECT id FROM orders WHERE workspace_id = $2)"
        );
        sqlx::query_as::<_, RoutingStep>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply an update. `started_at`/`completed_at` are stamped on entry to
    /// `in_progress`/`completed` respectively.
    ///
    /// Only applies while the step is still in `expected_status`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        expected_status: &str,
        input: &UpdateRoutingStep,
    ) -> Result<Option<RoutingStep>, sqlx::Error> {
        let query = format!(
            "UPDATE routing_steps SET
                status = COALESCE($2, status),
                assigned_employee_id = COALESCE($3, assigned_employee_id),
                notes = COALESCE($4, notes),
                started_at = CASE WHEN $2 = 'in_progress' AND started_at IS NULL
                                  THEN NOW() ELSE started_at END,
                completed_at = CASE WHEN $2 = 'completed' THEN NOW() ELSE completed_at END
             WHERE id = $1 AND status = $5
             RETURNING {STEP_COLUMNS}"
        );
        sqlx::query_as::<_, RoutingStep>(&query)
            .bind(id)
            .bind(&input.status)
            .bind(input.assigned_employee_id)
            .bind(&input.notes)
            .bind(expected_status)
            .fetch_optional(pool)
            .await
    }

    /// Mark a linked step completed when its run finishes.
    pub async fn complete(pool: &PgPool, workspace_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE routing_steps SET status = 'completed', completed_at = NOW()
             WHERE id = $1 AND status NOT IN ('completed', 'skipped')
               AND order_id IN (SELECT id FROM orders WHERE workspace_id = $2)",
        )
        .bind(id)
        .bind(workspace_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
