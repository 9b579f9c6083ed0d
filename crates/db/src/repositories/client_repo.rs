//! Repositories for the `clients` and `brands` tables.

use ashley_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::{
    Brand, Client, ClientListItem, CreateBrand, CreateClient, UpdateClient,
};

const COLUMNS: &str = "id, workspace_id, name, company, contact_person, email, phone, address, \
                       tax_id, payment_terms, credit_limit, is_active, created_at, updated_at";

const PREFIXED_COLUMNS: &str = "c.id, c.workspace_id, c.name, c.company, c.contact_person, \
                                c.email, c.phone, c.address, c.tax_id, c.payment_terms, \
                                c.credit_limit, c.is_active, c.created_at, c.updated_at";

/// Shared `WHERE` for list and count. `$1` workspace, `$2` search, `$3` is_active.
const LIST_FILTER: &str = "c.workspace_id = $1
    AND ($2::TEXT IS NULL
         OR c.name ILIKE '%' || $2 || '%'
         OR c.email ILIKE '%' || $2 || '%'
         OR c.company ILIKE '%' || $2 || '%')
    AND ($3::BOOLEAN IS NULL OR c.is_active = $3)";

pub struct ClientRepo;

impl ClientRepo {
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreateClient,
    ) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients
                (workspace_id, name, company, contact_person, email, phone, address,
                 tax_id, payment_terms, credit_limit)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.company)
            .bind(&input.contact_person)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.tax_id)
            .bind(input.payment_terms)
            .bind(input.credit_limit)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    /// Page of clients with brand and order counts, newest first.
    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        search: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClientListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {PREFIXED_COLUMNS},
                    (SELECT COUNT(*) FROM brands b WHERE b.client_id = c.id) AS brand_count,
                    (SELECT COUNT(*) FROM orders o WHERE o.client_id = c.id) AS order_count
             FROM clients c
             WHERE {LIST_FILTER}
             ORDER BY c.created_at DESC, c.id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, ClientListItem>(&query)
            .bind(workspace_id)
            .bind(search)
            .bind(is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        workspace_id: DbId,
        search: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM clients c WHERE {LIST_FILTER}");
        let (total,): (i64,) = sqlx::query_as(&query)
            .bind(workspace_id)
            .bind(search)
            .bind(is_active)
            .fetch_one(pool)
            .await?;
        Ok(total)
    }

    /// Partial update. Returns `None` if the client is not in the workspace.
    pub async fn update(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
        input: &UpdateClient,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET
                name = COALESCE($3, name),
                company = COALESCE($4, company),
                contact_person = COALESCE($5, contact_person),
                email = COALESCE($6, email),
                phone = COALESCE($7, phone),
                address = COALESCE($8, address),
                tax_id = COALESCE($9, tax_id),
                payment_terms = COALESCE($10, payment_terms),
                credit_limit = COALESCE($11, credit_limit),
                is_active = COALESCE($12, is_active)
             WHERE id = $1 AND workspace_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(workspace_id)
            .bind(&input.name)
            .bind(&input.company)
            .bind(&input.contact_person)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.tax_id)
            .bind(input.payment_terms)
            .bind(input.credit_limit)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft delete by clearing `is_active`. Returns `true` if a row changed.
    pub async fn soft_delete(pool: &PgPool, workspace_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE clients SET is_active = false
             WHERE id = $1 AND workspace_id = $2 AND is_active = true",
        )
        .bind(id)
        .bind(workspace_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Orders of this client whose status blocks deletion.
    pub async fn count_orders_in_status(
        pool: &PgPool,
        client_id: DbId,
        statuses: &[&str],
    ) -> Result<i64, sqlx::Error> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        let (n,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders WHERE client_id = $1 AND status = ANY($2)",
        )
        .bind(client_id)
        .bind(&statuses)
        .fetch_one(pool)
        .await?;
        Ok(n)
    }
}

const BRAND_COLUMNS: &str =
    "id, workspace_id, client_id, name, code, logo_url, settings, is_active, created_at, updated_at";

pub struct BrandRepo;

impl BrandRepo {
    /// Insert a brand. `code` must already be normalized.
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        client_id: DbId,
        input: &CreateBrand,
        code: Option<&str>,
    ) -> Result<Brand, sqlx::Error> {
        let query = format!(
            "INSERT INTO brands (workspace_id, client_id, name, code, logo_url, settings)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{{}}'::jsonb))
             RETURNING {BRAND_COLUMNS}"
        );
        sqlx::query_as::<_, Brand>(&query)
            .bind(workspace_id)
            .bind(client_id)
            .bind(&input.name)
            .bind(code)
            .bind(&input.logo_url)
            .bind(&input.settings)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Brand>, sqlx::Error> {
        let query =
            format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Brand>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_client(pool: &PgPool, client_id: DbId) -> Result<Vec<Brand>, sqlx::Error> {
        let query =
            format!("SELECT {BRAND_COLUMNS} FROM brands WHERE client_id = $1 ORDER BY name");
        sqlx::query_as::<_, Brand>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }
}
