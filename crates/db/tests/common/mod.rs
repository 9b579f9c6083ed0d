//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use ashley_core::types::DbId;
use ashley_db::models::client::{Brand, Client, CreateBrand, CreateClient};
use ashley_db::models::order::{CreateLineItem, NewOrder, Order};
use ashley_db::models::user::{CreateUser, User};
use ashley_db::models::workspace::{CreateWorkspace, Workspace};
use ashley_db::repositories::{BrandRepo, ClientRepo, OrderRepo, UserRepo, WorkspaceRepo};
use chrono::{Datelike, Utc};
use sqlx::PgPool;

pub async fn workspace(pool: &PgPool, slug: &str) -> Workspace {
    WorkspaceRepo::create(
        pool,
        &CreateWorkspace {
            name: format!("Workspace {slug}"),
            slug: slug.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn user(pool: &PgPool, workspace_id: DbId, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            workspace_id,
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: "admin".to_string(),
        },
    )
    .await
    .unwrap()
}

pub fn new_client(name: &str) -> CreateClient {
    CreateClient {
        name: name.to_string(),
        company: None,
        contact_person: None,
        email: None,
        phone: None,
        address: None,
        tax_id: None,
        payment_terms: None,
        credit_limit: None,
    }
}

pub async fn client_with_brand(
    pool: &PgPool,
    workspace_id: DbId,
    brand_code: Option<&str>,
) -> (Client, Brand) {
    let client = ClientRepo::create(pool, workspace_id, &new_client("Acme Apparel"))
        .await
        .unwrap();
    let brand = BrandRepo::create(
        pool,
        workspace_id,
        client.id,
        &CreateBrand {
            name: "Acme".to_string(),
            code: brand_code.map(str::to_string),
            logo_url: None,
            settings: None,
        },
        brand_code,
    )
    .await
    .unwrap();
    (client, brand)
}

pub fn line(method: &str, quantity: i32, unit_price: f64) -> (CreateLineItem, f64) {
    (
        CreateLineItem {
            description: "Team tee".to_string(),
            product_type: "tee".to_string(),
            printing_method: method.to_string(),
            quantity,
            unit_price,
            size_breakdown: None,
        },
        f64::from(quantity) * unit_price,
    )
}

pub async fn order(
    pool: &PgPool,
    workspace_id: DbId,
    client: &Client,
    brand: &Brand,
    created_by: DbId,
) -> Order {
    order_in_year(pool, workspace_id, client, brand, created_by, Utc::now().year()).await
}

pub async fn order_in_year(
    pool: &PgPool,
    workspace_id: DbId,
    client: &Client,
    brand: &Brand,
    created_by: DbId,
    year: i32,
) -> Order {
    let lines = vec![line("silkscreen", 100, 250.0)];
    let total = lines.iter().map(|(_, t)| t).sum();
    OrderRepo::create(
        pool,
        &NewOrder {
            workspace_id,
            client_id: client.id,
            brand_id: brand.id,
            brand_code: brand.code.clone(),
            year,
            total_amount: total,
            currency: "PHP".to_string(),
            channel: None,
            payment_terms: "net_15".to_string(),
            deposit_percentage: 50,
            tax_inclusive: true,
            production_route: None,
            delivery_date: None,
            notes: None,
            created_by,
            line_items: lines,
        },
    )
    .await
    .unwrap()
}

/// Workspace, admin user, client, brand `ACM` and one order.
pub struct Fixture {
    pub workspace: Workspace,
    pub user: User,
    pub client: Client,
    pub brand: Brand,
    pub order: Order,
}

pub async fn fixture(pool: &PgPool, slug: &str) -> Fixture {
    let workspace = workspace(pool, slug).await;
    let user = user(pool, workspace.id, &format!("admin@{slug}.test")).await;
    let (client, brand) = client_with_brand(pool, workspace.id, Some("ACM")).await;
    let order = order(pool, workspace.id, &client, &brand, user.id).await;
    Fixture {
        workspace,
        user,
        client,
        brand,
        order,
    }
}
