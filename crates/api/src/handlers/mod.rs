//! Request handlers, one module per resource.
//!
//! Handlers validate input, delegate to the repositories in `ashley_db` and
//! map failures through [`AppError`](crate::error::AppError).

pub mod admin;
pub mod audit;
pub mod auth;
pub mod capa;
pub mod clients;
pub mod cutting;
pub mod designs;
pub mod finance;
pub mod hr;
pub mod inventory;
pub mod maintenance;
pub mod orders;
pub mod payroll;
pub mod portal;
pub mod printing;
pub mod production;
pub mod quality;
pub mod sewing;
