//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts, validated with `validator`
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod audit;
pub mod capa;
pub mod client;
pub mod cutting;
pub mod design;
pub mod event;
pub mod finance;
pub mod hr;
pub mod inventory;
pub mod maintenance;
pub mod order;
pub mod payroll;
pub mod printing;
pub mod production;
pub mod quality;
pub mod session;
pub mod sewing;
pub mod user;
pub mod workspace;
