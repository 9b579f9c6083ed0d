//! Domain rules for the Ashley manufacturing ERP.
//!
//! Everything here is pure: constants, validators, state machines and the
//! arithmetic behind production, payroll and finance. Persistence lives in
//! `ashley-db` and the HTTP surface in `ashley-api`.

pub mod aql;
pub mod audit;
pub mod capa;
pub mod client;
pub mod cutting;
pub mod design;
pub mod error;
pub mod finance;
pub mod hashing;
pub mod hr;
pub mod inventory;
pub mod maintenance;
pub mod money;
pub mod order;
pub mod pagination;
pub mod payroll;
pub mod printing;
pub mod production;
pub mod quality;
pub mod reporting;
pub mod roles;
pub mod routing;
pub mod sewing;
pub mod types;
pub mod validation;
