//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Every lookup of a
//! tenant-owned row takes the caller's `workspace_id`, so rows from another
//! workspace come back as `None`.

pub mod audit_repo;
pub mod capa_repo;
pub mod client_repo;
pub mod cutting_repo;
pub mod design_repo;
pub mod employee_repo;
pub mod event_repo;
pub mod finance_repo;
pub mod inventory_repo;
pub mod maintenance_repo;
pub mod order_repo;
pub mod payroll_repo;
pub mod printing_repo;
pub mod production_repo;
pub mod quality_repo;
pub mod session_repo;
pub mod sewing_repo;
pub mod user_repo;
pub mod workspace_repo;

pub use audit_repo::AuditRepo;
pub use capa_repo::{CapaDimension, CapaRepo};
pub use client_repo::{BrandRepo, ClientRepo};
pub use cutting_repo::{CutLayRepo, FabricRepo, IssueOutcome};
pub use design_repo::DesignRepo;
pub use employee_repo::{AttendanceRepo, EmployeeRepo};
pub use event_repo::EventRepo;
pub use finance_repo::{InvoiceRepo, PaymentOutcome, PaymentRepo};
pub use inventory_repo::{MaterialRepo, PurchaseOrderRepo, SupplierRepo};
pub use maintenance_repo::{AssetRepo, ScheduleDeleteOutcome, ScheduleRepo, WorkOrderRepo};
pub use order_repo::{OrderRepo, RoutingStepRepo};
pub use payroll_repo::PayrollRepo;
pub use printing_repo::{MachineRepo, PrintRunRepo};
pub use production_repo::{BundleRepo, ProductionRepo};
pub use quality_repo::{ChecklistRepo, DefectCodeRepo, InspectionRepo};
pub use session_repo::SessionRepo;
pub use sewing_repo::{PieceRateRepo, SewingOperationRepo, SewingRunRepo};
pub use user_repo::UserRepo;
pub use workspace_repo::WorkspaceRepo;
