//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean exactamente a los
//! nombres de campo del API de permisos y del proveedor de identidad.

pub mod api;
pub mod apply;
pub mod auth;
pub mod lenient;
pub mod record;
pub mod state;
pub mod user;
pub mod vehicle;

pub use api::ApiResponse;
pub use apply::{ApplicationRequest, ApplyForm, FormVersion, LegacyApplyForm, PermitType};
pub use auth::{AttemptResult, LoginOutcome};
pub use record::{PermitRecord, PermitStatus};
pub use state::{AccountStatus, QuotaInfo, VehicleStatus};
pub use user::UserIdentity;
pub use vehicle::VehicleRecord;
