//! Services module
//!
//! Este módulo contiene la lógica de negocio: decisión de renovación,
//! construcción del formulario, login, notificaciones y el orquestador
//! que los encadena por usuario.

pub mod apply_builder;
pub mod auth_service;
pub mod decision_service;
pub mod notification_service;
pub mod renewal_service;
pub mod status_report;

pub use apply_builder::ApplyRequestBuilder;
pub use auth_service::AuthService;
pub use decision_service::{needs_application, Decision};
pub use notification_service::{NotificationService, Notifier, NotifyTarget};
pub use renewal_service::{run_batch, BatchSummary, RenewalOptions, RenewalOutcome, RenewalReport, RenewalService};
pub use status_report::StatusSummary;
