//! Motor de decisión de renovación
//!
//! Función pura del estado de la cuenta y de la fecha de hoy: devuelve la
//! fecha para la que hay que presentar una solicitud, o `None` si no hace falta.

use chrono::{Duration, NaiveDate};

use crate::models::record::PermitStatus;
use crate::models::state::AccountStatus;

/// Decisión sobre el registro vigente
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No hay registros: primera solicitud
    FirstApplication(NaiveDate),
    /// Permiso activo a punto de caducar: se solicita el día siguiente
    RenewTomorrow(NaiveDate),
    /// Rechazado, caducado o estado desconocido
    Reapply(NaiveDate),
    NotNeeded,
}

impl Decision {
    pub fn target_date(&self) -> Option<NaiveDate> {
        match self {
            Decision::FirstApplication(date) | Decision::RenewTomorrow(date) | Decision::Reapply(date) => {
                Some(*date)
            }
            Decision::NotNeeded => None,
        }
    }
}

/// Regla base sobre (existe registro, estado, días restantes)
pub fn decide(status: Option<&PermitStatus>, remaining_days: i64, today: NaiveDate) -> Decision {
    let status = match status {
        Some(status) => status,
        None => return Decision::FirstApplication(today),
    };

    match status {
        PermitStatus::ApprovedActive if remaining_days <= 1 => Decision::RenewTomorrow(today + Duration::days(1)),
        PermitStatus::ApprovedActive | PermitStatus::UnderReview | PermitStatus::ApprovedPending => {
            Decision::NotNeeded
        }
        PermitStatus::Other(_) => Decision::Reapply(today),
    }
}

/// Decisión sobre el vehículo canónico de la cuenta
pub fn evaluate(account: &AccountStatus, today: NaiveDate) -> Decision {
    match account.latest_record_for_first_vehicle() {
        None => decide(None, 0, today),
        Some(record) => decide(Some(&record.status()), record.remaining_days(today), today),
    }
}

/// Fecha de la próxima solicitud, o `None` si no hace falta solicitar
pub fn needs_application(account: &AccountStatus, today: NaiveDate) -> Option<NaiveDate> {
    evaluate(account, today).target_date()
}
