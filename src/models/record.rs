//! Registro de solicitud de permiso (办证信息)
//!
//! Cada vehículo trae dos listas de registros: la primaria (`bzxx`) y la de
//! segunda tramitación (`ecbzxx`). Ver [`super::state::VehicleStatus`].

use chrono::NaiveDate;
use serde::Deserialize;

use super::lenient;
use crate::utils::dates::{days_between, future_date, parse_date, DEFAULT_VALIDITY_DAYS};

pub const LABEL_APPROVED_ACTIVE: &str = "审核通过(生效中)";
pub const LABEL_UNDER_REVIEW: &str = "审核中";
pub const LABEL_APPROVED_PENDING: &str = "审核通过(待生效)";

/// Estado de tramitación derivado de `blztmc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermitStatus {
    ApprovedActive,
    UnderReview,
    ApprovedPending,
    /// Rechazado, caducado o cualquier etiqueta desconocida
    Other(String),
}

impl PermitStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            LABEL_APPROVED_ACTIVE => PermitStatus::ApprovedActive,
            LABEL_UNDER_REVIEW => PermitStatus::UnderReview,
            LABEL_APPROVED_PENDING => PermitStatus::ApprovedPending,
            other => PermitStatus::Other(other.to_string()),
        }
    }

    /// Estados en los que el permiso sigue en curso y no hay que volver a solicitar
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, PermitStatus::Other(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PermitRecord {
    #[serde(rename = "vId", deserialize_with = "lenient::string")]
    pub v_id: String,
    #[serde(rename = "applyId", deserialize_with = "lenient::string")]
    pub apply_id: String,
    #[serde(deserialize_with = "lenient::int")]
    pub blzt: i64,
    /// Etiqueta de estado, p.ej. "审核通过(生效中)"
    #[serde(deserialize_with = "lenient::string")]
    pub blztmc: String,
    #[serde(deserialize_with = "lenient::string")]
    pub sxrqmc: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub sxrzmc: Option<String>,
    /// Inicio de validez
    #[serde(deserialize_with = "lenient::string")]
    pub yxqs: String,
    /// Fin de validez; ausente = inicio + 6 días
    #[serde(deserialize_with = "lenient::opt_string")]
    pub yxqz: Option<String>,
    #[serde(deserialize_with = "lenient::opt_int")]
    pub sxsyts: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub jjzzl: String,
    #[serde(deserialize_with = "lenient::string")]
    pub jjzzlmc: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub jjzh: Option<String>,
    /// Fecha y hora de la solicitud
    #[serde(deserialize_with = "lenient::string")]
    pub sqsj: String,
    #[serde(deserialize_with = "lenient::string")]
    pub jsrxm: String,
    #[serde(deserialize_with = "lenient::string")]
    pub jszh: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub sfzmhm: Option<String>,
    /// Motivo de rechazo
    #[serde(deserialize_with = "lenient::opt_string")]
    pub shsbyy: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub shsbyyms: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub hphm: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hpzl: String,
    #[serde(deserialize_with = "lenient::string")]
    pub vid: String,
}

impl PermitRecord {
    pub fn status(&self) -> PermitStatus {
        PermitStatus::from_label(&self.blztmc)
    }

    pub fn status_description(&self) -> &str {
        &self.blztmc
    }

    /// Días restantes (inclusivos) desde `today` hasta `yxqz`; 0 si no hay fecha de fin válida
    pub fn remaining_days(&self, today: NaiveDate) -> i64 {
        self.yxqz
            .as_deref()
            .and_then(parse_date)
            .map(|end| days_between(today, end))
            .unwrap_or(0)
    }

    /// Contador `sxsyts` que calcula el propio API
    pub fn remaining_days_counter(&self) -> i64 {
        self.sxsyts.unwrap_or(0)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.yxqz
            .as_deref()
            .and_then(parse_date)
            .map(|end| end < today)
            .unwrap_or(false)
    }

    /// Fin de validez a mostrar: `yxqz` o inicio + 6 días
    pub fn effective_end(&self) -> String {
        match &self.yxqz {
            Some(end) => end.clone(),
            None => future_date(&self.yxqs, DEFAULT_VALIDITY_DAYS).unwrap_or_default(),
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.shsbyyms.as_deref().or(self.shsbyy.as_deref())
    }
}
