//! Formularios de solicitud de permiso
//!
//! El endpoint `insertApplyRecord` ha aceptado dos formas de payload a lo
//! largo del tiempo. Ambas se modelan como variantes de [`ApplicationRequest`]
//! y el builder elige la variante de forma explícita según [`FormVersion`].

use serde::{Deserialize, Serialize};

/// Destino por defecto dentro de Pekín
pub const DEFAULT_DESTINATION: &str = "北京动物园";
pub const DEFAULT_LONGITUDE: &str = "116.4";
pub const DEFAULT_LATITUDE: &str = "39.9";
pub const DEFAULT_DEST_LONGITUDE_V1: &str = "116.273348";
pub const DEFAULT_DEST_LATITUDE_V1: &str = "40.040219";
/// "Otros" como motivo del viaje
pub const DEFAULT_PURPOSE_CODE: &str = "06";
pub const DEFAULT_PURPOSE_NAME: &str = "其它";
pub const DEFAULT_AREA: &str = "海淀区";
pub const DEFAULT_AREA_CODE_V2: &str = "006";
pub const DEFAULT_AREA_CODE_V1: &str = "010";
pub const DEFAULT_ROAD_CODE_V1: &str = "00606";
pub const DEFAULT_ROAD_NAME_V1: &str = "其他道路";

/// Generación del endpoint de solicitud
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormVersion {
    V1,
    #[default]
    V2,
}

impl FormVersion {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Some(FormVersion::V1),
            "v2" | "2" => Some(FormVersion::V2),
            _ => None,
        }
    }
}

/// Tipo de permiso solicitado
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermitType {
    #[default]
    WithinSixthRing,
    OutsideSixthRing,
}

impl PermitType {
    /// Selector legible -> tipo; cualquier valor no reconocido como "dentro" es "fuera"
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim() {
            "within-six-ring-road" | "六环内" | "01" => PermitType::WithinSixthRing,
            _ => PermitType::OutsideSixthRing,
        }
    }

    /// Código `jjzzl` del API
    pub fn code(&self) -> &'static str {
        match self {
            PermitType::WithinSixthRing => "01",
            PermitType::OutsideSixthRing => "02",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PermitType::WithinSixthRing => "六环内",
            PermitType::OutsideSixthRing => "六环外",
        }
    }
}

/// Formulario actual (v2)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyForm {
    pub sfzj: i32,
    pub sqdzgdjd: String,
    pub sqdzgdwd: String,
    pub zjxxdzgdjd: String,
    pub zjxxdzgdwd: String,
    pub zjxxdz: String,
    pub xxdz: String,
    pub jjmdmc: String,
    pub jjmd: String,
    pub area: String,
    pub jjdq: String,
    #[serde(rename = "applyIdOld")]
    pub apply_id_old: String,
    pub jjrq: String,
    pub jsrxm: String,
    pub jszh: String,
    pub jjzzl: String,
    /// Acompañantes; el API espera la lista aunque vaya vacía
    pub txrxx: Vec<serde_json::Value>,
    pub hphm: String,
    pub hpzl: String,
    pub cllx: String,
    #[serde(rename = "vId")]
    pub v_id: String,
}

/// Formulario histórico (v1)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyApplyForm {
    pub sqdzgdjd: String,
    pub sqdzgdwd: String,
    pub sqdzbdjd: String,
    pub sqdzbdwd: String,
    /// Acompañantes; el API espera la lista aunque vaya vacía
    pub txrxx: Vec<serde_json::Value>,
    pub hpzl: String,
    pub jjdq: String,
    pub jjmd: String,
    pub jjzzl: String,
    pub jjlk: String,
    pub jjmdmc: String,
    pub jjlkmc: String,
    #[serde(rename = "applyIdOld")]
    pub apply_id_old: String,
    pub jjrq: String,
    #[serde(rename = "vId")]
    pub v_id: String,
    pub jsrxm: String,
    pub jszh: String,
    pub hphm: String,
    pub sfzj: i32,
    pub zjxxdz: String,
    pub xxdz: String,
}

/// Payload saliente de `insertApplyRecord`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApplicationRequest {
    V1(LegacyApplyForm),
    V2(ApplyForm),
}

impl ApplicationRequest {
    pub fn version(&self) -> FormVersion {
        match self {
            ApplicationRequest::V1(_) => FormVersion::V1,
            ApplicationRequest::V2(_) => FormVersion::V2,
        }
    }

    /// Fecha de entrada solicitada (`jjrq`)
    pub fn target_date(&self) -> &str {
        match self {
            ApplicationRequest::V1(form) => &form.jjrq,
            ApplicationRequest::V2(form) => &form.jjrq,
        }
    }

    pub fn previous_apply_id(&self) -> &str {
        match self {
            ApplicationRequest::V1(form) => &form.apply_id_old,
            ApplicationRequest::V2(form) => &form.apply_id_old,
        }
    }

    pub fn permit_type_code(&self) -> &str {
        match self {
            ApplicationRequest::V1(form) => &form.jjzzl,
            ApplicationRequest::V2(form) => &form.jjzzl,
        }
    }

    pub fn plate_number(&self) -> &str {
        match self {
            ApplicationRequest::V1(form) => &form.hphm,
            ApplicationRequest::V2(form) => &form.hphm,
        }
    }
}
