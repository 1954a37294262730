//! Modelo de vehículo
//!
//! Vehículo registrado en la cuenta, tal como lo devuelve
//! `vehicleController/getUserIdInfo`. Los nombres de campo del API se
//! conservan en el wire con `#[serde(rename)]`.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::lenient;

/// Tipo de placa por defecto: vehículo pequeño de nueva energía
pub const DEFAULT_PLATE_TYPE: &str = "52";
/// Tipo de vehículo por defecto: turismo
pub const DEFAULT_VEHICLE_TYPE: &str = "01";

lazy_static! {
    /// Códigos de tipo de placa (号牌种类)
    pub static ref LICENSE_PLATE_TYPE_MAP: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("01", "大型汽车");
        m.insert("02", "小型汽车");
        m.insert("03", "使馆汽车");
        m.insert("04", "领馆汽车");
        m.insert("05", "境外汽车");
        m.insert("06", "外籍汽车");
        m.insert("07", "普通摩托车");
        m.insert("15", "挂车");
        m.insert("16", "教练汽车");
        m.insert("51", "大型新能源汽车");
        m.insert("52", "小型新能源汽车");
        m
    };

    /// Códigos de tipo de vehículo (车辆类型)
    pub static ref VEHICLE_TYPE_MAP: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("01", "客车");
        m.insert("02", "货车");
        m
    };
}

fn default_vehicle_type() -> String {
    DEFAULT_VEHICLE_TYPE.to_string()
}

fn default_enable_status() -> i64 {
    1
}

/// Vehículo de la cuenta
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleRecord {
    #[serde(rename = "hpzl", default, deserialize_with = "lenient::string")]
    pub license_plate_type: String,
    #[serde(rename = "hphm", default, deserialize_with = "lenient::string")]
    pub license_number: String,
    #[serde(rename = "cllx", default = "default_vehicle_type", deserialize_with = "lenient::string")]
    pub vehicle_type: String,
    #[serde(rename = "fdjh", default, deserialize_with = "lenient::string")]
    pub engine_number: String,
    #[serde(rename = "ppxh", default, deserialize_with = "lenient::string")]
    pub brand_model: String,
    #[serde(rename = "zcsj", default, deserialize_with = "lenient::string")]
    pub registration_date: String,
    #[serde(rename = "cjsj", default, deserialize_with = "lenient::opt_string")]
    pub collection_date: Option<String>,
    #[serde(rename = "qyzt", default = "default_enable_status", deserialize_with = "lenient::int")]
    pub enable_status: i64,
    #[serde(rename = "zcqdKey", default, deserialize_with = "lenient::opt_string")]
    pub registration_channel_key: Option<String>,
    #[serde(rename = "sfzmhm", default, deserialize_with = "lenient::opt_string")]
    pub identity_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub kz3: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub kz5: Option<String>,
    /// Ausente antes del primer registro upstream
    #[serde(rename = "vId", default, deserialize_with = "lenient::opt_string")]
    pub vehicle_id: Option<String>,
}

impl Default for VehicleRecord {
    fn default() -> Self {
        Self {
            license_plate_type: DEFAULT_PLATE_TYPE.to_string(),
            license_number: String::new(),
            vehicle_type: DEFAULT_VEHICLE_TYPE.to_string(),
            engine_number: String::new(),
            brand_model: String::new(),
            registration_date: String::new(),
            collection_date: None,
            enable_status: 1,
            registration_channel_key: None,
            identity_number: None,
            kz3: String::new(),
            kz5: None,
            vehicle_id: None,
        }
    }
}

/// Payload para `relationController/add`
#[derive(Debug, Clone, Serialize)]
pub struct VehiclePayload {
    pub hphm: String,
    pub hpzl: String,
    pub hpzlmc: String,
    pub cllx: String,
    pub cllxmc: String,
    pub fdjh: String,
    pub ppxh: String,
    pub zcsj: String,
    pub kz3: String,
    pub qyzt: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cjsj: Option<String>,
    #[serde(rename = "zcqdKey", skip_serializing_if = "Option::is_none")]
    pub zcqd_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfzmhm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kz5: Option<String>,
    #[serde(rename = "vId", skip_serializing_if = "Option::is_none")]
    pub v_id: Option<String>,
}

impl VehicleRecord {
    /// Nombre legible del tipo de placa, vacío si el código no es conocido
    pub fn plate_type_name(&self) -> &'static str {
        LICENSE_PLATE_TYPE_MAP
            .get(self.license_plate_type.as_str())
            .copied()
            .unwrap_or("")
    }

    pub fn vehicle_type_name(&self) -> &'static str {
        VEHICLE_TYPE_MAP
            .get(self.vehicle_type.as_str())
            .copied()
            .unwrap_or("")
    }

    /// `vId` o vacío si el vehículo todavía no está registrado upstream
    pub fn vehicle_id_or_empty(&self) -> &str {
        self.vehicle_id.as_deref().unwrap_or("")
    }

    /// Convertir al formato que espera el API
    pub fn to_payload(&self) -> VehiclePayload {
        VehiclePayload {
            hphm: self.license_number.clone(),
            hpzl: self.license_plate_type.clone(),
            hpzlmc: self.plate_type_name().to_string(),
            cllx: self.vehicle_type.clone(),
            cllxmc: self.vehicle_type_name().to_string(),
            fdjh: self.engine_number.clone(),
            ppxh: self.brand_model.clone(),
            zcsj: self.registration_date.clone(),
            kz3: self.kz3.clone(),
            qyzt: self.enable_status,
            cjsj: self.collection_date.clone(),
            zcqd_key: self.registration_channel_key.clone(),
            sfzmhm: self.identity_number.clone(),
            kz5: self.kz5.clone(),
            v_id: self.vehicle_id.clone(),
        }
    }
}
