//! Estado de la cuenta (`applyRecordController/stateList`)
//!
//! El primer vehículo de `bzclxx` es el canónico para todas las consultas a
//! nivel de cuenta.

use serde::{Deserialize, Serialize};

use super::lenient;
use super::record::PermitRecord;
use crate::utils::errors::{data_absent_error, AppResult};

/// Contadores de cupo del vehículo canónico
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaInfo {
    pub remaining_times: u32,
    pub remaining_days: u32,
    pub used_times: i64,
    pub total_days: i64,
    pub available_days: i64,
}

/// Estado de un vehículo
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleStatus {
    #[serde(rename = "vId", deserialize_with = "lenient::string")]
    pub v_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hpzl: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hphm: String,
    /// Veces tramitadas
    #[serde(deserialize_with = "lenient::int")]
    pub ybcs: i64,
    /// Días tramitados
    #[serde(deserialize_with = "lenient::int")]
    pub bzts: i64,
    /// Días disponibles
    #[serde(deserialize_with = "lenient::int")]
    pub kjts: i64,
    /// Veces restantes (string numérico)
    #[serde(deserialize_with = "lenient::string")]
    pub sycs: String,
    /// Días restantes (string numérico)
    #[serde(deserialize_with = "lenient::string")]
    pub syts: String,
    /// Permiso de clase 1 disponible
    #[serde(deserialize_with = "lenient::boolean")]
    pub ylzsfkb: bool,
    /// Permiso de clase 2 disponible
    #[serde(deserialize_with = "lenient::boolean")]
    pub elzsfkb: bool,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub bnbzyy: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub qyzt: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub cllx: String,
    #[serde(deserialize_with = "lenient::list")]
    pub bzxx: Vec<PermitRecord>,
    #[serde(deserialize_with = "lenient::list")]
    pub ecbzxx: Vec<PermitRecord>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub sfyecbzxx: bool,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub ecztbz: Option<bool>,
}

impl VehicleStatus {
    /// Registro más reciente; la lista secundaria tiene prioridad sobre la primaria
    pub fn latest_record(&self) -> Option<&PermitRecord> {
        self.ecbzxx.first().or_else(|| self.bzxx.first())
    }

    pub fn can_apply(&self) -> bool {
        self.ylzsfkb || self.elzsfkb
    }

    pub fn remaining_quota(&self) -> QuotaInfo {
        QuotaInfo {
            remaining_times: lenient::digits_or_zero(&self.sycs),
            remaining_days: lenient::digits_or_zero(&self.syts),
            used_times: self.ybcs,
            total_days: self.bzts,
            available_days: self.kjts,
        }
    }
}

/// Estado de la cuenta
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountStatus {
    #[serde(deserialize_with = "lenient::string")]
    pub sfzmhm: String,
    #[serde(deserialize_with = "lenient::string")]
    pub ylzqyms: String,
    #[serde(deserialize_with = "lenient::string")]
    pub ylzmc: String,
    #[serde(deserialize_with = "lenient::string")]
    pub elzqyms: String,
    #[serde(deserialize_with = "lenient::string")]
    pub elzmc: String,
    #[serde(deserialize_with = "lenient::list")]
    pub bzclxx: Vec<VehicleStatus>,
}

impl AccountStatus {
    /// Parsear el campo `data` de la respuesta
    ///
    /// Los campos ausentes toman su valor por defecto, pero un `data` que no es
    /// un objeto significa estado desconocido y nunca un estado vacío.
    pub fn from_api_data(data: serde_json::Value) -> AppResult<Self> {
        if !data.is_object() {
            log::error!("❌ Estado de cuenta sin datos: {}", data);
            return Err(data_absent_error("account state"));
        }
        Ok(serde_json::from_value(data)?)
    }

    pub fn first_vehicle(&self) -> Option<&VehicleStatus> {
        self.bzclxx.first()
    }

    pub fn vehicle_by_id(&self, v_id: &str) -> Option<&VehicleStatus> {
        self.bzclxx.iter().find(|vehicle| vehicle.v_id == v_id)
    }

    pub fn latest_record_for_first_vehicle(&self) -> Option<&PermitRecord> {
        self.first_vehicle().and_then(VehicleStatus::latest_record)
    }

    pub fn can_apply_first_vehicle(&self) -> bool {
        self.first_vehicle().map(VehicleStatus::can_apply).unwrap_or(false)
    }

    /// Cupo del vehículo canónico, `None` si la cuenta no tiene vehículos
    pub fn quota_for_first_vehicle(&self) -> Option<QuotaInfo> {
        self.first_vehicle().map(VehicleStatus::remaining_quota)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_state() {
        let state = AccountStatus::from_api_data(json!({
            "sfzmhm": "110101199001011234",
            "ylzmc": "进京证(六环内)",
            "bzclxx": [{
                "vId": "v1",
                "hphm": "冀A12345",
                "ybcs": 3,
                "bzts": 21,
                "kjts": "9",
                "sycs": "9",
                "syts": "N/A",
                "ylzsfkb": true,
                "elzsfkb": false,
                "bzxx": [{ "applyId": "a-primary", "blztmc": "审核通过(生效中)" }],
                "ecbzxx": []
            }]
        }))
        .unwrap();

        assert_eq!(state.bzclxx.len(), 1);
        assert!(state.can_apply_first_vehicle());
        assert_eq!(state.latest_record_for_first_vehicle().unwrap().apply_id, "a-primary");

        let quota = state.quota_for_first_vehicle().unwrap();
        assert_eq!(
            quota,
            QuotaInfo {
                remaining_times: 9,
                remaining_days: 0,
                used_times: 3,
                total_days: 21,
                available_days: 9,
            }
        );
    }

    #[test]
    fn test_secondary_list_takes_precedence() {
        let state = AccountStatus::from_api_data(json!({
            "bzclxx": [{
                "bzxx": [{ "applyId": "primary" }],
                "ecbzxx": [{ "applyId": "secondary-1" }, { "applyId": "secondary-2" }]
            }]
        }))
        .unwrap();

        assert_eq!(state.latest_record_for_first_vehicle().unwrap().apply_id, "secondary-1");
    }

    #[test]
    fn test_malformed_quota_coerces_to_zero() {
        let vehicle = VehicleStatus {
            sycs: "N/A".into(),
            syts: "".into(),
            ..VehicleStatus::default()
        };
        let quota = vehicle.remaining_quota();
        assert_eq!(quota.remaining_times, 0);
        assert_eq!(quota.remaining_days, 0);
    }

    #[test]
    fn test_empty_object_and_null_fields() {
        let state = AccountStatus::from_api_data(json!({})).unwrap();
        assert!(state.bzclxx.is_empty());
        assert!(state.latest_record_for_first_vehicle().is_none());
        assert!(!state.can_apply_first_vehicle());
        assert!(state.quota_for_first_vehicle().is_none());

        let state = AccountStatus::from_api_data(json!({ "bzclxx": null, "elzmc": null })).unwrap();
        assert!(state.bzclxx.is_empty());
        assert_eq!(state.elzmc, "");
    }

    #[test]
    fn test_missing_payload_is_data_absent() {
        for data in [serde_json::Value::Null, json!([]), json!("ok")] {
            let err = AccountStatus::from_api_data(data).unwrap_err();
            assert_eq!(err.error_code(), "DATA_ABSENT");
        }
    }

    #[test]
    fn test_vehicle_without_records_and_lookup_by_id() {
        let state = AccountStatus::from_api_data(json!({
            "bzclxx": [{ "vId": "v1", "elzsfkb": "true" }, { "vId": "v2" }]
        }))
        .unwrap();

        assert!(state.latest_record_for_first_vehicle().is_none());
        assert!(state.can_apply_first_vehicle());
        assert_eq!(state.vehicle_by_id("v2").unwrap().v_id, "v2");
        assert!(state.vehicle_by_id("v3").is_none());
    }
}
