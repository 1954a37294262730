//! Construcción del payload de solicitud
//!
//! El builder no hace I/O: combina vehículo, titular, fecha objetivo y
//! registro previo en un [`ApplicationRequest`] con los valores por defecto
//! del API.

use chrono::NaiveDate;

use crate::models::apply::*;
use crate::models::record::PermitRecord;
use crate::models::user::UserIdentity;
use crate::models::vehicle::{VehicleRecord, DEFAULT_PLATE_TYPE, DEFAULT_VEHICLE_TYPE};
use crate::utils::dates::format_date;

#[derive(Debug, Clone)]
pub struct ApplyRequestBuilder<'a> {
    vehicle: &'a VehicleRecord,
    user: &'a UserIdentity,
    target_date: NaiveDate,
    destination: String,
    longitude: String,
    latitude: String,
    permit_type: PermitType,
    previous: Option<&'a PermitRecord>,
    version: FormVersion,
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl<'a> ApplyRequestBuilder<'a> {
    pub fn new(vehicle: &'a VehicleRecord, user: &'a UserIdentity, target_date: NaiveDate) -> Self {
        Self {
            vehicle,
            user,
            target_date,
            destination: DEFAULT_DESTINATION.to_string(),
            longitude: DEFAULT_LONGITUDE.to_string(),
            latitude: DEFAULT_LATITUDE.to_string(),
            permit_type: PermitType::default(),
            previous: None,
            version: FormVersion::default(),
        }
    }

    pub fn destination(mut self, destination: &str) -> Self {
        self.destination = or_default(destination, DEFAULT_DESTINATION);
        self
    }

    pub fn coordinates(mut self, longitude: &str, latitude: &str) -> Self {
        self.longitude = or_default(longitude, DEFAULT_LONGITUDE);
        self.latitude = or_default(latitude, DEFAULT_LATITUDE);
        self
    }

    pub fn permit_type(mut self, permit_type: PermitType) -> Self {
        self.permit_type = permit_type;
        self
    }

    /// Registro vigente cuyo `applyId` se arrastra como `applyIdOld`
    pub fn previous_record(mut self, record: Option<&'a PermitRecord>) -> Self {
        self.previous = record;
        self
    }

    pub fn version(mut self, version: FormVersion) -> Self {
        self.version = version;
        self
    }

    fn apply_id_old(&self) -> String {
        self.previous.map(|r| r.apply_id.clone()).unwrap_or_default()
    }

    pub fn build(&self) -> ApplicationRequest {
        match self.version {
            FormVersion::V1 => ApplicationRequest::V1(self.build_legacy()),
            FormVersion::V2 => ApplicationRequest::V2(self.build_current()),
        }
    }

    fn build_current(&self) -> ApplyForm {
        ApplyForm {
            sfzj: 1,
            sqdzgdjd: self.longitude.clone(),
            sqdzgdwd: self.latitude.clone(),
            zjxxdzgdjd: self.longitude.clone(),
            zjxxdzgdwd: self.latitude.clone(),
            zjxxdz: self.destination.clone(),
            xxdz: self.destination.clone(),
            jjmdmc: DEFAULT_PURPOSE_NAME.to_string(),
            jjmd: DEFAULT_PURPOSE_CODE.to_string(),
            area: DEFAULT_AREA.to_string(),
            jjdq: DEFAULT_AREA_CODE_V2.to_string(),
            apply_id_old: self.apply_id_old(),
            jjrq: format_date(self.target_date),
            jsrxm: self.user.name.clone(),
            jszh: self.user.id_number.clone(),
            jjzzl: self.permit_type.code().to_string(),
            txrxx: Vec::new(),
            hphm: self.vehicle.license_number.clone(),
            hpzl: or_default(&self.vehicle.license_plate_type, DEFAULT_PLATE_TYPE),
            cllx: or_default(&self.vehicle.vehicle_type, DEFAULT_VEHICLE_TYPE),
            v_id: self.vehicle.vehicle_id_or_empty().to_string(),
        }
    }

    fn build_legacy(&self) -> LegacyApplyForm {
        LegacyApplyForm {
            sqdzgdjd: self.longitude.clone(),
            sqdzgdwd: self.latitude.clone(),
            sqdzbdjd: DEFAULT_DEST_LONGITUDE_V1.to_string(),
            sqdzbdwd: DEFAULT_DEST_LATITUDE_V1.to_string(),
            txrxx: Vec::new(),
            hpzl: or_default(&self.vehicle.license_plate_type, DEFAULT_PLATE_TYPE),
            jjdq: DEFAULT_AREA_CODE_V1.to_string(),
            jjmd: DEFAULT_PURPOSE_CODE.to_string(),
            jjzzl: self.permit_type.code().to_string(),
            jjlk: DEFAULT_ROAD_CODE_V1.to_string(),
            jjmdmc: DEFAULT_PURPOSE_NAME.to_string(),
            jjlkmc: DEFAULT_ROAD_NAME_V1.to_string(),
            apply_id_old: self.apply_id_old(),
            jjrq: format_date(self.target_date),
            v_id: self.vehicle.vehicle_id_or_empty().to_string(),
            jsrxm: self.user.name.clone(),
            jszh: self.user.id_number.clone(),
            hphm: self.vehicle.license_number.clone(),
            sfzj: 1,
            zjxxdz: self.destination.clone(),
            xxdz: self.destination.clone(),
        }
    }
}

/// Atajo para el caso habitual: formulario actual, sin registro previo
pub fn build(
    vehicle: &VehicleRecord,
    user: &UserIdentity,
    target_date: NaiveDate,
    destination: &str,
    permit_type: &str,
) -> ApplicationRequest {
    ApplyRequestBuilder::new(vehicle, user, target_date)
        .destination(destination)
        .permit_type(PermitType::from_selector(permit_type))
        .build()
}
