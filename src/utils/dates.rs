//! Utilidades de fechas
//!
//! Las fechas del API upstream llegan como strings `YYYY-MM-DD`.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Días de validez por defecto cuando el registro no trae `yxqz`
pub const DEFAULT_VALIDITY_DAYS: i64 = 6;

/// Parsear una fecha `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Diferencia inclusiva entre dos fechas: `(b - a) + 1`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days() + 1
}

/// Igual que [`days_between`] pero sobre strings; devuelve 0 si alguna no se puede parsear
pub fn days_between_dates(from: &str, to: &str) -> i64 {
    match (parse_date(from), parse_date(to)) {
        (Some(a), Some(b)) => days_between(a, b),
        _ => {
            log::warn!("⚠️ No se pudo calcular la diferencia entre '{}' y '{}'", from, to);
            0
        }
    }
}

/// Fecha `days` días después de `value`, o `None` si `value` no es una fecha válida
pub fn future_date(value: &str, days: i64) -> Option<String> {
    parse_date(value).map(|date| format_date(date + Duration::days(days)))
}

/// Hora local de Pekín (UTC+8, sin horario de verano)
pub fn beijing_now() -> NaiveDateTime {
    Utc::now().naive_utc() + Duration::hours(8)
}

/// Fecha de hoy en Pekín
pub fn beijing_today() -> NaiveDate {
    beijing_now().date()
}
