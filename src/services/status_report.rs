//! Resumen del estado actual y texto de la notificación final

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::state::{AccountStatus, QuotaInfo};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Vista del registro vigente del vehículo canónico
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub apply_type: String,
    pub apply_date: String,
    pub remaining_days: i64,
    /// Días restantes según el contador `sxsyts` del API
    pub counted_days: i64,
    pub expired: bool,
    pub quota: Option<QuotaInfo>,
    pub can_apply: bool,
    pub rejection_reason: Option<String>,
}

impl StatusSummary {
    /// `None` si el vehículo canónico no tiene ningún registro
    pub fn from_state(account: &AccountStatus, today: NaiveDate) -> Option<Self> {
        let record = account.latest_record_for_first_vehicle()?;

        Some(Self {
            start_date: record.yxqs.clone(),
            end_date: record.effective_end(),
            status: record.status_description().to_string(),
            apply_type: record.jjzzlmc.clone(),
            apply_date: record.sqsj.clone(),
            remaining_days: record.remaining_days(today),
            counted_days: record.remaining_days_counter(),
            expired: record.is_expired(today),
            quota: account.quota_for_first_vehicle(),
            can_apply: account.can_apply_first_vehicle(),
            rejection_reason: record.rejection_reason().map(str::to_string),
        })
    }
}

/// Quita el año (`YYYY-`) de una fecha para el título
fn short_date(date: &str) -> &str {
    date.get(5..).unwrap_or("")
}

/// Título y cuerpo de la notificación de resultado
pub fn format_notification(outcome: &str, summary: &StatusSummary, now: NaiveDateTime) -> (String, String) {
    let title = format!(
        "进京证{}: {}~{}",
        outcome,
        short_date(&summary.start_date),
        short_date(&summary.end_date)
    );

    let mut lines = vec![
        outcome.to_string(),
        format!("状态: {}", summary.status),
        format!("有效期: {}至{}", summary.start_date, summary.end_date),
        format!("剩余天数: {}", summary.remaining_days),
        format!("类型: {}", summary.apply_type),
        format!("申请时间: {}", summary.apply_date),
        format!("执行时间: {}", now.format(DATETIME_FORMAT)),
    ];
    if let Some(quota) = &summary.quota {
        lines.push(format!("剩余申请次数: {}", quota.remaining_times));
    }
    if let Some(reason) = &summary.rejection_reason {
        lines.push(format!("审核意见: {}", reason));
    }

    (title, lines.join("\n"))
}
