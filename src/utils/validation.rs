//! Utilidades de validación
//!
//! Validadores `custom` para la configuración de usuarios.

use validator::ValidationError;

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar un móvil chino: 11 dígitos empezando por 1
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 11 && value.starts_with('1') && value.chars().all(|c| c.is_ascii_digit());
    if !valid {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"1XXXXXXXXXX".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar el selector de tipo de permiso
pub fn validate_permit_type(value: &str) -> Result<(), ValidationError> {
    const ACCEPTED: [&str; 6] = [
        "within-six-ring-road",
        "outside-six-ring-road",
        "六环内",
        "六环外",
        "01",
        "02",
    ];
    if !ACCEPTED.contains(&value.trim()) {
        let mut error = ValidationError::new("permit_type");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}
