//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, fechas, URLs,
//! cifrado de credenciales y validación.

pub mod crypto;
pub mod dates;
pub mod errors;
pub mod url;
pub mod validation;

pub use errors::{AppError, AppResult};
