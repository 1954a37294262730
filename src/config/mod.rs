//! Configuración del proyecto
//!
//! Este módulo contiene las variables de entorno y la configuración por
//! usuario (credenciales, token, destinos de notificación).

pub mod environment;
pub mod users;

pub use environment::*;
pub use users::{UserConfig, UserConfigStore};
