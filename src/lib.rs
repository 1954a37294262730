//! Renovación automática del permiso de entrada a Pekín (进京证)
//!
//! Login en el proveedor de identidad, consulta del estado en el API de
//! permisos, decisión de renovación, envío de la solicitud y notificación.

pub mod clients;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;
