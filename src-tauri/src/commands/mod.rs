pub mod config;
pub mod evidencias;
pub mod pagos;
pub mod remisiones;
pub mod respaldo;
pub mod sesiones;
pub mod usuarios;
