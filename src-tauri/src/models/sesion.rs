use serde::{Deserialize, Serialize};

use super::ObjetivoEvidencia;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EstadoSesion {
    #[serde(rename = "PENDIENTE")]
    Pendiente,
    #[serde(rename = "COMPLETADA")]
    Completada,
}

impl EstadoSesion {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoSesion::Pendiente => "PENDIENTE",
            EstadoSesion::Completada => "COMPLETADA",
        }
    }

    pub fn desde_str(s: &str) -> Option<Self> {
        match s {
            "PENDIENTE" => Some(EstadoSesion::Pendiente),
            "COMPLETADA" => Some(EstadoSesion::Completada),
            _ => None,
        }
    }
}

/// Sesión de subida efímera: la crea el escritorio, la completa el
/// teléfono que escaneó el QR. El estado solo transiciona
/// PENDIENTE → COMPLETADA, una vez.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SesionSubida {
    pub id: i64,
    pub token: String,
    pub estado: EstadoSesion,
    pub objetivo: ObjetivoEvidencia,
    pub ruta_evidencia: Option<String>,
}

/// Respuesta al iniciar un hand-off: la sesión, la URL que codifica el QR
/// y el QR ya renderizado como PNG en base64.
#[derive(Debug, Serialize, Deserialize)]
pub struct InicioSesionSubida {
    pub sesion: SesionSubida,
    pub url: String,
    pub qr_png_base64: String,
}
