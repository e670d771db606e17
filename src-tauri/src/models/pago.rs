use serde::{Deserialize, Serialize};

/// Identidad de un pago: local mientras no se haya persistido,
/// rowid de SQLite una vez guardado con su remisión.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "tipo", content = "valor")]
pub enum PagoId {
    Local(String),
    Persistido(i64),
}

impl PagoId {
    pub fn es_local(&self) -> bool {
        matches!(self, PagoId::Local(_))
    }
}

/// Abono registrado contra una remisión. Pertenece en exclusiva a su
/// remisión; las evidencias son rutas opacas dentro del almacén local.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Pago {
    pub id: PagoId,
    pub monto: String,
    pub numero_recibo: String,
    pub reporte: String,
    pub metodo_pago: String,
    pub fecha_creacion: String,
    pub evidencias: Vec<String>,
}

/// Campos de texto del formulario compartido de alta/edición de pagos.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CamposPago {
    pub monto: String,
    pub numero_recibo: String,
    pub reporte: String,
    pub metodo_pago: String,
}

/// Estado completo del formulario, incluyendo evidencias ya adjuntadas
/// al pago en captura.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FormularioPago {
    pub monto: String,
    pub numero_recibo: String,
    pub reporte: String,
    pub metodo_pago: String,
    pub evidencias: Vec<String>,
}

impl FormularioPago {
    pub fn desde_pago(pago: &Pago) -> Self {
        FormularioPago {
            monto: pago.monto.clone(),
            numero_recibo: pago.numero_recibo.clone(),
            reporte: pago.reporte.clone(),
            metodo_pago: pago.metodo_pago.clone(),
            evidencias: pago.evidencias.clone(),
        }
    }
}

/// Destino de una evidencia: el pago en captura en el formulario,
/// o un pago ya presente en la libreta (local o persistido).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "tipo", content = "valor")]
pub enum ObjetivoEvidencia {
    Captura,
    Pago(PagoId),
}
