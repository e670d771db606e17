use serde::{Deserialize, Serialize};

use super::Pago;

/// Nota de remisión contra la que se cobran pagos parciales.
/// Los montos viajan como texto decimal; el saldo es derivado y se
/// recalcula tras cada mutación de pagos.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Remision {
    pub id: Option<i64>,
    pub numero: String,
    pub nota_venta: String,
    pub factura: String,
    pub total: String,
    pub saldo: String,
}

impl Remision {
    pub fn nueva() -> Self {
        Remision {
            id: None,
            numero: String::new(),
            nota_venta: String::new(),
            factura: String::new(),
            total: "0".to_string(),
            saldo: "0.00".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RemisionCompleta {
    pub remision: Remision,
    pub pagos: Vec<Pago>,
}

/// Hueco en la numeración de remisiones, solo para mostrar en el listado.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HuecoFolio {
    pub anterior: i64,
    pub siguiente: i64,
    pub faltantes: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListadoRemisiones {
    pub remisiones: Vec<Remision>,
    pub huecos: Vec<HuecoFolio>,
}
