use crate::models::Pago;

/// Saldo pendiente de una remisión: total menos la suma de abonos,
/// con exactamente dos decimales.
///
/// Los montos que no parsean como número cuentan como 0; es el mismo
/// comportamiento permisivo del formulario, no un error. Con listas
/// largas de pagos el error acumulado de punto flotante se acepta.
pub fn calcular_saldo(total: &str, pagos: &[Pago]) -> String {
    let total: f64 = parsear_monto(total);
    let abonado: f64 = pagos.iter().map(|p| parsear_monto(&p.monto)).sum();
    format!("{:.2}", total - abonado)
}

fn parsear_monto(texto: &str) -> f64 {
    texto.trim().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PagoId;

    fn pago(monto: &str) -> Pago {
        Pago {
            id: PagoId::Local("local-test".to_string()),
            monto: monto.to_string(),
            numero_recibo: String::new(),
            reporte: String::new(),
            metodo_pago: String::new(),
            fecha_creacion: String::new(),
            evidencias: Vec::new(),
        }
    }

    #[test]
    fn test_saldo_sin_pagos() {
        assert_eq!(calcular_saldo("1500", &[]), "1500.00");
    }

    #[test]
    fn test_saldo_con_abonos() {
        let pagos = vec![pago("500"), pago("250.50")];
        assert_eq!(calcular_saldo("1500", &pagos), "749.50");
    }

    #[test]
    fn test_saldo_dos_decimales() {
        let pagos = vec![pago("0.1"), pago("0.2")];
        assert_eq!(calcular_saldo("1", &pagos), "0.70");
    }

    #[test]
    fn test_total_invalido_cuenta_como_cero() {
        let pagos = vec![pago("10")];
        assert_eq!(calcular_saldo("abc", &pagos), "-10.00");
    }

    #[test]
    fn test_monto_invalido_cuenta_como_cero() {
        let pagos = vec![pago("10"), pago("xx")];
        assert_eq!(calcular_saldo("100", &pagos), "90.00");
    }

    #[test]
    fn test_saldo_negativo() {
        let pagos = vec![pago("120")];
        assert_eq!(calcular_saldo("100", &pagos), "-20.00");
    }
}
