use crate::models::{HuecoFolio, Remision};

/// Busca folios faltantes entre remisiones consecutivas del listado,
/// que debe venir ordenado descendente por número.
///
/// Solo se comparan pares donde ambos números parsean como entero; un
/// número no numérico simplemente no genera marcador. Los faltantes de
/// cada hueco se listan en descendente, igual que el listado.
pub fn folios_faltantes(remisiones: &[Remision]) -> Vec<HuecoFolio> {
    let mut huecos = Vec::new();

    for par in remisiones.windows(2) {
        let actual = match par[0].numero.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let siguiente = match par[1].numero.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => continue,
        };

        if actual - siguiente > 1 {
            let faltantes: Vec<i64> = ((siguiente + 1)..actual).rev().collect();
            huecos.push(HuecoFolio {
                anterior: actual,
                siguiente,
                faltantes,
            });
        }
    }

    huecos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remision(numero: &str) -> Remision {
        Remision {
            numero: numero.to_string(),
            ..Remision::nueva()
        }
    }

    #[test]
    fn test_hueco_simple() {
        let lista = vec![remision("10"), remision("7")];
        let huecos = folios_faltantes(&lista);
        assert_eq!(huecos.len(), 1);
        assert_eq!(huecos[0].faltantes, vec![9, 8]);
        assert_eq!(huecos[0].anterior, 10);
        assert_eq!(huecos[0].siguiente, 7);
    }

    #[test]
    fn test_consecutivas_sin_hueco() {
        let lista = vec![remision("10"), remision("9")];
        assert!(folios_faltantes(&lista).is_empty());
    }

    #[test]
    fn test_no_numerico_se_omite() {
        let lista = vec![remision("10"), remision("x")];
        assert!(folios_faltantes(&lista).is_empty());
    }

    #[test]
    fn test_varios_huecos() {
        let lista = vec![remision("12"), remision("10"), remision("6")];
        let huecos = folios_faltantes(&lista);
        assert_eq!(huecos.len(), 2);
        assert_eq!(huecos[0].faltantes, vec![11]);
        assert_eq!(huecos[1].faltantes, vec![9, 8, 7]);
    }

    #[test]
    fn test_no_numerico_intermedio() {
        // el par (12, x) y el par (x, 9) se omiten; no hay marcador
        let lista = vec![remision("12"), remision("x"), remision("9")];
        assert!(folios_faltantes(&lista).is_empty());
    }

    #[test]
    fn test_listado_vacio_o_unitario() {
        assert!(folios_faltantes(&[]).is_empty());
        assert!(folios_faltantes(&[remision("5")]).is_empty());
    }
}
