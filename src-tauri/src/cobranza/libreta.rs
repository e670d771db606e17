use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::cobranza::saldo;
use crate::errores::AppError;
use crate::models::{CamposPago, FormularioPago, ObjetivoEvidencia, Pago, PagoId, Remision};
use crate::utils;

/// La remisión abierta en el detalle. Solo puede haber una a la vez;
/// el modal de detalle es su único dueño.
pub struct EdicionState {
    pub edicion: Mutex<Option<EdicionRemision>>,
}

impl Default for EdicionState {
    fn default() -> Self {
        EdicionState {
            edicion: Mutex::new(None),
        }
    }
}

/// Modo del formulario compartido de pagos. Un solo estado activo:
/// o no se está capturando nada, o se captura un pago (nuevo cuando
/// `editando` es None, edición en sitio cuando trae la identidad).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "modo")]
pub enum ModoLibreta {
    Inactivo,
    Capturando {
        editando: Option<PagoId>,
        formulario: FormularioPago,
    },
}

/// Copia de trabajo de una remisión con su libreta de pagos.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EdicionRemision {
    pub remision: Remision,
    pub pagos: Vec<Pago>,
    pub modo: ModoLibreta,
}

impl EdicionRemision {
    pub fn nueva(remision: Remision, pagos: Vec<Pago>) -> Self {
        EdicionRemision {
            remision,
            pagos,
            modo: ModoLibreta::Inactivo,
        }
    }

    /// Limpia el formulario y entra en captura de un pago nuevo.
    pub fn capturar_nuevo(&mut self) {
        self.modo = ModoLibreta::Capturando {
            editando: None,
            formulario: FormularioPago::default(),
        };
    }

    /// Llena el formulario con el pago objetivo y lo marca como destino
    /// de la próxima guardada.
    pub fn editar_pago(&mut self, id: &PagoId) -> Result<(), AppError> {
        let pago = self
            .pagos
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| AppError::Validacion("Pago no encontrado".to_string()))?;

        self.modo = ModoLibreta::Capturando {
            editando: Some(id.clone()),
            formulario: FormularioPago::desde_pago(pago),
        };
        Ok(())
    }

    pub fn cancelar_captura(&mut self) {
        self.modo = ModoLibreta::Inactivo;
    }

    /// Guarda el formulario en la libreta. Sin monto no hace nada, igual
    /// que sin captura activa. Con destino de edición reemplaza los campos
    /// en sitio conservando identidad y fecha de creación original; sin
    /// destino agrega un pago nuevo con identidad local y fecha de hoy.
    /// En ambos casos recalcula el saldo y cierra el formulario.
    pub fn guardar_pago(&mut self, campos: CamposPago) {
        if campos.monto.trim().is_empty() {
            return;
        }

        let (editando, evidencias) = match &self.modo {
            ModoLibreta::Capturando {
                editando,
                formulario,
            } => (editando.clone(), formulario.evidencias.clone()),
            ModoLibreta::Inactivo => return,
        };

        match editando {
            Some(id) => {
                if let Some(pago) = self.pagos.iter_mut().find(|p| p.id == id) {
                    pago.monto = campos.monto;
                    pago.numero_recibo = campos.numero_recibo;
                    pago.reporte = campos.reporte;
                    pago.metodo_pago = campos.metodo_pago;
                    pago.evidencias = evidencias;
                }
            }
            None => {
                self.pagos.push(Pago {
                    id: PagoId::Local(utils::generar_id_local()),
                    monto: campos.monto,
                    numero_recibo: campos.numero_recibo,
                    reporte: campos.reporte,
                    metodo_pago: campos.metodo_pago,
                    fecha_creacion: Local::now().format("%d/%m/%Y %H:%M").to_string(),
                    evidencias,
                });
            }
        }

        self.recalcular_saldo();
        self.modo = ModoLibreta::Inactivo;
    }

    /// Adjunta una ruta de evidencia al destino indicado. La subida directa
    /// y el hand-off móvil convergen aquí.
    pub fn adjuntar_evidencia(
        &mut self,
        objetivo: &ObjetivoEvidencia,
        ruta: String,
    ) -> Result<(), AppError> {
        match objetivo {
            ObjetivoEvidencia::Captura => match &mut self.modo {
                ModoLibreta::Capturando { formulario, .. } => {
                    formulario.evidencias.push(ruta);
                    Ok(())
                }
                ModoLibreta::Inactivo => Err(AppError::Validacion(
                    "No hay un pago en captura".to_string(),
                )),
            },
            ObjetivoEvidencia::Pago(id) => {
                let pago = self
                    .pagos
                    .iter_mut()
                    .find(|p| &p.id == id)
                    .ok_or_else(|| AppError::Validacion("Pago no encontrado".to_string()))?;
                pago.evidencias.push(ruta);
                Ok(())
            }
        }
    }

    /// Quita una ruta de la lista del destino. No toca el almacén; el
    /// borrado físico va primero y solo si tuvo éxito se llama esto.
    pub fn quitar_evidencia(
        &mut self,
        objetivo: &ObjetivoEvidencia,
        ruta: &str,
    ) -> Result<(), AppError> {
        match objetivo {
            ObjetivoEvidencia::Captura => match &mut self.modo {
                ModoLibreta::Capturando { formulario, .. } => {
                    formulario.evidencias.retain(|r| r != ruta);
                    Ok(())
                }
                ModoLibreta::Inactivo => Err(AppError::Validacion(
                    "No hay un pago en captura".to_string(),
                )),
            },
            ObjetivoEvidencia::Pago(id) => {
                let pago = self
                    .pagos
                    .iter_mut()
                    .find(|p| &p.id == id)
                    .ok_or_else(|| AppError::Validacion("Pago no encontrado".to_string()))?;
                pago.evidencias.retain(|r| r != ruta);
                Ok(())
            }
        }
    }

    pub fn recalcular_saldo(&mut self) {
        self.remision.saldo = saldo::calcular_saldo(&self.remision.total, &self.pagos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edicion_con_total(total: &str) -> EdicionRemision {
        let mut remision = Remision::nueva();
        remision.total = total.to_string();
        EdicionRemision::nueva(remision, Vec::new())
    }

    fn campos(monto: &str) -> CamposPago {
        CamposPago {
            monto: monto.to_string(),
            numero_recibo: "R-1".to_string(),
            reporte: "REP".to_string(),
            metodo_pago: "EFECTIVO".to_string(),
        }
    }

    #[test]
    fn test_pago_nuevo_agrega_con_id_local() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion.guardar_pago(campos("400"));

        assert_eq!(edicion.pagos.len(), 1);
        assert!(edicion.pagos[0].id.es_local());
        assert!(!edicion.pagos[0].fecha_creacion.is_empty());
        assert_eq!(edicion.remision.saldo, "600.00");
        assert!(matches!(edicion.modo, ModoLibreta::Inactivo));
    }

    #[test]
    fn test_monto_vacio_no_hace_nada() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion.guardar_pago(campos("  "));

        assert!(edicion.pagos.is_empty());
        // el formulario sigue abierto
        assert!(matches!(edicion.modo, ModoLibreta::Capturando { .. }));
    }

    #[test]
    fn test_guardar_sin_captura_no_hace_nada() {
        let mut edicion = edicion_con_total("1000");
        edicion.guardar_pago(campos("400"));
        assert!(edicion.pagos.is_empty());
    }

    #[test]
    fn test_editar_reemplaza_en_sitio_y_conserva_fecha() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion.guardar_pago(campos("400"));

        let id = edicion.pagos[0].id.clone();
        let fecha_original = edicion.pagos[0].fecha_creacion.clone();

        edicion.editar_pago(&id).unwrap();
        edicion.guardar_pago(campos("550"));

        assert_eq!(edicion.pagos.len(), 1);
        assert_eq!(edicion.pagos[0].id, id);
        assert_eq!(edicion.pagos[0].monto, "550");
        assert_eq!(edicion.pagos[0].fecha_creacion, fecha_original);
        assert_eq!(edicion.remision.saldo, "450.00");
    }

    #[test]
    fn test_editar_pago_inexistente() {
        let mut edicion = edicion_con_total("1000");
        let resultado = edicion.editar_pago(&PagoId::Persistido(99));
        assert!(resultado.is_err());
    }

    #[test]
    fn test_editar_llena_formulario() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion.guardar_pago(campos("400"));
        let id = edicion.pagos[0].id.clone();

        edicion.editar_pago(&id).unwrap();
        match &edicion.modo {
            ModoLibreta::Capturando {
                editando,
                formulario,
            } => {
                assert_eq!(editando.as_ref(), Some(&id));
                assert_eq!(formulario.monto, "400");
                assert_eq!(formulario.numero_recibo, "R-1");
            }
            ModoLibreta::Inactivo => panic!("debería estar capturando"),
        }
    }

    #[test]
    fn test_evidencia_en_captura_viaja_al_pago() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion
            .adjuntar_evidencia(
                &ObjetivoEvidencia::Captura,
                "evidence/1-123-foto.jpg".to_string(),
            )
            .unwrap();
        edicion.guardar_pago(campos("400"));

        assert_eq!(edicion.pagos[0].evidencias, vec!["evidence/1-123-foto.jpg"]);
    }

    #[test]
    fn test_evidencia_en_captura_sin_formulario_abierto() {
        let mut edicion = edicion_con_total("1000");
        let resultado = edicion.adjuntar_evidencia(
            &ObjetivoEvidencia::Captura,
            "evidence/1-123-foto.jpg".to_string(),
        );
        assert!(resultado.is_err());
    }

    #[test]
    fn test_evidencia_a_pago_existente() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion.guardar_pago(campos("400"));
        let id = edicion.pagos[0].id.clone();

        edicion
            .adjuntar_evidencia(
                &ObjetivoEvidencia::Pago(id),
                "evidence/directo-5-r.png".to_string(),
            )
            .unwrap();
        assert_eq!(edicion.pagos[0].evidencias.len(), 1);
    }

    #[test]
    fn test_quitar_evidencia() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion.guardar_pago(campos("400"));
        let id = edicion.pagos[0].id.clone();
        let objetivo = ObjetivoEvidencia::Pago(id);

        edicion
            .adjuntar_evidencia(&objetivo, "evidence/a.jpg".to_string())
            .unwrap();
        edicion
            .adjuntar_evidencia(&objetivo, "evidence/b.jpg".to_string())
            .unwrap();
        edicion.quitar_evidencia(&objetivo, "evidence/a.jpg").unwrap();

        assert_eq!(edicion.pagos[0].evidencias, vec!["evidence/b.jpg"]);
    }

    #[test]
    fn test_editar_permite_modificar_evidencias() {
        let mut edicion = edicion_con_total("1000");
        edicion.capturar_nuevo();
        edicion
            .adjuntar_evidencia(&ObjetivoEvidencia::Captura, "evidence/a.jpg".to_string())
            .unwrap();
        edicion.guardar_pago(campos("400"));
        let id = edicion.pagos[0].id.clone();

        // reabrir y adjuntar otra evidencia desde el formulario
        edicion.editar_pago(&id).unwrap();
        edicion
            .adjuntar_evidencia(&ObjetivoEvidencia::Captura, "evidence/b.jpg".to_string())
            .unwrap();
        edicion.guardar_pago(campos("400"));

        assert_eq!(
            edicion.pagos[0].evidencias,
            vec!["evidence/a.jpg", "evidence/b.jpg"]
        );
    }
}
