use tauri::State;
use tracing::info;

use crate::cobranza::libreta::{EdicionRemision, EdicionState};
use crate::db::{self, Database};
use crate::models::{EstadoSesion, InicioSesionSubida, ObjetivoEvidencia};
use crate::movil::qr;
use crate::movil::servidor;
use crate::movil::sesiones::{self, EventoSesion, SesionesState};

/// Crea la sesión de hand-off y devuelve la URL con su QR para que el
/// teléfono la escanee. El destino de la evidencia queda registrado en
/// la propia sesión.
#[tauri::command]
pub fn iniciar_sesion_subida(
    db: State<Database>,
    sesiones_state: State<SesionesState>,
    objetivo: ObjetivoEvidencia,
) -> Result<InicioSesionSubida, String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    let sesion = sesiones::crear_sesion(&conn, &sesiones_state, &objetivo)?;

    let host = {
        let configurado = db::config_con(&conn, "movil_host", "");
        if configurado.is_empty() {
            servidor::direccion_lan().unwrap_or_else(|| "localhost".to_string())
        } else {
            configurado
        }
    };
    let puerto: u16 = db::config_con(&conn, "movil_puerto", "")
        .parse()
        .unwrap_or(servidor::PUERTO_DEFAULT);

    let url = servidor::url_handoff(&host, puerto, sesion.id, &sesion.token);
    let qr_png_base64 = qr::qr_png_base64(&url).map_err(String::from)?;

    info!("sesión de subida {} iniciada", sesion.id);
    Ok(InicioSesionSubida {
        sesion,
        url,
        qr_png_base64,
    })
}

/// Espera a que el teléfono complete la sesión. Cada cambio del registro
/// llega como instantánea completa; las que aún no están COMPLETADA (o
/// no traen ruta) se toleran sin hacer nada. La primera completada
/// adjunta la evidencia al destino original, se da de baja del canal y
/// resuelve, así el modal se cierra una sola vez. Devuelve None si la
/// sesión se canceló.
#[tauri::command]
pub async fn esperar_sesion_subida(
    edicion_state: State<'_, EdicionState>,
    sesiones_state: State<'_, SesionesState>,
    sesion_id: i64,
) -> Result<Option<EdicionRemision>, String> {
    let mut rx = sesiones_state
        .suscribirse(sesion_id)
        .ok_or_else(|| "Sesión no válida".to_string())?;

    loop {
        let evento = rx.borrow_and_update().clone();
        match evento {
            EventoSesion::Instantanea(sesion) => {
                if sesion.estado == EstadoSesion::Completada {
                    if let Some(ruta) = sesion.ruta_evidencia.clone() {
                        sesiones_state.dar_de_baja(sesion_id);

                        let mut guard =
                            edicion_state.edicion.lock().map_err(|e| e.to_string())?;
                        let edicion = guard
                            .as_mut()
                            .ok_or_else(|| "No hay una remisión abierta".to_string())?;
                        edicion
                            .adjuntar_evidencia(&sesion.objetivo, ruta)
                            .map_err(String::from)?;
                        return Ok(Some(edicion.clone()));
                    }
                }
            }
            EventoSesion::Cancelada => {
                sesiones_state.dar_de_baja(sesion_id);
                return Ok(None);
            }
        }

        // el emisor se soltó sin completar: trátese como cancelación
        if rx.changed().await.is_err() {
            sesiones_state.dar_de_baja(sesion_id);
            return Ok(None);
        }
    }
}

/// Cierra el modal de hand-off sin adjuntar nada. La fila PENDIENTE
/// queda abandonada y la recoge la purga por vencimiento.
#[tauri::command]
pub fn cancelar_sesion_subida(
    sesiones_state: State<SesionesState>,
    sesion_id: i64,
) -> Result<(), String> {
    sesiones::cancelar_sesion(&sesiones_state, sesion_id);
    Ok(())
}
