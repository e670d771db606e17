use tauri::State;

use crate::cobranza::libreta::{EdicionRemision, EdicionState};
use crate::errores::AppError;
use crate::models::{CamposPago, PagoId};

/// Ejecuta una operación sobre la remisión abierta y devuelve la copia
/// de trabajo actualizada para refrescar la vista.
fn con_edicion<F>(edicion_state: &EdicionState, operacion: F) -> Result<EdicionRemision, String>
where
    F: FnOnce(&mut EdicionRemision) -> Result<(), AppError>,
{
    let mut guard = edicion_state.edicion.lock().map_err(|e| e.to_string())?;
    let edicion = guard
        .as_mut()
        .ok_or_else(|| "No hay una remisión abierta".to_string())?;
    operacion(edicion).map_err(String::from)?;
    Ok(edicion.clone())
}

#[tauri::command]
pub fn capturar_pago_nuevo(edicion_state: State<EdicionState>) -> Result<EdicionRemision, String> {
    con_edicion(&edicion_state, |edicion| {
        edicion.capturar_nuevo();
        Ok(())
    })
}

#[tauri::command]
pub fn editar_pago(
    edicion_state: State<EdicionState>,
    pago_id: PagoId,
) -> Result<EdicionRemision, String> {
    con_edicion(&edicion_state, |edicion| edicion.editar_pago(&pago_id))
}

/// Guarda el formulario en la libreta. Un monto vacío no guarda nada y
/// tampoco es error: el formulario simplemente se queda como está.
#[tauri::command]
pub fn guardar_pago(
    edicion_state: State<EdicionState>,
    campos: CamposPago,
) -> Result<EdicionRemision, String> {
    con_edicion(&edicion_state, |edicion| {
        edicion.guardar_pago(campos);
        Ok(())
    })
}

#[tauri::command]
pub fn cancelar_captura(edicion_state: State<EdicionState>) -> Result<EdicionRemision, String> {
    con_edicion(&edicion_state, |edicion| {
        edicion.cancelar_captura();
        Ok(())
    })
}
