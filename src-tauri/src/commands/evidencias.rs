use tauri::State;
use tracing::warn;

use crate::almacen;
use crate::cobranza::libreta::{EdicionRemision, EdicionState};
use crate::models::ObjetivoEvidencia;

/// Tamaño máximo de una evidencia (10MB)
const MAX_BYTES: usize = 10_000_000;

/// Sube una foto tomada en este mismo equipo y la adjunta al destino,
/// sin pasar por una sesión de hand-off. Converge en el mismo adjuntado
/// que usa el camino móvil.
#[tauri::command]
pub fn subir_evidencia_directa(
    edicion_state: State<EdicionState>,
    objetivo: ObjetivoEvidencia,
    ruta_archivo: String,
) -> Result<EdicionRemision, String> {
    let bytes = std::fs::read(&ruta_archivo).map_err(|e| {
        warn!("no se pudo leer {}: {}", ruta_archivo, e);
        "Error al subir la imagen".to_string()
    })?;
    if bytes.len() > MAX_BYTES {
        return Err("La imagen es demasiado grande. Máximo 10MB.".to_string());
    }

    let nombre = std::path::Path::new(&ruta_archivo)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "foto.jpg".to_string());
    let ruta = almacen::ruta_evidencia("directo", &nombre);

    almacen::guardar(&ruta, &bytes).map_err(|e| {
        warn!("no se pudo guardar la evidencia: {}", e);
        "Error al subir la imagen".to_string()
    })?;

    let mut guard = edicion_state.edicion.lock().map_err(|e| e.to_string())?;
    let edicion = guard
        .as_mut()
        .ok_or_else(|| "No hay una remisión abierta".to_string())?;
    edicion
        .adjuntar_evidencia(&objetivo, ruta)
        .map_err(String::from)?;
    Ok(edicion.clone())
}

/// Resuelve una ruta de evidencia a una URL `data:` para mostrarla.
#[tauri::command]
pub fn obtener_evidencia(ruta: String) -> Result<String, String> {
    almacen::url_datos(&ruta).map_err(|e| {
        warn!("no se pudo leer la evidencia {}: {}", ruta, e);
        "Error al cargar la imagen".to_string()
    })
}

/// Borra la evidencia del almacén y, solo si eso tuvo éxito, la quita de
/// la lista del destino. Si el borrado físico falla la lista queda igual
/// y el usuario ve el error.
#[tauri::command]
pub fn eliminar_evidencia(
    edicion_state: State<EdicionState>,
    objetivo: ObjetivoEvidencia,
    ruta: String,
) -> Result<EdicionRemision, String> {
    almacen::eliminar(&ruta).map_err(|e| {
        warn!("no se pudo borrar la evidencia {}: {}", ruta, e);
        "Error al eliminar la evidencia".to_string()
    })?;

    let mut guard = edicion_state.edicion.lock().map_err(|e| e.to_string())?;
    let edicion = guard
        .as_mut()
        .ok_or_else(|| "No hay una remisión abierta".to_string())?;
    edicion
        .quitar_evidencia(&objetivo, &ruta)
        .map_err(String::from)?;
    Ok(edicion.clone())
}
