use tauri::State;
use tracing::info;

use crate::db::{get_db_path, Database};

/// Retorna la ruta actual de la base de datos
#[tauri::command]
pub fn obtener_ruta_db() -> Result<String, String> {
    Ok(get_db_path().to_string_lossy().to_string())
}

/// Crea un respaldo de la base de datos en la ruta destino
#[tauri::command]
pub fn crear_respaldo(db: State<Database>, destino: String) -> Result<String, String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    // Checkpoint WAL para que todo quede en el archivo principal
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .map_err(|e| format!("Error en WAL checkpoint: {}", e))?;

    drop(conn);

    let db_path = get_db_path();
    if !db_path.exists() {
        return Err("No se encontró el archivo de base de datos".to_string());
    }

    std::fs::copy(&db_path, &destino)
        .map_err(|e| format!("Error al copiar la base de datos: {}", e))?;

    info!("respaldo creado en {}", destino);
    Ok(destino)
}

/// Restaura un respaldo reemplazando la base de datos actual
#[tauri::command]
pub fn restaurar_respaldo(db: State<Database>, origen: String) -> Result<String, String> {
    let origen_path = std::path::PathBuf::from(&origen);
    if !origen_path.exists() {
        return Err("El archivo de respaldo no existe".to_string());
    }

    // Validar el encabezado SQLite antes de pisar nada
    let encabezado = std::fs::read(&origen_path).map_err(|e| format!("Error al leer archivo: {}", e))?;
    if encabezado.len() < 16 || &encabezado[..16] != b"SQLite format 3\0" {
        return Err("El archivo seleccionado no es una base de datos SQLite válida".to_string());
    }

    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .map_err(|e| format!("Error en WAL checkpoint: {}", e))?;
    drop(conn);

    let db_path = get_db_path();
    std::fs::copy(&origen_path, &db_path)
        .map_err(|e| format!("Error al restaurar la base de datos: {}", e))?;

    info!("respaldo restaurado desde {}", origen);
    Ok("Respaldo restaurado. Reinicie la aplicación.".to_string())
}
