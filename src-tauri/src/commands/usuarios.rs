use tauri::State;
use tracing::info;

use crate::db::{Database, SesionState};
use crate::models::{NuevoUsuario, SesionActiva, UsuarioInfo};
use crate::utils;

/// Verifica el PIN contra los usuarios activos y, si coincide,
/// establece la sesión.
#[tauri::command]
pub fn iniciar_sesion(
    db: State<Database>,
    sesion: State<SesionState>,
    pin: String,
) -> Result<SesionActiva, String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let mut stmt = conn
        .prepare("SELECT id, nombre, pin_hash, pin_salt, rol FROM usuarios WHERE activo = 1")
        .map_err(|e| e.to_string())?;

    let usuarios: Vec<(i64, String, String, String, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    for (id, nombre, pin_hash, pin_salt, rol) in usuarios {
        if utils::hash_pin(&pin_salt, &pin) == pin_hash {
            let nueva = SesionActiva {
                usuario_id: id,
                nombre,
                rol,
            };
            let mut guard = sesion.sesion.lock().map_err(|e| e.to_string())?;
            *guard = Some(nueva.clone());
            info!("sesión iniciada para {}", nueva.nombre);
            return Ok(nueva);
        }
    }

    Err("PIN incorrecto".to_string())
}

#[tauri::command]
pub fn cerrar_sesion(sesion: State<SesionState>) -> Result<(), String> {
    let mut guard = sesion.sesion.lock().map_err(|e| e.to_string())?;
    *guard = None;
    Ok(())
}

#[tauri::command]
pub fn obtener_sesion_actual(sesion: State<SesionState>) -> Result<Option<SesionActiva>, String> {
    let guard = sesion.sesion.lock().map_err(|e| e.to_string())?;
    Ok(guard.clone())
}

/// Alta de usuario. Solo para la sesión ADMIN.
#[tauri::command]
pub fn crear_usuario(
    db: State<Database>,
    sesion: State<SesionState>,
    usuario: NuevoUsuario,
) -> Result<UsuarioInfo, String> {
    verificar_admin(&sesion)?;

    if !usuario.pin.chars().all(|c| c.is_ascii_digit())
        || usuario.pin.len() < 4
        || usuario.pin.len() > 6
    {
        return Err("El PIN debe tener 4 a 6 dígitos numéricos".to_string());
    }

    if usuario.rol != "ADMIN" && usuario.rol != "COBRADOR" {
        return Err("El rol debe ser ADMIN o COBRADOR".to_string());
    }

    let nombre = usuario.nombre.trim().to_uppercase();
    if nombre.is_empty() {
        return Err("El nombre no puede estar vacío".to_string());
    }

    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let existe: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM usuarios WHERE nombre = ?1",
            rusqlite::params![nombre],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c > 0)
        .unwrap_or(false);
    if existe {
        return Err(format!("Ya existe un usuario con el nombre '{}'", nombre));
    }

    let salt = utils::generar_salt();
    let pin_hash = utils::hash_pin(&salt, &usuario.pin);

    conn.execute(
        "INSERT INTO usuarios (nombre, pin_hash, pin_salt, rol, activo)
         VALUES (?1, ?2, ?3, ?4, 1)",
        rusqlite::params![nombre, pin_hash, salt, usuario.rol],
    )
    .map_err(|e| e.to_string())?;

    Ok(UsuarioInfo {
        id: conn.last_insert_rowid(),
        nombre,
        rol: usuario.rol,
        activo: true,
    })
}

#[tauri::command]
pub fn listar_usuarios(db: State<Database>) -> Result<Vec<UsuarioInfo>, String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let mut stmt = conn
        .prepare("SELECT id, nombre, rol, activo FROM usuarios ORDER BY nombre")
        .map_err(|e| e.to_string())?;

    let usuarios = stmt
        .query_map([], |row| {
            Ok(UsuarioInfo {
                id: row.get(0)?,
                nombre: row.get(1)?,
                rol: row.get(2)?,
                activo: row.get::<_, i64>(3)? != 0,
            })
        })
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    Ok(usuarios)
}

fn verificar_admin(sesion: &SesionState) -> Result<(), String> {
    let guard = sesion.sesion.lock().map_err(|e| e.to_string())?;
    match guard.as_ref() {
        Some(activa) if activa.rol == "ADMIN" => Ok(()),
        Some(_) => Err("Se requiere una sesión de administrador".to_string()),
        None => Err("Debe iniciar sesión".to_string()),
    }
}
