use rusqlite::Connection;
use tauri::{AppHandle, Emitter, State};
use tracing::warn;

use crate::cobranza::folios;
use crate::cobranza::libreta::{EdicionRemision, EdicionState};
use crate::db::Database;
use crate::errores::AppError;
use crate::models::{ListadoRemisiones, Pago, PagoId, Remision, RemisionCompleta};

#[tauri::command]
pub fn listar_remisiones(
    db: State<Database>,
    filtro: Option<String>,
) -> Result<ListadoRemisiones, String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    listar(&conn, filtro.as_deref()).map_err(String::from)
}

/// Abre una remisión en el estado de edición (la copia de trabajo del
/// modal de detalle). Sin id abre una remisión nueva sin guardar. Los
/// pagos se cargan recién aquí, no con el listado.
#[tauri::command]
pub fn abrir_remision(
    db: State<Database>,
    edicion_state: State<EdicionState>,
    id: Option<i64>,
) -> Result<EdicionRemision, String> {
    let edicion = match id {
        Some(id) => {
            let conn = db.conn.lock().map_err(|e| e.to_string())?;
            abrir(&conn, id)?
        }
        None => EdicionRemision::nueva(Remision::nueva(), Vec::new()),
    };

    let mut guard = edicion_state.edicion.lock().map_err(|e| e.to_string())?;
    *guard = Some(edicion.clone());
    Ok(edicion)
}

/// Cierra el modal de detalle descartando la copia de trabajo.
#[tauri::command]
pub fn cerrar_remision(edicion_state: State<EdicionState>) -> Result<(), String> {
    let mut guard = edicion_state.edicion.lock().map_err(|e| e.to_string())?;
    *guard = None;
    Ok(())
}

#[tauri::command]
pub fn guardar_remision(
    app: AppHandle,
    db: State<Database>,
    edicion_state: State<EdicionState>,
) -> Result<RemisionCompleta, String> {
    let guardada;
    let resultado;
    {
        let conn = db.conn.lock().map_err(|e| e.to_string())?;
        let mut guard = edicion_state.edicion.lock().map_err(|e| e.to_string())?;
        let edicion = guard
            .as_mut()
            .ok_or_else(|| "No hay una remisión abierta".to_string())?;

        guardada = guardar(&conn, edicion).map_err(|e| {
            warn!("error al guardar la remisión: {}", e);
            String::from(e)
        })?;
        resultado = RemisionCompleta {
            remision: edicion.remision.clone(),
            pagos: edicion.pagos.clone(),
        };
    }

    if guardada {
        if let Err(e) = app.emit("remisiones-actualizadas", ()) {
            warn!("no se pudo notificar el listado: {}", e);
        }
    }
    Ok(resultado)
}

pub fn listar(conn: &Connection, filtro: Option<&str>) -> Result<ListadoRemisiones, AppError> {
    let patron = format!("%{}%", filtro.unwrap_or("").trim());

    let mut stmt = conn.prepare(
        "SELECT id, numero, nota_venta, factura, total, saldo
         FROM remisiones
         WHERE numero LIKE ?1 OR nota_venta LIKE ?1 OR factura LIKE ?1",
    )?;

    let mut remisiones = stmt
        .query_map(rusqlite::params![patron], |row| {
            Ok(Remision {
                id: Some(row.get(0)?),
                numero: row.get(1)?,
                nota_venta: row.get(2)?,
                factura: row.get(3)?,
                total: row.get(4)?,
                saldo: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // Descendente por valor numérico del folio. total_cmp manda los no
    // numéricos (NaN) juntos; su orden relativo no importa.
    remisiones.sort_by(|a, b| {
        let na = a.numero.trim().parse::<f64>().unwrap_or(f64::NAN);
        let nb = b.numero.trim().parse::<f64>().unwrap_or(f64::NAN);
        nb.total_cmp(&na)
    });

    let huecos = folios::folios_faltantes(&remisiones);

    Ok(ListadoRemisiones { remisiones, huecos })
}

pub fn abrir(conn: &Connection, id: i64) -> Result<EdicionRemision, AppError> {
    let remision = conn.query_row(
        "SELECT id, numero, nota_venta, factura, total, saldo
         FROM remisiones WHERE id = ?1",
        rusqlite::params![id],
        |row| {
            Ok(Remision {
                id: Some(row.get(0)?),
                numero: row.get(1)?,
                nota_venta: row.get(2)?,
                factura: row.get(3)?,
                total: row.get(4)?,
                saldo: row.get(5)?,
            })
        },
    )?;

    let pagos = cargar_pagos(conn, id)?;
    Ok(EdicionRemision::nueva(remision, pagos))
}

pub fn cargar_pagos(conn: &Connection, remision_id: i64) -> Result<Vec<Pago>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, monto, numero_recibo, reporte, metodo_pago, fecha_creacion, evidencias
         FROM pagos WHERE remision_id = ?1 ORDER BY id",
    )?;

    let pagos = stmt
        .query_map(rusqlite::params![remision_id], |row| {
            let evidencias: String = row.get(6)?;
            Ok(Pago {
                id: PagoId::Persistido(row.get(0)?),
                monto: row.get(1)?,
                numero_recibo: row.get(2)?,
                reporte: row.get(3)?,
                metodo_pago: row.get(4)?,
                fecha_creacion: row.get(5)?,
                evidencias: serde_json::from_str(&evidencias).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(pagos)
}

/// Persiste el agregado completo. Devuelve false si la remisión no tiene
/// número: se bloquea en silencio, igual que el formulario de pagos.
///
/// Cabecera primero, pagos después, sin transacción: una falla a medias
/// deja lo ya escrito. Los pagos con identidad local se insertan y
/// adoptan su rowid; los persistidos se actualizan. No hay camino de
/// borrado de pagos.
pub fn guardar(conn: &Connection, edicion: &mut EdicionRemision) -> Result<bool, AppError> {
    if edicion.remision.numero.trim().is_empty() {
        return Ok(false);
    }

    edicion.recalcular_saldo();

    let remision = &edicion.remision;
    let remision_id = match remision.id {
        Some(id) => {
            conn.execute(
                "UPDATE remisiones
                 SET numero = ?1, nota_venta = ?2, factura = ?3, total = ?4, saldo = ?5,
                     updated_at = datetime('now', 'localtime')
                 WHERE id = ?6",
                rusqlite::params![
                    remision.numero,
                    remision.nota_venta,
                    remision.factura,
                    remision.total,
                    remision.saldo,
                    id,
                ],
            )?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO remisiones (numero, nota_venta, factura, total, saldo)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    remision.numero,
                    remision.nota_venta,
                    remision.factura,
                    remision.total,
                    remision.saldo,
                ],
            )?;
            conn.last_insert_rowid()
        }
    };
    edicion.remision.id = Some(remision_id);

    for pago in &mut edicion.pagos {
        let evidencias = serde_json::to_string(&pago.evidencias)?;
        match &pago.id {
            PagoId::Local(_) => {
                conn.execute(
                    "INSERT INTO pagos
                     (remision_id, monto, numero_recibo, reporte, metodo_pago,
                      fecha_creacion, evidencias)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        remision_id,
                        pago.monto,
                        pago.numero_recibo,
                        pago.reporte,
                        pago.metodo_pago,
                        pago.fecha_creacion,
                        evidencias,
                    ],
                )?;
                pago.id = PagoId::Persistido(conn.last_insert_rowid());
            }
            PagoId::Persistido(id) => {
                // fecha_creacion se fija al crear y no se vuelve a tocar
                conn.execute(
                    "UPDATE pagos
                     SET monto = ?1, numero_recibo = ?2, reporte = ?3,
                         metodo_pago = ?4, evidencias = ?5
                     WHERE id = ?6",
                    rusqlite::params![
                        pago.monto,
                        pago.numero_recibo,
                        pago.reporte,
                        pago.metodo_pago,
                        evidencias,
                        id,
                    ],
                )?;
            }
        }
    }

    Ok(true)
}
