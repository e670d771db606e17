use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;

use crate::errores::AppError;
use crate::models::{EstadoSesion, ObjetivoEvidencia, SesionSubida};
use crate::utils;

/// Minutos que vive una sesión pendiente antes de purgarse.
const TTL_MINUTOS: i64 = 15;

/// Lo que ve un suscriptor del canal de una sesión: la instantánea
/// completa en cada cambio, o la cancelación terminal.
#[derive(Clone, Debug)]
pub enum EventoSesion {
    Instantanea(SesionSubida),
    Cancelada,
}

/// Un canal `watch` por sesión de subida abierta. El modal de hand-off
/// se suscribe al crearla y se da de baja al completar o cancelar.
pub struct SesionesState {
    canales: Mutex<HashMap<i64, watch::Sender<EventoSesion>>>,
}

impl Default for SesionesState {
    fn default() -> Self {
        SesionesState {
            canales: Mutex::new(HashMap::new()),
        }
    }
}

impl SesionesState {
    fn registrar(&self, sesion: &SesionSubida) {
        let (tx, _rx) = watch::channel(EventoSesion::Instantanea(sesion.clone()));
        if let Ok(mut canales) = self.canales.lock() {
            canales.insert(sesion.id, tx);
        }
    }

    pub fn suscribirse(&self, id: i64) -> Option<watch::Receiver<EventoSesion>> {
        self.canales
            .lock()
            .ok()
            .and_then(|canales| canales.get(&id).map(|tx| tx.subscribe()))
    }

    fn publicar(&self, id: i64, evento: EventoSesion) {
        if let Ok(canales) = self.canales.lock() {
            if let Some(tx) = canales.get(&id) {
                let _ = tx.send(evento);
            }
        }
    }

    pub fn dar_de_baja(&self, id: i64) {
        if let Ok(mut canales) = self.canales.lock() {
            canales.remove(&id);
        }
    }
}

/// Crea una sesión PENDIENTE con token fresco y el destino al que se
/// adjuntará la evidencia cuando alguien la complete. De paso purga las
/// sesiones pendientes que ya vencieron.
pub fn crear_sesion(
    conn: &Connection,
    sesiones: &SesionesState,
    objetivo: &ObjetivoEvidencia,
) -> Result<SesionSubida, AppError> {
    purgar_vencidas(conn);

    let token = utils::generar_token();
    let objetivo_json = serde_json::to_string(objetivo)?;
    conn.execute(
        "INSERT INTO sesiones_subida (token, estado, objetivo) VALUES (?1, 'PENDIENTE', ?2)",
        rusqlite::params![token, objetivo_json],
    )?;
    let id = conn.last_insert_rowid();

    let sesion = SesionSubida {
        id,
        token,
        estado: EstadoSesion::Pendiente,
        objetivo: objetivo.clone(),
        ruta_evidencia: None,
    };
    sesiones.registrar(&sesion);
    Ok(sesion)
}

pub fn obtener_sesion(conn: &Connection, id: i64) -> Result<Option<SesionSubida>, AppError> {
    let fila = conn
        .query_row(
            "SELECT id, token, estado, objetivo, ruta_evidencia
             FROM sesiones_subida WHERE id = ?1",
            rusqlite::params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?;

    let (id, token, estado, objetivo, ruta_evidencia) = match fila {
        Some(f) => f,
        None => return Ok(None),
    };

    let estado = EstadoSesion::desde_str(&estado).ok_or(AppError::SesionInvalida)?;
    let objetivo: ObjetivoEvidencia = serde_json::from_str(&objetivo)?;

    Ok(Some(SesionSubida {
        id,
        token,
        estado,
        objetivo,
        ruta_evidencia,
    }))
}

/// Marca la sesión como COMPLETADA con su ruta de evidencia y publica la
/// instantánea a quien espere. La condición de estado va dentro del
/// UPDATE: dos completadores concurrentes no pueden completar dos veces.
pub fn completar_sesion(
    conn: &Connection,
    sesiones: &SesionesState,
    id: i64,
    token: &str,
    ruta: &str,
) -> Result<SesionSubida, AppError> {
    let sesion = obtener_sesion(conn, id)?.ok_or(AppError::SesionInvalida)?;
    if sesion.token != token {
        return Err(AppError::SesionInvalida);
    }

    let cambiadas = conn.execute(
        "UPDATE sesiones_subida SET estado = 'COMPLETADA', ruta_evidencia = ?1
         WHERE id = ?2 AND estado = 'PENDIENTE'",
        rusqlite::params![ruta, id],
    )?;
    if cambiadas == 0 {
        return Err(AppError::SesionInvalida);
    }

    let actualizada = obtener_sesion(conn, id)?.ok_or(AppError::SesionInvalida)?;
    sesiones.publicar(id, EventoSesion::Instantanea(actualizada.clone()));
    Ok(actualizada)
}

/// Cancela el hand-off: publica el evento terminal y da de baja el canal,
/// para que no quede un oyente vivo por cada intento abandonado.
pub fn cancelar_sesion(sesiones: &SesionesState, id: i64) {
    sesiones.publicar(id, EventoSesion::Cancelada);
    sesiones.dar_de_baja(id);
}

fn purgar_vencidas(conn: &Connection) {
    let _ = conn.execute(
        "DELETE FROM sesiones_subida
         WHERE estado = 'PENDIENTE'
           AND created_at < datetime('now', 'localtime', ?1)",
        rusqlite::params![format!("-{} minutes", TTL_MINUTOS)],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn preparar() -> (db::Database, SesionesState) {
        (db::abrir_en_memoria(), SesionesState::default())
    }

    #[test]
    fn test_crear_sesion_pendiente() {
        let (db, sesiones) = preparar();
        let conn = db.conn.lock().unwrap();

        let sesion = crear_sesion(&conn, &sesiones, &ObjetivoEvidencia::Captura).unwrap();
        assert_eq!(sesion.estado, EstadoSesion::Pendiente);
        assert_eq!(sesion.token.len(), 32);
        assert!(sesion.ruta_evidencia.is_none());
        assert!(sesiones.suscribirse(sesion.id).is_some());
    }

    #[test]
    fn test_completar_una_sola_vez() {
        let (db, sesiones) = preparar();
        let conn = db.conn.lock().unwrap();

        let sesion = crear_sesion(&conn, &sesiones, &ObjetivoEvidencia::Captura).unwrap();
        let rx = sesiones.suscribirse(sesion.id).unwrap();

        let completada = completar_sesion(
            &conn,
            &sesiones,
            sesion.id,
            &sesion.token,
            "evidence/1-1-a.jpg",
        )
        .unwrap();
        assert_eq!(completada.estado, EstadoSesion::Completada);
        assert_eq!(completada.ruta_evidencia.as_deref(), Some("evidence/1-1-a.jpg"));

        // el suscriptor ve la instantánea completada
        match &*rx.borrow() {
            EventoSesion::Instantanea(s) => {
                assert_eq!(s.estado, EstadoSesion::Completada);
            }
            EventoSesion::Cancelada => panic!("no debería estar cancelada"),
        }

        // segunda completada: rechazada
        let repetida = completar_sesion(
            &conn,
            &sesiones,
            sesion.id,
            &sesion.token,
            "evidence/1-2-b.jpg",
        );
        assert!(repetida.is_err());
    }

    #[test]
    fn test_token_incorrecto_rechazado() {
        let (db, sesiones) = preparar();
        let conn = db.conn.lock().unwrap();

        let sesion = crear_sesion(&conn, &sesiones, &ObjetivoEvidencia::Captura).unwrap();
        let resultado = completar_sesion(&conn, &sesiones, sesion.id, "otro", "evidence/x.jpg");
        assert!(resultado.is_err());
    }

    #[test]
    fn test_cancelar_publica_y_da_de_baja() {
        let (db, sesiones) = preparar();
        let conn = db.conn.lock().unwrap();

        let sesion = crear_sesion(&conn, &sesiones, &ObjetivoEvidencia::Captura).unwrap();
        let rx = sesiones.suscribirse(sesion.id).unwrap();

        cancelar_sesion(&sesiones, sesion.id);

        assert!(matches!(&*rx.borrow(), EventoSesion::Cancelada));
        assert!(sesiones.suscribirse(sesion.id).is_none());
    }

    #[test]
    fn test_purga_de_pendientes_vencidas() {
        let (db, sesiones) = preparar();
        let conn = db.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO sesiones_subida (token, estado, objetivo, created_at)
             VALUES ('t', 'PENDIENTE', '{\"tipo\":\"Captura\"}',
                     datetime('now', 'localtime', '-30 minutes'))",
            [],
        )
        .unwrap();
        let vieja = conn.last_insert_rowid();

        // las completadas viejas se conservan
        conn.execute(
            "INSERT INTO sesiones_subida (token, estado, objetivo, ruta_evidencia, created_at)
             VALUES ('t2', 'COMPLETADA', '{\"tipo\":\"Captura\"}', 'evidence/a.jpg',
                     datetime('now', 'localtime', '-30 minutes'))",
            [],
        )
        .unwrap();
        let completada = conn.last_insert_rowid();

        crear_sesion(&conn, &sesiones, &ObjetivoEvidencia::Captura).unwrap();

        assert!(obtener_sesion(&conn, vieja).unwrap().is_none());
        assert!(obtener_sesion(&conn, completada).unwrap().is_some());
    }
}
