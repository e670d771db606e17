pub mod schema;

use crate::models::SesionActiva;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct Database {
    pub conn: Mutex<Connection>,
}

pub struct SesionState {
    pub sesion: Mutex<Option<SesionActiva>>,
}

impl Database {
    pub fn new() -> Result<Self, rusqlite::Error> {
        let db_path = get_db_path();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(&db_path)?;
        Self::con_conexion(conn)
    }

    pub fn con_conexion(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -8000;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database {
            conn: Mutex::new(conn),
        };

        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        schema::create_tables(&conn)?;

        // Migraciones incrementales (safe: .ok() ignora si columna ya existe)
        conn.execute(
            "ALTER TABLE sesiones_subida ADD COLUMN objetivo TEXT NOT NULL DEFAULT '{\"tipo\":\"Captura\"}'",
            [],
        )
        .ok();

        // Usuario administrador inicial, PIN 0000, solo si la tabla está vacía
        let hay_usuarios: i64 = conn
            .query_row("SELECT COUNT(*) FROM usuarios", [], |row| row.get(0))
            .unwrap_or(0);
        if hay_usuarios == 0 {
            let salt = crate::utils::generar_salt();
            let hash = crate::utils::hash_pin(&salt, "0000");
            conn.execute(
                "INSERT INTO usuarios (nombre, pin_hash, pin_salt, rol, activo)
                 VALUES ('ADMIN', ?1, ?2, 'ADMIN', 1)",
                rusqlite::params![hash, salt],
            )
            .ok();
        }

        Ok(())
    }

    /// Valor de configuración, con default si no existe
    pub fn config_o(&self, key: &str, default: &str) -> String {
        match self.conn.lock() {
            Ok(conn) => config_con(&conn, key, default),
            Err(_) => default.to_string(),
        }
    }
}

/// Igual que `Database::config_o` pero sobre una conexión ya tomada.
pub fn config_con(conn: &Connection, key: &str, default: &str) -> String {
    conn.query_row(
        "SELECT value FROM config WHERE key = ?1",
        rusqlite::params![key],
        |row| row.get(0),
    )
    .unwrap_or_else(|_| default.to_string())
}

pub fn get_db_path() -> PathBuf {
    let mut path = directorio_datos().unwrap_or_else(|| PathBuf::from("."));
    path.push("cobranza.db");
    path
}

/// Directorio de datos de la aplicación (base de datos y evidencias)
pub fn directorio_datos() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("LOCALAPPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("Cobranza"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(".local").join("share").join("cobranza"))
    }
}

#[cfg(test)]
pub fn abrir_en_memoria() -> Database {
    let conn = Connection::open_in_memory().expect("abrir db en memoria");
    Database::con_conexion(conn).expect("inicializar db en memoria")
}
