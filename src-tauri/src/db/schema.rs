use rusqlite::Connection;

pub fn create_tables(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        -- Configuración del negocio
        CREATE TABLE IF NOT EXISTS config (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Remisiones (cabecera de cobranza)
        CREATE TABLE IF NOT EXISTS remisiones (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            numero TEXT NOT NULL,
            nota_venta TEXT NOT NULL DEFAULT '',
            factura TEXT NOT NULL DEFAULT '',
            total TEXT NOT NULL DEFAULT '0',
            saldo TEXT NOT NULL DEFAULT '0.00',
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE INDEX IF NOT EXISTS idx_remisiones_numero ON remisiones(numero);
        CREATE INDEX IF NOT EXISTS idx_remisiones_nota_venta ON remisiones(nota_venta);
        CREATE INDEX IF NOT EXISTS idx_remisiones_factura ON remisiones(factura);

        -- Pagos parciales de cada remisión; evidencias es un arreglo JSON de rutas
        CREATE TABLE IF NOT EXISTS pagos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            remision_id INTEGER NOT NULL,
            monto TEXT NOT NULL DEFAULT '0',
            numero_recibo TEXT NOT NULL DEFAULT '',
            reporte TEXT NOT NULL DEFAULT '',
            metodo_pago TEXT NOT NULL DEFAULT '',
            fecha_creacion TEXT NOT NULL DEFAULT '',
            evidencias TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            FOREIGN KEY (remision_id) REFERENCES remisiones(id)
        );

        CREATE INDEX IF NOT EXISTS idx_pagos_remision ON pagos(remision_id);

        -- Sesiones efímeras de subida de evidencia (hand-off móvil)
        CREATE TABLE IF NOT EXISTS sesiones_subida (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            token TEXT NOT NULL,
            estado TEXT NOT NULL DEFAULT 'PENDIENTE',
            ruta_evidencia TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE INDEX IF NOT EXISTS idx_sesiones_estado ON sesiones_subida(estado);

        -- Usuarios locales
        CREATE TABLE IF NOT EXISTS usuarios (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL UNIQUE,
            pin_hash TEXT NOT NULL,
            pin_salt TEXT NOT NULL,
            rol TEXT NOT NULL DEFAULT 'COBRADOR',
            activo INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );
        ",
    )?;

    Ok(())
}
