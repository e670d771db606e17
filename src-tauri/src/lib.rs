mod almacen;
mod cobranza;
mod commands;
mod db;
mod errores;
mod models;
mod movil;
pub mod utils;

use db::{Database, SesionState};
use std::sync::Mutex;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let database = Database::new().expect("Error al inicializar la base de datos");
    let puerto: u16 = database
        .config_o("movil_puerto", "")
        .parse()
        .unwrap_or(movil::servidor::PUERTO_DEFAULT);

    let sesion_state = SesionState {
        sesion: Mutex::new(None),
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(database)
        .manage(sesion_state)
        .manage(cobranza::libreta::EdicionState::default())
        .manage(movil::sesiones::SesionesState::default())
        .setup(move |app| {
            // el servidor LAN vive lo que viva la app
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                if let Err(e) = movil::servidor::iniciar(handle, puerto).await {
                    tracing::warn!("servidor móvil no disponible: {}", e);
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Remisiones
            commands::remisiones::listar_remisiones,
            commands::remisiones::abrir_remision,
            commands::remisiones::cerrar_remision,
            commands::remisiones::guardar_remision,
            // Pagos
            commands::pagos::capturar_pago_nuevo,
            commands::pagos::editar_pago,
            commands::pagos::guardar_pago,
            commands::pagos::cancelar_captura,
            // Evidencias
            commands::evidencias::subir_evidencia_directa,
            commands::evidencias::obtener_evidencia,
            commands::evidencias::eliminar_evidencia,
            // Hand-off móvil
            commands::sesiones::iniciar_sesion_subida,
            commands::sesiones::esperar_sesion_subida,
            commands::sesiones::cancelar_sesion_subida,
            // Usuarios / Sesión
            commands::usuarios::iniciar_sesion,
            commands::usuarios::cerrar_sesion,
            commands::usuarios::obtener_sesion_actual,
            commands::usuarios::crear_usuario,
            commands::usuarios::listar_usuarios,
            // Configuración
            commands::config::obtener_config,
            commands::config::guardar_config,
            // Respaldo
            commands::respaldo::obtener_ruta_db,
            commands::respaldo::crear_respaldo,
            commands::respaldo::restaurar_respaldo,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
