use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::net::UdpSocket;
use tauri::{AppHandle, Manager};
use tracing::{info, warn};

use crate::almacen;
use crate::db::Database;
use crate::movil::sesiones::{self, SesionesState};

pub const PUERTO_DEFAULT: u16 = 8917;

#[derive(Clone)]
struct ServidorMovil {
    app: AppHandle,
}

/// Servidor LAN que atiende al teléfono: sirve la página de subida y
/// recibe la foto que completa la sesión de hand-off.
pub async fn iniciar(app: AppHandle, puerto: u16) -> Result<(), String> {
    let router = Router::new()
        .route("/movil", get(pagina_movil))
        .route("/api/evidencia", post(recibir_evidencia))
        .with_state(ServidorMovil { app });

    let direccion = format!("0.0.0.0:{}", puerto);
    let listener = tokio::net::TcpListener::bind(&direccion)
        .await
        .map_err(|e| format!("No se pudo escuchar en {}: {}", direccion, e))?;

    info!("servidor móvil escuchando en {}", direccion);
    axum::serve(listener, router).await.map_err(|e| e.to_string())
}

/// URL que codifica el QR. El token viaja en la propia URL; cualquiera
/// que la tenga puede completar la sesión mientras no venza.
pub fn url_handoff(host: &str, puerto: u16, sesion_id: i64, token: &str) -> String {
    format!(
        "http://{}:{}/movil?sesion={}&token={}",
        host, puerto, sesion_id, token
    )
}

/// Dirección LAN del equipo, para que el teléfono pueda alcanzarlo.
pub fn direccion_lan() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|a| a.ip().to_string())
}

async fn pagina_movil(Query(parametros): Query<HashMap<String, String>>) -> Html<String> {
    let sesion = parametros.get("sesion").cloned().unwrap_or_default();
    let token = parametros.get("token").cloned().unwrap_or_default();

    if sesion.is_empty() {
        return Html(PAGINA_ERROR.to_string());
    }

    Html(
        PAGINA_SUBIDA
            .replace("__SESION__", &sesion)
            .replace("__TOKEN__", &token),
    )
}

async fn recibir_evidencia(
    State(estado): State<ServidorMovil>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    match procesar_subida(&estado.app, &mut multipart).await {
        Ok(ruta) => (
            StatusCode::OK,
            Json(serde_json::json!({ "ok": true, "ruta": ruta })),
        ),
        Err(mensaje) => {
            warn!("subida móvil rechazada: {}", mensaje);
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "ok": false, "error": mensaje })),
            )
        }
    }
}

async fn procesar_subida(app: &AppHandle, multipart: &mut Multipart) -> Result<String, String> {
    let mut sesion_id: Option<i64> = None;
    let mut token = String::new();
    let mut nombre = "foto.jpg".to_string();
    let mut contenido: Option<Vec<u8>> = None;

    while let Some(campo) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let nombre_campo = campo.name().unwrap_or("").to_string();
        match nombre_campo.as_str() {
            "sesion" => {
                sesion_id = campo.text().await.map_err(|e| e.to_string())?.trim().parse().ok();
            }
            "token" => {
                token = campo.text().await.map_err(|e| e.to_string())?;
            }
            "archivo" => {
                if let Some(n) = campo.file_name() {
                    nombre = n.to_string();
                }
                contenido = Some(campo.bytes().await.map_err(|e| e.to_string())?.to_vec());
            }
            _ => {}
        }
    }

    let sesion_id = sesion_id.ok_or_else(|| "Sesión no válida".to_string())?;
    let contenido = contenido.ok_or_else(|| "Falta el archivo".to_string())?;
    if contenido.is_empty() {
        return Err("Falta el archivo".to_string());
    }

    let ruta = almacen::ruta_evidencia(&sesion_id.to_string(), &nombre);
    almacen::guardar(&ruta, &contenido).map_err(String::from)?;

    let db = app.state::<Database>();
    let sesiones = app.state::<SesionesState>();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    let sesion = sesiones::completar_sesion(&conn, &sesiones, sesion_id, &token, &ruta)
        .map_err(String::from)?;

    info!("sesión de subida {} completada con {}", sesion.id, ruta);
    Ok(ruta)
}

const PAGINA_ERROR: &str = r#"<!doctype html>
<html lang="es"><head><meta charset="utf-8"><title>Subir Evidencia</title></head>
<body><div style="padding:1rem">Error: Sesión no válida.</div></body></html>"#;

const PAGINA_SUBIDA: &str = r#"<!doctype html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Subir Evidencia</title>
<style>
  body { font-family: sans-serif; margin: 0; padding: 1rem; background: #f6f6f6; }
  h2, p { text-align: center; }
  p { color: #666; }
  .tarjeta { background: #fff; border-radius: 8px; padding: 1rem; margin-top: 2rem;
             box-shadow: 0 1px 3px rgba(0,0,0,.15); }
  .boton { display: block; width: 100%; padding: 1rem; border: 0; border-radius: 6px;
           background: #2563eb; color: #fff; font-size: 1rem; text-align: center;
           cursor: pointer; box-sizing: border-box; }
  .boton[disabled] { opacity: .5; }
  #nombre { text-align: center; margin: 1rem 0; word-break: break-all; }
  #error { color: red; text-align: center; }
  #exito { text-align: center; margin-top: 2rem; display: none; }
  #exito .palomita { font-size: 4rem; margin-bottom: 1rem; }
</style>
</head>
<body>
<div id="formulario">
  <h2>Subir Evidencia</h2>
  <p>Toma una foto o selecciona un archivo para el pago.</p>
  <div class="tarjeta">
    <label class="boton" for="archivo" id="etiqueta">📸 Tomar Foto / Seleccionar</label>
    <input id="archivo" type="file" accept="image/*" capture="environment" style="display:none">
    <div id="nombre"></div>
    <button class="boton" id="subir" disabled>Subir Evidencia</button>
    <p id="error"></p>
  </div>
</div>
<div id="exito">
  <div class="palomita">✅</div>
  <h2>¡Subida Exitosa!</h2>
  <p>La evidencia se ha guardado correctamente.</p>
  <p>Ya puedes cerrar esta ventana.</p>
</div>
<script>
  var entrada = document.getElementById("archivo");
  var subir = document.getElementById("subir");
  var etiqueta = document.getElementById("etiqueta");
  entrada.addEventListener("change", function () {
    if (entrada.files.length) {
      document.getElementById("nombre").textContent = entrada.files[0].name;
      etiqueta.textContent = "Cambiar archivo";
      subir.disabled = false;
    }
  });
  subir.addEventListener("click", function () {
    if (!entrada.files.length) return;
    subir.disabled = true;
    subir.textContent = "Subiendo...";
    document.getElementById("error").textContent = "";
    var datos = new FormData();
    datos.append("sesion", "__SESION__");
    datos.append("token", "__TOKEN__");
    datos.append("archivo", entrada.files[0]);
    fetch("/api/evidencia", { method: "POST", body: datos })
      .then(function (r) { return r.json(); })
      .then(function (r) {
        if (!r.ok) throw new Error(r.error || "error");
        document.getElementById("formulario").style.display = "none";
        document.getElementById("exito").style.display = "block";
      })
      .catch(function () {
        document.getElementById("error").textContent =
          "Error al subir la imagen. Intenta de nuevo.";
        subir.disabled = false;
        subir.textContent = "Subir Evidencia";
      });
  });
</script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_handoff() {
        let url = url_handoff("192.168.0.5", 8917, 42, "abcd");
        assert_eq!(url, "http://192.168.0.5:8917/movil?sesion=42&token=abcd");
    }

    #[test]
    fn test_pagina_con_marcadores() {
        assert!(PAGINA_SUBIDA.contains("__SESION__"));
        assert!(PAGINA_SUBIDA.contains("__TOKEN__"));
    }
}
