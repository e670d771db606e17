use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::{Path, PathBuf};

use crate::db;
use crate::errores::AppError;

/// Almacén local de evidencias fotográficas. Las rutas son cadenas
/// opacas relativas a la raíz, con la forma
/// `evidence/<contexto>-<timestamp>-<nombre>`.
pub fn raiz_evidencias() -> PathBuf {
    db::directorio_datos()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("evidencias")
}

/// Deriva una ruta única sin coordinación central: contexto + reloj.
pub fn ruta_evidencia(contexto: &str, nombre_original: &str) -> String {
    let marca = chrono::Utc::now().timestamp_millis();
    format!(
        "evidence/{}-{}-{}",
        contexto,
        marca,
        sanear_nombre(nombre_original)
    )
}

fn sanear_nombre(nombre: &str) -> String {
    let limpio: String = nombre
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if limpio.is_empty() {
        "archivo".to_string()
    } else {
        limpio
    }
}

fn validar_ruta(ruta: &str) -> Result<(), AppError> {
    if ruta.is_empty() || ruta.starts_with('/') || ruta.split('/').any(|p| p == "..") {
        return Err(AppError::Validacion("Ruta de evidencia no válida".to_string()));
    }
    Ok(())
}

pub fn guardar(ruta: &str, bytes: &[u8]) -> Result<String, AppError> {
    guardar_en(&raiz_evidencias(), ruta, bytes)
}

pub fn guardar_en(raiz: &Path, ruta: &str, bytes: &[u8]) -> Result<String, AppError> {
    validar_ruta(ruta)?;
    let destino = raiz.join(ruta);
    if let Some(padre) = destino.parent() {
        std::fs::create_dir_all(padre)?;
    }
    std::fs::write(&destino, bytes)?;
    Ok(ruta.to_string())
}

pub fn eliminar(ruta: &str) -> Result<(), AppError> {
    eliminar_en(&raiz_evidencias(), ruta)
}

pub fn eliminar_en(raiz: &Path, ruta: &str) -> Result<(), AppError> {
    validar_ruta(ruta)?;
    std::fs::remove_file(raiz.join(ruta))?;
    Ok(())
}

/// Resuelve una ruta a una URL `data:` transitoria para mostrarla.
pub fn url_datos(ruta: &str) -> Result<String, AppError> {
    url_datos_en(&raiz_evidencias(), ruta)
}

pub fn url_datos_en(raiz: &Path, ruta: &str) -> Result<String, AppError> {
    validar_ruta(ruta)?;
    let bytes = std::fs::read(raiz.join(ruta))?;
    Ok(format!("data:{};base64,{}", mime_de(ruta), BASE64.encode(&bytes)))
}

fn mime_de(ruta: &str) -> &'static str {
    let extension = ruta.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raiz_pruebas(caso: &str) -> PathBuf {
        let raiz = std::env::temp_dir().join(format!(
            "cobranza-almacen-{}-{}",
            std::process::id(),
            caso
        ));
        std::fs::create_dir_all(&raiz).unwrap();
        raiz
    }

    #[test]
    fn test_guardar_y_leer() {
        let raiz = raiz_pruebas("guardar");
        let ruta = guardar_en(&raiz, "evidence/1-99-foto.png", b"png-bytes").unwrap();
        assert_eq!(ruta, "evidence/1-99-foto.png");

        let url = url_datos_en(&raiz, &ruta).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_eliminar_inexistente_falla() {
        let raiz = raiz_pruebas("eliminar");
        assert!(eliminar_en(&raiz, "evidence/no-existe.jpg").is_err());
    }

    #[test]
    fn test_eliminar_existente() {
        let raiz = raiz_pruebas("eliminar-ok");
        guardar_en(&raiz, "evidence/2-1-a.jpg", b"x").unwrap();
        eliminar_en(&raiz, "evidence/2-1-a.jpg").unwrap();
        assert!(url_datos_en(&raiz, "evidence/2-1-a.jpg").is_err());
    }

    #[test]
    fn test_ruta_con_traversal_rechazada() {
        let raiz = raiz_pruebas("traversal");
        assert!(guardar_en(&raiz, "../fuera.jpg", b"x").is_err());
        assert!(guardar_en(&raiz, "/absoluta.jpg", b"x").is_err());
        assert!(eliminar_en(&raiz, "evidence/../../fuera").is_err());
    }

    #[test]
    fn test_ruta_evidencia_formato() {
        let ruta = ruta_evidencia("7", "mi foto rara!.jpg");
        assert!(ruta.starts_with("evidence/7-"));
        assert!(ruta.ends_with("-mi_foto_rara_.jpg"));
    }
}
