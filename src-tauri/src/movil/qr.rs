use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use qrcode::QrCode;

use crate::errores::AppError;

/// Renderiza la URL de hand-off como QR en PNG, codificado base64 para
/// mostrarlo directo en un `<img>` del modal.
pub fn qr_png_base64(data: &str) -> Result<String, AppError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::Interno(format!("Error creando QR: {}", e)))?;

    let modules = code.to_colors();
    let width = code.width() as u32;
    let scale = 4_u32;
    let border = 4_u32;
    let img_size = (width + border * 2) * scale;

    let mut img_buf = vec![255u8; (img_size * img_size) as usize];

    for (i, color) in modules.iter().enumerate() {
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        if *color == qrcode::types::Color::Dark {
            let px = (x + border) * scale;
            let py = (y + border) * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    let idx = ((py + dy) * img_size + (px + dx)) as usize;
                    if idx < img_buf.len() {
                        img_buf[idx] = 0;
                    }
                }
            }
        }
    }

    let gray_img = image::GrayImage::from_raw(img_size, img_size, img_buf)
        .ok_or_else(|| AppError::Interno("Error creando imagen QR".to_string()))?;

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(gray_img)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| AppError::Interno(format!("Error codificando QR: {}", e)))?;

    Ok(BASE64.encode(&png))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_es_png_valido() {
        let b64 = qr_png_base64("http://192.168.1.10:8917/movil?sesion=1&token=abc").unwrap();
        let bytes = BASE64.decode(b64).unwrap();
        // firma PNG
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
