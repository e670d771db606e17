use rand::Rng;
use sha2::{Digest, Sha256};

/// Genera un salt aleatorio de 16 caracteres hexadecimales
pub fn generar_salt() -> String {
    let mut rng = rand::thread_rng();
    let salt: u64 = rng.gen();
    format!("{:016x}", salt)
}

/// Hash de PIN con salt usando SHA-256, en formato hexadecimal
pub fn hash_pin(salt: &str, pin: &str) -> String {
    let input = format!("{}{}", salt, pin);
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}

/// Token aleatorio de 32 caracteres hexadecimales para sesiones de subida
pub fn generar_token() -> String {
    let mut rng = rand::thread_rng();
    let alto: u64 = rng.gen();
    let bajo: u64 = rng.gen();
    format!("{:016x}{:016x}", alto, bajo)
}

/// Identificador temporal para pagos aún no persistidos.
/// El prefijo lo distingue a simple vista de un rowid de SQLite.
pub fn generar_id_local() -> String {
    let mut rng = rand::thread_rng();
    let n: u64 = rng.gen();
    format!("local-{:016x}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_local_prefijo() {
        let id = generar_id_local();
        assert!(id.starts_with("local-"));
        assert_eq!(id.len(), "local-".len() + 16);
    }

    #[test]
    fn test_token_longitud() {
        let token = generar_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_pin_deterministico() {
        let salt = "0123456789abcdef";
        assert_eq!(hash_pin(salt, "1234"), hash_pin(salt, "1234"));
        assert_ne!(hash_pin(salt, "1234"), hash_pin(salt, "4321"));
    }
}
