use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error de base de datos: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Error de archivo: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error de serialización: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Validacion(String),

    #[error("Sesión no válida")]
    SesionInvalida,

    #[error("Error: {0}")]
    Interno(String),
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
