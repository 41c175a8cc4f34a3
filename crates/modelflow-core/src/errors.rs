//! Errores específicos del core (simples por ahora).

use thiserror::Error;

/// Fallos al copiar scripts a su directorio temporal de ejecución. Se
/// reportan al pipeline plegados en `Failure`, nunca como panic.
#[derive(Debug, Error)]
pub enum ScriptStagingError {
    #[error("script path has no file name")]
    MissingFileName,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
