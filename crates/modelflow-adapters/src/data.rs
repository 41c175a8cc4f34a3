//! Tipos de datos y validación de dominio para la conversión de checkpoints.

use std::path::PathBuf;

use thiserror::Error;

use modelflow_core::{conversion_files, ConversionFile, ValidatedData};

/// Entrada sin validar: el directorio que debería contener el checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointConversionData {
    pub checkpoint_dir: PathBuf,
}

impl CheckpointConversionData {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into() }
    }

    fn required_files(&self) -> Vec<PathBuf> {
        vec![self.checkpoint_dir.join("params.json"),
             self.checkpoint_dir.join("tokenizer.model"),
             self.checkpoint_dir.join("consolidated.00.pth")]
    }
}

/// Entrada ya validada; solo se construye a través de `validate_checkpoint`.
#[derive(Debug, Clone)]
pub struct ValidatedCheckpointData {
    pub checkpoint_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum CheckpointValidationError {
    #[error("required file missing: {}", .0.display())]
    MissingFile(PathBuf),
}

/// Comprueba la existencia de los ficheros requeridos (solo existencia,
/// nunca contenidos). Si `required_files` está presente se rellena con cada
/// fichero inspeccionado, encontrado o no, sea cual sea el resultado.
pub fn validate_checkpoint(
    data: CheckpointConversionData,
    required_files: Option<&mut Vec<ConversionFile>>)
    -> Result<ValidatedData<ValidatedCheckpointData>, CheckpointValidationError> {
    let files = conversion_files(data.required_files());
    if let Some(out) = required_files {
        *out = files.clone();
    }

    if let Some(missing) = files.iter().find(|file| !file.found) {
        return Err(CheckpointValidationError::MissingFile(missing.path.clone()));
    }

    Ok(ValidatedData::new(ValidatedCheckpointData { checkpoint_dir: data.checkpoint_dir },
                          files))
}
