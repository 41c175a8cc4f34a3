//! Helpers de validación previa al pipeline.
//!
//! La validación solo comprueba existencia de ficheros (nunca abre ni parsea
//! contenidos), es síncrona y no participa en la señal de cancelación.

use std::path::PathBuf;

/// Snapshot inmutable de si un fichero requerido existía en el momento de la
/// validación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFile {
    pub path: PathBuf,
    pub found: bool,
}

/// Construye el snapshot de existencia para cada ruta.
pub fn conversion_files<I, P>(paths: I) -> Vec<ConversionFile>
    where I: IntoIterator<Item = P>,
          P: Into<PathBuf>
{
    paths.into_iter()
         .map(|path| {
             let path = path.into();
             let found = path.exists();
             ConversionFile { path, found }
         })
         .collect()
}

/// Datos de entrada ya validados, junto con los ficheros comprobados.
#[derive(Debug, Clone)]
pub struct ValidatedData<T> {
    data: T,
    checked_files: Vec<ConversionFile>,
}

impl<T> ValidatedData<T> {
    pub fn new(data: T, checked_files: Vec<ConversionFile>) -> Self {
        Self { data, checked_files }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn checked_files(&self) -> &[ConversionFile] {
        &self.checked_files
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}
