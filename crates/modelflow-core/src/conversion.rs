//! Contrato que debe cumplir cada dominio de conversión concreto.

use std::error::Error;

use crate::step::ConversionPipeline;
use crate::validation::{ConversionFile, ValidatedData};

/// Una conversión de modelo concreta: define sus tipos de datos, su enum de
/// step-kind, su error de validación y cómo ensamblar el pipeline.
///
/// El engine no impone ninguna restricción sobre la representación interna
/// de estos tipos.
pub trait ModelConversion {
    /// Datos de entrada sin validar.
    type Data;
    /// Datos devueltos por la validación (puede coincidir con `Data`).
    type ValidatedData;
    /// Discriminador de step, usado para reportar progreso.
    type StepKind: Clone + Send + Sync + 'static;
    /// Entrada del pipeline; normalmente contiene `ValidatedData`.
    type PipelineInput: Clone + Send + 'static;
    /// Error de dominio de la validación.
    type ValidationError: Error;
    /// Resultado final de la conversión.
    type Result: Send + 'static;

    /// Pasos de la conversión, en orden de ejecución.
    fn conversion_steps() -> Vec<Self::StepKind>;

    /// Validación previa. Si `required_files` está presente se rellena con
    /// todos los ficheros inspeccionados (encontrados o no), sea cual sea el
    /// resultado.
    fn validate(data: Self::Data,
                required_files: Option<&mut Vec<ConversionFile>>)
                -> Result<ValidatedData<Self::ValidatedData>, Self::ValidationError>;

    /// Ensambla el pipeline alrededor de la entrada validada; no arranca la
    /// ejecución.
    fn make_conversion_pipeline(
        &self,
        input: Self::PipelineInput)
        -> ConversionPipeline<Self::StepKind, Self::PipelineInput, Self::Result>;
}
