//! Pipeline de conversión checkpoint -> GGML -> cuantizado.

use std::io;
use std::path::PathBuf;

use modelflow_core::python::{check_environment_step, check_installed_python_dependencies_step,
                             install_python_dependencies_step, run_python_script};
use modelflow_core::{process, ConversionPipeline, ConversionStep, ModelConversion, Pipe,
                     ProcessCommand, PythonScript};

use crate::data::{validate_checkpoint, CheckpointConversionData, CheckpointValidationError,
                  ValidatedCheckpointData};

/// Discriminador de progreso del pipeline de checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointConversionStep {
    CheckEnvironment,
    InstallDependencies,
    CheckDependencies,
    ConvertModel,
    QuantizeModel,
}

/// Entrada del pipeline: datos validados más las rutas de herramientas que
/// aporta el caller.
#[derive(Debug, Clone)]
pub struct CheckpointPipelineInput {
    pub validated: ValidatedCheckpointData,
    /// Script que convierte el checkpoint a GGML.
    pub convert_script: PythonScript,
    /// Binario de cuantización (ruta absoluta).
    pub quantize_binary: PathBuf,
    /// Ruta del fichero GGML intermedio a producir.
    pub output_path: PathBuf,
}

impl CheckpointPipelineInput {
    fn quantized_path(&self) -> PathBuf {
        self.output_path.with_extension("q4.bin")
    }
}

/// La conversión concreta: cinco steps, los tres primeros estándar.
pub struct CheckpointConversion;

impl ModelConversion for CheckpointConversion {
    type Data = CheckpointConversionData;
    type ValidatedData = ValidatedCheckpointData;
    type StepKind = CheckpointConversionStep;
    type PipelineInput = CheckpointPipelineInput;
    type ValidationError = CheckpointValidationError;
    type Result = PathBuf;

    fn conversion_steps() -> Vec<Self::StepKind> {
        vec![CheckpointConversionStep::CheckEnvironment,
             CheckpointConversionStep::InstallDependencies,
             CheckpointConversionStep::CheckDependencies,
             CheckpointConversionStep::ConvertModel,
             CheckpointConversionStep::QuantizeModel]
    }

    fn validate(data: Self::Data,
                required_files: Option<&mut Vec<modelflow_core::ConversionFile>>)
                -> Result<modelflow_core::ValidatedData<Self::ValidatedData>,
                          Self::ValidationError> {
        validate_checkpoint(data, required_files)
    }

    fn make_conversion_pipeline(
        &self,
        input: Self::PipelineInput)
        -> ConversionPipeline<Self::StepKind, Self::PipelineInput, Self::Result> {
        let dependencies = input.convert_script.python_dependencies.clone();

        Pipe::new(check_environment_step(CheckpointConversionStep::CheckEnvironment))
            .then(install_python_dependencies_step(CheckpointConversionStep::InstallDependencies,
                                                   dependencies.clone()))
            .then(check_installed_python_dependencies_step(
                CheckpointConversionStep::CheckDependencies,
                dependencies))
            .then(convert_model_step())
            .then(quantize_model_step())
            .build(input)
    }
}

/// Ejecuta el script de conversión sobre el checkpoint validado. Su limpieza
/// borra el GGML intermedio si un step posterior abandona.
fn convert_model_step()
    -> ConversionStep<CheckpointConversionStep, CheckpointPipelineInput, CheckpointPipelineInput> {
    ConversionStep::new(CheckpointConversionStep::ConvertModel,
                        |input: CheckpointPipelineInput, connectors| async move {
                            let args = vec![input.validated
                                                 .checkpoint_dir
                                                 .display()
                                                 .to_string(),
                                            input.output_path.display().to_string()];
                            run_python_script(&input.convert_script, &args, &connectors).await
                                .map(|_| input)
                        },
                        |input| remove_if_present(&input.output_path))
}

/// Cuantiza el GGML intermedio; el resultado del pipeline es la ruta del
/// fichero cuantizado.
fn quantize_model_step()
    -> ConversionStep<CheckpointConversionStep, CheckpointPipelineInput, PathBuf> {
    ConversionStep::new(CheckpointConversionStep::QuantizeModel,
                        |input: CheckpointPipelineInput, connectors| async move {
                            let quantized = input.quantized_path();
                            let command =
                                ProcessCommand::new(input.quantize_binary.display().to_string(),
                                                    vec![input.output_path.display().to_string(),
                                                         quantized.display().to_string()]);
                            process::run(command, &connectors).await.map(|_| quantized)
                        },
                        |input| remove_if_present(&input.quantized_path()))
}

fn remove_if_present(path: &std::path::Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(_) => false,
    }
}
