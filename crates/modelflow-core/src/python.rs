//! Steps estándar reutilizables para conversiones basadas en Python, más el
//! runner de scripts.
//!
//! Los tres builders de steps son pass-through: genéricos sobre el `Kind`
//! del pipeline que los aloja y sobre su tipo de entrada, que devuelven sin
//! cambios en caso de éxito. Las funciones libres equivalentes permiten
//! componer varias utilidades dentro de un mismo step.

use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::connectors::CommandConnectors;
use crate::errors::ScriptStagingError;
use crate::process::{self, ProcessCommand};
use crate::status::ConversionStatus;
use crate::step::ConversionStep;

/// Código de salida para fallos de staging de scripts (I/O local, no un
/// proceso externo).
pub const SCRIPT_STAGING_EXIT_CODE: i32 = 1;

const PYTHON: &str = "python3";

/// Script de Python a ejecutar, con sus dependencias pip y los scripts
/// auxiliares que deben copiarse junto a él.
#[derive(Debug, Clone)]
pub struct PythonScript {
    pub path: PathBuf,
    pub python_dependencies: Vec<String>,
    pub dependent_scripts: Vec<PythonScript>,
}

impl PythonScript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(),
               python_dependencies: Vec::new(),
               dependent_scripts: Vec::new() }
    }

    pub fn with_python_dependencies<I, S>(mut self, dependencies: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.python_dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependent_scripts(mut self, scripts: Vec<PythonScript>) -> Self {
        self.dependent_scripts = scripts;
        self
    }
}

// ---------------------------------------------------------------------------
// Builders de steps estándar
// ---------------------------------------------------------------------------

/// Verifica que el intérprete de Python sea resoluble en el PATH actual.
pub fn check_environment_step<Kind, In>(kind: Kind) -> ConversionStep<Kind, In, In>
    where In: Send + 'static
{
    ConversionStep::with_handler(kind, |input, connectors| async move {
        check_conversion_environment(input, &connectors).await
    })
}

/// Instala la lista fija de dependencias vía pip; propaga el código de
/// salida del instalador en caso de fallo.
pub fn install_python_dependencies_step<Kind, In>(kind: Kind,
                                                  dependencies: Vec<String>)
                                                  -> ConversionStep<Kind, In, In>
    where In: Send + 'static
{
    ConversionStep::with_handler(kind, move |input, connectors| {
        let dependencies = dependencies.clone();
        async move { install_python_dependencies(input, &dependencies, &connectors).await }
    })
}

/// Consulta cada dependencia individualmente, fail-fast en la primera
/// ausente y con checkpoint de cancelación entre consultas.
pub fn check_installed_python_dependencies_step<Kind, In>(kind: Kind,
                                                          dependencies: Vec<String>)
                                                          -> ConversionStep<Kind, In, In>
    where In: Send + 'static
{
    ConversionStep::with_handler(kind, move |input, connectors| {
        let dependencies = dependencies.clone();
        async move { check_installed_python_dependencies(input, &dependencies, &connectors).await }
    })
}

// ---------------------------------------------------------------------------
// Funciones libres
// ---------------------------------------------------------------------------

pub async fn check_conversion_environment<In>(input: In,
                                              connectors: &CommandConnectors)
                                              -> ConversionStatus<In> {
    run_passthrough(input, ProcessCommand::new("which", [PYTHON]), connectors).await
}

pub async fn install_python_dependencies<In>(input: In,
                                             dependencies: &[String],
                                             connectors: &CommandConnectors)
                                             -> ConversionStatus<In> {
    let mut args: Vec<String> = vec!["-u".into(), "-m".into(), "pip".into(), "install".into()];
    args.extend(dependencies.iter().cloned());
    run_passthrough(input, ProcessCommand::new(PYTHON, args), connectors).await
}

pub async fn check_installed_python_dependencies<In>(input: In,
                                                     dependencies: &[String],
                                                     connectors: &CommandConnectors)
                                                     -> ConversionStatus<In> {
    for dependency in dependencies {
        if connectors.is_cancelled() {
            return ConversionStatus::Cancelled;
        }

        let command = ProcessCommand::new(PYTHON, ["-u", "-m", "pip", "show", dependency.as_str()]);
        match process::run(command, connectors).await {
            ConversionStatus::Success(()) => {}
            ConversionStatus::Failure { exit_code } => {
                // Fail-fast: no seguimos consultando el resto.
                return ConversionStatus::Failure { exit_code };
            }
            ConversionStatus::Cancelled => return ConversionStatus::Cancelled,
        }
    }
    ConversionStatus::Success(input)
}

/// Ejecuta un comando y, en caso de éxito, devuelve la entrada sin cambios.
async fn run_passthrough<In>(input: In,
                             command: ProcessCommand,
                             connectors: &CommandConnectors)
                             -> ConversionStatus<In> {
    process::run(command, connectors).await.map(|()| input)
}

/// Copia el script y sus auxiliares a un directorio temporal único y lo
/// ejecuta con `python3 -u`.
pub async fn run_python_script(script: &PythonScript,
                               arguments: &[String],
                               connectors: &CommandConnectors)
                               -> ConversionStatus<()> {
    let staging_dir = std::env::temp_dir().join(Uuid::new_v4().to_string());
    let main_script = match stage_scripts(script, &staging_dir) {
        Ok(path) => path,
        Err(err) => {
            warn!(%err, "failed to stage python scripts");
            return ConversionStatus::Failure { exit_code: SCRIPT_STAGING_EXIT_CODE };
        }
    };

    let mut args: Vec<String> = vec!["-u".into(), main_script.to_string_lossy().into_owned()];
    args.extend(arguments.iter().cloned());
    process::run(ProcessCommand::new(PYTHON, args), connectors).await
}

fn stage_scripts(script: &PythonScript, staging_dir: &Path) -> Result<PathBuf, ScriptStagingError> {
    std::fs::create_dir_all(staging_dir)?;
    let main_script = stage_script(script, staging_dir)?;
    for dependent in &script.dependent_scripts {
        stage_script(dependent, staging_dir)?;
    }
    Ok(main_script)
}

fn stage_script(script: &PythonScript, staging_dir: &Path) -> Result<PathBuf, ScriptStagingError> {
    let file_name = script.path
                          .file_name()
                          .ok_or(ScriptStagingError::MissingFileName)?;
    let contents = std::fs::read_to_string(&script.path)?;
    let target = staging_dir.join(file_name);
    std::fs::write(&target, contents)?;
    Ok(target)
}
