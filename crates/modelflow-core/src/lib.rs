//! modelflow-core: motor de pipelines de conversión por pasos, cancelable.
//!
//! Un pipeline es una secuencia ordenada de `ConversionStep`s que comparten
//! un único `CommandConnectors` (observadores de línea + señal de
//! cancelación). Cada step produce un `ConversionStatus` terminal y el
//! pipeline encadena la salida de un step como entrada del siguiente.

pub mod connectors;
pub mod conversion;
pub mod errors;
pub mod process;
pub mod python;
pub mod status;
pub mod step;
pub mod validation;

pub use connectors::{CancelSignal, CommandConnectors, LineConnector};
pub use conversion::ModelConversion;
pub use errors::ScriptStagingError;
pub use process::ProcessCommand;
pub use python::PythonScript;
pub use status::{ConversionStatus, SPAWN_FAILURE_EXIT_CODE};
pub use step::{ConversionPipeline, ConversionStep, Pipe, PipelineProgress, PipelineState};
pub use validation::{conversion_files, ConversionFile, ValidatedData};
