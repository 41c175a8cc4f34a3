//! modelflow-adapters: conversión concreta construida sobre el core neutral.
//!
//! Implementa la conversión de un checkpoint estilo PyTorch a GGML: tipos de
//! datos, validación de dominio y ensamblado del pipeline con los steps
//! estándar de Python más los dos steps propios (convertir y cuantizar).

pub mod checkpoint;
pub mod data;

pub use checkpoint::{CheckpointConversion, CheckpointConversionStep, CheckpointPipelineInput};
pub use data::{validate_checkpoint, CheckpointConversionData, CheckpointValidationError,
               ValidatedCheckpointData};
