//! Definiciones relacionadas a Steps.
//!
//! Un step es una unidad de trabajo con nombre (`kind`) que transforma una
//! entrada en una salida produciendo un `ConversionStatus` terminal. Este
//! módulo define:
//! - `ConversionStep`: handler de ejecución + handler de limpieza.
//! - `Pipe`: builder tipado que valida en compilación que la salida de cada
//!   step coincide con la entrada del siguiente.
//! - `ConversionPipeline`: la máquina de estados que ejecuta los steps en
//!   orden estricto con limpieza inversa al abandonar.

pub mod definition;
mod erased;
pub mod pipeline;

pub use definition::{CleanUpHandler, ConversionStep, ExecutionHandler, StepFuture};
pub use pipeline::{ConversionPipeline, Pipe, PipelineProgress, PipelineState};
