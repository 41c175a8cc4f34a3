use std::future::Future;
use std::pin::Pin;

use crate::connectors::CommandConnectors;
use crate::status::ConversionStatus;

/// Futuro devuelto por el handler de ejecución de un step.
pub type StepFuture<Out> = Pin<Box<dyn Future<Output = ConversionStatus<Out>> + Send>>;

/// Handler de ejecución: `(In, CommandConnectors) -> async ConversionStatus<Out>`.
pub type ExecutionHandler<In, Out> = Box<dyn Fn(In, CommandConnectors) -> StepFuture<Out> + Send + Sync>;

/// Handler de limpieza, invocado al abandonar el step (fallo o cancelación
/// propios, o de un step posterior). Devuelve `true` si la limpieza tuvo
/// éxito.
pub type CleanUpHandler<In> = Box<dyn Fn(In) -> bool + Send + Sync>;

/// Unidad de trabajo inmutable de un pipeline de conversión.
///
/// `kind` es un discriminador usado para reportar progreso, no para lógica
/// de despacho. El handler de ejecución puede lanzar cero o más comandos vía
/// el process runner, o ser cómputo puro; debe consultar la señal de
/// cancelación en cada checkpoint natural y devolver `Cancelled` pronto.
pub struct ConversionStep<Kind, In, Out> {
    kind: Kind,
    execute: ExecutionHandler<In, Out>,
    clean_up: CleanUpHandler<In>,
}

impl<Kind, In, Out> ConversionStep<Kind, In, Out> {
    pub fn new<E, Fut, C>(kind: Kind, execute: E, clean_up: C) -> Self
        where E: Fn(In, CommandConnectors) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = ConversionStatus<Out>> + Send + 'static,
              C: Fn(In) -> bool + Send + Sync + 'static
    {
        Self { kind,
               execute: Box::new(move |input, connectors| Box::pin(execute(input, connectors))),
               clean_up: Box::new(clean_up) }
    }

    /// Step sin limpieza (la limpieza siempre reporta éxito).
    pub fn with_handler<E, Fut>(kind: Kind, execute: E) -> Self
        where E: Fn(In, CommandConnectors) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = ConversionStatus<Out>> + Send + 'static
    {
        Self::new(kind, execute, |_| true)
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub async fn execute(&self, input: In, connectors: CommandConnectors) -> ConversionStatus<Out> {
        (self.execute)(input, connectors).await
    }

    pub fn clean_up(&self, input: In) -> bool {
        (self.clean_up)(input)
    }
}
