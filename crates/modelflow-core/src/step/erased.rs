//! Type-erased step slots.
//!
//! The typed `Pipe` builder guarantees adjacency compatibility at compile
//! time; at runtime values travel between steps as `Box<dyn Any + Send>` so
//! a heterogeneous chain fits in one ordered sequence.

use std::any::Any;

use async_trait::async_trait;

use crate::connectors::CommandConnectors;
use crate::status::ConversionStatus;

use super::definition::ConversionStep;

pub(crate) type BoxedValue = Box<dyn Any + Send>;

#[async_trait]
pub(crate) trait ErasedStep<Kind>: Send {
    fn kind(&self) -> Kind;

    async fn execute(&mut self,
                     input: BoxedValue,
                     connectors: CommandConnectors)
                     -> ConversionStatus<BoxedValue>;

    /// Limpia usando la entrada retenida de la última ejecución, si la hay.
    fn clean_up(&mut self) -> bool;
}

pub(crate) struct ErasedSlot<Kind, In, Out> {
    step: ConversionStep<Kind, In, Out>,
    retained_input: Option<In>,
}

impl<Kind, In, Out> ErasedSlot<Kind, In, Out> {
    pub(crate) fn new(step: ConversionStep<Kind, In, Out>) -> Self {
        Self { step,
               retained_input: None }
    }
}

#[async_trait]
impl<Kind, In, Out> ErasedStep<Kind> for ErasedSlot<Kind, In, Out>
    where Kind: Clone + Send + Sync + 'static,
          In: Clone + Send + 'static,
          Out: Send + 'static
{
    fn kind(&self) -> Kind {
        self.step.kind().clone()
    }

    async fn execute(&mut self,
                     input: BoxedValue,
                     connectors: CommandConnectors)
                     -> ConversionStatus<BoxedValue> {
        let input = *input.downcast::<In>()
                          .expect("step input type checked at pipeline construction");
        // Retenemos la entrada para la limpieza posterior; el pipeline la
        // consume exactamente una vez al abandonar.
        self.retained_input = Some(input.clone());
        match self.step.execute(input, connectors).await {
            ConversionStatus::Success(output) => ConversionStatus::Success(Box::new(output) as BoxedValue),
            ConversionStatus::Failure { exit_code } => ConversionStatus::Failure { exit_code },
            ConversionStatus::Cancelled => ConversionStatus::Cancelled,
        }
    }

    fn clean_up(&mut self) -> bool {
        match self.retained_input.take() {
            Some(input) => self.step.clean_up(input),
            None => true,
        }
    }
}
