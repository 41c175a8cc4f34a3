use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::connectors::CommandConnectors;
use crate::status::ConversionStatus;

use super::definition::ConversionStep;
use super::erased::{BoxedValue, ErasedSlot, ErasedStep};

/// Chains `ConversionStep`s into a `ConversionPipeline`, checking adjacency
/// while the steps are still typed: `then` only accepts a step that consumes
/// `Cur`, the output type of the chain so far, so a mismatched pair is a
/// compile error rather than a runtime downcast failure. `build(input)` wraps
/// the validated input and erases the steps without starting them.
pub struct Pipe<Kind, In, Cur> {
    steps: Vec<Box<dyn ErasedStep<Kind>>>,
    _io: PhantomData<fn(In) -> Cur>,
}

impl<Kind, In, Cur> Pipe<Kind, In, Cur>
    where Kind: Clone + Send + Sync + 'static,
          In: Clone + Send + 'static,
          Cur: Send + 'static
{
    pub fn new(step: ConversionStep<Kind, In, Cur>) -> Self {
        Self { steps: vec![Box::new(ErasedSlot::new(step))],
               _io: PhantomData }
    }

    /// Extend the chain with a step consuming `Cur`; the chain's output type
    /// becomes that step's output.
    pub fn then<Next>(mut self, step: ConversionStep<Kind, Cur, Next>) -> Pipe<Kind, In, Next>
        where Cur: Clone,
              Next: Send + 'static
    {
        self.steps.push(Box::new(ErasedSlot::new(step)));
        Pipe { steps: self.steps,
               _io: PhantomData }
    }

    /// Build the pipeline around its (already validated) input. Construction
    /// does not start execution.
    pub fn build(self, input: In) -> ConversionPipeline<Kind, In, Cur> {
        ConversionPipeline { steps: self.steps,
                             input: Some(input),
                             state: Arc::new(Mutex::new(PipelineState::NotStarted)),
                             _result: PhantomData }
    }
}

/// Observable pipeline lifecycle. Transitions are strictly monotonic:
/// `NotStarted → Running(0) → … → Running(n-1) → {Completed|Failed|Cancelled}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState<Kind> {
    NotStarted,
    Running { index: usize, kind: Kind },
    Completed,
    Failed { exit_code: i32 },
    Cancelled,
}

impl<Kind> PipelineState<Kind> {
    pub fn is_terminal(&self) -> bool {
        matches!(self,
                 PipelineState::Completed | PipelineState::Failed { .. } | PipelineState::Cancelled)
    }
}

/// Cloneable polling handle over the pipeline state; usable from another
/// task while `run` is in flight.
#[derive(Clone)]
pub struct PipelineProgress<Kind> {
    state: Arc<Mutex<PipelineState<Kind>>>,
}

impl<Kind: Clone> PipelineProgress<Kind> {
    pub fn state(&self) -> PipelineState<Kind> {
        self.state.lock().expect("pipeline state lock").clone()
    }

    pub fn current_step(&self) -> Option<(usize, Kind)> {
        match self.state() {
            PipelineState::Running { index, kind } => Some((index, kind)),
            _ => None,
        }
    }
}

/// Ordered sequence of type-erased steps sharing one `CommandConnectors`
/// instance per run.
pub struct ConversionPipeline<Kind, In, Result> {
    steps: Vec<Box<dyn ErasedStep<Kind>>>,
    input: Option<In>,
    state: Arc<Mutex<PipelineState<Kind>>>,
    _result: PhantomData<fn() -> Result>,
}

impl<Kind, In, Result> ConversionPipeline<Kind, In, Result>
    where Kind: Clone + Send + Sync + 'static,
          In: Send + 'static,
          Result: Send + 'static
{
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn state(&self) -> PipelineState<Kind> {
        self.state.lock().expect("pipeline state lock").clone()
    }

    pub fn progress(&self) -> PipelineProgress<Kind> {
        PipelineProgress { state: Arc::clone(&self.state) }
    }

    pub fn step_kinds(&self) -> Vec<Kind> {
        self.steps.iter().map(|step| step.kind()).collect()
    }

    /// Drives the steps strictly sequentially, threading each step's output
    /// into the next step's input.
    ///
    /// On `Failure` or `Cancelled` from any step, every step that began so
    /// far is cleaned up in reverse order before the terminal status is
    /// returned. A clean-up failure is logged and never masks the primary
    /// status.
    ///
    /// # Panics
    /// Invoking `run` twice on the same pipeline is a programming error and
    /// panics.
    pub async fn run(&mut self, connectors: CommandConnectors) -> ConversionStatus<Result> {
        let input = self.input
                        .take()
                        .expect("ConversionPipeline::run called more than once");

        let mut value: BoxedValue = Box::new(input);
        for index in 0..self.steps.len() {
            // Checkpoint de cancelación antes de arrancar cada step.
            if connectors.is_cancelled() {
                self.unwind(index);
                self.set_state(PipelineState::Cancelled);
                return ConversionStatus::Cancelled;
            }

            let kind = self.steps[index].kind();
            self.set_state(PipelineState::Running { index, kind });
            debug!(index, total = self.steps.len(), "pipeline step started");

            let status = self.steps[index].execute(value, connectors.clone()).await;
            match status {
                ConversionStatus::Success(output) => {
                    value = output;
                }
                ConversionStatus::Failure { exit_code } => {
                    self.unwind(index + 1);
                    self.set_state(PipelineState::Failed { exit_code });
                    return ConversionStatus::Failure { exit_code };
                }
                ConversionStatus::Cancelled => {
                    self.unwind(index + 1);
                    self.set_state(PipelineState::Cancelled);
                    return ConversionStatus::Cancelled;
                }
            }
        }

        self.set_state(PipelineState::Completed);
        let result = *value.downcast::<Result>()
                           .expect("pipeline result type checked at construction");
        ConversionStatus::Success(result)
    }

    /// Limpieza inversa: del step abandonado (exclusivo) hacia atrás, una
    /// sola vez por step.
    fn unwind(&mut self, abandoned: usize) {
        for index in (0..abandoned).rev() {
            if !self.steps[index].clean_up() {
                warn!(index, "step clean-up failed; keeping original status");
            }
        }
    }

    fn set_state(&self, next: PipelineState<Kind>) {
        *self.state.lock().expect("pipeline state lock") = next;
    }
}
