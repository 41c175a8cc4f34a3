//! Conectores de comando: observadores de línea + señal de cancelación.
//!
//! Un `CommandConnectors` se construye una vez por ejecución de pipeline y se
//! comparte (por clonación barata) con todos los steps. Cada campo tiene un
//! único escritor: la señal la escribe el caller, los callbacks los invocan
//! los runners.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Callback observador de una línea de salida (o de la línea de comando).
pub type LineConnector = Arc<dyn Fn(&str) + Send + Sync>;

/// Señal de cancelación compartida, inicializada en `false`.
///
/// `cancel()` es idempotente: volver a poner `true` no tiene efecto
/// observable adicional.
#[derive(Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Solicita la cancelación. Idempotente.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Lectura síncrona del valor actual.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
         .field("cancelled", &self.is_cancelled())
         .finish()
    }
}

/// Bundle de observadores opcionales más la señal de cancelación.
#[derive(Clone)]
pub struct CommandConnectors {
    pub command: Option<LineConnector>,
    pub stdout: Option<LineConnector>,
    pub stderr: Option<LineConnector>,
    cancel: CancelSignal,
}

impl CommandConnectors {
    pub fn new(command: Option<LineConnector>,
               stdout: Option<LineConnector>,
               stderr: Option<LineConnector>,
               cancel: CancelSignal)
               -> Self {
        Self { command,
               stdout,
               stderr,
               cancel }
    }

    /// Conectores sin observadores y con una señal propia sin cancelar.
    pub fn empty() -> Self {
        Self::new(None, None, None, CancelSignal::new())
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Se resuelve cuando la señal transiciona a `true`. Si nunca se cancela,
    /// queda pendiente para siempre.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // El sender vive en `self.cancel`, así que esto no ocurre
                // mientras los conectores existan.
                std::future::pending::<()>().await;
            }
        }
    }

    pub(crate) fn emit_command(&self, line: &str) {
        if let Some(connector) = &self.command {
            connector(line);
        }
    }
}
