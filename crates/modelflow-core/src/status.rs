/// Código de salida centinela para comandos que no pudieron lanzarse
/// (binario inexistente, permisos). Se reporta como `Failure`, nunca como
/// panic.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Resultado terminal de ejecutar un step o un pipeline completo.
///
/// Exactamente una variante está poblada; `Success` es la única que
/// transporta un valor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus<T> {
    Success(T),
    Failure { exit_code: i32 },
    Cancelled,
}

impl<T> ConversionStatus<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionStatus::Success(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConversionStatus::Cancelled)
    }

    /// Código de salida si el status es `Failure`.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ConversionStatus::Failure { exit_code } => Some(*exit_code),
            _ => None,
        }
    }

    /// Valor de éxito, si existe.
    pub fn result(self) -> Option<T> {
        match self {
            ConversionStatus::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Transforma el valor de `Success` preservando `Failure`/`Cancelled`.
    pub fn map<U, F>(self, f: F) -> ConversionStatus<U>
        where F: FnOnce(T) -> U
    {
        match self {
            ConversionStatus::Success(value) => ConversionStatus::Success(f(value)),
            ConversionStatus::Failure { exit_code } => ConversionStatus::Failure { exit_code },
            ConversionStatus::Cancelled => ConversionStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_preserves_non_success_variants() {
        let failure: ConversionStatus<u32> = ConversionStatus::Failure { exit_code: 3 };
        assert_eq!(failure.map(|v| v + 1), ConversionStatus::Failure { exit_code: 3 });

        let cancelled: ConversionStatus<u32> = ConversionStatus::Cancelled;
        assert_eq!(cancelled.map(|v| v + 1), ConversionStatus::Cancelled);
    }

    #[test]
    fn accessors_match_variants() {
        assert!(ConversionStatus::Success(()).is_success());
        assert_eq!(ConversionStatus::<()>::Failure { exit_code: 7 }.exit_code(), Some(7));
        assert_eq!(ConversionStatus::Success(5).result(), Some(5));
        assert_eq!(ConversionStatus::<u8>::Cancelled.result(), None);
    }
}
