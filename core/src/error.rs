use thiserror::Error;

/// Default result type for flows that use the crate error.
pub type FlowResult<T> = Result<T, Error>;

/// Raised when `with` is called on a frozen context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot extend a frozen context")]
pub struct FrozenContextError;

/// Raised when an interpreter cannot satisfy a flow's declared effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpretationError {
    #[error("no handler registered for effect `{effect}`")]
    MissingHandler { effect: String },
    #[error("handler for effect `{effect}` failed: {message}")]
    HandlerFailed { effect: String, message: String },
}

impl InterpretationError {
    /// The effect identifier this error refers to.
    pub fn effect(&self) -> &str {
        match self {
            InterpretationError::MissingHandler { effect } => effect,
            InterpretationError::HandlerFailed { effect, .. } => effect,
        }
    }
}

/// The default error type carried by a [`Flow`](crate::Flow).
///
/// Flows may use their own error type instead; the combinators that need to
/// raise one of these variants ask for `E: From<Error>` (or the narrower
/// source error) rather than fixing the type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    FrozenContext(#[from] FrozenContextError),
    #[error(transparent)]
    Interpretation(#[from] InterpretationError),
    #[error("race requires at least one flow")]
    EmptyRace,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap an arbitrary message as a flow failure.
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Error::Other(anyhow::Error::msg(message))
    }
}
