use crate::env::FrameError;
use crate::jvm;
use std::fmt;

/// Reasons class analysis can fail
#[derive(Debug)]
pub enum Error {
    /// Bad name, descriptor, or signature, or a type that could not be resolved
    Jvm(jvm::Error),

    /// Frame emulation went wrong while replaying a method
    Frame { method: String, error: FrameError },

    /// The instruction dispatcher has no model for an instruction
    UnsupportedInstruction { method: String, instruction: String },

    /// The signature rebuilt from the analyzed class does not match the one in the class file
    ///
    /// `None` means "no signature".
    SignatureMismatch {
        class: String,
        expected: Option<String>,
        actual: Option<String>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Jvm(err) => write!(f, "{}", err),
            Error::Frame { method, error } => write!(f, "in method '{}': {}", method, error),
            Error::UnsupportedInstruction {
                method,
                instruction,
            } => write!(
                f,
                "in method '{}': unsupported instruction '{}'",
                method, instruction
            ),
            Error::SignatureMismatch {
                class,
                expected,
                actual,
            } => write!(
                f,
                "signature of '{}' parsed incorrectly: expected {}, got {}",
                class,
                expected.as_deref().unwrap_or("<none>"),
                actual.as_deref().unwrap_or("<none>"),
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Jvm(err) => Some(err),
            Error::Frame { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<jvm::Error> for Error {
    fn from(err: jvm::Error) -> Error {
        Error::Jvm(err)
    }
}

/// Failure while replaying a single instruction
///
/// The method being replayed is attached when this gets turned into an [`Error`].
#[derive(Debug)]
pub enum ReplayError {
    Jvm(jvm::Error),
    Frame(FrameError),
    Unsupported(String),
}

impl ReplayError {
    pub fn in_method(self, method: &str) -> Error {
        match self {
            ReplayError::Jvm(err) => Error::Jvm(err),
            ReplayError::Frame(error) => Error::Frame {
                method: method.to_owned(),
                error,
            },
            ReplayError::Unsupported(instruction) => Error::UnsupportedInstruction {
                method: method.to_owned(),
                instruction,
            },
        }
    }
}

impl From<jvm::Error> for ReplayError {
    fn from(err: jvm::Error) -> ReplayError {
        ReplayError::Jvm(err)
    }
}

impl From<FrameError> for ReplayError {
    fn from(err: FrameError) -> ReplayError {
        ReplayError::Frame(err)
    }
}
