use std::fmt;

/// Inconsistencies detected while emulating a method's frame
///
/// These signal either a malformed instruction stream or a bug in the instruction dispatcher, and
/// are never recovered from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FrameError {
    /// Popped from an empty operand stack scope
    EmptyStack,

    /// Tried to exit the outermost operand stack scope
    ExitRootStack,

    /// Loaded from a slot that holds nothing at this point
    MissingLocal(u16),

    /// Loaded from the second slot of a `long` or `double`
    WideSecondHalf(u16),

    /// Stored a value from the stack which is not a variable
    NotStorable(u16),

    /// Stored past the last local slot (a wide value in slot `65535`, for instance)
    SlotOverflow(u16),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::EmptyStack => write!(f, "pop from empty operand stack"),
            FrameError::ExitRootStack => write!(f, "cannot exit root stack"),
            FrameError::MissingLocal(slot) => write!(f, "no value in local slot {}", slot),
            FrameError::WideSecondHalf(slot) => {
                write!(f, "local slot {} is the second half of a wide value", slot)
            }
            FrameError::NotStorable(slot) => {
                write!(f, "value stored to local slot {} is not a variable", slot)
            }
            FrameError::SlotOverflow(slot) => {
                write!(f, "value stored to local slot {} does not fit", slot)
            }
        }
    }
}

impl std::error::Error for FrameError {}
