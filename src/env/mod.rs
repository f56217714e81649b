//! Emulated method environment: local variables, operand stack, and the frame combining them

mod errors;
mod frame;
mod locals;
mod stack;
mod variables;

pub use errors::*;
pub use frame::*;
pub use locals::*;
pub use stack::*;
pub use variables::*;
