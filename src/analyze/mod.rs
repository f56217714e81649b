//! Class analysis: from a decoded [`crate::tree::ClassNode`] to a [`crate::model::TypeDeclaration`]
//!
//! Analysis of one class goes through the following steps:
//!
//!   - access flags are translated into modifiers
//!   - the class, its superclass, and its interfaces are resolved
//!   - the class signature is parsed, and whatever supertypes it spells out replace the ones from
//!     the class header
//!   - every method is analyzed (replaying its body against a fresh [`crate::env::EmulatedFrame`]
//!     through an [`InstructionDispatcher`]), then every field
//!   - the declaration is assembled, and its signature is rebuilt and compared to the one in the
//!     class file

mod class;
mod dispatcher;
mod errors;
mod member;

pub use class::*;
pub use dispatcher::*;
pub use errors::*;
pub use member::*;
