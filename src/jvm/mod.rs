//! Names, descriptors, generic signatures, and type resolution for JVM classes

mod access_flags;
mod descriptors;
mod errors;
mod names;
mod resolver;
pub mod signatures;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
pub use resolver::*;
pub use signatures::{
    ClassType, GenericSignature, GenericType, MethodSignature, ParsedSignature, TypeArgument,
    TypeVariable,
};
