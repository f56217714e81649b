//! In-memory tree of a class, as decoded from a class file
//!
//! Names and descriptors are kept as raw strings here. Nothing has been resolved or validated yet:
//! that is the job of [`crate::analyze`].

mod insn;
mod label;

pub use insn::*;
pub use label::*;

use crate::jvm::{
    ClassAccessFlags, Error, FieldAccessFlags, MethodAccessFlags, MethodDescriptor,
    ParseDescriptor, UnqualifiedName, Name,
};

/// Decoded class
#[derive(Clone, Debug)]
pub struct ClassNode {
    pub access: ClassAccessFlags,

    /// Internal name (eg. `java/util/Map$Entry`)
    pub name: String,

    /// Internal name of the superclass (only `java/lang/Object` has none)
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,

    /// Generic signature, if the class has a `Signature` attribute
    pub signature: Option<String>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
}

impl ClassNode {
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccessFlags::INTERFACE)
    }
}

#[derive(Clone, Debug)]
pub struct FieldNode {
    pub access: FieldAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MethodNode {
    pub access: MethodAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,

    /// Body, interspersed with labels (empty for `abstract` and `native` methods)
    pub instructions: Vec<Insn>,

    /// Entries from the `LocalVariableTable`, merged with `LocalVariableTypeTable` signatures
    pub local_variables: Vec<LocalVariableNode>,
    pub max_stack: u16,
    pub max_locals: u16,
}

impl MethodNode {
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == UnqualifiedName::INIT.as_str()
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == UnqualifiedName::CLINIT.as_str()
    }

    /// Whether there is bytecode to replay
    pub fn has_body(&self) -> bool {
        !self
            .access
            .intersects(MethodAccessFlags::ABSTRACT | MethodAccessFlags::NATIVE)
    }

    pub fn parsed_descriptor(&self) -> Result<MethodDescriptor, Error> {
        MethodDescriptor::parse(&self.descriptor)
            .map_err(|err| Error::BadDescriptor(format!("{} ({})", self.descriptor, err)))
    }
}

/// Debug information about one local variable
///
/// The variable lives in `index` from `start` (inclusive) to `end` (exclusive).
#[derive(Clone, PartialEq, Debug)]
pub struct LocalVariableNode {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub start: Label,
    pub end: Label,
    pub index: u16,
}

#[cfg(test)]
mod test {
    use super::*;

    fn method(name: &str, access: MethodAccessFlags, descriptor: &str) -> MethodNode {
        MethodNode {
            access,
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            signature: None,
            instructions: vec![],
            local_variables: vec![],
            max_stack: 0,
            max_locals: 0,
        }
    }

    #[test]
    fn method_kinds() {
        let init = method("<init>", MethodAccessFlags::PUBLIC, "()V");
        assert!(init.is_constructor());
        assert!(init.has_body());

        let clinit = method("<clinit>", MethodAccessFlags::STATIC, "()V");
        assert!(clinit.is_static_initializer());
        assert!(clinit.is_static());

        let run = method("run", MethodAccessFlags::ABSTRACT, "()V");
        assert!(!run.has_body());
    }

    #[test]
    fn bad_method_descriptor() {
        let broken = method("run", MethodAccessFlags::PUBLIC, "(I");
        assert!(matches!(
            broken.parsed_descriptor(),
            Err(Error::BadDescriptor(_))
        ));
    }
}
