use bitflags::bitflags;
use std::collections::BTreeSet;

bitflags! {
    /// Access flags on classes
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.1-200-E.1
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags on fields
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.5-200-A.1
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

/// Source-level modifier on a declaration
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Transient,
    Volatile,
    Synchronized,
    Native,
    Strict,
    Synthetic,
    Bridge,
    Varargs,
    Enum,
    Annotation,
}

/// Kind of declaration an access bitmask was read from
///
/// The same bit means different things on different declarations (eg. `0x0040` is `volatile` on
/// a field but `bridge` on a method).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AccessTarget {
    Class,
    Field,
    Method,
}

impl Modifier {
    /// Translate a raw access bitmask into modifiers
    ///
    /// Bits that have no source-level counterpart (`ACC_SUPER`, `ACC_INTERFACE`, `ACC_MODULE`) are
    /// dropped, as are bits not defined for the target.
    pub fn from_access(target: AccessTarget, access: u16) -> BTreeSet<Modifier> {
        match target {
            AccessTarget::Class => ClassAccessFlags::from_bits_truncate(access).modifiers(),
            AccessTarget::Field => FieldAccessFlags::from_bits_truncate(access).modifiers(),
            AccessTarget::Method => MethodAccessFlags::from_bits_truncate(access).modifiers(),
        }
    }
}

/// Collect the modifiers whose flag is set
fn collect<F: Copy>(table: &[(F, Modifier)], contains: impl Fn(F) -> bool) -> BTreeSet<Modifier> {
    table
        .iter()
        .filter(|(flag, _)| contains(*flag))
        .map(|(_, modifier)| *modifier)
        .collect()
}

impl ClassAccessFlags {
    const MODIFIERS: [(ClassAccessFlags, Modifier); 6] = [
        (ClassAccessFlags::PUBLIC, Modifier::Public),
        (ClassAccessFlags::FINAL, Modifier::Final),
        (ClassAccessFlags::ABSTRACT, Modifier::Abstract),
        (ClassAccessFlags::SYNTHETIC, Modifier::Synthetic),
        (ClassAccessFlags::ANNOTATION, Modifier::Annotation),
        (ClassAccessFlags::ENUM, Modifier::Enum),
    ];

    pub fn modifiers(&self) -> BTreeSet<Modifier> {
        collect(&Self::MODIFIERS, |flag| self.contains(flag))
    }
}

impl MethodAccessFlags {
    const MODIFIERS: [(MethodAccessFlags, Modifier); 12] = [
        (MethodAccessFlags::PUBLIC, Modifier::Public),
        (MethodAccessFlags::PRIVATE, Modifier::Private),
        (MethodAccessFlags::PROTECTED, Modifier::Protected),
        (MethodAccessFlags::STATIC, Modifier::Static),
        (MethodAccessFlags::FINAL, Modifier::Final),
        (MethodAccessFlags::SYNCHRONIZED, Modifier::Synchronized),
        (MethodAccessFlags::BRIDGE, Modifier::Bridge),
        (MethodAccessFlags::VARARGS, Modifier::Varargs),
        (MethodAccessFlags::NATIVE, Modifier::Native),
        (MethodAccessFlags::ABSTRACT, Modifier::Abstract),
        (MethodAccessFlags::STRICT, Modifier::Strict),
        (MethodAccessFlags::SYNTHETIC, Modifier::Synthetic),
    ];

    pub fn modifiers(&self) -> BTreeSet<Modifier> {
        collect(&Self::MODIFIERS, |flag| self.contains(flag))
    }
}

impl FieldAccessFlags {
    const MODIFIERS: [(FieldAccessFlags, Modifier); 9] = [
        (FieldAccessFlags::PUBLIC, Modifier::Public),
        (FieldAccessFlags::PRIVATE, Modifier::Private),
        (FieldAccessFlags::PROTECTED, Modifier::Protected),
        (FieldAccessFlags::STATIC, Modifier::Static),
        (FieldAccessFlags::FINAL, Modifier::Final),
        (FieldAccessFlags::VOLATILE, Modifier::Volatile),
        (FieldAccessFlags::TRANSIENT, Modifier::Transient),
        (FieldAccessFlags::SYNTHETIC, Modifier::Synthetic),
        (FieldAccessFlags::ENUM, Modifier::Enum),
    ];

    pub fn modifiers(&self) -> BTreeSet<Modifier> {
        collect(&Self::MODIFIERS, |flag| self.contains(flag))
    }
}
