use super::Stmt;
use crate::jvm::{GenericSignature, GenericType, Modifier};
use std::collections::BTreeSet;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DeclarationKind {
    Class,
    Interface,
}

/// Class or interface declaration
#[derive(Clone, PartialEq, Debug)]
pub struct TypeDeclaration {
    pub kind: DeclarationKind,
    pub modifiers: BTreeSet<Modifier>,

    /// Name as written in Java source (eg. `java.util.Map.Entry`)
    pub qualified_name: String,
    pub generic_signature: GenericSignature,

    /// Always `None` for interfaces
    pub super_class: Option<GenericType>,
    pub interfaces: Vec<GenericType>,
    pub static_block: StaticBlock,
    pub fields: Vec<FieldDeclaration>,

    /// Always empty for interfaces
    pub constructors: Vec<ConstructorDeclaration>,
    pub methods: Vec<MethodDeclaration>,

    /// Nested types are never filled in by class analysis
    pub inner_types: Vec<TypeDeclaration>,
}

impl TypeDeclaration {
    pub fn is_interface(&self) -> bool {
        self.kind == DeclarationKind::Interface
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct FieldDeclaration {
    pub modifiers: BTreeSet<Modifier>,
    pub name: String,
    pub field_type: GenericType,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Parameter {
    pub name: String,
    pub parameter_type: GenericType,
}

#[derive(Clone, PartialEq, Debug)]
pub struct MethodDeclaration {
    pub modifiers: BTreeSet<Modifier>,
    pub name: String,
    pub generic_signature: GenericSignature,
    pub parameters: Vec<Parameter>,

    /// `None` is for `void`
    pub return_type: Option<GenericType>,
    pub throws: Vec<GenericType>,

    /// `None` for `abstract` and `native` methods, or when bodies are not replayed
    pub body: Option<Vec<Stmt>>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ConstructorDeclaration {
    pub modifiers: BTreeSet<Modifier>,
    pub generic_signature: GenericSignature,
    pub parameters: Vec<Parameter>,
    pub throws: Vec<GenericType>,
    pub body: Option<Vec<Stmt>>,
}

/// Body of `<clinit>`, concatenated if several are ever found
#[derive(Clone, PartialEq, Debug, Default)]
pub struct StaticBlock {
    pub body: Vec<Stmt>,
}

impl StaticBlock {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
