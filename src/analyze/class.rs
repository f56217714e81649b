use super::{AnalyzedMember, BasicDispatcher, Error, InstructionDispatcher};
use crate::jvm::signatures::parse_full;
use crate::jvm::{
    ClassType, GenericSignature, GenericType, RenderDescriptor, TypeArgument, TypeResolver,
};
use crate::model::{DeclarationKind, StaticBlock, TypeDeclaration};
use crate::tree::ClassNode;

/// Turns decoded classes into declarations
///
/// The analyzer holds no per-class state, so one analyzer can be reused for any number of classes.
/// Types are resolved through the resolver, which is where all caching happens.
pub struct ClassAnalyzer<'a> {
    pub(super) resolver: &'a dyn TypeResolver,
    pub(super) dispatcher: &'a dyn InstructionDispatcher,
    pub(super) replay_bodies: bool,
}

impl<'a> ClassAnalyzer<'a> {
    /// Analyzer replaying method bodies with [`BasicDispatcher`]
    pub fn new(resolver: &'a dyn TypeResolver) -> ClassAnalyzer<'a> {
        ClassAnalyzer::with_dispatcher(resolver, &BasicDispatcher)
    }

    pub fn with_dispatcher(
        resolver: &'a dyn TypeResolver,
        dispatcher: &'a dyn InstructionDispatcher,
    ) -> ClassAnalyzer<'a> {
        ClassAnalyzer {
            resolver,
            dispatcher,
            replay_bodies: true,
        }
    }

    /// Only analyze declarations, leaving every method body out
    pub fn skip_bodies(mut self) -> ClassAnalyzer<'a> {
        self.replay_bodies = false;
        self
    }

    pub fn analyze(&self, class: &ClassNode) -> Result<TypeDeclaration, Error> {
        log::debug!("Analyzing class {}", class.name);

        let modifiers = class.access.modifiers();
        let is_interface = class.is_interface();
        let this_class = self.resolver.resolve(&class.name, is_interface)?;

        let mut super_class: Option<GenericType> = class
            .super_name
            .as_deref()
            .map(|name| self.resolver.resolve_unknown(name).map(GenericType::class))
            .transpose()?;
        let mut interfaces: Vec<GenericType> = class
            .interfaces
            .iter()
            .map(|name| self.resolver.resolve(name, true).map(GenericType::class))
            .collect::<Result<_, _>>()?;

        // Generic signatures are more precise than the class header
        let signature = parse_full(self.resolver, class.signature.as_deref())?;
        if signature.super_type.is_some() {
            super_class = signature.super_type;
        }
        if !signature.interfaces.is_empty() {
            interfaces = signature.interfaces;
        }
        let generic_signature = signature.generic_signature;

        // Type of `this` inside the class: the class applied to its own type variables
        let this_type = GenericType::Class(ClassType {
            class: this_class.clone(),
            arguments: generic_signature
                .variables()
                .iter()
                .map(|variable| TypeArgument::Exact(GenericType::variable(&variable.name)))
                .collect(),
            outer: None,
        });

        let mut constructors = vec![];
        let mut methods = vec![];
        let mut static_block = StaticBlock::default();
        for method in &class.methods {
            match self.analyze_method(&this_type, method)? {
                AnalyzedMember::Constructor(constructor) => constructors.push(constructor),
                AnalyzedMember::Method(method) => methods.push(method),
                AnalyzedMember::StaticBlock(block) => static_block.body.extend(block.body),
            }
        }

        let fields = class
            .fields
            .iter()
            .map(|field| self.analyze_field(field))
            .collect::<Result<_, _>>()?;

        let (kind, declared_super, constructors) = if is_interface {
            (DeclarationKind::Interface, None, vec![])
        } else {
            (DeclarationKind::Class, super_class.clone(), constructors)
        };

        let declaration = TypeDeclaration {
            kind,
            modifiers,
            qualified_name: this_class.canonical_name(),
            generic_signature,
            super_class: declared_super,
            interfaces,
            static_block,
            fields,
            constructors,
            methods,
            inner_types: vec![],
        };

        check_signature(class, &declaration, super_class.as_ref())?;
        Ok(declaration)
    }
}

/// Rebuild the class signature from analyzed types
///
/// Classes whose type parameters, superclass, and interfaces are all non-generic have no
/// signature.
pub fn derive_signature(
    generic_signature: &GenericSignature,
    super_class: Option<&GenericType>,
    interfaces: &[GenericType],
) -> Option<String> {
    let is_generic = !generic_signature.is_empty()
        || super_class.map_or(false, GenericType::is_generic)
        || interfaces.iter().any(GenericType::is_generic);
    if !is_generic {
        return None;
    }

    let mut signature = generic_signature.render();
    if let Some(super_class) = super_class {
        super_class.render_to(&mut signature);
    }
    for interface in interfaces {
        interface.render_to(&mut signature);
    }
    Some(signature)
}

/// Compare the signature in the class file with the one rebuilt from the declaration
///
/// The superclass is passed separately since interface declarations do not record one, even
/// though their signatures do.
fn check_signature(
    class: &ClassNode,
    declaration: &TypeDeclaration,
    super_class: Option<&GenericType>,
) -> Result<(), Error> {
    let expected = class
        .signature
        .as_deref()
        .filter(|signature| !signature.is_empty());
    let actual = derive_signature(
        &declaration.generic_signature,
        super_class,
        &declaration.interfaces,
    );

    if expected != actual.as_deref() {
        log::error!(
            "Signature of {} parsed incorrectly: expected {:?}, got {:?}",
            declaration.qualified_name,
            expected,
            actual
        );
        return Err(Error::SignatureMismatch {
            class: declaration.qualified_name.clone(),
            expected: expected.map(str::to_owned),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{BinaryName, ClassAccessFlags, TypeRef, TypeRegistry};

    fn class(name: &str, signature: Option<&str>) -> ClassNode {
        ClassNode {
            access: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            name: name.to_owned(),
            super_name: Some("java/lang/Object".to_owned()),
            interfaces: vec![],
            signature: signature.map(str::to_owned),
            fields: vec![],
            methods: vec![],
        }
    }

    #[test]
    fn plain_class_has_no_signature() {
        let registry = TypeRegistry::with_java_library();
        let declaration = ClassAnalyzer::new(&registry)
            .analyze(&class("me/alec/Plain", None))
            .unwrap();
        assert_eq!(declaration.kind, DeclarationKind::Class);
        assert_eq!(
            declaration.super_class,
            Some(GenericType::class(TypeRef::class(BinaryName::OBJECT)))
        );
        assert!(declaration.generic_signature.is_empty());
    }

    #[test]
    fn derived_signatures() {
        let object = GenericType::class(TypeRef::class(BinaryName::OBJECT));
        assert_eq!(
            derive_signature(&GenericSignature::empty(), Some(&object), &[]),
            None
        );

        let comparable = GenericType::parameterized(
            TypeRef::interface(BinaryName::COMPARABLE),
            vec![TypeArgument::Exact(GenericType::variable("T"))],
        );
        assert_eq!(
            derive_signature(&GenericSignature::empty(), Some(&object), &[comparable]),
            Some("Ljava/lang/Object;Ljava/lang/Comparable<TT;>;".to_owned())
        );
    }

    #[test]
    fn this_type_carries_type_variables() {
        let registry = TypeRegistry::with_java_library();
        let mut node = class("me/alec/Box", Some("<T:Ljava/lang/Object;>Ljava/lang/Object;"));
        node.methods.push(crate::tree::MethodNode {
            access: crate::jvm::MethodAccessFlags::PUBLIC,
            name: "self".to_owned(),
            descriptor: "()Lme/alec/Box;".to_owned(),
            signature: Some("()Lme/alec/Box<TT;>;".to_owned()),
            instructions: vec![
                crate::tree::Insn::Load(crate::tree::LocalKind::Reference, 0),
                crate::tree::Insn::Return(Some(crate::tree::LocalKind::Reference)),
            ],
            local_variables: vec![],
            max_stack: 1,
            max_locals: 1,
        });

        let declaration = ClassAnalyzer::new(&registry).analyze(&node).unwrap();
        let body = declaration.methods[0].body.as_ref().unwrap();
        match &body[0] {
            crate::model::Stmt::Return(Some(crate::model::Expr::Variable(this))) => {
                assert_eq!(this.name, "this");
                assert_eq!(this.variable_type.render(), "Lme/alec/Box<TT;>;");
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }
}
