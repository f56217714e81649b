use super::{ClassAnalyzer, Error, MethodReplay};
use crate::env::{EmulatedFrame, FrameError};
use crate::jvm::signatures::{parse_field_signature, parse_method_signature};
use crate::jvm::{
    FieldType, GenericType, MethodSignature, Name, ParseDescriptor, TypeResolver, UnqualifiedName,
};
use crate::model::{
    ConstructorDeclaration, Expr, FieldDeclaration, MethodDeclaration, Parameter, StaticBlock,
    Stmt, VariableAccess,
};
use crate::tree::{FieldNode, Insn, LocalVariableNode, MethodNode};
use crate::util::Width;

/// Result of analyzing one method
///
/// Which case comes out is decided from the method's name alone, before anything is analyzed.
#[derive(Clone, PartialEq, Debug)]
pub enum AnalyzedMember {
    Constructor(ConstructorDeclaration),
    Method(MethodDeclaration),
    StaticBlock(StaticBlock),
}

fn field_type(resolver: &dyn TypeResolver, descriptor: &str) -> Result<GenericType, Error> {
    let parsed = FieldType::parse(descriptor).map_err(|err| {
        crate::jvm::Error::BadDescriptor(format!("{} ({})", descriptor, err))
    })?;
    Ok(GenericType::from_field_type(&parsed, resolver)?)
}

/// Generic type if there is a signature, otherwise the descriptor type
fn declared_type(
    resolver: &dyn TypeResolver,
    descriptor: &str,
    signature: Option<&str>,
) -> Result<GenericType, Error> {
    match signature {
        Some(signature) if !signature.is_empty() => {
            Ok(parse_field_signature(resolver, signature)?)
        }
        _ => field_type(resolver, descriptor),
    }
}

impl<'a> ClassAnalyzer<'a> {
    pub fn analyze_field(&self, field: &FieldNode) -> Result<FieldDeclaration, Error> {
        log::debug!("Analyzing field {}", field.name);
        Ok(FieldDeclaration {
            modifiers: field.access.modifiers(),
            name: field.name.clone(),
            field_type: declared_type(
                self.resolver,
                &field.descriptor,
                field.signature.as_deref(),
            )?,
        })
    }

    /// Full signature of a method, preferring the generic signature when there is one
    fn method_signature(&self, method: &MethodNode) -> Result<MethodSignature, Error> {
        let descriptor = method.parsed_descriptor()?;
        let erased = MethodSignature::from_descriptor(&descriptor, self.resolver)?;
        let signature = match method.signature.as_deref() {
            Some(signature) if !signature.is_empty() => signature,
            _ => return Ok(erased),
        };

        let mut generic = parse_method_signature(self.resolver, signature)?;

        // Synthetic parameters (eg. the outer instance of an inner class) show up only in the
        // descriptor
        if generic.parameters.len() != erased.parameters.len() {
            log::debug!(
                "Signature '{}' of {} disagrees with descriptor '{}' on parameters",
                signature,
                method.name,
                method.descriptor
            );
            generic.parameters = erased.parameters;
        }
        Ok(generic)
    }

    /// Analyze a method into a constructor, a regular method, or the static initializer
    pub fn analyze_method(
        &self,
        this_type: &GenericType,
        method: &MethodNode,
    ) -> Result<AnalyzedMember, Error> {
        log::debug!("Analyzing method {}{}", method.name, method.descriptor);
        let modifiers = method.access.modifiers();
        let signature = self.method_signature(method)?;
        let first_slot: u16 = if method.is_static() { 0 } else { 1 };

        let mut parameters = vec![];
        let mut slot = first_slot;
        for (index, parameter_type) in signature.parameters.iter().enumerate() {
            let name = parameter_name(&method.local_variables, slot)
                .unwrap_or_else(|| format!("arg{}", index));
            parameters.push(Parameter {
                name,
                parameter_type: parameter_type.clone(),
            });
            slot = slot.saturating_add(parameter_type.width() as u16);
        }

        let body = if self.replay_bodies && method.has_body() {
            Some(self.replay(this_type, method, &parameters)?)
        } else {
            None
        };

        Ok(if method.is_constructor() {
            AnalyzedMember::Constructor(ConstructorDeclaration {
                modifiers,
                generic_signature: signature.type_parameters,
                parameters,
                throws: signature.throws,
                body,
            })
        } else if method.is_static_initializer() {
            AnalyzedMember::StaticBlock(StaticBlock {
                body: body.unwrap_or_default(),
            })
        } else {
            AnalyzedMember::Method(MethodDeclaration {
                modifiers,
                name: method.name.clone(),
                generic_signature: signature.type_parameters,
                parameters,
                return_type: signature.return_type,
                throws: signature.throws,
                body,
            })
        })
    }

    /// Replay the bytecode of a method against a fresh frame
    fn replay(
        &self,
        this_type: &GenericType,
        method: &MethodNode,
        parameters: &[Parameter],
    ) -> Result<Vec<Stmt>, Error> {
        let mut frame = EmulatedFrame::new();

        for local in &method.local_variables {
            let variable_type =
                declared_type(self.resolver, &local.descriptor, local.signature.as_deref())?;
            frame.store_info(
                local.index,
                variable_type,
                local.name.clone(),
                Some(local.start),
                Some(local.end),
            );
        }

        let mut slot: u16 = 0;
        if !method.is_static() {
            let this = VariableAccess::new(UnqualifiedName::THIS.as_str(), this_type.clone());
            frame.variables_mut().declare(&this);
            frame.store_access(Expr::Variable(this), 0);
            slot = 1;
        }

        let accesses: Vec<VariableAccess> = parameters
            .iter()
            .map(|parameter| {
                VariableAccess::new(parameter.name.clone(), parameter.parameter_type.clone())
            })
            .collect();
        for access in &accesses {
            frame.variables_mut().declare(access);
        }
        let frame_error = |error: FrameError| Error::Frame {
            method: method.name.clone(),
            error,
        };

        // Wide parameters take two slots, which `store_values` does not account for
        if accesses.iter().all(|access| access.variable_type.width() == 1) {
            frame.store_values(accesses, slot).map_err(frame_error)?;
        } else {
            for access in accesses {
                let width = access.variable_type.width() as u16;
                frame.store(access, slot).map_err(frame_error)?;
                slot = slot
                    .checked_add(width)
                    .ok_or(FrameError::SlotOverflow(slot))
                    .map_err(frame_error)?;
            }
        }

        let mut replay = MethodReplay::new(frame, self.resolver);
        let instructions = &method.instructions;
        for (index, insn) in instructions.iter().enumerate() {
            let next_label = match instructions.get(index + 1) {
                Some(Insn::Label(label)) => Some(*label),
                _ => None,
            };
            replay.set_next_label(next_label);
            self.dispatcher
                .dispatch(insn, &mut replay)
                .map_err(|err| err.in_method(&method.name))?;
        }

        let leftover = replay.frame.stack().len();
        if leftover != 0 {
            log::warn!(
                "Method {}{} ends with {} value(s) left on the operand stack",
                method.name,
                method.descriptor,
                leftover
            );
        }
        Ok(replay.into_body())
    }
}

/// Name of the parameter in `slot`, from the earliest debug window for that slot
fn parameter_name(locals: &[LocalVariableNode], slot: u16) -> Option<String> {
    locals
        .iter()
        .filter(|local| local.index == slot)
        .min_by_key(|local| local.start)
        .map(|local| local.name.clone())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{BaseType, BinaryName, MethodAccessFlags, TypeRef, TypeRegistry};
    use crate::tree::{Label, LocalKind};

    fn method(name: &str, access: MethodAccessFlags, descriptor: &str) -> MethodNode {
        MethodNode {
            access,
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            signature: None,
            instructions: vec![],
            local_variables: vec![],
            max_stack: 2,
            max_locals: 4,
        }
    }

    fn this_type() -> GenericType {
        GenericType::class(TypeRef::class(BinaryName::OBJECT))
    }

    #[test]
    fn member_kinds_follow_names() {
        let registry = TypeRegistry::with_java_library();
        let analyzer = ClassAnalyzer::new(&registry).skip_bodies();
        let this = this_type();

        let init = method("<init>", MethodAccessFlags::PUBLIC, "()V");
        let clinit = method("<clinit>", MethodAccessFlags::STATIC, "()V");
        let run = method("run", MethodAccessFlags::PUBLIC, "()V");
        assert!(matches!(
            analyzer.analyze_method(&this, &init),
            Ok(AnalyzedMember::Constructor(_))
        ));
        assert!(matches!(
            analyzer.analyze_method(&this, &clinit),
            Ok(AnalyzedMember::StaticBlock(_))
        ));
        assert!(matches!(
            analyzer.analyze_method(&this, &run),
            Ok(AnalyzedMember::Method(_))
        ));
    }

    #[test]
    fn wide_parameters_and_debug_names() {
        let registry = TypeRegistry::with_java_library();
        let analyzer = ClassAnalyzer::new(&registry);

        // static long add(long a, int b) { return a + b; } (with only `b` named)
        let mut add = method(
            "add",
            MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            "(JI)J",
        );
        add.local_variables.push(LocalVariableNode {
            name: "b".to_owned(),
            descriptor: "I".to_owned(),
            signature: None,
            start: Label(0),
            end: Label(1),
            index: 2,
        });
        add.instructions = vec![
            Insn::Label(Label(0)),
            Insn::Load(LocalKind::Long, 0),
            Insn::Load(LocalKind::Int, 2),
            Insn::Other(0x85), // i2l
            Insn::Label(Label(1)),
        ];

        match analyzer.analyze_method(&this_type(), &add) {
            Err(Error::UnsupportedInstruction { method, .. }) => assert_eq!(method, "add"),
            other => panic!("unexpected result {:?}", other),
        }

        let analyzer = analyzer.skip_bodies();
        match analyzer.analyze_method(&this_type(), &add) {
            Ok(AnalyzedMember::Method(declaration)) => {
                let names: Vec<&str> =
                    declaration.parameters.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["arg0", "b"]);
                assert_eq!(
                    declaration.return_type,
                    Some(GenericType::Base(BaseType::Long))
                );
                assert_eq!(declaration.body, None);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn bodies_are_replayed() {
        let registry = TypeRegistry::with_java_library();
        let analyzer = ClassAnalyzer::new(&registry);

        // int first(int x, long y, int z) { return z; }
        let mut first = method("first", MethodAccessFlags::PUBLIC, "(IJI)I");
        first.instructions = vec![
            Insn::Load(LocalKind::Int, 4),
            Insn::Return(Some(LocalKind::Int)),
        ];
        match analyzer.analyze_method(&this_type(), &first) {
            Ok(AnalyzedMember::Method(declaration)) => {
                let z = VariableAccess::new("arg2", GenericType::Base(BaseType::Int));
                assert_eq!(
                    declaration.body,
                    Some(vec![Stmt::Return(Some(Expr::Variable(z)))])
                );
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn abstract_methods_have_no_body() {
        let registry = TypeRegistry::with_java_library();
        let analyzer = ClassAnalyzer::new(&registry);
        let mut get = method(
            "get",
            MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            "()Ljava/lang/Object;",
        );
        get.signature = Some("()TT;".to_owned());
        match analyzer.analyze_method(&this_type(), &get) {
            Ok(AnalyzedMember::Method(declaration)) => {
                assert_eq!(declaration.body, None);
                assert_eq!(declaration.return_type, Some(GenericType::variable("T")));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn field_signatures_win() {
        let registry = TypeRegistry::with_java_library();
        let analyzer = ClassAnalyzer::new(&registry);
        let field = FieldNode {
            access: crate::jvm::FieldAccessFlags::PRIVATE,
            name: "items".to_owned(),
            descriptor: "Ljava/util/List;".to_owned(),
            signature: Some("Ljava/util/List<TT;>;".to_owned()),
        };
        let declaration = analyzer.analyze_field(&field).unwrap();
        assert!(declaration.field_type.is_parameterized());

        let broken = FieldNode {
            signature: Some("Ljava/util/List<TT;".to_owned()),
            ..field
        };
        assert!(matches!(
            analyzer.analyze_field(&broken),
            Err(Error::Jvm(crate::jvm::Error::BadSignature(_)))
        ));
    }
}
