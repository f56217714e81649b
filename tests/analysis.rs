use classtree::analyze::{
    ClassAnalyzer, Error, InstructionDispatcher, MethodReplay, ReplayError,
};
use classtree::env::FrameError;
use classtree::jvm::*;
use classtree::model::{DeclarationKind, Expr, Literal, Stmt};
use classtree::tree::{ClassNode, FieldNode, FieldOp, Insn, InvokeKind, LocalKind, MethodNode};
use std::cell::Cell;

fn class_node(name: &str, access: ClassAccessFlags, signature: Option<&str>) -> ClassNode {
    ClassNode {
        access,
        name: name.to_owned(),
        super_name: Some("java/lang/Object".to_owned()),
        interfaces: vec![],
        signature: signature.map(str::to_owned),
        fields: vec![],
        methods: vec![],
    }
}

fn method_node(name: &str, access: MethodAccessFlags, descriptor: &str, code: Vec<Insn>) -> MethodNode {
    MethodNode {
        access,
        name: name.to_owned(),
        descriptor: descriptor.to_owned(),
        signature: None,
        instructions: code,
        local_variables: vec![],
        max_stack: 4,
        max_locals: 4,
    }
}

#[test]
fn signature_overrides_header() {
    let registry = TypeRegistry::with_java_library();
    let mut node = class_node(
        "me/alec/Box",
        ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL | ClassAccessFlags::SUPER,
        Some("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<Lme/alec/Box<TT;>;>;"),
    );
    node.interfaces.push("java/lang/Comparable".to_owned());

    let declaration = ClassAnalyzer::new(&registry).analyze(&node).unwrap();
    assert_eq!(declaration.kind, DeclarationKind::Class);
    assert_eq!(declaration.qualified_name, "me.alec.Box");
    assert_eq!(
        declaration.modifiers.into_iter().collect::<Vec<_>>(),
        vec![Modifier::Public, Modifier::Final]
    );
    assert_eq!(declaration.generic_signature.len(), 1);
    assert_eq!(declaration.interfaces.len(), 1);

    match &declaration.interfaces[0] {
        GenericType::Class(comparable) => {
            assert!(comparable.class.is_interface);
            assert_eq!(
                comparable.arguments[0],
                TypeArgument::Exact(GenericType::parameterized(
                    TypeRef::class(BinaryName::from_string("me/alec/Box".to_owned()).unwrap()),
                    vec![TypeArgument::Exact(GenericType::variable("T"))],
                ))
            );
        }
        other => panic!("unexpected interface {:?}", other),
    }
}

#[test]
fn signature_superclass_overrides_header() {
    let registry = TypeRegistry::with_java_library();
    let mut node = class_node(
        "me/alec/Names",
        ClassAccessFlags::PUBLIC,
        Some("Ljava/util/ArrayList<Ljava/lang/String;>;"),
    );
    node.super_name = Some("java/util/ArrayList".to_owned());

    let declaration = ClassAnalyzer::new(&registry).analyze(&node).unwrap();
    let array_list = TypeRef::class(BinaryName::ARRAYLIST);
    let super_class = declaration.super_class.unwrap();
    assert!(super_class.is_parameterized());
    assert_ne!(super_class, GenericType::class(array_list.clone()));
    assert_eq!(
        super_class,
        GenericType::parameterized(
            array_list,
            vec![TypeArgument::Exact(GenericType::class(TypeRef::class(
                BinaryName::STRING
            )))],
        )
    );
    assert!(declaration.interfaces.is_empty());
}

#[test]
fn header_types_without_signature() {
    let registry = TypeRegistry::with_java_library();
    let mut node = class_node("me/alec/Task", ClassAccessFlags::PUBLIC, None);
    node.interfaces.push("java/lang/Runnable".to_owned());
    node.fields.push(FieldNode {
        access: FieldAccessFlags::PRIVATE | FieldAccessFlags::VOLATILE,
        name: "done".to_owned(),
        descriptor: "Z".to_owned(),
        signature: None,
    });

    let declaration = ClassAnalyzer::new(&registry).analyze(&node).unwrap();
    assert_eq!(
        declaration.interfaces,
        vec![GenericType::class(TypeRef::interface(BinaryName::RUNNABLE))]
    );
    assert_eq!(declaration.fields.len(), 1);
    assert_eq!(declaration.fields[0].field_type, GenericType::Base(BaseType::Boolean));
    assert!(declaration.fields[0].modifiers.contains(&Modifier::Volatile));
}

#[test]
fn interfaces_have_no_superclass() {
    let registry = TypeRegistry::with_java_library();
    let mut node = class_node(
        "me/alec/Source",
        ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
        Some("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/function/Supplier<TT;>;"),
    );
    node.interfaces.push("java/util/function/Supplier".to_owned());
    node.fields.push(FieldNode {
        access: FieldAccessFlags::PUBLIC | FieldAccessFlags::STATIC | FieldAccessFlags::FINAL,
        name: "NAME".to_owned(),
        descriptor: "Ljava/lang/String;".to_owned(),
        signature: None,
    });
    node.methods.push(method_node(
        "<clinit>",
        MethodAccessFlags::STATIC,
        "()V",
        vec![
            Insn::Const(classtree::tree::Constant::String("source".to_owned())),
            Insn::Field {
                op: FieldOp::PutStatic,
                owner: "me/alec/Source".to_owned(),
                name: "NAME".to_owned(),
                descriptor: "Ljava/lang/String;".to_owned(),
            },
            Insn::Return(None),
        ],
    ));
    node.methods.push(method_node(
        "get",
        MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
        "()Ljava/lang/Object;",
        vec![],
    ));

    let declaration = ClassAnalyzer::new(&registry).analyze(&node).unwrap();
    assert!(declaration.is_interface());
    assert_eq!(declaration.super_class, None);
    assert!(declaration.constructors.is_empty());
    assert_eq!(declaration.methods.len(), 1);
    assert_eq!(declaration.methods[0].body, None);

    assert_eq!(declaration.static_block.body.len(), 2);
    match &declaration.static_block.body[0] {
        Stmt::FieldStore {
            name,
            target: None,
            value: Expr::Literal(Literal::String(value)),
            ..
        } => {
            assert_eq!(name, "NAME");
            assert_eq!(value, "source");
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn constructor_bodies() {
    let registry = TypeRegistry::with_java_library();
    let mut node = class_node("me/alec/Cell", ClassAccessFlags::PUBLIC, None);
    node.fields.push(FieldNode {
        access: FieldAccessFlags::PRIVATE,
        name: "value".to_owned(),
        descriptor: "J".to_owned(),
        signature: None,
    });
    node.methods.push(method_node(
        "<init>",
        MethodAccessFlags::PUBLIC,
        "(J)V",
        vec![
            Insn::Load(LocalKind::Reference, 0),
            Insn::Invoke {
                kind: InvokeKind::Special,
                owner: "java/lang/Object".to_owned(),
                name: "<init>".to_owned(),
                descriptor: "()V".to_owned(),
            },
            Insn::Load(LocalKind::Reference, 0),
            Insn::Load(LocalKind::Long, 1),
            Insn::Field {
                op: FieldOp::PutField,
                owner: "me/alec/Cell".to_owned(),
                name: "value".to_owned(),
                descriptor: "J".to_owned(),
            },
            Insn::Return(None),
        ],
    ));

    let declaration = ClassAnalyzer::new(&registry).analyze(&node).unwrap();
    assert_eq!(declaration.constructors.len(), 1);
    let constructor = &declaration.constructors[0];
    assert_eq!(constructor.parameters[0].name, "arg0");

    let body = constructor.body.as_ref().unwrap();
    assert_eq!(body.len(), 3);
    assert!(matches!(
        &body[0],
        Stmt::Expr(Expr::Invoke { name, target: Some(_), .. }) if name == "<init>"
    ));
    match &body[1] {
        Stmt::FieldStore {
            target: Some(Expr::Variable(this)),
            value: Expr::Variable(argument),
            ..
        } => {
            assert_eq!(this.name, "this");
            assert_eq!(argument.name, "arg0");
        }
        other => panic!("unexpected statement {:?}", other),
    }
    assert_eq!(body[2], Stmt::Return(None));
}

#[test]
fn stray_signature_suffix_is_a_mismatch() {
    let registry = TypeRegistry::with_java_library();
    let node = class_node(
        "me/alec/Odd",
        ClassAccessFlags::PUBLIC,
        Some("Ljava/lang/Object;Q"),
    );
    match ClassAnalyzer::new(&registry).analyze(&node) {
        Err(Error::SignatureMismatch {
            class,
            expected,
            actual,
        }) => {
            assert_eq!(class, "me.alec.Odd");
            assert_eq!(expected.as_deref(), Some("Ljava/lang/Object;Q"));
            assert_eq!(actual, None);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn truncated_signature_is_a_mismatch() {
    let registry = TypeRegistry::with_java_library();
    let node = class_node(
        "me/alec/Cut",
        ClassAccessFlags::PUBLIC,
        Some("<T:Ljava/lang/Object;>Ljava/util/List<TT;"),
    );
    let result = ClassAnalyzer::new(&registry).analyze(&node);
    assert!(matches!(result, Err(Error::SignatureMismatch { .. })));
}

/// Dispatcher that only counts what it is given
struct CountingDispatcher {
    seen: Cell<usize>,
}

impl InstructionDispatcher for CountingDispatcher {
    fn dispatch(&self, _insn: &Insn, _replay: &mut MethodReplay<'_>) -> Result<(), ReplayError> {
        self.seen.set(self.seen.get() + 1);
        Ok(())
    }
}

/// Dispatcher that closes one stack scope too many
struct UnbalancedDispatcher;

impl InstructionDispatcher for UnbalancedDispatcher {
    fn dispatch(&self, _insn: &Insn, replay: &mut MethodReplay<'_>) -> Result<(), ReplayError> {
        replay.frame.enter_stack();
        replay.frame.exit_stack()?;
        replay.frame.exit_stack()?;
        Ok(())
    }
}

#[test]
fn custom_dispatchers() {
    let registry = TypeRegistry::with_java_library();
    let mut node = class_node("me/alec/Loop", ClassAccessFlags::PUBLIC, None);
    node.methods.push(method_node(
        "spin",
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        "()V",
        vec![Insn::Other(0xa7), Insn::Nop, Insn::Return(None)],
    ));

    let counting = CountingDispatcher { seen: Cell::new(0) };
    let declaration = ClassAnalyzer::with_dispatcher(&registry, &counting)
        .analyze(&node)
        .unwrap();
    assert_eq!(counting.seen.get(), 3);
    assert_eq!(declaration.methods[0].body, Some(vec![]));

    match ClassAnalyzer::with_dispatcher(&registry, &UnbalancedDispatcher).analyze(&node) {
        Err(Error::Frame { method, error }) => {
            assert_eq!(method, "spin");
            assert_eq!(error, FrameError::ExitRootStack);
        }
        other => panic!("unexpected result {:?}", other),
    }

    // The default dispatcher does not know about branches
    assert!(matches!(
        ClassAnalyzer::new(&registry).analyze(&node),
        Err(Error::UnsupportedInstruction { .. })
    ));
    assert!(ClassAnalyzer::new(&registry)
        .skip_bodies()
        .analyze(&node)
        .is_ok());
}
