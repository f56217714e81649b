use classtree::jvm::signatures::{parse_full, parse_method_signature, parse_type_or_var, Cursor};
use classtree::jvm::*;

/// Signatures as `javac` emits them for some familiar JDK classes
const CLASS_SIGNATURES: &[&str] = &[
    // java.util.HashMap
    "<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/util/AbstractMap<TK;TV;>;Ljava/util/Map<TK;TV;>;Ljava/lang/Cloneable;Ljava/io/Serializable;",
    // java.lang.Enum
    "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;Ljava/lang/constant/Constable;Ljava/lang/Comparable<TE;>;Ljava/io/Serializable;",
    // java.util.Collections.UnmodifiableMap.UnmodifiableEntrySet
    "<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/util/Collections$UnmodifiableSet<Ljava/util/Map$Entry<TK;TV;>;>;",
    // java.util.stream.Collectors helper
    "<T:Ljava/lang/Object;A:Ljava/lang/Object;R:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/stream/Collector<TT;TA;TR;>;",
    // java.util.EnumMap
    "<K:Ljava/lang/Enum<TK;>;V:Ljava/lang/Object;>Ljava/util/AbstractMap<TK;TV;>;Ljava/io/Serializable;Ljava/lang/Cloneable;",
    // java.util.concurrent.ConcurrentHashMap.KeySetView
    "<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/util/concurrent/ConcurrentHashMap$CollectionView<TK;TV;TK;>;Ljava/util/Set<TK;>;Ljava/io/Serializable;",
];

#[test]
fn jdk_class_signatures_round_trip() {
    let registry = TypeRegistry::with_java_library();
    for signature in CLASS_SIGNATURES {
        let parsed = parse_full(&registry, Some(*signature)).unwrap();
        assert!(parsed.super_type.is_some(), "no super type in {}", signature);
        assert_eq!(parsed.render(), *signature);
    }
}

#[test]
fn hashmap_signature_structure() {
    let registry = TypeRegistry::with_java_library();
    let parsed = parse_full(&registry, Some(CLASS_SIGNATURES[0])).unwrap();

    let names: Vec<&str> = parsed
        .generic_signature
        .variables()
        .iter()
        .map(|variable| variable.name.as_str())
        .collect();
    assert_eq!(names, vec!["K", "V"]);

    let super_type = parsed.super_type.unwrap();
    assert_eq!(super_type.name(), "java.util.AbstractMap");
    assert_eq!(
        super_type.arguments(),
        &[
            TypeArgument::Exact(GenericType::variable("K")),
            TypeArgument::Exact(GenericType::variable("V")),
        ]
    );

    let interfaces: Vec<String> = parsed.interfaces.iter().map(GenericType::name).collect();
    assert_eq!(
        interfaces,
        vec!["java.util.Map", "java.lang.Cloneable", "java.io.Serializable"]
    );
}

#[test]
fn cursor_is_returned_by_value() {
    let registry = TypeRegistry::new();
    let start = Cursor::new("TK;TV;");

    let (after_first, first) = parse_type_or_var(start, &registry).unwrap();
    let (after_second, second) = parse_type_or_var(after_first, &registry).unwrap();
    assert_eq!(first, Some(GenericType::variable("K")));
    assert_eq!(second, Some(GenericType::variable("V")));
    assert!(after_second.is_at_end());

    // Parsing again from a saved cursor gives the same result
    let (again, first_again) = parse_type_or_var(start, &registry).unwrap();
    assert_eq!(again, after_first);
    assert_eq!(first_again, first);
}

#[test]
fn jdk_method_signatures_round_trip() {
    let registry = TypeRegistry::with_java_library();
    let signatures = [
        // Collections.sort
        "<T::Ljava/lang/Comparable<-TT;>;>(Ljava/util/List<TT;>;)V",
        // Collections.max
        "<T:Ljava/lang/Object;:Ljava/lang/Comparable<-TT;>;>(Ljava/util/Collection<+TT;>;)TT;",
        // Class.getConstructor
        "([Ljava/lang/Class<*>;)Ljava/lang/reflect/Constructor<TT;>;^Ljava/lang/NoSuchMethodException;^Ljava/lang/SecurityException;",
        // Map.Entry.getKey inside an inner class
        "()Ljava/util/Map$Entry<TK;TV;>;",
        // Arrays.fill
        "([JIIJ)V",
    ];
    for signature in signatures {
        let parsed = parse_method_signature(&registry, signature).unwrap();
        assert_eq!(parsed.render(), signature);
    }
}

#[test]
fn resolver_failures_are_errors() {
    let registry = TypeRegistry::strict();
    assert!(matches!(
        parse_full(&registry, Some("Lcom/example/Unknown;")),
        Err(Error::MissingClass(_))
    ));
}
