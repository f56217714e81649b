use super::{BinaryName, Error, Name};
use elsa::map::FrozenMap;
use std::fmt;

/// A resolved class or interface
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: BinaryName,
    pub is_interface: bool,
}

impl TypeRef {
    pub const fn class(name: BinaryName) -> TypeRef {
        TypeRef {
            name,
            is_interface: false,
        }
    }

    pub const fn interface(name: BinaryName) -> TypeRef {
        TypeRef {
            name,
            is_interface: true,
        }
    }

    /// Name as it would be written in Java source
    pub fn canonical_name(&self) -> String {
        self.name.canonical_name()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_interface { "interface" } else { "class" };
        write!(f, "{} {}", kind, self.name.as_str())
    }
}

/// Capability to turn internal names into types
///
/// Analysis only ever reads through this trait. Implementations that cache must do so behind a
/// shared reference.
pub trait TypeResolver {
    /// Resolve a name whose class/interface kind is known (eg. from a class header)
    fn resolve(&self, internal_name: &str, is_interface: bool) -> Result<TypeRef, Error>;

    /// Resolve a name whose kind is not known (eg. a class named inside a signature)
    fn resolve_unknown(&self, internal_name: &str) -> Result<TypeRef, Error>;
}

/// Interning registry of known types
///
/// Types enter the registry either up front (see [`Self::with_java_library`] and
/// [`Self::register`]) or the first time [`TypeResolver::resolve`] sees them with a known kind.
/// Entries are never removed or replaced, so handing out references while inserting is fine.
pub struct TypeRegistry {
    types: FrozenMap<String, Box<TypeRef>>,

    /// Fail on unknown names instead of assuming they are classes
    strict: bool,
}

impl TypeRegistry {
    /// New empty registry
    pub fn new() -> TypeRegistry {
        TypeRegistry {
            types: FrozenMap::new(),
            strict: false,
        }
    }

    /// New empty registry where [`TypeResolver::resolve_unknown`] fails for unregistered names
    pub fn strict() -> TypeRegistry {
        TypeRegistry {
            types: FrozenMap::new(),
            strict: true,
        }
    }

    /// Registry preloaded with commonly referenced `java.*` types
    pub fn with_java_library() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.insert_java_library_types();
        registry
    }

    /// Add the commonly referenced `java.*` types, with their correct class/interface kind
    pub fn insert_java_library_types(&self) {
        let classes = [
            BinaryName::CLASS,
            BinaryName::ENUM,
            BinaryName::EXCEPTION,
            BinaryName::HASHMAP,
            BinaryName::INTEGER,
            BinaryName::ARRAYLIST,
            BinaryName::NUMBER,
            BinaryName::OBJECT,
            BinaryName::RUNTIMEEXCEPTION,
            BinaryName::STRING,
            BinaryName::THROWABLE,
        ];
        let interfaces = [
            BinaryName::CHARSEQUENCE,
            BinaryName::CLONEABLE,
            BinaryName::COLLECTION,
            BinaryName::COMPARABLE,
            BinaryName::COMPARATOR,
            BinaryName::FUNCTION,
            BinaryName::ITERABLE,
            BinaryName::ITERATOR,
            BinaryName::LIST,
            BinaryName::MAP,
            BinaryName::MAP_ENTRY,
            BinaryName::RUNNABLE,
            BinaryName::SERIALIZABLE,
            BinaryName::SET,
            BinaryName::SUPPLIER,
        ];
        for name in classes {
            self.register(TypeRef::class(name));
        }
        for name in interfaces {
            self.register(TypeRef::interface(name));
        }
    }

    /// Register a type, returning the registered entry
    ///
    /// If the name is already registered, the existing entry wins.
    pub fn register(&self, type_ref: TypeRef) -> &TypeRef {
        match self.types.get(type_ref.name.as_str()) {
            Some(existing) => existing,
            None => {
                let key = type_ref.name.as_str().to_owned();
                self.types.insert(key, Box::new(type_ref))
            }
        }
    }

    /// Look up a registered type
    pub fn get(&self, internal_name: &str) -> Option<&TypeRef> {
        self.types.get(internal_name)
    }
}

impl Default for TypeRegistry {
    fn default() -> TypeRegistry {
        TypeRegistry::new()
    }
}

fn binary_name(internal_name: &str) -> Result<BinaryName, Error> {
    BinaryName::from_string(internal_name.to_owned()).map_err(Error::MalformedName)
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, internal_name: &str, is_interface: bool) -> Result<TypeRef, Error> {
        if let Some(known) = self.get(internal_name) {
            if known.is_interface != is_interface {
                log::debug!(
                    "'{}' registered as {:?} but resolved with is_interface={}",
                    internal_name,
                    known,
                    is_interface
                );
                return Ok(TypeRef {
                    name: known.name.clone(),
                    is_interface,
                });
            }
            return Ok(known.clone());
        }
        let name = binary_name(internal_name)?;
        Ok(self
            .register(TypeRef {
                name,
                is_interface,
            })
            .clone())
    }

    fn resolve_unknown(&self, internal_name: &str) -> Result<TypeRef, Error> {
        if let Some(known) = self.get(internal_name) {
            return Ok(known.clone());
        }
        if self.strict {
            return Err(Error::MissingClass(internal_name.to_owned()));
        }

        // Not cached: a later `resolve` with a known kind should get to register it
        Ok(TypeRef::class(binary_name(internal_name)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn preloaded_kinds() {
        let registry = TypeRegistry::with_java_library();
        assert!(!registry.resolve_unknown("java/lang/Object").unwrap().is_interface);
        assert!(registry.resolve_unknown("java/util/List").unwrap().is_interface);
    }

    #[test]
    fn resolve_registers_kind() {
        let registry = TypeRegistry::new();
        assert!(!registry.resolve_unknown("me/alec/Shape").unwrap().is_interface);
        assert!(registry.resolve("me/alec/Shape", true).unwrap().is_interface);
        assert!(registry.resolve_unknown("me/alec/Shape").unwrap().is_interface);
    }

    #[test]
    fn strict_and_malformed_lookups() {
        let registry = TypeRegistry::strict();
        assert!(matches!(
            registry.resolve_unknown("me/alec/Missing"),
            Err(Error::MissingClass(_))
        ));
        assert!(matches!(
            registry.resolve("me..alec", false),
            Err(Error::MalformedName(_))
        ));
    }
}
