//! Generic signatures
//!
//! Classes, fields, and methods may carry a `Signature` attribute describing their generic types
//! (the grammar is in [JVMS 4.7.9.1][0]). For a class, the signature is an optional block of type
//! parameters followed by the superclass and then every implemented interface:
//!
//! ```text
//! <K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Map<TK;TV;>;
//! ```
//!
//! The parser is a forward-only recursive descent over a [`Cursor`]. Every sub-parser takes the
//! cursor by value and hands back the advanced cursor along with the parsed value, or `None` if
//! the input ran out before a terminator. Only type resolution failures are errors.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.7.9.1

use super::{BaseType, Error, FieldType, MethodDescriptor, Name, RenderDescriptor};
use super::{TypeRef, TypeResolver};
use crate::util::Width;

/// Position in a signature string
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Cursor<'s> {
    source: &'s str,
    position: usize,
}

impl<'s> Cursor<'s> {
    pub fn new(source: &'s str) -> Cursor<'s> {
        Cursor {
            source,
            position: 0,
        }
    }

    /// Byte offset into the source
    pub fn position(&self) -> usize {
        self.position
    }

    /// Next character, without consuming it
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Skip the next character
    pub fn bump(self) -> Cursor<'s> {
        match self.peek() {
            Some(c) => Cursor {
                position: self.position + c.len_utf8(),
                ..self
            },
            None => self,
        }
    }

    /// Skip the next character if it is `expected`
    pub fn eat(self, expected: char) -> Option<Cursor<'s>> {
        if self.peek() == Some(expected) {
            Some(self.bump())
        } else {
            None
        }
    }

    /// Input that has not been consumed yet
    pub fn rest(&self) -> &'s str {
        &self.source[self.position..]
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Consume characters up to (but excluding) the first one in `terminators`
    fn take_until(self, terminators: &[char]) -> (Cursor<'s>, &'s str) {
        let rest = self.rest();
        let len = rest.find(terminators).unwrap_or(rest.len());
        let taken = &rest[..len];
        (
            Cursor {
                position: self.position + len,
                ..self
            },
            taken,
        )
    }
}

/// Result of a sub-parser: the advanced cursor and the value, if one could be parsed
pub type Parsed<'s, T> = Result<(Cursor<'s>, Option<T>), Error>;

/// Generic type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum GenericType {
    /// Primitive (only inside arrays and method signatures)
    Base(BaseType),

    /// Class or interface, possibly parameterized
    Class(ClassType),

    /// Reference to a type variable, by name
    ///
    /// The name is resolved against the enclosing type parameters by whoever consumes the type.
    Variable(String),

    Array(Box<GenericType>),
}

/// Class or interface type with its type arguments
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ClassType {
    pub class: TypeRef,
    pub arguments: Vec<TypeArgument>,

    /// Enclosing class, when the signature spells out `Outer<..>.Inner`
    pub outer: Option<Box<ClassType>>,
}

/// Argument to a parameterized type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeArgument {
    /// `*`, ie. `?`
    Any,

    /// `+T`, ie. `? extends T`
    Extends(GenericType),

    /// `-T`, ie. `? super T`
    Super(GenericType),

    Exact(GenericType),
}

/// Declared type variable, along with its bounds
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeVariable {
    pub name: String,

    /// `T:Ljava/lang/Number;` has a class bound, `T::Ljava/lang/Runnable;` does not
    pub class_bound: Option<GenericType>,
    pub interface_bounds: Vec<GenericType>,
}

/// Type variables declared on a class or method
///
/// The empty signature means "no generics" (and renders to nothing).
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct GenericSignature(Vec<TypeVariable>);

/// Full signature of a class
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ParsedSignature {
    pub generic_signature: GenericSignature,

    /// `None` when the signature does not spell out a superclass
    pub super_type: Option<GenericType>,
    pub interfaces: Vec<GenericType>,
}

/// Full signature of a method
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MethodSignature {
    pub type_parameters: GenericSignature,
    pub parameters: Vec<GenericType>,

    /// `None` is for `void`
    pub return_type: Option<GenericType>,
    pub throws: Vec<GenericType>,
}

impl GenericType {
    /// Class type with no type arguments
    pub fn class(class: TypeRef) -> GenericType {
        GenericType::Class(ClassType {
            class,
            arguments: vec![],
            outer: None,
        })
    }

    /// Class type applied to some type arguments
    pub fn parameterized(class: TypeRef, arguments: Vec<TypeArgument>) -> GenericType {
        GenericType::Class(ClassType {
            class,
            arguments,
            outer: None,
        })
    }

    pub fn variable(name: impl Into<String>) -> GenericType {
        GenericType::Variable(name.into())
    }

    /// Source-level name: canonical class name, variable name, or primitive keyword
    pub fn name(&self) -> String {
        match self {
            GenericType::Base(base_type) => base_type_keyword(*base_type).to_owned(),
            GenericType::Class(class_type) => class_type.class.canonical_name(),
            GenericType::Variable(name) => name.clone(),
            GenericType::Array(element_type) => format!("{}[]", element_type.name()),
        }
    }

    /// Type arguments, if this is a class type
    pub fn arguments(&self) -> &[TypeArgument] {
        match self {
            GenericType::Class(class_type) => &class_type.arguments,
            _ => &[],
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.arguments().is_empty()
    }

    /// Whether the type can only be expressed with a generic signature
    pub fn is_generic(&self) -> bool {
        match self {
            GenericType::Base(_) => false,
            GenericType::Class(class_type) => class_type.is_generic(),
            GenericType::Variable(_) => true,
            GenericType::Array(element_type) => element_type.is_generic(),
        }
    }

    /// Convert a raw descriptor type
    pub fn from_field_type(
        field_type: &FieldType,
        resolver: &dyn TypeResolver,
    ) -> Result<GenericType, Error> {
        Ok(match field_type {
            FieldType::Base(base_type) => GenericType::Base(*base_type),
            FieldType::Object(name) => {
                GenericType::class(resolver.resolve_unknown(name.as_str())?)
            }
            FieldType::Array(element_type) => GenericType::Array(Box::new(
                GenericType::from_field_type(element_type, resolver)?,
            )),
        })
    }
}

fn base_type_keyword(base_type: BaseType) -> &'static str {
    match base_type {
        BaseType::Byte => "byte",
        BaseType::Char => "char",
        BaseType::Double => "double",
        BaseType::Float => "float",
        BaseType::Int => "int",
        BaseType::Long => "long",
        BaseType::Short => "short",
        BaseType::Boolean => "boolean",
    }
}

impl Width for GenericType {
    fn width(&self) -> usize {
        match self {
            GenericType::Base(base_type) => base_type.width(),
            _ => 1,
        }
    }
}

impl GenericSignature {
    pub fn empty() -> GenericSignature {
        GenericSignature(vec![])
    }

    pub fn new(variables: Vec<TypeVariable>) -> GenericSignature {
        GenericSignature(variables)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn variables(&self) -> &[TypeVariable] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&TypeVariable> {
        self.0.iter().find(|variable| variable.name == name)
    }
}

impl TypeVariable {
    /// `name extends bound`
    pub fn extends(name: impl Into<String>, bound: GenericType) -> TypeVariable {
        TypeVariable {
            name: name.into(),
            class_bound: Some(bound),
            interface_bounds: vec![],
        }
    }
}

impl RenderDescriptor for GenericType {
    fn render_to(&self, write_to: &mut String) {
        match self {
            GenericType::Base(base_type) => base_type.render_to(write_to),
            GenericType::Class(class_type) => class_type.render_to(write_to),
            GenericType::Variable(name) => {
                write_to.push('T');
                write_to.push_str(name);
                write_to.push(';');
            }
            GenericType::Array(element_type) => {
                write_to.push('[');
                element_type.render_to(write_to);
            }
        }
    }
}

impl ClassType {
    pub fn is_generic(&self) -> bool {
        !self.arguments.is_empty() || self.outer.as_ref().map_or(false, |o| o.is_generic())
    }

    /// Everything but the leading `L` and trailing `;`
    fn render_body(&self, write_to: &mut String) {
        let name = self.class.name.as_str();
        match &self.outer {
            Some(outer) => {
                outer.render_body(write_to);
                write_to.push('.');
                let simple_name = name
                    .strip_prefix(outer.class.name.as_str())
                    .and_then(|suffix| suffix.strip_prefix('$'))
                    .unwrap_or(name);
                write_to.push_str(simple_name);
            }
            None => write_to.push_str(name),
        }
        if !self.arguments.is_empty() {
            write_to.push('<');
            for argument in &self.arguments {
                argument.render_to(write_to);
            }
            write_to.push('>');
        }
    }
}

impl RenderDescriptor for ClassType {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('L');
        self.render_body(write_to);
        write_to.push(';');
    }
}

impl RenderDescriptor for TypeArgument {
    fn render_to(&self, write_to: &mut String) {
        match self {
            TypeArgument::Any => write_to.push('*'),
            TypeArgument::Extends(bound) => {
                write_to.push('+');
                bound.render_to(write_to);
            }
            TypeArgument::Super(bound) => {
                write_to.push('-');
                bound.render_to(write_to);
            }
            TypeArgument::Exact(argument) => argument.render_to(write_to),
        }
    }
}

impl RenderDescriptor for TypeVariable {
    fn render_to(&self, write_to: &mut String) {
        write_to.push_str(&self.name);
        write_to.push(':');
        if let Some(bound) = &self.class_bound {
            bound.render_to(write_to);
        }
        for bound in &self.interface_bounds {
            write_to.push(':');
            bound.render_to(write_to);
        }
    }
}

impl RenderDescriptor for GenericSignature {
    fn render_to(&self, write_to: &mut String) {
        if self.is_empty() {
            return;
        }
        write_to.push('<');
        for variable in &self.0 {
            variable.render_to(write_to);
        }
        write_to.push('>');
    }
}

impl RenderDescriptor for ParsedSignature {
    fn render_to(&self, write_to: &mut String) {
        self.generic_signature.render_to(write_to);
        if let Some(super_type) = &self.super_type {
            super_type.render_to(write_to);
        }
        for interface in &self.interfaces {
            interface.render_to(write_to);
        }
    }
}

impl RenderDescriptor for MethodSignature {
    fn render_to(&self, write_to: &mut String) {
        self.type_parameters.render_to(write_to);
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(return_type) => return_type.render_to(write_to),
        }
        for thrown in &self.throws {
            write_to.push('^');
            thrown.render_to(write_to);
        }
    }
}

impl MethodSignature {
    /// Signature equivalent to a raw descriptor
    pub fn from_descriptor(
        descriptor: &MethodDescriptor,
        resolver: &dyn TypeResolver,
    ) -> Result<MethodSignature, Error> {
        Ok(MethodSignature {
            type_parameters: GenericSignature::empty(),
            parameters: descriptor
                .parameters
                .iter()
                .map(|parameter| GenericType::from_field_type(parameter, resolver))
                .collect::<Result<_, _>>()?,
            return_type: descriptor
                .return_type
                .as_ref()
                .map(|return_type| GenericType::from_field_type(return_type, resolver))
                .transpose()?,
            throws: vec![],
        })
    }
}

/// Parse the signature of a class
///
/// A missing or empty signature means "no generics". Otherwise, the type parameter block (if any)
/// is parsed first, then types are parsed one at a time: the first is the superclass and the rest
/// are interfaces. Scanning stops as soon as the rendering of what has been parsed so far is no
/// longer a prefix of the input, or a type fails to parse. Whatever is left over will make the
/// signature fail the round-trip check done after class analysis.
pub fn parse_full(
    resolver: &dyn TypeResolver,
    signature: Option<&str>,
) -> Result<ParsedSignature, Error> {
    let signature = match signature {
        Some(signature) if !signature.is_empty() => signature,
        _ => return Ok(ParsedSignature::default()),
    };

    let generic_signature = if signature.starts_with('<') {
        let (_, parsed) = parse_type_parameters(Cursor::new(signature), resolver)?;
        parsed.unwrap_or_default()
    } else {
        GenericSignature::empty()
    };

    let mut super_type = None;
    let mut interfaces = vec![];
    let mut rendered = generic_signature.render();

    while signature.len() > rendered.len() && signature.starts_with(&rendered) {
        let rest = &signature[rendered.len()..];
        let (_, parsed) = parse_type_or_var(Cursor::new(rest), resolver)?;
        let parsed = match parsed {
            Some(parsed) => parsed,
            None => break,
        };

        parsed.render_to(&mut rendered);
        if super_type.is_none() {
            super_type = Some(parsed);
        } else {
            interfaces.push(parsed);
        }
    }

    log::trace!(
        "Parsed class signature '{}' (super {:?}, {} interfaces)",
        signature,
        super_type,
        interfaces.len()
    );

    Ok(ParsedSignature {
        generic_signature,
        super_type,
        interfaces,
    })
}

/// Parse a standalone type parameter block, or a single type
///
/// A string starting with `<` is read as a block of type parameters. Anything else is read as one
/// type, which is returned wrapped in an anonymous type variable. Missing or malformed input
/// produces the empty signature.
pub fn parse(resolver: &dyn TypeResolver, signature: Option<&str>) -> Result<GenericSignature, Error> {
    let signature = match signature {
        Some(signature) if !signature.is_empty() => signature,
        _ => return Ok(GenericSignature::empty()),
    };
    let cursor = Cursor::new(signature);
    if signature.starts_with('<') {
        let (_, parsed) = parse_type_parameters(cursor, resolver)?;
        Ok(parsed.unwrap_or_default())
    } else {
        let (_, parsed) = parse_type_or_var(cursor, resolver)?;
        Ok(match parsed {
            Some(bound) => GenericSignature(vec![TypeVariable::extends("", bound)]),
            None => GenericSignature::empty(),
        })
    }
}

/// Parse the signature of a field or local variable
pub fn parse_field_signature(
    resolver: &dyn TypeResolver,
    signature: &str,
) -> Result<GenericType, Error> {
    match parse_type_or_var(Cursor::new(signature), resolver)? {
        (cursor, Some(parsed)) if cursor.is_at_end() => Ok(parsed),
        _ => Err(Error::BadSignature(signature.to_owned())),
    }
}

/// Parse the signature of a method
pub fn parse_method_signature(
    resolver: &dyn TypeResolver,
    signature: &str,
) -> Result<MethodSignature, Error> {
    let bad_signature = || Error::BadSignature(signature.to_owned());
    let mut cursor = Cursor::new(signature);

    let type_parameters = if cursor.peek() == Some('<') {
        let (next, parsed) = parse_type_parameters(cursor, resolver)?;
        cursor = next;
        parsed.ok_or_else(bad_signature)?
    } else {
        GenericSignature::empty()
    };

    cursor = cursor.eat('(').ok_or_else(bad_signature)?;
    let mut parameters = vec![];
    loop {
        if let Some(next) = cursor.eat(')') {
            cursor = next;
            break;
        }
        let (next, parsed) = parse_java_type(cursor, resolver)?;
        cursor = next;
        parameters.push(parsed.ok_or_else(bad_signature)?);
    }

    let return_type = match cursor.eat('V') {
        Some(next) => {
            cursor = next;
            None
        }
        None => {
            let (next, parsed) = parse_java_type(cursor, resolver)?;
            cursor = next;
            Some(parsed.ok_or_else(bad_signature)?)
        }
    };

    let mut throws = vec![];
    while let Some(next) = cursor.eat('^') {
        let (next, parsed) = parse_type_or_var(next, resolver)?;
        cursor = next;
        throws.push(parsed.ok_or_else(bad_signature)?);
    }

    if !cursor.is_at_end() {
        return Err(bad_signature());
    }

    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

/// Parse a `<...>` block of type parameters
///
/// The cursor must be on the opening `<`. Each entry is `name:classBound` followed by any number
/// of `:interfaceBound`, and the class bound may be empty.
pub fn parse_type_parameters<'s>(
    cursor: Cursor<'s>,
    resolver: &dyn TypeResolver,
) -> Parsed<'s, GenericSignature> {
    let mut cursor = match cursor.eat('<') {
        Some(cursor) => cursor,
        None => return Ok((cursor, None)),
    };
    let mut variables = vec![];

    loop {
        if let Some(next) = cursor.eat('>') {
            return Ok((next, Some(GenericSignature(variables))));
        }

        let (next, name) = cursor.take_until(&[':', '>']);
        cursor = match next.eat(':') {
            Some(next) if !name.is_empty() => next,
            _ => return Ok((next, None)),
        };

        let class_bound = if cursor.peek() == Some(':') {
            None
        } else {
            let (next, bound) = parse_type_or_var(cursor, resolver)?;
            cursor = next;
            match bound {
                Some(bound) => Some(bound),
                None => return Ok((cursor, None)),
            }
        };

        let mut interface_bounds = vec![];
        while cursor.peek() == Some(':') {
            // `parse_type_or_var` skips the leading `:`
            let (next, bound) = parse_type_or_var(cursor, resolver)?;
            cursor = next;
            match bound {
                Some(bound) => interface_bounds.push(bound),
                None => return Ok((cursor, None)),
            }
        }

        variables.push(TypeVariable {
            name: name.to_owned(),
            class_bound,
            interface_bounds,
        });
    }
}

/// Parse a class type, type variable, or array type
///
/// A single leading `:` is skipped. Running out of input yields `None`.
pub fn parse_type_or_var<'s>(
    cursor: Cursor<'s>,
    resolver: &dyn TypeResolver,
) -> Parsed<'s, GenericType> {
    let cursor = cursor.eat(':').unwrap_or(cursor);
    match cursor.peek() {
        Some('L') => parse_java_class(cursor, resolver),
        Some('T') => Ok(parse_var(cursor)),
        Some('[') => {
            let (cursor, element_type) = parse_java_type(cursor.bump(), resolver)?;
            Ok((cursor, element_type.map(|e| GenericType::Array(Box::new(e)))))
        }
        _ => Ok((cursor, None)),
    }
}

/// Parse any type that can appear in a method signature or as an array element
fn parse_java_type<'s>(cursor: Cursor<'s>, resolver: &dyn TypeResolver) -> Parsed<'s, GenericType> {
    match cursor.peek().and_then(BaseType::from_char) {
        Some(base_type) => Ok((cursor.bump(), Some(GenericType::Base(base_type)))),
        None => parse_type_or_var(cursor, resolver),
    }
}

/// Parse a type argument (inside `<...>` of a class type)
fn parse_type_argument<'s>(
    cursor: Cursor<'s>,
    resolver: &dyn TypeResolver,
) -> Parsed<'s, TypeArgument> {
    if let Some(cursor) = cursor.eat('*') {
        return Ok((cursor, Some(TypeArgument::Any)));
    }
    if let Some(cursor) = cursor.eat('+') {
        let (cursor, bound) = parse_type_or_var(cursor, resolver)?;
        return Ok((cursor, bound.map(TypeArgument::Extends)));
    }
    if let Some(cursor) = cursor.eat('-') {
        let (cursor, bound) = parse_type_or_var(cursor, resolver)?;
        return Ok((cursor, bound.map(TypeArgument::Super)));
    }
    let (cursor, argument) = parse_type_or_var(cursor, resolver)?;
    Ok((cursor, argument.map(TypeArgument::Exact)))
}

/// Parse `Lname<args>.Inner<args>;`
///
/// The cursor must be on the `L`. The trailing `;` is consumed when present; a `>` also ends the
/// type but is left for the enclosing argument list.
///
/// Package segments must be separated with `/`, as in class files. Every `.` starts an inner class
/// (`Lpkg/Outer.Inner;` names `pkg/Outer$Inner`), so a dotted name like `Ljava.util.List;` is read
/// as a chain of inner classes. It still renders back to the same text.
fn parse_java_class<'s>(cursor: Cursor<'s>, resolver: &dyn TypeResolver) -> Parsed<'s, GenericType> {
    let mut cursor = cursor.bump();
    let mut outer: Option<ClassType> = None;

    loop {
        let (next, segment) = cursor.take_until(&[';', '<', '>', '.']);
        cursor = next;
        if cursor.is_at_end() || segment.is_empty() {
            return Ok((cursor, None));
        }

        let class = match &outer {
            Some(outer) => {
                let nested = outer.class.name.nested(segment).map_err(Error::MalformedName)?;
                resolver.resolve_unknown(nested.as_str())?
            }
            None => resolver.resolve_unknown(segment)?,
        };
        let mut class_type = ClassType {
            class,
            arguments: vec![],
            outer: outer.take().map(Box::new),
        };

        if let Some(next) = cursor.eat('<') {
            cursor = next;
            loop {
                let (next, argument) = parse_type_argument(cursor, resolver)?;
                cursor = next;
                match argument {
                    Some(argument) => class_type.arguments.push(argument),
                    None => return Ok((cursor, None)),
                }
                match cursor.peek() {
                    Some('>') => {
                        cursor = cursor.bump();
                        break;
                    }
                    None => return Ok((cursor, None)),
                    Some(_) => (),
                }
            }
        }

        match cursor.peek() {
            Some('.') => {
                cursor = cursor.bump();
                outer = Some(class_type);
            }
            Some(';') => return Ok((cursor.bump(), Some(GenericType::Class(class_type)))),
            Some('>') => return Ok((cursor, Some(GenericType::Class(class_type)))),
            _ => return Ok((cursor, None)),
        }
    }
}

/// Parse `Tname;`
///
/// The cursor must be on the `T`. The trailing `;` is consumed when present.
fn parse_var(cursor: Cursor<'_>) -> (Cursor<'_>, Option<GenericType>) {
    let (cursor, name) = cursor.bump().take_until(&[';', '>']);
    if cursor.is_at_end() || name.is_empty() {
        return (cursor, None);
    }
    let cursor = cursor.eat(';').unwrap_or(cursor);
    (cursor, Some(GenericType::variable(name)))
}
