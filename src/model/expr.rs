use crate::jvm::{GenericType, TypeRef};
use crate::tree::{ArithmeticOp, InvokeKind, LocalKind};
use crate::util::Width;

/// Read or write of a named local variable
#[derive(Clone, PartialEq, Debug)]
pub struct VariableAccess {
    pub name: String,
    pub variable_type: GenericType,
}

impl VariableAccess {
    pub fn new(name: impl Into<String>, variable_type: GenericType) -> VariableAccess {
        VariableAccess {
            name: name.into(),
            variable_type,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),

    /// `Foo.class`
    Class(GenericType),
}

/// Expression recovered from the operand stack
#[derive(Clone, PartialEq, Debug)]
pub enum Expr {
    Variable(VariableAccess),
    Literal(Literal),
    Binary {
        op: ArithmeticOp,
        kind: LocalKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Negate {
        kind: LocalKind,
        value: Box<Expr>,
    },
    Cast {
        target: GenericType,
        value: Box<Expr>,
    },
    FieldAccess {
        owner: TypeRef,

        /// `None` for static fields
        target: Option<Box<Expr>>,
        name: String,
        field_type: GenericType,
    },
    Invoke {
        kind: InvokeKind,
        owner: TypeRef,

        /// `None` for static methods
        target: Option<Box<Expr>>,
        name: String,
        arguments: Vec<Expr>,

        /// `None` is for `void`
        return_type: Option<GenericType>,
    },
    New {
        class: TypeRef,
        arguments: Vec<Expr>,
    },

    /// Result of `new` whose constructor has not been called yet
    ///
    /// Every copy of it on the stack shares the same `id`, so that the `<init>` call can replace
    /// them all with the constructed [`Expr::New`].
    Uninitialized { class: TypeRef, id: u32 },
}

impl Expr {
    pub fn variable(name: impl Into<String>, variable_type: GenericType) -> Expr {
        Expr::Variable(VariableAccess::new(name, variable_type))
    }

    /// Variable access, if this expression is one
    pub fn as_variable(&self) -> Option<&VariableAccess> {
        match self {
            Expr::Variable(access) => Some(access),
            _ => None,
        }
    }
}

/// Number of operand stack slots the expression's value takes
impl Width for Expr {
    fn width(&self) -> usize {
        match self {
            Expr::Variable(access) => access.variable_type.width(),
            Expr::Literal(Literal::Long(_) | Literal::Double(_)) => 2,
            Expr::Literal(_) => 1,
            Expr::Binary { kind, .. } | Expr::Negate { kind, .. } => kind.width(),
            Expr::Cast { target, .. } => target.width(),
            Expr::FieldAccess { field_type, .. } => field_type.width(),
            Expr::Invoke { return_type, .. } => return_type.as_ref().map_or(0, Width::width),
            Expr::New { .. } | Expr::Uninitialized { .. } => 1,
        }
    }
}

/// Statement recovered from a method body
#[derive(Clone, PartialEq, Debug)]
pub enum Stmt {
    /// First store to a variable: `Type name = value;`
    Define {
        variable: VariableAccess,
        value: Expr,
    },

    /// Later stores: `name = value;`
    Assign {
        variable: VariableAccess,
        value: Expr,
    },

    /// `name += amount;`
    Increment {
        variable: VariableAccess,
        amount: i16,
    },
    FieldStore {
        owner: TypeRef,
        target: Option<Expr>,
        name: String,
        value: Expr,
    },

    /// Expression evaluated for its side effects (eg. a `void` call)
    Expr(Expr),
    Return(Option<Expr>),
    Throw(Expr),
}
