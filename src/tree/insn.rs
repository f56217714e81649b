//! Instructions as the analyzer sees them
//!
//! This is a coarser view than the raw opcode list:
//!
//!   - constants, loads, stores, and returns are merged across their typed variants and carry a
//!     [`LocalKind`] or [`Constant`] instead
//!
//!   - `wide` never shows up, but instead gets merged into the instruction it modifies
//!
//!   - symbolic references are already resolved out of the constant pool into owned strings
//!
//!   - everything the analyzer has no model for stays around as [`Insn::Other`], so that the
//!     analyzer can report it rather than silently skipping it

use super::Label;
use crate::jvm::{BaseType, FieldType};
use crate::util::Width;

#[derive(Clone, PartialEq, Debug)]
pub enum Insn {
    /// Pseudo-instruction marking a position (for local variable windows)
    Label(Label),
    Nop,
    Const(Constant),
    Load(LocalKind, u16), // covers `iload`, `iload_<n>`, and `wide iload`, etc.
    Store(LocalKind, u16),
    IInc(u16, i16), // covers `iinc` and `wide iinc`
    Arithmetic(ArithmeticOp, LocalKind),
    Negate(LocalKind),
    Pop,
    Pop2,
    Dup,
    Swap,
    New(String),
    CheckCast(String),
    Field {
        op: FieldOp,
        owner: String,
        name: String,
        descriptor: String,
    },
    Invoke {
        kind: InvokeKind,
        owner: String,
        name: String,
        descriptor: String,
    },
    Return(Option<LocalKind>), // `None` is for `return` (ie. void)
    AThrow,

    /// Any other opcode
    Other(u8),
}

impl Insn {
    /// Short human readable name, for diagnostics
    pub fn mnemonic(&self) -> String {
        match self {
            Insn::Label(label) => format!("{:?}", label),
            Insn::Nop => String::from("nop"),
            Insn::Const(constant) => format!("const {:?}", constant),
            Insn::Load(kind, index) => format!("{}load {}", kind.prefix(), index),
            Insn::Store(kind, index) => format!("{}store {}", kind.prefix(), index),
            Insn::IInc(index, amount) => format!("iinc {} {}", index, amount),
            Insn::Arithmetic(op, kind) => format!("{}{:?}", kind.prefix(), op).to_lowercase(),
            Insn::Negate(kind) => format!("{}neg", kind.prefix()),
            Insn::Pop => String::from("pop"),
            Insn::Pop2 => String::from("pop2"),
            Insn::Dup => String::from("dup"),
            Insn::Swap => String::from("swap"),
            Insn::New(class) => format!("new {}", class),
            Insn::CheckCast(class) => format!("checkcast {}", class),
            Insn::Field { op, owner, name, .. } => {
                let op = format!("{:?}", op).to_lowercase();
                format!("{} {}.{}", op, owner, name)
            }
            Insn::Invoke {
                kind, owner, name, ..
            } => {
                let kind = format!("{:?}", kind).to_lowercase();
                format!("invoke{} {}.{}", kind, owner, name)
            }
            Insn::Return(None) => String::from("return"),
            Insn::Return(Some(kind)) => format!("{}return", kind.prefix()),
            Insn::AThrow => String::from("athrow"),
            Insn::Other(opcode) => format!("opcode 0x{:02x}", opcode),
        }
    }
}

/// Constant pushed by `aconst_null`, `iconst_<n>`, `bipush`, `ldc`, and friends
#[derive(Clone, PartialEq, Debug)]
pub enum Constant {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Class(String),
}

impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Computational type of a local variable or stack slot
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum LocalKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl LocalKind {
    /// Kind used to hold a value of the given type
    pub fn for_type(field_type: &FieldType) -> LocalKind {
        match field_type {
            FieldType::Base(BaseType::Long) => LocalKind::Long,
            FieldType::Base(BaseType::Float) => LocalKind::Float,
            FieldType::Base(BaseType::Double) => LocalKind::Double,
            FieldType::Base(_) => LocalKind::Int,
            FieldType::Object(_) | FieldType::Array(_) => LocalKind::Reference,
        }
    }

    fn prefix(&self) -> char {
        match self {
            LocalKind::Int => 'i',
            LocalKind::Long => 'l',
            LocalKind::Float => 'f',
            LocalKind::Double => 'd',
            LocalKind::Reference => 'a',
        }
    }
}

impl Width for LocalKind {
    fn width(&self) -> usize {
        match self {
            LocalKind::Long | LocalKind::Double => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    And,
    Or,
    Xor,
}

impl ArithmeticOp {
    /// Java source operator
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
            ArithmeticOp::Rem => "%",
            ArithmeticOp::Shl => "<<",
            ArithmeticOp::Shr => ">>",
            ArithmeticOp::UShr => ">>>",
            ArithmeticOp::And => "&",
            ArithmeticOp::Or => "|",
            ArithmeticOp::Xor => "^",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldOp {
    GetStatic,
    PutStatic,
    GetField,
    PutField,
}

impl FieldOp {
    pub fn is_static(&self) -> bool {
        matches!(self, FieldOp::GetStatic | FieldOp::PutStatic)
    }

    pub fn is_put(&self) -> bool {
        matches!(self, FieldOp::PutStatic | FieldOp::PutField)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}
