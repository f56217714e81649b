use super::{ConstantPool, Deserialize};
use crate::jvm::Error;
use byteorder::ReadBytesExt;

/// Raw attribute, as found on classes, fields, methods, and `Code`
///
/// Only the attributes analysis cares about get decoded further; everything else is skipped.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug)]
pub struct Attribute {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl Deserialize for Attribute {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let name_index = u16::deserialize(reader)?;

        // Attribute info length is 4 bytes
        let len = u32::deserialize(reader)?;
        let info = super::read_bytes(reader, len as usize)?;
        Ok(Attribute { name_index, info })
    }
}

impl Attribute {
    pub fn name<'p>(&self, constants: &'p ConstantPool) -> Result<&'p str, Error> {
        constants.utf8(self.name_index)
    }

    /// Decode the attribute's contents
    pub fn decode<A: Deserialize>(&self) -> Result<A, Error> {
        A::deserialize(&mut self.info.as_slice())
    }
}

/// Find the first attribute with the given name and decode it
pub fn find_attribute<A: AttributeLike>(
    attributes: &[Attribute],
    constants: &ConstantPool,
) -> Result<Option<A>, Error> {
    for attribute in attributes {
        if attribute.name(constants)? == A::NAME {
            return attribute.decode().map(Some);
        }
    }
    Ok(None)
}

/// Decode every attribute with the given name
pub fn find_attributes<A: AttributeLike>(
    attributes: &[Attribute],
    constants: &ConstantPool,
) -> Result<Vec<A>, Error> {
    let mut found = vec![];
    for attribute in attributes {
        if attribute.name(constants)? == A::NAME {
            found.push(attribute.decode()?);
        }
    }
    Ok(found)
}

/// Attributes which can be decoded out of a raw [`Attribute`]
pub trait AttributeLike: Deserialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.9
pub struct Signature {
    pub signature: u16,
}

impl Deserialize for Signature {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(Signature {
            signature: u16::deserialize(reader)?,
        })
    }
}

impl AttributeLike for Signature {
    const NAME: &'static str = "Signature";
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_array: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Deserialize for Code {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let max_stack = u16::deserialize(reader)?;
        let max_locals = u16::deserialize(reader)?;

        // Code length is 4 bytes
        let code_length = u32::deserialize(reader)?;
        let code_array = super::read_bytes(reader, code_length as usize)?;
        Ok(Code {
            max_stack,
            max_locals,
            code_array,
            exception_table: Vec::deserialize(reader)?,
            attributes: Vec::deserialize(reader)?,
        })
    }
}

impl AttributeLike for Code {
    const NAME: &'static str = "Code";
}

pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,
    pub handler_pc: u16,

    /// Exception class caught, `0` for `finally` blocks
    pub catch_type: u16,
}

impl Deserialize for ExceptionHandler {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(ExceptionHandler {
            start_pc: u16::deserialize(reader)?,
            end_pc: u16::deserialize(reader)?,
            handler_pc: u16::deserialize(reader)?,
            catch_type: u16::deserialize(reader)?,
        })
    }
}

/// Entry of a `LocalVariableTable` or `LocalVariableTypeTable`
///
/// The variable is live for `length` bytes starting at `start_pc`. The type is a descriptor in
/// the first case and a signature in the second.
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub type_index: u16,
    pub index: u16,
}

impl LocalVariable {
    pub fn end_pc(&self) -> u32 {
        self.start_pc as u32 + self.length as u32
    }

    /// Whether the two entries describe the same variable
    pub fn same_variable(&self, other: &LocalVariable) -> bool {
        self.start_pc == other.start_pc
            && self.length == other.length
            && self.index == other.index
            && self.name_index == other.name_index
    }
}

impl Deserialize for LocalVariable {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(LocalVariable {
            start_pc: u16::deserialize(reader)?,
            length: u16::deserialize(reader)?,
            name_index: u16::deserialize(reader)?,
            type_index: u16::deserialize(reader)?,
            index: u16::deserialize(reader)?,
        })
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.13
pub struct LocalVariableTable(pub Vec<LocalVariable>);

impl Deserialize for LocalVariableTable {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(LocalVariableTable(Vec::deserialize(reader)?))
    }
}

impl AttributeLike for LocalVariableTable {
    const NAME: &'static str = "LocalVariableTable";
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.14
pub struct LocalVariableTypeTable(pub Vec<LocalVariable>);

impl Deserialize for LocalVariableTypeTable {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(LocalVariableTypeTable(Vec::deserialize(reader)?))
    }
}

impl AttributeLike for LocalVariableTypeTable {
    const NAME: &'static str = "LocalVariableTypeTable";
}
