use super::{Attribute, ConstantPool, Deserialize};
use crate::jvm::Error;
use byteorder::ReadBytesExt;

/// Raw class file, with everything still pointing into the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.1
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constants: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,

    /// `0` only for `java/lang/Object`
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub const MAGIC: u32 = 0xCAFE_BABE;
}

impl Deserialize for ClassFile {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let magic = u32::deserialize(reader)?;
        if magic != ClassFile::MAGIC {
            return Err(Error::ClassFormat(format!("bad magic number 0x{:08x}", magic)));
        }
        Ok(ClassFile {
            minor_version: u16::deserialize(reader)?,
            major_version: u16::deserialize(reader)?,
            constants: ConstantPool::deserialize(reader)?,
            access_flags: u16::deserialize(reader)?,
            this_class: u16::deserialize(reader)?,
            super_class: u16::deserialize(reader)?,
            interfaces: Vec::deserialize(reader)?,
            fields: Vec::deserialize(reader)?,
            methods: Vec::deserialize(reader)?,
            attributes: Vec::deserialize(reader)?,
        })
    }
}

/// Field or method, which share the same layout
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl Deserialize for MemberInfo {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(MemberInfo {
            access_flags: u16::deserialize(reader)?,
            name_index: u16::deserialize(reader)?,
            descriptor_index: u16::deserialize(reader)?,
            attributes: Vec::deserialize(reader)?,
        })
    }
}
