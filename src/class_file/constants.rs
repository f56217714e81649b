use super::Deserialize;
use crate::jvm::Error;
use crate::tree;
use byteorder::ReadBytesExt;

/// Entry in the constant pool
///
/// Indices into the pool are kept raw, and only looked up when a [`ConstantPool`] accessor is used.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Clone, PartialEq, Debug)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),

    /// Index 0, and the slot following a `Long` or `Double`
    Unusable,
}

impl Constant {
    /// Number of pool slots taken up
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

impl Deserialize for Constant {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let tag = u8::deserialize(reader)?;
        Ok(match tag {
            1 => {
                let len = u16::deserialize(reader)?;
                let bytes = super::read_bytes(reader, len as usize)?;
                Constant::Utf8(decode_modified_utf8(&bytes)?)
            }
            3 => Constant::Integer(i32::deserialize(reader)?),
            4 => Constant::Float(f32::deserialize(reader)?),
            5 => Constant::Long(i64::deserialize(reader)?),
            6 => Constant::Double(f64::deserialize(reader)?),
            7 => Constant::Class(u16::deserialize(reader)?),
            8 => Constant::String(u16::deserialize(reader)?),
            9 => Constant::FieldRef {
                class: u16::deserialize(reader)?,
                name_and_type: u16::deserialize(reader)?,
            },
            10 => Constant::MethodRef {
                class: u16::deserialize(reader)?,
                name_and_type: u16::deserialize(reader)?,
            },
            11 => Constant::InterfaceMethodRef {
                class: u16::deserialize(reader)?,
                name_and_type: u16::deserialize(reader)?,
            },
            12 => Constant::NameAndType {
                name: u16::deserialize(reader)?,
                descriptor: u16::deserialize(reader)?,
            },
            15 => Constant::MethodHandle {
                kind: u8::deserialize(reader)?,
                reference: u16::deserialize(reader)?,
            },
            16 => Constant::MethodType(u16::deserialize(reader)?),
            17 => Constant::Dynamic {
                bootstrap: u16::deserialize(reader)?,
                name_and_type: u16::deserialize(reader)?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap: u16::deserialize(reader)?,
                name_and_type: u16::deserialize(reader)?,
            },
            19 => Constant::Module(u16::deserialize(reader)?),
            20 => Constant::Package(u16::deserialize(reader)?),
            _ => return Err(Error::ClassFormat(format!("unknown constant tag {}", tag))),
        })
    }
}

/// Decode the "modified UTF-8" used in class files
///
/// This differs from UTF-8 in that `\0` is encoded on two bytes and supplementary characters are
/// encoded as surrogate pairs, with each surrogate taking three bytes.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, Error> {
    let malformed = || Error::ClassFormat(format!("malformed modified UTF-8 {:?}", bytes));
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();

    while let Some(b0) = iter.next() {
        let unit = if b0 & 0x80 == 0 {
            b0 as u16
        } else if b0 & 0xe0 == 0xc0 {
            let b1 = iter.next().ok_or_else(malformed)?;
            ((b0 as u16 & 0x1f) << 6) | (b1 as u16 & 0x3f)
        } else if b0 & 0xf0 == 0xe0 {
            let b1 = iter.next().ok_or_else(malformed)?;
            let b2 = iter.next().ok_or_else(malformed)?;
            ((b0 as u16 & 0x0f) << 12) | ((b1 as u16 & 0x3f) << 6) | (b2 as u16 & 0x3f)
        } else {
            return Err(malformed());
        };
        units.push(unit);
    }

    String::from_utf16(&units).map_err(|_| malformed())
}

/// Constant pool of a class file, indexed from 1
#[derive(Clone, Debug)]
pub struct ConstantPool {
    constants: Vec<Constant>,
}

impl Deserialize for ConstantPool {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let count = u16::deserialize(reader)? as usize;
        let mut constants = vec![Constant::Unusable];
        while constants.len() < count {
            let constant = Constant::deserialize(reader)?;
            let width = constant.width();
            constants.push(constant);
            if width == 2 {
                constants.push(Constant::Unusable);
            }
        }
        Ok(ConstantPool { constants })
    }
}

impl ConstantPool {
    pub fn get(&self, index: u16) -> Result<&Constant, Error> {
        match self.constants.get(index as usize) {
            Some(Constant::Unusable) | None => Err(Error::ClassFormat(format!(
                "invalid constant pool index {}",
                index
            ))),
            Some(constant) => Ok(constant),
        }
    }

    fn unexpected(&self, index: u16, expected: &str) -> Error {
        Error::ClassFormat(format!(
            "constant pool index {} is not a {} constant",
            index, expected
        ))
    }

    pub fn utf8(&self, index: u16) -> Result<&str, Error> {
        match self.get(index)? {
            Constant::Utf8(string) => Ok(string),
            _ => Err(self.unexpected(index, "UTF-8")),
        }
    }

    /// Internal name (or array descriptor) of a `Class` constant
    pub fn class_name(&self, index: u16) -> Result<&str, Error> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8(*name),
            _ => Err(self.unexpected(index, "class")),
        }
    }

    /// Owner, name, and descriptor of a field or method reference
    pub fn member_ref(&self, index: u16) -> Result<(&str, &str, &str), Error> {
        let (class, name_and_type) = match self.get(index)? {
            Constant::FieldRef {
                class,
                name_and_type,
            }
            | Constant::MethodRef {
                class,
                name_and_type,
            }
            | Constant::InterfaceMethodRef {
                class,
                name_and_type,
            } => (*class, *name_and_type),
            _ => return Err(self.unexpected(index, "member reference")),
        };
        match self.get(name_and_type)? {
            Constant::NameAndType { name, descriptor } => Ok((
                self.class_name(class)?,
                self.utf8(*name)?,
                self.utf8(*descriptor)?,
            )),
            _ => Err(self.unexpected(name_and_type, "name and type")),
        }
    }

    /// Constant loaded by `ldc`, if it is one that analysis models
    pub fn loadable(&self, index: u16) -> Result<Option<tree::Constant>, Error> {
        Ok(Some(match self.get(index)? {
            Constant::Integer(i) => tree::Constant::Int(*i),
            Constant::Float(f) => tree::Constant::Float(*f),
            Constant::Long(l) => tree::Constant::Long(*l),
            Constant::Double(d) => tree::Constant::Double(*d),
            Constant::String(string) => tree::Constant::String(self.utf8(*string)?.to_owned()),
            Constant::Class(_) => tree::Constant::Class(self.class_name(index)?.to_owned()),
            _ => return Ok(None),
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn modified_utf8() {
        assert_eq!(decode_modified_utf8(b"hello").unwrap(), "hello");
        assert_eq!(decode_modified_utf8(&[0xc0, 0x80]).unwrap(), "\0");
        assert_eq!(decode_modified_utf8(&[0xc3, 0xa9]).unwrap(), "é");

        // U+1F600 as a surrogate pair
        let smiley = [0xed, 0xa0, 0xbd, 0xed, 0xb8, 0x80];
        assert_eq!(decode_modified_utf8(&smiley).unwrap(), "\u{1F600}");

        assert!(decode_modified_utf8(&[0xe0, 0x80]).is_err());
        assert!(decode_modified_utf8(&[0xff]).is_err());
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let bytes: &[u8] = &[
            0x00, 0x05, // count
            0x05, 0, 0, 0, 0, 0, 0, 0, 7, // long 7
            0x01, 0x00, 0x01, b'A', // utf8 "A"
            0x07, 0x00, 0x03, // class #3
        ];
        let pool = ConstantPool::deserialize(&mut &bytes[..]).unwrap();
        assert!(matches!(pool.get(1), Ok(Constant::Long(7))));
        assert!(pool.get(2).is_err());
        assert_eq!(pool.class_name(4).unwrap(), "A");
        assert!(pool.utf8(4).is_err());
        assert!(pool.get(0).is_err());
        assert!(pool.get(5).is_err());
    }
}
