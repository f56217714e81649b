//! Decoding of bytecode arrays into [`Insn`]s
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-6.html#jvms-6.5

use super::{ConstantPool, Deserialize};
use crate::jvm::Error;
use crate::tree::{ArithmeticOp, Constant, FieldOp, Insn, InvokeKind, Label, LocalKind};
use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;

/// Kinds in the order typed opcodes come in (`iload`, `lload`, `fload`, `dload`, `aload`)
const KINDS: [LocalKind; 5] = [
    LocalKind::Int,
    LocalKind::Long,
    LocalKind::Float,
    LocalKind::Double,
    LocalKind::Reference,
];

/// Operators of `ishl` through `lxor`, which alternate between `int` and `long`
const BITWISE: [ArithmeticOp; 6] = [
    ArithmeticOp::Shl,
    ArithmeticOp::Shr,
    ArithmeticOp::UShr,
    ArithmeticOp::And,
    ArithmeticOp::Or,
    ArithmeticOp::Xor,
];

const ARITHMETIC: [ArithmeticOp; 5] = [
    ArithmeticOp::Add,
    ArithmeticOp::Sub,
    ArithmeticOp::Mul,
    ArithmeticOp::Div,
    ArithmeticOp::Rem,
];

type CodeReader<'c> = Cursor<&'c [u8]>;

/// Decode a bytecode array, keeping the offset of every instruction
pub fn decode_instructions(
    code: &[u8],
    constants: &ConstantPool,
) -> Result<Vec<(u32, Insn)>, Error> {
    let mut reader: CodeReader = Cursor::new(code);
    let mut decoded = vec![];
    while (reader.position() as usize) < code.len() {
        let offset = reader.position() as u32;
        let opcode = u8::deserialize(&mut reader)?;
        let insn = decode_instruction(opcode, &mut reader, constants)?;
        decoded.push((offset, insn));
    }
    Ok(decoded)
}

/// Interleave labels at the given offsets with decoded instructions
///
/// Labels are numbered in increasing offset order. A boundary that falls inside an instruction is
/// placed before the next instruction, and boundaries at or past the end come last.
pub fn insert_labels(
    decoded: Vec<(u32, Insn)>,
    boundaries: &BTreeSet<u32>,
) -> (Vec<Insn>, HashMap<u32, Label>) {
    let mut labels = HashMap::new();
    let mut next_label = Label::START;
    for offset in boundaries {
        labels.insert(*offset, next_label);
        next_label = next_label.next();
    }

    let mut instructions = Vec::with_capacity(decoded.len() + boundaries.len());
    let mut pending = boundaries.iter().peekable();
    for (offset, insn) in decoded {
        while let Some(boundary) = pending.next_if(|boundary| **boundary <= offset) {
            instructions.push(Insn::Label(labels[boundary]));
        }
        instructions.push(insn);
    }
    for boundary in pending {
        instructions.push(Insn::Label(labels[boundary]));
    }

    (instructions, labels)
}

fn skip(reader: &mut CodeReader<'_>, count: u64) -> Result<(), Error> {
    let target = reader.position() + count;
    if target > reader.get_ref().len() as u64 {
        return Err(Error::ClassFormat(String::from("truncated instruction")));
    }
    reader.set_position(target);
    Ok(())
}

/// Skip the 0-3 bytes padding `tableswitch` and `lookupswitch` operands to a multiple of 4
fn skip_switch_padding(reader: &mut CodeReader<'_>) -> Result<(), Error> {
    let padding = (4 - reader.position() % 4) % 4;
    skip(reader, padding)
}

/// Bytes of operands for opcodes decoded as [`Insn::Other`]
fn operand_length(opcode: u8) -> u64 {
    match opcode {
        0xa9 | 0xbc => 1,                                  // ret, newarray
        0x99..=0xa8 | 0xbd | 0xc1 | 0xc6 | 0xc7 => 2,      // branches, anewarray, instanceof
        0xc5 => 3,                                         // multianewarray
        0xba | 0xc8 | 0xc9 => 4,                           // invokedynamic, goto_w, jsr_w
        _ => 0,
    }
}

fn decode_instruction(
    opcode: u8,
    reader: &mut CodeReader<'_>,
    constants: &ConstantPool,
) -> Result<Insn, Error> {
    let kind_at = |base: u8| KINDS[(opcode - base) as usize];

    Ok(match opcode {
        0x00 => Insn::Nop,
        0x01 => Insn::Const(Constant::Null),
        0x02..=0x08 => Insn::Const(Constant::Int(opcode as i32 - 0x03)),
        0x09..=0x0a => Insn::Const(Constant::Long((opcode - 0x09) as i64)),
        0x0b..=0x0d => Insn::Const(Constant::Float((opcode - 0x0b) as f32)),
        0x0e..=0x0f => Insn::Const(Constant::Double((opcode - 0x0e) as f64)),
        0x10 => Insn::Const(Constant::Int(i8::deserialize(reader)? as i32)),
        0x11 => Insn::Const(Constant::Int(i16::deserialize(reader)? as i32)),
        0x12..=0x14 => {
            let index = if opcode == 0x12 {
                u8::deserialize(reader)? as u16
            } else {
                u16::deserialize(reader)?
            };
            match constants.loadable(index)? {
                Some(constant) => Insn::Const(constant),
                None => Insn::Other(opcode),
            }
        }

        0x15..=0x19 => Insn::Load(kind_at(0x15), u8::deserialize(reader)? as u16),
        0x1a..=0x2d => {
            let n = opcode - 0x1a;
            Insn::Load(KINDS[(n / 4) as usize], (n % 4) as u16)
        }
        0x36..=0x3a => Insn::Store(kind_at(0x36), u8::deserialize(reader)? as u16),
        0x3b..=0x4e => {
            let n = opcode - 0x3b;
            Insn::Store(KINDS[(n / 4) as usize], (n % 4) as u16)
        }

        0x57 => Insn::Pop,
        0x58 => Insn::Pop2,
        0x59 => Insn::Dup,
        0x5f => Insn::Swap,

        0x60..=0x73 => {
            let n = opcode - 0x60;
            Insn::Arithmetic(ARITHMETIC[(n / 4) as usize], KINDS[(n % 4) as usize])
        }
        0x74..=0x77 => Insn::Negate(kind_at(0x74)),
        0x78..=0x83 => {
            let n = opcode - 0x78;
            let kind = if n % 2 == 0 {
                LocalKind::Int
            } else {
                LocalKind::Long
            };
            Insn::Arithmetic(BITWISE[(n / 2) as usize], kind)
        }
        0x84 => {
            let index = u8::deserialize(reader)? as u16;
            let amount = i8::deserialize(reader)? as i16;
            Insn::IInc(index, amount)
        }

        0xaa => {
            skip_switch_padding(reader)?;
            let _default = i32::deserialize(reader)?;
            let low = i32::deserialize(reader)?;
            let high = i32::deserialize(reader)?;
            if high < low {
                return Err(Error::ClassFormat(format!(
                    "tableswitch with low {} above high {}",
                    low, high
                )));
            }
            skip(reader, (high as i64 - low as i64 + 1) as u64 * 4)?;
            Insn::Other(opcode)
        }
        0xab => {
            skip_switch_padding(reader)?;
            let _default = i32::deserialize(reader)?;
            let pairs = i32::deserialize(reader)?;
            if pairs < 0 {
                return Err(Error::ClassFormat(format!(
                    "lookupswitch with {} pairs",
                    pairs
                )));
            }
            skip(reader, pairs as u64 * 8)?;
            Insn::Other(opcode)
        }

        0xac..=0xb0 => Insn::Return(Some(kind_at(0xac))),
        0xb1 => Insn::Return(None),

        0xb2..=0xb5 => {
            let (owner, name, descriptor) = constants.member_ref(u16::deserialize(reader)?)?;
            let op = match opcode {
                0xb2 => FieldOp::GetStatic,
                0xb3 => FieldOp::PutStatic,
                0xb4 => FieldOp::GetField,
                _ => FieldOp::PutField,
            };
            Insn::Field {
                op,
                owner: owner.to_owned(),
                name: name.to_owned(),
                descriptor: descriptor.to_owned(),
            }
        }
        0xb6..=0xb9 => {
            let (owner, name, descriptor) = constants.member_ref(u16::deserialize(reader)?)?;
            let kind = match opcode {
                0xb6 => InvokeKind::Virtual,
                0xb7 => InvokeKind::Special,
                0xb8 => InvokeKind::Static,
                _ => {
                    // Argument count and a zero byte
                    skip(reader, 2)?;
                    InvokeKind::Interface
                }
            };
            Insn::Invoke {
                kind,
                owner: owner.to_owned(),
                name: name.to_owned(),
                descriptor: descriptor.to_owned(),
            }
        }

        0xbb => Insn::New(constants.class_name(u16::deserialize(reader)?)?.to_owned()),
        0xbf => Insn::AThrow,
        0xc0 => Insn::CheckCast(constants.class_name(u16::deserialize(reader)?)?.to_owned()),

        0xc4 => {
            let modified = u8::deserialize(reader)?;
            let index = u16::deserialize(reader)?;
            match modified {
                0x15..=0x19 => Insn::Load(KINDS[(modified - 0x15) as usize], index),
                0x36..=0x3a => Insn::Store(KINDS[(modified - 0x36) as usize], index),
                0x84 => Insn::IInc(index, i16::deserialize(reader)?),
                0xa9 => Insn::Other(modified),
                _ => {
                    return Err(Error::ClassFormat(format!(
                        "opcode 0x{:02x} cannot be wide",
                        modified
                    )))
                }
            }
        }

        0x00..=0xc9 => {
            skip(reader, operand_length(opcode))?;
            Insn::Other(opcode)
        }
        _ => {
            return Err(Error::ClassFormat(format!(
                "invalid opcode 0x{:02x}",
                opcode
            )))
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn empty_pool() -> ConstantPool {
        ConstantPool::deserialize(&mut &[0u8, 1][..]).unwrap()
    }

    fn decode(code: &[u8]) -> Vec<Insn> {
        decode_instructions(code, &empty_pool())
            .unwrap()
            .into_iter()
            .map(|(_, insn)| insn)
            .collect()
    }

    #[test]
    fn locals_and_arithmetic() {
        let code = [
            0x1b, // iload_1
            0x1c, // iload_2
            0x60, // iadd
            0x3e, // istore_3
            0x20, // lload_2
            0x7d, // lushr
            0xc4, 0x36, 0x01, 0x00, // wide istore 256
            0x84, 0x03, 0xff, // iinc 3 -1
            0xb1, // return
        ];
        assert_eq!(
            decode(&code),
            vec![
                Insn::Load(LocalKind::Int, 1),
                Insn::Load(LocalKind::Int, 2),
                Insn::Arithmetic(ArithmeticOp::Add, LocalKind::Int),
                Insn::Store(LocalKind::Int, 3),
                Insn::Load(LocalKind::Long, 2),
                Insn::Arithmetic(ArithmeticOp::UShr, LocalKind::Long),
                Insn::Store(LocalKind::Int, 256),
                Insn::IInc(3, -1),
                Insn::Return(None),
            ]
        );
    }

    #[test]
    fn constants() {
        let code = [0x02, 0x08, 0x0a, 0x10, 0x80, 0x11, 0x01, 0x00, 0x01];
        assert_eq!(
            decode(&code),
            vec![
                Insn::Const(Constant::Int(-1)),
                Insn::Const(Constant::Int(5)),
                Insn::Const(Constant::Long(1)),
                Insn::Const(Constant::Int(-128)),
                Insn::Const(Constant::Int(256)),
                Insn::Const(Constant::Null),
            ]
        );
    }

    #[test]
    fn unsupported_opcodes_skip_operands() {
        let code = [
            0x99, 0x00, 0x05, // ifeq +5
            0x00, // nop
            0xaa, // tableswitch at offset 4, padded to 8
            0x00, 0x00, 0x00, // padding
            0x00, 0x00, 0x00, 0x10, // default
            0x00, 0x00, 0x00, 0x01, // low
            0x00, 0x00, 0x00, 0x02, // high
            0x00, 0x00, 0x00, 0x10, // 1
            0x00, 0x00, 0x00, 0x10, // 2
            0xbf, // athrow
        ];
        assert_eq!(
            decode(&code),
            vec![
                Insn::Other(0x99),
                Insn::Nop,
                Insn::Other(0xaa),
                Insn::AThrow
            ]
        );

        assert!(decode_instructions(&[0xfe], &empty_pool()).is_err());
        assert!(decode_instructions(&[0xa7, 0x00], &empty_pool()).is_err());
    }

    #[test]
    fn labels_at_boundaries() {
        let decoded = vec![(0, Insn::Nop), (1, Insn::IInc(1, 1)), (4, Insn::Return(None))];
        let boundaries: BTreeSet<u32> = [0, 2, 4, 5].into_iter().collect();
        let (instructions, labels) = insert_labels(decoded, &boundaries);
        assert_eq!(
            instructions,
            vec![
                Insn::Label(Label(0)),
                Insn::Nop,
                Insn::IInc(1, 1),
                Insn::Label(Label(1)),
                Insn::Label(Label(2)),
                Insn::Return(None),
                Insn::Label(Label(3)),
            ]
        );
        assert_eq!(labels[&5], Label(3));
    }
}
