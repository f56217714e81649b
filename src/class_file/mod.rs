//! Decoder from the binary class-file format into a [`ClassNode`]
//!
//! Only what analysis needs is decoded: names, flags, `Signature` attributes, and method bodies
//! along with their local variable tables. Every other attribute is skipped.

mod attribute;
mod class;
mod code;
mod constants;
mod deserialize;

pub use attribute::*;
pub use class::*;
pub use code::*;
pub use constants::*;
pub use deserialize::*;

use crate::jvm::{ClassAccessFlags, Error, FieldAccessFlags, MethodAccessFlags};
use crate::tree::{ClassNode, FieldNode, LocalVariableNode, MethodNode};
use std::collections::BTreeSet;

/// Decode a class file
pub fn read_class(bytes: &[u8]) -> Result<ClassNode, Error> {
    let mut reader = bytes;
    let class_file = ClassFile::deserialize(&mut reader).map_err(|err| match err {
        Error::IoError(io) => Error::ClassFormat(format!("truncated class file ({})", io)),
        other => other,
    })?;
    if !reader.is_empty() {
        return Err(Error::ClassFormat(format!(
            "{} unexpected trailing bytes",
            reader.len()
        )));
    }
    class_node(&class_file)
}

fn signature(attributes: &[Attribute], constants: &ConstantPool) -> Result<Option<String>, Error> {
    match find_attribute::<Signature>(attributes, constants)? {
        Some(Signature { signature }) => Ok(Some(constants.utf8(signature)?.to_owned())),
        None => Ok(None),
    }
}

fn class_node(class_file: &ClassFile) -> Result<ClassNode, Error> {
    let constants = &class_file.constants;
    let name = constants.class_name(class_file.this_class)?.to_owned();
    log::debug!(
        "Decoding class {} (version {}.{})",
        name,
        class_file.major_version,
        class_file.minor_version
    );

    let super_name = match class_file.super_class {
        0 => None,
        index => Some(constants.class_name(index)?.to_owned()),
    };
    let interfaces = class_file
        .interfaces
        .iter()
        .map(|index| constants.class_name(*index).map(str::to_owned))
        .collect::<Result<_, _>>()?;

    let fields = class_file
        .fields
        .iter()
        .map(|field| -> Result<FieldNode, Error> {
            Ok(FieldNode {
                access: FieldAccessFlags::from_bits_truncate(field.access_flags),
                name: constants.utf8(field.name_index)?.to_owned(),
                descriptor: constants.utf8(field.descriptor_index)?.to_owned(),
                signature: signature(&field.attributes, constants)?,
            })
        })
        .collect::<Result<_, _>>()?;

    let methods = class_file
        .methods
        .iter()
        .map(|method| method_node(method, constants))
        .collect::<Result<_, _>>()?;

    Ok(ClassNode {
        access: ClassAccessFlags::from_bits_truncate(class_file.access_flags),
        name,
        super_name,
        interfaces,
        signature: signature(&class_file.attributes, constants)?,
        fields,
        methods,
    })
}

fn method_node(method: &MemberInfo, constants: &ConstantPool) -> Result<MethodNode, Error> {
    let mut node = MethodNode {
        access: MethodAccessFlags::from_bits_truncate(method.access_flags),
        name: constants.utf8(method.name_index)?.to_owned(),
        descriptor: constants.utf8(method.descriptor_index)?.to_owned(),
        signature: signature(&method.attributes, constants)?,
        instructions: vec![],
        local_variables: vec![],
        max_stack: 0,
        max_locals: 0,
    };

    let code = match find_attribute::<Code>(&method.attributes, constants)? {
        Some(code) => code,
        None => return Ok(node),
    };
    node.max_stack = code.max_stack;
    node.max_locals = code.max_locals;

    let local_variables: Vec<LocalVariable> =
        find_attributes::<LocalVariableTable>(&code.attributes, constants)?
            .into_iter()
            .flat_map(|table| table.0)
            .collect();
    let local_variable_types: Vec<LocalVariable> =
        find_attributes::<LocalVariableTypeTable>(&code.attributes, constants)?
            .into_iter()
            .flat_map(|table| table.0)
            .collect();

    let boundaries: BTreeSet<u32> = local_variables
        .iter()
        .flat_map(|local| [local.start_pc as u32, local.end_pc()])
        .collect();
    let decoded = decode_instructions(&code.code_array, constants)?;
    let (instructions, labels) = insert_labels(decoded, &boundaries);
    node.instructions = instructions;

    let label_at = |offset: u32| {
        labels.get(&offset).copied().ok_or_else(|| {
            Error::ClassFormat(format!("no label at local variable boundary {}", offset))
        })
    };
    for local in &local_variables {
        let signature = local_variable_types
            .iter()
            .find(|typed| typed.same_variable(local))
            .map(|typed| constants.utf8(typed.type_index).map(str::to_owned))
            .transpose()?;
        node.local_variables.push(LocalVariableNode {
            name: constants.utf8(local.name_index)?.to_owned(),
            descriptor: constants.utf8(local.type_index)?.to_owned(),
            signature,
            start: label_at(local.start_pc as u32)?,
            end: label_at(local.end_pc())?,
            index: local.index,
        });
    }

    Ok(node)
}
