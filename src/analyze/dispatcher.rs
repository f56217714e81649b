use super::ReplayError;
use crate::env::{EmulatedFrame, FrameError};
use crate::jvm::{
    BaseType, FieldType, GenericType, MethodDescriptor, Name, ParseDescriptor, TypeRef,
    TypeResolver, UnqualifiedName,
};
use crate::model::{Expr, Literal, Stmt, VariableAccess};
use crate::tree::{Constant, FieldOp, Insn, InvokeKind, Label, LocalKind};
use crate::util::Width;

/// Per-opcode replay logic
///
/// The dispatcher is called once for every instruction of a method body (labels included), in
/// order. It drives the frame and emits statements into the replay.
pub trait InstructionDispatcher {
    fn dispatch(&self, insn: &Insn, replay: &mut MethodReplay<'_>) -> Result<(), ReplayError>;
}

/// State of the replay of one method body
pub struct MethodReplay<'r> {
    pub frame: EmulatedFrame,
    body: Vec<Stmt>,
    resolver: &'r dyn TypeResolver,

    /// Label immediately following the instruction being dispatched, if any
    next_label: Option<Label>,
    next_uninitialized: u32,
}

impl<'r> MethodReplay<'r> {
    pub fn new(frame: EmulatedFrame, resolver: &'r dyn TypeResolver) -> MethodReplay<'r> {
        MethodReplay {
            frame,
            body: vec![],
            resolver,
            next_label: None,
            next_uninitialized: 0,
        }
    }

    pub fn resolver(&self) -> &'r dyn TypeResolver {
        self.resolver
    }

    pub fn next_label(&self) -> Option<Label> {
        self.next_label
    }

    pub(super) fn set_next_label(&mut self, label: Option<Label>) {
        self.next_label = label;
    }

    /// Append a statement to the body
    pub fn emit(&mut self, statement: Stmt) {
        log::trace!("Emitting {:?}", statement);
        self.body.push(statement);
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    pub fn into_body(self) -> Vec<Stmt> {
        self.body
    }

    /// Identifier for a new not-yet-constructed object
    pub fn fresh_uninitialized(&mut self) -> u32 {
        let id = self.next_uninitialized;
        self.next_uninitialized += 1;
        id
    }

    /// Type of a raw field descriptor
    pub fn descriptor_type(&self, descriptor: &str) -> Result<GenericType, ReplayError> {
        let field_type = FieldType::parse(descriptor)
            .map_err(|err| crate::jvm::Error::BadDescriptor(format!("{} ({})", descriptor, err)))?;
        Ok(GenericType::from_field_type(&field_type, self.resolver)?)
    }

    /// Type named by a class constant (either an internal name or an array descriptor)
    pub fn class_type(&self, class: &str) -> Result<GenericType, ReplayError> {
        if class.starts_with('[') {
            self.descriptor_type(class)
        } else {
            Ok(GenericType::class(self.resolver.resolve_unknown(class)?))
        }
    }

    /// Type to give a fresh variable when no debug information is available
    fn fallback_type(&self, kind: LocalKind) -> Result<GenericType, ReplayError> {
        Ok(match kind {
            LocalKind::Int => GenericType::Base(BaseType::Int),
            LocalKind::Long => GenericType::Base(BaseType::Long),
            LocalKind::Float => GenericType::Base(BaseType::Float),
            LocalKind::Double => GenericType::Base(BaseType::Double),
            LocalKind::Reference => self.class_type("java/lang/Object")?,
        })
    }

    /// Pick the variable that a store of `kind` into `slot` writes to
    ///
    /// Debug information for a window that opens right after the store wins, then the window
    /// active right now, then whatever variable is already in the slot. Failing all of those, a
    /// fresh variable is made up.
    pub fn variable_for_store(
        &self,
        kind: LocalKind,
        slot: u16,
    ) -> Result<VariableAccess, ReplayError> {
        let info = self
            .next_label
            .and_then(|label| self.frame.info_starting_at(slot, label))
            .or_else(|| self.frame.get_info(slot))
            .filter(|info| info.variable_type.width() == kind.width());
        if let Some(info) = info {
            return Ok(VariableAccess::new(
                info.name.clone(),
                info.variable_type.clone(),
            ));
        }

        if let Ok(Expr::Variable(existing)) = self.frame.load(slot) {
            if existing.variable_type.width() == kind.width() {
                return Ok(existing);
            }
        }

        let name = self.frame.variables().fresh_name(slot);
        Ok(VariableAccess::new(name, self.fallback_type(kind)?))
    }
}

/// Dispatcher for straight-line code
///
/// Branches, switches, arrays, monitors, conversions, comparisons, and `invokedynamic` are
/// reported as unsupported.
#[derive(Copy, Clone, Debug, Default)]
pub struct BasicDispatcher;

impl BasicDispatcher {
    /// Discard a value, keeping it as a statement if it may have side effects
    fn discard(value: Expr, replay: &mut MethodReplay<'_>) {
        if matches!(value, Expr::Invoke { .. } | Expr::New { .. }) {
            replay.emit(Stmt::Expr(value));
        }
    }

    fn invoke(
        kind: InvokeKind,
        owner: &str,
        name: &str,
        descriptor: &str,
        replay: &mut MethodReplay<'_>,
    ) -> Result<(), ReplayError> {
        let method_descriptor = MethodDescriptor::parse(descriptor)
            .map_err(|err| crate::jvm::Error::BadDescriptor(format!("{} ({})", descriptor, err)))?;
        let owner: TypeRef = match kind {
            InvokeKind::Interface => replay.resolver().resolve(owner, true)?,
            _ => replay.resolver().resolve_unknown(owner)?,
        };
        let return_type = method_descriptor
            .return_type
            .as_ref()
            .map(|return_type| GenericType::from_field_type(return_type, replay.resolver()))
            .transpose()?;

        let arguments = replay
            .frame
            .stack_mut()
            .pop_many(method_descriptor.parameters.len())?;
        let target = match kind {
            InvokeKind::Static => None,
            _ => Some(replay.frame.pop()?),
        };

        // Constructor call on the result of a `new`
        if let Some(Expr::Uninitialized { class, id }) = &target {
            if name == UnqualifiedName::INIT.as_str() {
                let id = *id;
                let constructed = Expr::New {
                    class: class.clone(),
                    arguments,
                };
                let mut replaced = false;
                replay.frame.stack_mut().for_each_mut(|value| {
                    if matches!(value, Expr::Uninitialized { id: other, .. } if *other == id) {
                        *value = constructed.clone();
                        replaced = true;
                    }
                });
                if !replaced {
                    replay.emit(Stmt::Expr(constructed));
                }
                return Ok(());
            }
        }

        let call = Expr::Invoke {
            kind,
            owner,
            target: target.map(Box::new),
            name: name.to_owned(),
            arguments,
            return_type,
        };
        if call.width() == 0 {
            replay.emit(Stmt::Expr(call));
        } else {
            replay.frame.push(call);
        }
        Ok(())
    }
}

impl InstructionDispatcher for BasicDispatcher {
    fn dispatch(&self, insn: &Insn, replay: &mut MethodReplay<'_>) -> Result<(), ReplayError> {
        log::trace!("Replaying {}", insn.mnemonic());
        match insn {
            Insn::Label(label) => replay.frame.visit_label(*label),
            Insn::Nop => (),

            Insn::Const(constant) => {
                let literal = match constant {
                    Constant::Null => Literal::Null,
                    Constant::Int(i) => Literal::Int(*i),
                    Constant::Long(l) => Literal::Long(*l),
                    Constant::Float(f) => Literal::Float(*f),
                    Constant::Double(d) => Literal::Double(*d),
                    Constant::String(s) => Literal::String(s.clone()),
                    Constant::Class(class) => Literal::Class(replay.class_type(class)?),
                };
                replay.frame.push(Expr::Literal(literal));
            }

            Insn::Load(_, slot) => replay.frame.load_to_stack(*slot)?,

            Insn::Store(kind, slot) => {
                let value = replay.frame.pop()?;
                let variable = replay.variable_for_store(*kind, *slot)?;
                let statement = if replay.frame.variables_mut().declare(&variable) {
                    Stmt::Define {
                        variable: variable.clone(),
                        value,
                    }
                } else {
                    Stmt::Assign {
                        variable: variable.clone(),
                        value,
                    }
                };
                replay.emit(statement);
                replay.frame.store(variable, *slot)?;
            }

            Insn::IInc(slot, amount) => match replay.frame.load(*slot)? {
                Expr::Variable(variable) => replay.emit(Stmt::Increment {
                    variable,
                    amount: *amount,
                }),
                _ => return Err(FrameError::NotStorable(*slot).into()),
            },

            Insn::Arithmetic(op, kind) => {
                let rhs = replay.frame.pop()?;
                let lhs = replay.frame.pop()?;
                replay.frame.push(Expr::Binary {
                    op: *op,
                    kind: *kind,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                });
            }

            Insn::Negate(kind) => {
                let value = replay.frame.pop()?;
                replay.frame.push(Expr::Negate {
                    kind: *kind,
                    value: Box::new(value),
                });
            }

            Insn::Pop => {
                let value = replay.frame.pop()?;
                BasicDispatcher::discard(value, replay);
            }

            Insn::Pop2 => {
                let value = replay.frame.pop()?;
                let wide = value.width() == 2;
                BasicDispatcher::discard(value, replay);
                if !wide {
                    let value = replay.frame.pop()?;
                    BasicDispatcher::discard(value, replay);
                }
            }

            Insn::Dup => {
                let value = replay.frame.pop()?;
                replay.frame.push(value.clone());
                replay.frame.push(value);
            }

            Insn::Swap => {
                let top = replay.frame.pop()?;
                let below = replay.frame.pop()?;
                replay.frame.push(top);
                replay.frame.push(below);
            }

            Insn::New(class) => {
                let class = replay.resolver().resolve_unknown(class)?;
                let id = replay.fresh_uninitialized();
                replay.frame.push(Expr::Uninitialized { class, id });
            }

            Insn::CheckCast(class) => {
                let target = replay.class_type(class)?;
                let value = replay.frame.pop()?;
                replay.frame.push(Expr::Cast {
                    target,
                    value: Box::new(value),
                });
            }

            Insn::Field {
                op,
                owner,
                name,
                descriptor,
            } => {
                let owner = replay.resolver().resolve_unknown(owner)?;
                let field_type = replay.descriptor_type(descriptor)?;
                let name = name.clone();
                match op {
                    FieldOp::GetStatic | FieldOp::GetField => {
                        let target = match op {
                            FieldOp::GetField => Some(Box::new(replay.frame.pop()?)),
                            _ => None,
                        };
                        replay.frame.push(Expr::FieldAccess {
                            owner,
                            target,
                            name,
                            field_type,
                        });
                    }
                    FieldOp::PutStatic | FieldOp::PutField => {
                        let value = replay.frame.pop()?;
                        let target = match op {
                            FieldOp::PutField => Some(replay.frame.pop()?),
                            _ => None,
                        };
                        replay.emit(Stmt::FieldStore {
                            owner,
                            target,
                            name,
                            value,
                        });
                    }
                }
            }

            Insn::Invoke {
                kind,
                owner,
                name,
                descriptor,
            } => BasicDispatcher::invoke(*kind, owner, name, descriptor, replay)?,

            Insn::Return(None) => replay.emit(Stmt::Return(None)),
            Insn::Return(Some(_)) => {
                let value = replay.frame.pop()?;
                replay.emit(Stmt::Return(Some(value)));
            }

            Insn::AThrow => {
                let value = replay.frame.pop()?;
                replay.emit(Stmt::Throw(value));
            }

            Insn::Other(_) => return Err(ReplayError::Unsupported(insn.mnemonic())),
        }
        Ok(())
    }
}
