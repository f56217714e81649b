use super::{FrameError, LocalVariableTable, StackManager, VariableInfo, VariableList};
use crate::jvm::GenericType;
use crate::model::{Expr, VariableAccess};
use crate::tree::Label;
use crate::util::Width;

/// Interpreter state while replaying one method body
///
/// A frame is created per method, mutated one instruction at a time, and dropped once the body has
/// been assembled.
#[derive(Debug, Default)]
pub struct EmulatedFrame {
    locals: LocalVariableTable<Expr>,
    variables: VariableList,
    stack: StackManager<Expr>,
    last_label: Option<Label>,
}

impl EmulatedFrame {
    pub fn new() -> EmulatedFrame {
        EmulatedFrame::default()
    }

    pub fn enter_stack(&mut self) {
        self.stack.enter_stack();
    }

    pub fn exit_stack(&mut self) -> Result<(), FrameError> {
        self.stack.exit_stack()
    }

    /// Store variables in consecutive slots, one slot per variable, starting at `start`
    ///
    /// Widths are ignored: a `long` here takes a single slot. Use [`Self::store`] to bind wide
    /// variables.
    pub fn store_values(
        &mut self,
        values: Vec<VariableAccess>,
        start: u16,
    ) -> Result<(), FrameError> {
        for (offset, value) in (0u16..).zip(values) {
            let slot = start
                .checked_add(offset)
                .ok_or(FrameError::SlotOverflow(start))?;
            self.locals.store(Expr::Variable(value), slot);
        }
        Ok(())
    }

    /// Store an arbitrary expression in a one-slot local
    pub fn store_access(&mut self, value: Expr, slot: u16) {
        self.locals.store(value, slot);
    }

    /// Store a variable, taking up two slots if its type is `long` or `double`
    pub fn store(&mut self, variable: VariableAccess, slot: u16) -> Result<(), FrameError> {
        if variable.variable_type.width() == 2 {
            self.locals.store_wide(Expr::Variable(variable), slot)
        } else {
            self.locals.store(Expr::Variable(variable), slot);
            Ok(())
        }
    }

    /// Pop the top of the stack and store it in `slot`
    ///
    /// Only variables can be bound this way. Store instructions, whose value is usually an
    /// arbitrary expression, instead bind the popped value to a variable picked by
    /// `MethodReplay::variable_for_store` and then [`Self::store`] that variable.
    pub fn store_from_stack(&mut self, slot: u16) -> Result<VariableAccess, FrameError> {
        match self.stack.pop()? {
            Expr::Variable(variable) => {
                self.store(variable.clone(), slot)?;
                Ok(variable)
            }
            _ => Err(FrameError::NotStorable(slot)),
        }
    }

    pub fn load(&self, slot: u16) -> Result<Expr, FrameError> {
        self.locals.load(slot).map(Clone::clone)
    }

    pub fn load_to_stack(&mut self, slot: u16) -> Result<(), FrameError> {
        let value = self.load(slot)?;
        self.stack.push(value);
        Ok(())
    }

    pub fn push(&mut self, value: Expr) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Expr, FrameError> {
        self.stack.pop()
    }

    pub fn stack(&self) -> &StackManager<Expr> {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut StackManager<Expr> {
        &mut self.stack
    }

    pub fn is_occupied(&self, slot: u16) -> bool {
        self.locals.is_occupied(slot)
    }

    pub fn store_info(
        &mut self,
        slot: u16,
        variable_type: GenericType,
        name: String,
        start: Option<Label>,
        end: Option<Label>,
    ) {
        self.locals
            .store_variable_info(slot, variable_type, name, start, end);
    }

    pub fn get_info(&self, slot: u16) -> Option<&VariableInfo> {
        self.locals.get_info(slot)
    }

    /// Debug information for a variable whose window opens at `label`
    pub fn info_starting_at(&self, slot: u16, label: Label) -> Option<&VariableInfo> {
        self.locals.info_starting_at(slot, label)
    }

    pub fn visit_label(&mut self, label: Label) {
        self.last_label = Some(label);
        self.locals.visit_label(label);
    }

    pub fn last_label(&self) -> Option<Label> {
        self.last_label
    }

    pub fn variables(&self) -> &VariableList {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableList {
        &mut self.variables
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{BaseType, BinaryName, TypeRef};
    use crate::model::Literal;

    fn int(name: &str) -> VariableAccess {
        VariableAccess::new(name, GenericType::Base(BaseType::Int))
    }

    #[test]
    fn parameters_in_consecutive_slots() {
        let mut frame = EmulatedFrame::new();
        frame.store_values(vec![int("a"), int("b")], 1).unwrap();
        assert_eq!(frame.load(1), Ok(Expr::Variable(int("a"))));
        assert_eq!(frame.load(2), Ok(Expr::Variable(int("b"))));
        assert_eq!(frame.load(3), Err(FrameError::MissingLocal(3)));
    }

    #[test]
    fn store_values_ignores_width() {
        let mut frame = EmulatedFrame::new();
        let a = VariableAccess::new("a", GenericType::Base(BaseType::Long));
        frame
            .store_values(vec![a.clone(), int("b"), int("c")], 2)
            .unwrap();
        assert_eq!(frame.load(2), Ok(Expr::Variable(a)));
        assert_eq!(frame.load(3), Ok(Expr::Variable(int("b"))));
        assert_eq!(frame.load(4), Ok(Expr::Variable(int("c"))));

        assert_eq!(
            frame.store_values(vec![int("x"), int("y")], u16::MAX),
            Err(FrameError::SlotOverflow(u16::MAX))
        );
    }

    #[test]
    fn wide_variables_take_two_slots() {
        let mut frame = EmulatedFrame::new();
        let total = VariableAccess::new("total", GenericType::Base(BaseType::Double));
        frame.store(total.clone(), 0).unwrap();
        assert_eq!(frame.load(1), Err(FrameError::WideSecondHalf(1)));
        assert_eq!(
            frame.store(total, u16::MAX),
            Err(FrameError::SlotOverflow(u16::MAX))
        );
    }

    #[test]
    fn stack_to_locals_and_back() {
        let mut frame = EmulatedFrame::new();
        frame.push(Expr::Variable(int("x")));
        assert_eq!(frame.store_from_stack(4), Ok(int("x")));
        assert!(frame.stack().is_empty());

        frame.load_to_stack(4).unwrap();
        assert_eq!(frame.pop(), Ok(Expr::Variable(int("x"))));

        frame.push(Expr::Literal(Literal::Int(3)));
        assert_eq!(frame.store_from_stack(5), Err(FrameError::NotStorable(5)));
        assert_eq!(frame.pop(), Err(FrameError::EmptyStack));
    }

    #[test]
    fn this_is_an_access() {
        let mut frame = EmulatedFrame::new();
        let this = Expr::variable("this", GenericType::class(TypeRef::class(BinaryName::OBJECT)));
        frame.store_access(this.clone(), 0);
        assert_eq!(frame.load(0), Ok(this));
    }

    #[test]
    fn labels_select_info() {
        let mut frame = EmulatedFrame::new();
        let int_type = GenericType::Base(BaseType::Int);
        frame.store_info(1, int_type, "i".to_owned(), Some(Label(2)), None);
        assert!(frame.get_info(1).is_none());
        frame.visit_label(Label(2));
        assert_eq!(frame.last_label(), Some(Label(2)));
        assert_eq!(frame.get_info(1).map(|i| i.name.as_str()), Some("i"));
    }

    #[test]
    fn unbalanced_exit() {
        let mut frame = EmulatedFrame::new();
        frame.enter_stack();
        assert_eq!(frame.exit_stack(), Ok(()));
        assert_eq!(frame.exit_stack(), Err(FrameError::ExitRootStack));
    }
}
