use super::FrameError;

/// Operand stack, split into nested scopes
///
/// Pushes and pops only ever see the innermost scope. Scopes are kept as an explicit stack of
/// stacks: the outermost one is created along with the manager and can never be exited.
#[derive(Clone, Debug)]
pub struct StackManager<V> {
    scopes: Vec<Vec<V>>,
}

impl<V> StackManager<V> {
    pub fn new() -> StackManager<V> {
        StackManager {
            scopes: vec![vec![]],
        }
    }

    fn current(&self) -> &Vec<V> {
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Vec<V> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn push(&mut self, value: V) {
        self.current_mut().push(value);
    }

    pub fn pop(&mut self) -> Result<V, FrameError> {
        self.current_mut().pop().ok_or(FrameError::EmptyStack)
    }

    /// Pop `count` values, returned in the order they were pushed
    pub fn pop_many(&mut self, count: usize) -> Result<Vec<V>, FrameError> {
        let current = self.current_mut();
        if current.len() < count {
            return Err(FrameError::EmptyStack);
        }
        let split = current.len() - count;
        Ok(current.split_off(split))
    }

    pub fn peek(&self) -> Option<&V> {
        self.current().last()
    }

    /// Number of values in the current scope
    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Values in the current scope, bottom first
    pub fn values(&self) -> &[V] {
        self.current()
    }

    /// Number of scopes, including the outermost one
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Start a new empty scope
    pub fn enter_stack(&mut self) {
        self.scopes.push(vec![]);
    }

    /// Discard the current scope (and anything left in it) and go back to the enclosing one
    pub fn exit_stack(&mut self) -> Result<(), FrameError> {
        if self.scopes.len() == 1 {
            return Err(FrameError::ExitRootStack);
        }
        let _ = self.scopes.pop();
        Ok(())
    }

    /// Visit every value in every scope
    pub fn for_each_mut(&mut self, mut visit: impl FnMut(&mut V)) {
        for value in self.scopes.iter_mut().flatten() {
            visit(value);
        }
    }
}

impl<V> Default for StackManager<V> {
    fn default() -> StackManager<V> {
        StackManager::new()
    }
}
