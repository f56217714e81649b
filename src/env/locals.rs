use super::FrameError;
use crate::jvm::GenericType;
use crate::tree::Label;
use std::collections::HashMap;

/// Debug information about a local variable, valid from `start` up to `end`
///
/// A missing `start` means "from the beginning of the method" and a missing `end` means "until the
/// end of the method".
#[derive(Clone, PartialEq, Debug)]
pub struct VariableInfo {
    pub slot: u16,
    pub variable_type: GenericType,
    pub name: String,
    pub start: Option<Label>,
    pub end: Option<Label>,
}

#[derive(Clone, Debug)]
enum Slot<V> {
    Value(V),

    /// First slot of a `long` or `double`
    WideHead(V),

    /// Second slot of a `long` or `double`
    WideTail,
}

/// Local variable slots, along with their debug information
///
/// Values are what is in a slot right now. Debug information is attached to label windows, since
/// the same slot can be reused for unrelated variables over the course of a method.
#[derive(Clone, Debug)]
pub struct LocalVariableTable<V> {
    slots: HashMap<u16, Slot<V>>,
    infos: Vec<VariableInfo>,

    /// Labels visited so far, along with the order in which they were visited
    visited: HashMap<Label, usize>,
}

impl<V> LocalVariableTable<V> {
    pub fn new() -> LocalVariableTable<V> {
        LocalVariableTable {
            slots: HashMap::new(),
            infos: vec![],
            visited: HashMap::new(),
        }
    }

    /// Remove the other half of any wide value overlapping `slot`
    fn clobber(&mut self, slot: u16) {
        match self.slots.remove(&slot) {
            Some(Slot::WideHead(_)) => {
                if let Some(tail) = slot.checked_add(1) {
                    let _ = self.slots.remove(&tail);
                }
            }
            Some(Slot::WideTail) => {
                if let Some(head) = slot.checked_sub(1) {
                    let _ = self.slots.remove(&head);
                }
            }
            Some(Slot::Value(_)) | None => (),
        }
    }

    /// Put a one-slot value in `slot`, replacing whatever was there
    pub fn store(&mut self, value: V, slot: u16) {
        self.clobber(slot);
        self.slots.insert(slot, Slot::Value(value));
    }

    /// Put a two-slot value in `slot` and `slot + 1`
    pub fn store_wide(&mut self, value: V, slot: u16) -> Result<(), FrameError> {
        let tail = slot.checked_add(1).ok_or(FrameError::SlotOverflow(slot))?;
        self.clobber(slot);
        self.clobber(tail);
        self.slots.insert(slot, Slot::WideHead(value));
        self.slots.insert(tail, Slot::WideTail);
        Ok(())
    }

    /// Current value in a slot
    pub fn load(&self, slot: u16) -> Result<&V, FrameError> {
        match self.slots.get(&slot) {
            Some(Slot::Value(value) | Slot::WideHead(value)) => Ok(value),
            Some(Slot::WideTail) => Err(FrameError::WideSecondHalf(slot)),
            None => Err(FrameError::MissingLocal(slot)),
        }
    }

    /// Whether anything is in the slot right now
    pub fn is_occupied(&self, slot: u16) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn store_variable_info(
        &mut self,
        slot: u16,
        variable_type: GenericType,
        name: String,
        start: Option<Label>,
        end: Option<Label>,
    ) {
        self.infos.push(VariableInfo {
            slot,
            variable_type,
            name,
            start,
            end,
        });
    }

    /// Order in which the window's start was reached, if it has been reached
    fn activation(&self, info: &VariableInfo) -> Option<usize> {
        let started = match info.start {
            None => 0,
            Some(start) => *self.visited.get(&start)? + 1,
        };
        match info.end {
            Some(end) if self.visited.contains_key(&end) => None,
            _ => Some(started),
        }
    }

    /// Debug information for the window of `slot` that is active at the current position
    ///
    /// If windows overlap, the one that started most recently wins.
    pub fn get_info(&self, slot: u16) -> Option<&VariableInfo> {
        self.infos
            .iter()
            .filter(|info| info.slot == slot)
            .filter_map(|info| self.activation(info).map(|order| (order, info)))
            .max_by_key(|(order, _)| *order)
            .map(|(_, info)| info)
    }

    /// Debug information for the window of `slot` that opens exactly at `label`
    pub fn info_starting_at(&self, slot: u16, label: Label) -> Option<&VariableInfo> {
        self.infos
            .iter()
            .rev()
            .find(|info| info.slot == slot && info.start == Some(label))
    }

    /// Move the current position past `label`
    pub fn visit_label(&mut self, label: Label) {
        let order = self.visited.len();
        self.visited.entry(label).or_insert(order);
    }
}

impl<V> Default for LocalVariableTable<V> {
    fn default() -> LocalVariableTable<V> {
        LocalVariableTable::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::BaseType;

    const INT: GenericType = GenericType::Base(BaseType::Int);

    #[test]
    fn store_then_load() {
        let mut table = LocalVariableTable::new();
        assert_eq!(table.load(1), Err(FrameError::MissingLocal(1)));
        table.store("a", 1);
        table.store("b", 1);
        assert_eq!(table.load(1), Ok(&"b"));
    }

    #[test]
    fn wide_values() {
        let mut table = LocalVariableTable::new();
        table.store_wide("long", 2).unwrap();
        assert_eq!(table.load(2), Ok(&"long"));
        assert_eq!(table.load(3), Err(FrameError::WideSecondHalf(3)));

        // Overwriting the second half invalidates the first
        table.store("int", 3);
        assert_eq!(table.load(2), Err(FrameError::MissingLocal(2)));
        assert_eq!(table.load(3), Ok(&"int"));

        // Overwriting a one-slot value's neighbour with a wide value
        table.store("x", 5);
        table.store_wide("double", 4).unwrap();
        assert_eq!(table.load(5), Err(FrameError::WideSecondHalf(5)));
        assert_eq!(table.load(3), Ok(&"int"));
    }

    #[test]
    fn last_slot() {
        let mut table = LocalVariableTable::new();
        assert_eq!(
            table.store_wide("long", u16::MAX),
            Err(FrameError::SlotOverflow(u16::MAX))
        );
        assert!(!table.is_occupied(u16::MAX));

        table.store("int", u16::MAX);
        assert_eq!(table.load(u16::MAX), Ok(&"int"));
        assert_eq!(table.store_wide("long", u16::MAX - 1), Ok(()));
        assert_eq!(table.load(u16::MAX), Err(FrameError::WideSecondHalf(u16::MAX)));
        table.store("int", u16::MAX - 1);
        assert!(!table.is_occupied(u16::MAX));
    }

    #[test]
    fn info_windows() {
        let mut table: LocalVariableTable<()> = LocalVariableTable::new();
        table.store_variable_info(1, INT, "i".to_owned(), Some(Label(1)), Some(Label(2)));
        table.store_variable_info(1, INT, "j".to_owned(), Some(Label(3)), Some(Label(4)));
        table.store_variable_info(0, INT, "always".to_owned(), None, None);

        assert_eq!(table.get_info(1), None);
        assert_eq!(table.get_info(0).map(|i| i.name.as_str()), Some("always"));

        table.visit_label(Label(1));
        assert_eq!(table.get_info(1).map(|i| i.name.as_str()), Some("i"));

        table.visit_label(Label(2));
        assert_eq!(table.get_info(1), None);

        table.visit_label(Label(3));
        assert_eq!(table.get_info(1).map(|i| i.name.as_str()), Some("j"));
        assert_eq!(
            table.info_starting_at(1, Label(3)).map(|i| i.name.as_str()),
            Some("j")
        );
        assert_eq!(table.info_starting_at(1, Label(2)), None);
    }
}
