use std::fmt;

/// Position marker inside a method's instruction list
///
/// Labels are only ever compared for identity and ordering. The class-file reader allocates them
/// in increasing bytecode offset order.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Label(pub u32);

impl Label {
    /// Label marking the start of a method body
    pub const START: Label = Label(0);

    /// Get the next fresh label
    pub fn next(&self) -> Label {
        Label(self.0 + 1)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("l{}", self.0))
    }
}
