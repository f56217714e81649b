use crate::model::VariableAccess;

/// Names of the variables declared so far in a method body
///
/// A store to a name that is not in the list yet is a definition; later stores are assignments.
#[derive(Clone, Debug, Default)]
pub struct VariableList {
    declared: Vec<VariableAccess>,
}

impl VariableList {
    pub fn new() -> VariableList {
        VariableList { declared: vec![] }
    }

    /// Record a variable, returning `true` if the name had not been declared yet
    pub fn declare(&mut self, variable: &VariableAccess) -> bool {
        if self.contains(&variable.name) {
            false
        } else {
            self.declared.push(variable.clone());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declared.iter().any(|declared| declared.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&VariableAccess> {
        self.declared.iter().find(|declared| declared.name == name)
    }

    /// Name for a variable in `slot` that has no debug information
    pub fn fresh_name(&self, slot: u16) -> String {
        let base = format!("local{}", slot);
        if !self.contains(&base) {
            return base;
        }
        (1..)
            .map(|suffix| format!("{}_{}", base, suffix))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(base)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableAccess> {
        self.declared.iter()
    }
}
