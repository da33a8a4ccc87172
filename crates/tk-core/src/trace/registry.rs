use serde::{Deserialize, Serialize};

use crate::ast::{ArgKind, Argument, NamedArgument};

/// Ordered, append-only list of the kernel's external arguments.
///
/// Position in the registry is the parameter position in the generated
/// program and the launch slot of the compiled graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentRegistry {
    entries: Vec<NamedArgument>,
    #[serde(skip)]
    next_index: usize,
}

impl ArgumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.next_index = 0;
    }

    pub(crate) fn next_name(&mut self) -> String {
        let name = format!("_{}", self.next_index);
        self.next_index += 1;
        name
    }

    pub(crate) fn push(&mut self, argument: NamedArgument) {
        self.entries.push(argument);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NamedArgument> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedArgument> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|arg| arg.name.as_str()).collect()
    }

    /// `(name, kind)` pairs in registration order.
    pub fn signature(&self) -> Vec<(String, ArgKind)> {
        self.entries
            .iter()
            .map(|arg| (arg.name.clone(), arg.kind()))
            .collect()
    }

    pub fn arguments(&self) -> impl Iterator<Item = &Argument> {
        self.entries.iter().map(|arg| &arg.argument)
    }
}

impl<'a> IntoIterator for &'a ArgumentRegistry {
    type Item = &'a NamedArgument;
    type IntoIter = std::slice::Iter<'a, NamedArgument>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<Vec<NamedArgument>> for ArgumentRegistry {
    fn from(entries: Vec<NamedArgument>) -> Self {
        let next_index = entries.len();
        Self {
            entries,
            next_index,
        }
    }
}
