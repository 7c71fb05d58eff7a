use crate::error::{LoopError, Span};
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub constant: bool,
    pub value: Value,
}

/// Flat name-to-binding store for one evaluation session.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name).map(|binding| &binding.value)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// (Re)writes `name` with the given constness, replacing any prior binding.
    pub fn declare(&mut self, name: &str, value: Value, constant: bool) {
        log::debug!(
            "declare {} {} = {}",
            if constant { "const" } else { "mut" },
            name,
            value
        );
        self.bindings
            .insert(name.to_string(), Binding { constant, value });
    }

    /// Plain assignment: creates a mutable binding when `name` is unbound,
    /// overwrites a mutable one, and refuses a constant one.
    pub fn assign(&mut self, name: &str, value: Value, span: Span) -> Result<(), LoopError> {
        match self.bindings.get_mut(name) {
            Some(binding) if binding.constant => Err(LoopError::runtime_error_with_help(
                span,
                format!("cannot assign to constant '{}'", name),
                format!("Declare it with 'mut {} := ...' to allow reassignment.", name),
            )),
            Some(binding) => {
                log::debug!("assign {} = {}", name, value);
                binding.value = value;
                Ok(())
            }
            None => {
                self.declare(name, value, false);
                Ok(())
            }
        }
    }

    /// Stores `value` under an existing binding, keeping its constness.
    pub fn replace(&mut self, name: &str, value: Value, span: Span) -> Result<(), LoopError> {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                log::debug!("update {} = {}", name, value);
                binding.value = value;
                Ok(())
            }
            None => Err(not_found(name, span)),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

pub(crate) fn not_found(name: &str, span: Span) -> LoopError {
    LoopError::runtime_error(span, format!("variable not found: '{}'", name))
}
