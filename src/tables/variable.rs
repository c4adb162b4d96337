/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a fitting variable's domain has a natural ordering (age bracket,
/// household size, …) or not (tenure type, …). Drives which affinity
/// formula the household selector applies (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    Ordinal,
    Categorical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub kind: VariableKind,
    pub domain: Vec<u32>,
}

/// The declared set of fitting variables F = {v1, …, vk} (§3), in the
/// caller-supplied order that every `JointCell`/`MarginalRow` aligns to.
#[derive(Debug, Clone, Default)]
pub struct VariableMetadata {
    order: Vec<String>,
    vars: HashMap<String, VariableInfo>,
}

impl VariableMetadata {
    pub fn new() -> VariableMetadata {
        VariableMetadata {
            order: Vec::new(),
            vars: HashMap::new(),
        }
    }

    pub fn declare(&mut self, variable: &str, kind: VariableKind, domain: Vec<u32>) {
        if !self.vars.contains_key(variable) {
            self.order.push(variable.to_string());
        }
        self.vars
            .insert(variable.to_string(), VariableInfo { kind, domain });
    }

    /// The fitting variables F, in declared order.
    pub fn fitting_variables(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, variable: &str) -> Option<&VariableInfo> {
        self.vars.get(variable)
    }

    pub fn domain_contains(&self, variable: &str, code: u32) -> bool {
        self.vars
            .get(variable)
            .map(|info| info.domain.contains(&code))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_declare_preserves_order() {
        let mut meta = VariableMetadata::new();
        meta.declare("age", VariableKind::Ordinal, vec![1, 2, 3]);
        meta.declare("tenure", VariableKind::Categorical, vec![1, 2]);
        assert_eq!(meta.fitting_variables(), &["age".to_string(), "tenure".to_string()]);
        assert_eq!(meta.get("age").unwrap().kind, VariableKind::Ordinal);
    }
}
