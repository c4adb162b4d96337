/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::KindError;
use crate::tables::variable::VariableMetadata;
use std::collections::HashMap;

/// One row of the microdata joint frequency table: a category-code tuple
/// `(d1, …, dk)` aligned to the declared fitting-variable order, with its
/// sample weight.
#[derive(Debug, Clone, PartialEq)]
pub struct JointCell {
    pub codes: Vec<u32>,
    pub weight: f64,
}

/// The empirical joint distribution of the fitting variables (§3). Each
/// tuple is unique; the table is indexed by tuple so repeated inserts of
/// the same tuple update rather than duplicate a cell.
#[derive(Debug, Clone, Default)]
pub struct MicroJoint {
    cells: Vec<JointCell>,
    index: HashMap<Vec<u32>, usize>,
}

impl MicroJoint {
    pub fn new() -> MicroJoint {
        MicroJoint {
            cells: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Inserts or overwrites the weight for tuple `codes`. `meta`/
    /// `fitting_vars` validate that each code is a member of its variable's
    /// declared domain.
    pub fn insert(
        &mut self,
        meta: &VariableMetadata,
        fitting_vars: &[String],
        codes: Vec<u32>,
        weight: f64,
    ) -> Result<(), KindError> {
        for (variable, &code) in fitting_vars.iter().zip(codes.iter()) {
            if !meta.domain_contains(variable, code) {
                return Err(KindError::UnknownCategory {
                    variable: variable.clone(),
                    code,
                });
            }
        }
        if let Some(&i) = self.index.get(&codes) {
            self.cells[i].weight = weight;
        } else {
            self.index.insert(codes.clone(), self.cells.len());
            self.cells.push(JointCell { codes, weight });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.cells.iter().map(|c| c.weight).sum()
    }

    /// An independent mutable clone, for the fitter to reweight per area
    /// without disturbing the shared source table (§4.1, §4.2).
    pub fn copy_deep(&self) -> MicroJoint {
        self.clone()
    }

    /// `(tuple, weight)` pairs in lexicographic order on the tuple.
    pub fn cells(&self) -> Vec<&JointCell> {
        let mut refs: Vec<&JointCell> = self.cells.iter().collect();
        refs.sort_by(|a, b| a.codes.cmp(&b.codes));
        refs
    }

    pub fn cells_mut(&mut self) -> &mut [JointCell] {
        &mut self.cells
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::variable::VariableKind;

    fn meta() -> (VariableMetadata, Vec<String>) {
        let mut meta = VariableMetadata::new();
        meta.declare("v", VariableKind::Categorical, vec![1, 2]);
        (meta, vec!["v".to_string()])
    }

    #[test]
    fn test_insert_and_cells_sorted() {
        let (meta, vars) = meta();
        let mut joint = MicroJoint::new();
        joint.insert(&meta, &vars, vec![2], 1.0).unwrap();
        joint.insert(&meta, &vars, vec![1], 1.0).unwrap();
        let cells = joint.cells();
        assert_eq!(cells[0].codes, vec![1]);
        assert_eq!(cells[1].codes, vec![2]);
    }

    #[test]
    fn test_insert_rejects_unknown_category() {
        let (meta, vars) = meta();
        let mut joint = MicroJoint::new();
        assert!(matches!(
            joint.insert(&meta, &vars, vec![9], 1.0),
            Err(KindError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_copy_deep_is_independent() {
        let (meta, vars) = meta();
        let mut joint = MicroJoint::new();
        joint.insert(&meta, &vars, vec![1], 1.0).unwrap();
        let mut clone = joint.copy_deep();
        clone.cells_mut()[0].weight = 5.0;
        assert_eq!(joint.cells()[0].weight, 1.0);
        assert_eq!(clone.cells()[0].weight, 5.0);
    }
}
