// private sub-modules defined in other files
mod global_totals;
mod marginal;
mod micro_categorical;
mod micro_joint;
mod polygons;
mod variable;

// exports identifiers from private sub-modules in the current module namespace
pub use self::global_totals::GlobalTotals;
pub use self::marginal::{MarginalTable, Marginals};
pub use self::micro_categorical::{CategoricalRow, MicroCategorical};
pub use self::micro_joint::{JointCell, MicroJoint};
pub use self::polygons::PolygonSet;
pub use self::variable::{VariableInfo, VariableKind, VariableMetadata};
