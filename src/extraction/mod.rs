//! Structural extraction: functions, classes and imports of one unit.

mod extractor;
mod types;

pub use extractor::{extract_parameters, extract_structure};
pub use types::{
    ClassInfo, FunctionInfo, ImportInfo, ParameterInfo, ParameterKind, UnitStructure,
};
