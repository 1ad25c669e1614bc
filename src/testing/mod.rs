//! Test synthesis from function structure.
//!
//! Generated cases are structural hypotheses: they are never run against the
//! analyzed code and their expectations must be reviewed before use.

pub mod inputs;
pub mod render;
pub mod synthesizer;

pub use inputs::{PyValue, TestInput};
pub use render::{module_name, render_module};
pub use synthesizer::{synthesize, synthesize_unit, Expectation, GeneratedTestCase, TestKind};
