//! Classical complexity measures over Python syntax trees.
//!
//! Function-level calls pass the `function_definition` node with
//! [`WalkScope::Local`](crate::core::visitor::WalkScope::Local); unit-level
//! calls pass the module root with `WalkScope::Full`.

pub mod cyclomatic;
pub mod halstead;
pub mod maintainability;
pub mod nesting;

pub use cyclomatic::{calculate_cyclomatic, combine_cyclomatic, decision_breakdown};
pub use halstead::{calculate_halstead, HalsteadMetrics};
pub use maintainability::{calculate_maintainability, MaintainabilityIndex, MaintainabilityLevel};
pub use nesting::{calculate_nesting, NestingDepth};
