pub mod catalog;
pub mod guard;
mod merge;
pub mod normalize;
mod validation;
mod workflow;

pub use catalog::*;
pub use guard::{InputRejected, SafetyGate};
pub use merge::deep_merge;
pub use normalize::{Normalized, fallback_workflow, normalize, normalize_named};
pub use validation::*;
pub use workflow::*;
