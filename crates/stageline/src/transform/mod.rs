//! Ordered SQL transforms against the staging store.

mod runner;
mod scripts;

pub use runner::{TransformRunner, TransformSummary, run_transforms};
pub use scripts::{TransformScript, discover_scripts};
