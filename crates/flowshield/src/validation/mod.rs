//! Validation engine and violation types.

mod engine;
mod violation;

pub use engine::ValidationEngine;
pub use violation::Violation;
