//! Repair engine and audit trail types.

mod engine;
mod record;

pub use engine::RepairEngine;
pub use record::{RepairOutcome, RepairRecord};
