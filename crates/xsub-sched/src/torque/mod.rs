//! Torque (PBS/OpenPBS lineage) integration.
//!
//! Submits with `qsub`, lists live jobs with `qstat` and cancels with `qdel`.

mod adapter;
mod parser;
mod templates;

pub use adapter::{PARAMETERS, TorqueAdapter};
pub(crate) use parser::parse_qsub_output;
