//! PBS Pro integration for HPC job submission.
//!
//! Shares the `qsub`/`qstat`/`qdel` verbs with Torque but adds accounting,
//! partition and exclusive-node options and uses `select` resource syntax.

mod adapter;
mod parser;
mod templates;

pub use adapter::{PARAMETERS, PbsProAdapter};
