//! Local-process fallback: jobs run as detached background processes.
//!
//! Job ids are process ids; a job is running while its process is listed by
//! `ps` and finished afterwards.

mod adapter;
mod parser;
mod templates;

pub use adapter::{LocalAdapter, PARAMETERS};
