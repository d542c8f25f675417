//! CLI command implementations.

pub mod cancel;
pub mod common;
pub mod params;
pub mod status;
pub mod submit;
