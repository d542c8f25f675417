//! Fujitsu PJM integration for the Fugaku supercomputer.
//!
//! Node counts are given as 1- to 3-dimensional torus shapes and the
//! resource group (`rscgrp`) is derived from the node count, the elapsed
//! time limit and the low-priority flag.

mod adapter;
mod parser;
mod templates;

pub use adapter::{FugakuAdapter, PARAMETERS, resource_group};
