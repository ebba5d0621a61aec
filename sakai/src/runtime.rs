//! Runtime support for simulations.

pub mod tracing;
