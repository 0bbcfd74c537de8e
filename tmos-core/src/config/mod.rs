//! Configuration types
//!
//! Board-agnostic runtime configuration, loadable from TOML.

pub mod types;

pub use types::*;
