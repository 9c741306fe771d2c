//! Configuration loading and validation

mod gemfamily_toml;
pub mod validation;

pub use gemfamily_toml::*;
