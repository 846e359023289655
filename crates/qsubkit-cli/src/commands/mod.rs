//! CLI command implementations.

pub mod common;
pub mod directive;
pub mod fill;
pub mod render;
pub mod submit;
pub mod version;
