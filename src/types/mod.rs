// charrank shared type definitions
// Each submodule defines types used across the pipeline.

pub mod character;
pub mod diff;
pub mod errors;
pub mod history;
pub mod ranking;
pub mod settings;
