//! Cantus Core - cancellable, incremental render orchestration for vocal projects

pub mod config;
pub mod events;
pub mod export;
pub mod project;
pub mod render;
pub mod signal;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use types::*;
