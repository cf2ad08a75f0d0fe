//! Frequency classification and grid extraction for hearing-level
//! measurement tables.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;

pub use error::{Error, Result};
