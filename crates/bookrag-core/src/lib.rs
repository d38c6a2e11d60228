//! bookrag-core
//!
//! Domain types, traits and configuration shared by the ingestion and query
//! sides of the workspace.

#![deny(unused_imports)]

pub mod config;
pub mod data_processor;
pub mod error;
pub mod logging;
pub mod splitter;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
